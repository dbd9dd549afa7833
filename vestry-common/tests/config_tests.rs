//! Unit tests for configuration and graceful degradation
//!
//! Covers:
//! - Missing TOML files never terminate startup
//! - Missing configs fall back to compiled defaults
//! - Priority order for root folder resolution
//! - Automatic directory and database path handling
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate VESTRY_ROOT_FOLDER or VESTRY_ROOT are marked with
//! #[serial] to ensure they run sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use vestry_common::config::{
    CompiledDefaults, LoggingConfig, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use vestry_common::Error;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    // Verify non-empty paths
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.log_file.is_none());

    // The application data folder carries the product name on every platform
    assert!(defaults.root_folder.ends_with("vestry") || defaults.root_folder.ends_with("vestry_data"));
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    // Clear environment variables
    env::remove_var("VESTRY_ROOT_FOLDER");
    env::remove_var("VESTRY_ROOT");

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve();

    // Should return a valid path (the compiled default)
    assert!(!root_folder.as_os_str().is_empty());

    // Should match compiled default
    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var_vestry_root_folder() {
    let test_path = "/tmp/vestry-test-env-folder";
    env::set_var("VESTRY_ROOT_FOLDER", test_path);

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve();

    assert_eq!(root_folder, PathBuf::from(test_path));

    // Cleanup
    env::remove_var("VESTRY_ROOT_FOLDER");
}

#[test]
#[serial]
fn test_resolver_env_var_vestry_root() {
    let test_path = "/tmp/vestry-test-env-root";
    env::set_var("VESTRY_ROOT", test_path);

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve();

    assert_eq!(root_folder, PathBuf::from(test_path));

    // Cleanup
    env::remove_var("VESTRY_ROOT");
}

#[test]
#[serial]
fn test_resolver_vestry_root_folder_takes_precedence() {
    // Clean up first to ensure no interference
    env::remove_var("VESTRY_ROOT_FOLDER");
    env::remove_var("VESTRY_ROOT");

    env::set_var("VESTRY_ROOT_FOLDER", "/tmp/vestry-priority-1");
    env::set_var("VESTRY_ROOT", "/tmp/vestry-priority-2");

    let resolver = RootFolderResolver::new("test-module");
    let root_folder = resolver.resolve();

    assert_eq!(root_folder, PathBuf::from("/tmp/vestry-priority-1"));

    // Cleanup
    env::remove_var("VESTRY_ROOT_FOLDER");
    env::remove_var("VESTRY_ROOT");
}

#[test]
fn test_initializer_database_path() {
    let root = PathBuf::from("/tmp/vestry-test-root");
    let initializer = RootFolderInitializer::new(root.clone());

    let db_path = initializer.database_path();
    assert_eq!(db_path, root.join("vestry.db"));
}

#[test]
fn test_initializer_database_exists() {
    let root = PathBuf::from("/tmp/vestry-test-nonexistent");
    let initializer = RootFolderInitializer::new(root);

    // Should return false for non-existent database
    assert!(!initializer.database_exists());
}

#[test]
fn test_initializer_creates_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("vestry-root");

    let initializer = RootFolderInitializer::new(root.clone());
    let result = initializer.ensure_directory_exists();

    assert!(result.is_ok(), "Failed to create directory: {:?}", result.err());
    assert!(root.exists(), "Directory was not created");
    assert!(root.is_dir(), "Created path is not a directory");
}

#[test]
fn test_initializer_idempotent_directory_creation() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("vestry-root");

    let initializer = RootFolderInitializer::new(root.clone());

    // First call - should create
    assert!(initializer.ensure_directory_exists().is_ok());

    // Second call - should succeed (idempotent)
    assert!(initializer.ensure_directory_exists().is_ok());

    assert!(root.exists());
}

#[test]
fn test_initializer_nested_directory_creation() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("level1").join("level2").join("vestry-root");

    let initializer = RootFolderInitializer::new(root.clone());
    let result = initializer.ensure_directory_exists();

    assert!(result.is_ok(), "Failed to create nested directories: {:?}", result.err());
    assert!(root.exists(), "Nested directory was not created");
    assert!(root.is_dir(), "Created nested path is not a directory");
}

#[test]
#[serial]
fn test_resolver_missing_config_file_does_not_error() {
    // Clear environment to force config file lookup
    env::remove_var("VESTRY_ROOT_FOLDER");
    env::remove_var("VESTRY_ROOT");

    // Use a module name that definitely won't have a config file
    let resolver = RootFolderResolver::new("nonexistent-test-module-12345");

    // Should not panic - should return compiled default
    let root_folder = resolver.resolve();

    assert!(!root_folder.as_os_str().is_empty());

    // Should match compiled default
    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
#[serial]
fn test_graceful_degradation_end_to_end() {
    // Clear environment
    env::remove_var("VESTRY_ROOT_FOLDER");
    env::remove_var("VESTRY_ROOT");

    // Step 1: Resolve root folder (should use default, no error)
    let resolver = RootFolderResolver::new("test-graceful-degradation");
    let root_folder = resolver.resolve();

    assert!(!root_folder.as_os_str().is_empty());

    // For testing, use a temp directory instead
    let tmp = tempfile::tempdir().unwrap();
    let test_root = tmp.path().join("vestry-graceful");

    // Step 2: Create directory (should succeed even if doesn't exist)
    let initializer = RootFolderInitializer::new(test_root.clone());
    let result = initializer.ensure_directory_exists();

    assert!(result.is_ok(), "Directory creation failed: {:?}", result.err());
    assert!(test_root.exists());

    // Step 3: Database path should be constructable
    let db_path = initializer.database_path();
    assert_eq!(db_path, test_root.join("vestry.db"));
    assert!(!initializer.database_exists());
}

#[test]
fn test_toml_config_full_file() {
    let toml_str = r#"
        root_folder = "/wardrobe"
        port = 5760

        [logging]
        level = "debug"
    "#;

    let config: TomlConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/wardrobe")));
    assert_eq!(config.port, Some(5760));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file, None);
}

#[test]
fn test_toml_config_backward_compatible_missing_fields() {
    // Older files carry only the root folder; everything else defaults
    let toml_str = r#"
        root_folder = "/wardrobe"
    "#;

    let config: TomlConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/wardrobe")));
    assert_eq!(config.port, None);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_toml_config_empty_file() {
    let config: TomlConfig = toml::from_str("").unwrap();
    assert_eq!(config.root_folder, None);
    assert_eq!(config.port, None);
    assert_eq!(config.logging.level, LoggingConfig::default().level);
}

#[test]
fn test_toml_config_load_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("vestry-ui.toml");
    std::fs::write(&path, "root_folder = \"/wardrobe\"\n").unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/wardrobe")));
}

#[test]
fn test_toml_config_load_missing_file_is_io_error() {
    let path = PathBuf::from("/tmp/vestry-definitely-missing-54321.toml");
    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_toml_config_load_invalid_file_is_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("vestry-ui.toml");
    std::fs::write(&path, "root_folder = [not toml").unwrap();

    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}
