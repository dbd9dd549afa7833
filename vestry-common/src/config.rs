//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration is minimal: a root folder holding the database
//! file, an optional port, and logging preferences. Everything tunable at
//! runtime lives in the database `settings` table.
//!
//! Root folder resolution priority:
//! 1. Command-line argument (applied by the binary, highest priority)
//! 2. `VESTRY_ROOT_FOLDER` environment variable
//! 3. `VESTRY_ROOT` environment variable (legacy name)
//! 4. `root_folder` in the TOML config file
//! 5. OS-dependent compiled default (fallback)

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::Result;

/// Name of the database file inside the root folder
pub const DATABASE_FILE_NAME: &str = "vestry.db";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    /// Default root folder (holds the database file)
    pub root_folder: PathBuf,
    /// Default log level
    pub log_level: String,
    /// Default log file (None = stderr)
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    /// Build the defaults for the platform the binary was compiled for
    pub fn for_current_platform() -> Self {
        CompiledDefaults {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/vestry
        dirs::data_local_dir()
            .map(|d| d.join("vestry"))
            .unwrap_or_else(|| PathBuf::from("./vestry_data"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/vestry
        dirs::data_dir()
            .map(|d| d.join("vestry"))
            .unwrap_or_else(|| PathBuf::from("./vestry_data"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\vestry
        dirs::data_local_dir()
            .map(|d| d.join("vestry"))
            .unwrap_or_else(|| PathBuf::from("./vestry_data"))
    } else {
        PathBuf::from("./vestry_data")
    }
}

/// Bootstrap configuration loaded from a TOML file
///
/// These settings cannot change during runtime; restart to pick up edits.
/// All fields are optional so that older files keep parsing as the schema
/// grows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder override
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port override
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse {:?}: {}", path, e)))
    }
}

/// Get the per-module configuration file path for the platform
///
/// Linux checks the user config directory first, then `/etc/vestry`.
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("vestry").join(&file_name)) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/vestry").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolves the root folder for a module following the documented priority
/// order (environment variables, TOML config file, compiled default)
///
/// Command-line arguments outrank everything here and are handled by the
/// binary before this resolver runs.
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        RootFolderResolver {
            module_name: module_name.to_string(),
        }
    }

    /// Resolve the root folder
    ///
    /// Never fails: a missing or unparseable config file falls through to
    /// the next tier so the application always starts.
    pub fn resolve(&self) -> PathBuf {
        if let Ok(path) = std::env::var("VESTRY_ROOT_FOLDER") {
            debug!("Root folder from VESTRY_ROOT_FOLDER: {}", path);
            return PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("VESTRY_ROOT") {
            debug!("Root folder from VESTRY_ROOT (legacy): {}", path);
            return PathBuf::from(path);
        }

        if let Some(config_path) = config_file_path(&self.module_name) {
            match TomlConfig::load(&config_path) {
                Ok(config) => {
                    if let Some(root_folder) = config.root_folder {
                        debug!("Root folder from {:?}: {:?}", config_path, root_folder);
                        return root_folder;
                    }
                }
                Err(e) => {
                    warn!("Ignoring unreadable config file {:?}: {}", config_path, e);
                }
            }
        }

        let default = default_root_folder();
        debug!("Root folder from compiled default: {:?}", default);
        default
    }
}

/// Prepares a resolved root folder for use: creates the directory tree and
/// names the database file inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        RootFolderInitializer { root }
    }

    /// Create the root folder (and parents) if missing. Idempotent.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Path of the database file inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }

    /// Whether the database file already exists
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}
