//! # Vestry Common Library
//!
//! Shared code for the Vestry wardrobe cataloger including:
//! - Database schema and queries (items, outfits, settings)
//! - Event types (VestryEvent enum) and the broadcast EventBus
//! - Wardrobe taxonomy: categories, seasons, tag suggestions
//! - Outfit slot model, normalization, and display summaries
//! - Configuration loading and root folder resolution

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod outfit;
pub mod pagination;
pub mod taxonomy;

pub use error::{Error, Result};
pub use taxonomy::{Category, Season};
