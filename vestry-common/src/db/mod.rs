//! Database schema and queries

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

pub mod init;
pub mod items;
pub mod outfits;
pub mod settings;

pub use init::*;

/// Parse a guid column, flagging corrupt rows instead of panicking
pub(crate) fn parse_guid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Invalid guid in database: {}", e)))
}

/// Parse an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}
