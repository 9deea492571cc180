//! Item value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single ingested content record with source metadata and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique, non-empty identifier.
    pub id: String,
    /// Kind of source the item came from (e.g. `rss`).
    pub source_type: String,
    /// Human-readable name of the source.
    pub source_name: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub author: String,
    /// When the source published the item.
    pub published_at: DateTime<Utc>,
    /// When the item was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl Item {
    /// Whether the identifier is usable as a store key.
    pub fn has_valid_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
