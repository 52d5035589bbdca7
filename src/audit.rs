//! Audit aspect shared by every record, and the outcome of audited writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creator, timestamps, modifier and soft-delete flag.
///
/// Carried unchanged by both entities and DTOs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_by: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Audit {
    /// Fresh audit stamp for a record created now.
    pub fn new(created_by: Option<&str>) -> Self {
        Self {
            created_by: created_by.map(str::to_string),
            created_at: Utc::now(),
            modified_by: None,
            modified_at: None,
            is_deleted: false,
        }
    }
}

/// What an update or soft-delete actually did.
///
/// Missing and already-deleted records are not errors; the write is skipped
/// and the reason reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was active and has been written.
    Applied,
    /// No record with that key exists.
    NotFound,
    /// The record exists but is soft-deleted.
    AlreadyDeleted,
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}
