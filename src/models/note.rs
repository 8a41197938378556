use serde::{Deserialize, Serialize};

/// Note model
///
/// A timestamped free-text note attached to a lead, shown in the lead's
/// detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub note: String,
    pub entry_ts: i64,
    pub created_ts: i64,
}
