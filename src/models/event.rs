use serde::{Deserialize, Serialize};

/// Kind of activity recorded against a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventKind {
    Created,
    StageChanged,
    NoteAdded,
    Enrolled,
}

impl LeadEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadEventKind::Created => "created",
            LeadEventKind::StageChanged => "stage_changed",
            LeadEventKind::NoteAdded => "note_added",
            LeadEventKind::Enrolled => "enrolled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(LeadEventKind::Created),
            "stage_changed" => Some(LeadEventKind::StageChanged),
            "note_added" => Some(LeadEventKind::NoteAdded),
            "enrolled" => Some(LeadEventKind::Enrolled),
            _ => None,
        }
    }
}

/// Activity log entry for a lead. `detail` carries kind-specific fields as
/// JSON (e.g. `{"from":"new","to":"qualified"}` for stage changes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadEvent {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub kind: LeadEventKind,
    pub detail: Option<serde_json::Value>,
    pub created_ts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_conversion() {
        assert_eq!(LeadEventKind::Created.as_str(), "created");
        assert_eq!(LeadEventKind::from_str("created"), Some(LeadEventKind::Created));
        assert_eq!(LeadEventKind::StageChanged.as_str(), "stage_changed");
        assert_eq!(LeadEventKind::from_str("stage_changed"), Some(LeadEventKind::StageChanged));
        assert_eq!(LeadEventKind::from_str("bogus"), None);
    }
}
