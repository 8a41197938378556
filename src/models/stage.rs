use serde::{Deserialize, Serialize};

/// Pipeline stage a lead occupies.
///
/// The four stages are a fixed enumeration and every lead is in exactly one
/// of them at any time. Any stage may move to any other stage; there is no
/// workflow ordering between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    New,
    Qualified,
    Contacted,
    Converted,
}

impl Stage {
    /// All stages in board display order.
    pub const ALL: [Stage; 4] = [
        Stage::New,
        Stage::Qualified,
        Stage::Contacted,
        Stage::Converted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Qualified => "qualified",
            Stage::Contacted => "contacted",
            Stage::Converted => "converted",
        }
    }

    /// Column header label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::New => "New",
            Stage::Qualified => "Qualified",
            Stage::Contacted => "Contacted",
            Stage::Converted => "Converted",
        }
    }

    /// Parse a stage name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(Stage::New),
            "qualified" => Some(Stage::Qualified),
            "contacted" => Some(Stage::Contacted),
            "converted" => Some(Stage::Converted),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
