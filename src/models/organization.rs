use serde::{Deserialize, Serialize};

/// Organization model
///
/// A prospective or current client organization (city hall, secretariat,
/// state agency). Leads reference organizations by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Option<i64>,
    pub name: String,
    pub city: Option<String>,
    pub is_archived: bool,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Organization {
    pub fn new(name: String, city: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            name,
            city,
            is_archived: false,
            created_ts: now,
            modified_ts: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_creation() {
        let org = Organization::new("Prefeitura X".to_string(), Some("Cascavel".to_string()));
        assert_eq!(org.name, "Prefeitura X");
        assert_eq!(org.city.as_deref(), Some("Cascavel"));
        assert!(!org.is_archived);
        assert!(org.id.is_none());
    }
}
