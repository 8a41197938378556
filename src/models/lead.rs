use serde::{Deserialize, Serialize};
use crate::models::Stage;

/// Contact fields supplied when creating a lead.
///
/// The command layer enforces that name, email, phone, organization, and
/// role are present. Email is not required to be unique.
#[derive(Debug, Clone, Default)]
pub struct LeadInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub organization_id: Option<i64>,
    pub role: String,
    pub source: Option<String>,
}

/// Lead model
///
/// A contact record tracked through the pipeline. Leads are created into a
/// stage (New by default), restaged by moves, and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Option<i64>,
    pub uuid: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub organization_id: Option<i64>,
    pub role: String,
    pub source: Option<String>,
    pub stage: Stage,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Lead {
    /// Create a new lead in the New stage from contact fields.
    pub fn new(input: LeadInput) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            organization_id: input.organization_id,
            role: input.role,
            source: input.source,
            stage: Stage::New,
            created_ts: now,
            modified_ts: now,
        }
    }
}
