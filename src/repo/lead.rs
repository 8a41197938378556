use rusqlite::{Connection, OptionalExtension};
use crate::models::{Lead, LeadInput, Stage};
use crate::repo::EventRepo;
use anyhow::{Context, Result};

/// Lead repository for database operations
///
/// `list_all` returns leads newest-first, so a hydrated
/// [`crate::board::LeadStore`] sees the same order a live store would have
/// built by prepending on create. There is no delete: leads stay on the
/// ledger for good.
pub struct LeadRepo;

impl LeadRepo {
    /// Create a new lead in the given stage
    pub fn create(conn: &Connection, input: &LeadInput, stage: Stage) -> Result<Lead> {
        let mut lead = Lead::new(input.clone());
        lead.stage = stage;

        conn.execute(
            "INSERT INTO leads (uuid, name, email, phone, organization_id, role, source, stage, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                lead.uuid,
                lead.name,
                lead.email,
                lead.phone,
                lead.organization_id,
                lead.role,
                lead.source,
                lead.stage.as_str(),
                lead.created_ts,
                lead.modified_ts,
            ],
        )
        .with_context(|| format!("Failed to create lead: {}", lead.name))?;

        let id = conn.last_insert_rowid();
        EventRepo::record_created(conn, id, stage)?;

        Ok(Lead {
            id: Some(id),
            ..lead
        })
    }

    /// Get lead by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Lead>> {
        let mut stmt = conn.prepare(
            "SELECT id, uuid, name, email, phone, organization_id, role, source, stage, created_ts, modified_ts
             FROM leads WHERE id = ?1"
        )?;

        let lead = stmt.query_row([id], lead_from_row).optional()?;
        Ok(lead)
    }

    /// List all leads, newest first (store order)
    pub fn list_all(conn: &Connection) -> Result<Vec<Lead>> {
        let mut stmt = conn.prepare(
            "SELECT id, uuid, name, email, phone, organization_id, role, source, stage, created_ts, modified_ts
             FROM leads ORDER BY id DESC"
        )?;

        let rows = stmt.query_map([], lead_from_row)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    /// Persist a stage transition and record it in the activity log
    pub fn set_stage(conn: &Connection, lead_id: i64, from: Stage, to: Stage) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let rows = conn.execute(
            "UPDATE leads SET stage = ?1, modified_ts = ?2 WHERE id = ?3",
            rusqlite::params![to.as_str(), now, lead_id],
        )
        .with_context(|| format!("Failed to update stage for lead {}", lead_id))?;

        if rows == 0 {
            anyhow::bail!("Lead {} not found", lead_id);
        }

        EventRepo::record_stage_changed(conn, lead_id, from, to)?;
        Ok(())
    }

    /// Update contact fields of an existing lead
    pub fn update(conn: &Connection, lead: &Lead) -> Result<()> {
        let id = lead.id.context("Cannot update a lead without an id")?;
        let now = chrono::Utc::now().timestamp();

        let rows = conn.execute(
            "UPDATE leads SET name = ?1, email = ?2, phone = ?3, organization_id = ?4,
                    role = ?5, source = ?6, modified_ts = ?7
             WHERE id = ?8",
            rusqlite::params![
                lead.name,
                lead.email,
                lead.phone,
                lead.organization_id,
                lead.role,
                lead.source,
                now,
                id,
            ],
        )
        .with_context(|| format!("Failed to update lead {}", id))?;

        if rows == 0 {
            anyhow::bail!("Lead {} not found", id);
        }
        Ok(())
    }

    /// Touch modified_ts on a lead
    pub fn touch_modified(conn: &Connection, lead_id: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE leads SET modified_ts = ?1 WHERE id = ?2",
            rusqlite::params![now, lead_id],
        )?;
        Ok(())
    }

    /// Repoint all leads of one organization to another (used by org merge)
    pub fn reassign_organization(conn: &Connection, from_org: i64, to_org: i64) -> Result<usize> {
        let rows = conn.execute(
            "UPDATE leads SET organization_id = ?1 WHERE organization_id = ?2",
            rusqlite::params![to_org, from_org],
        )?;
        Ok(rows)
    }
}

fn lead_from_row(row: &rusqlite::Row) -> rusqlite::Result<Lead> {
    let stage_str: String = row.get(8)?;
    Ok(Lead {
        id: Some(row.get(0)?),
        uuid: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        organization_id: row.get(5)?,
        role: row.get(6)?,
        source: row.get(7)?,
        stage: Stage::from_str(&stage_str).unwrap_or(Stage::New),
        created_ts: row.get(9)?,
        modified_ts: row.get(10)?,
    })
}
