use rusqlite::Connection;
use crate::models::{LeadEvent, LeadEventKind, Stage};
use anyhow::{Context, Result};

/// Activity log repository
///
/// Records what happened to a lead over its life: creation, stage changes,
/// notes, and enrollments. Entries are append-only; the detail column
/// carries kind-specific fields as JSON.
pub struct EventRepo;

impl EventRepo {
    fn record(
        conn: &Connection,
        lead_id: i64,
        kind: LeadEventKind,
        detail: Option<serde_json::Value>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let detail_json = detail.map(|d| d.to_string());
        conn.execute(
            "INSERT INTO lead_events (lead_id, kind, detail_json, created_ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![lead_id, kind.as_str(), detail_json, now],
        )
        .with_context(|| format!("Failed to record {} event for lead {}", kind.as_str(), lead_id))?;
        Ok(())
    }

    pub fn record_created(conn: &Connection, lead_id: i64, stage: Stage) -> Result<()> {
        Self::record(
            conn,
            lead_id,
            LeadEventKind::Created,
            Some(serde_json::json!({ "stage": stage.as_str() })),
        )
    }

    pub fn record_stage_changed(conn: &Connection, lead_id: i64, from: Stage, to: Stage) -> Result<()> {
        Self::record(
            conn,
            lead_id,
            LeadEventKind::StageChanged,
            Some(serde_json::json!({ "from": from.as_str(), "to": to.as_str() })),
        )
    }

    pub fn record_note_added(conn: &Connection, lead_id: i64, note_id: i64) -> Result<()> {
        Self::record(
            conn,
            lead_id,
            LeadEventKind::NoteAdded,
            Some(serde_json::json!({ "note_id": note_id })),
        )
    }

    pub fn record_enrolled(conn: &Connection, lead_id: i64, course_id: i64) -> Result<()> {
        Self::record(
            conn,
            lead_id,
            LeadEventKind::Enrolled,
            Some(serde_json::json!({ "course_id": course_id })),
        )
    }

    /// Get all events for a lead, oldest first
    pub fn get_by_lead(conn: &Connection, lead_id: i64) -> Result<Vec<LeadEvent>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, kind, detail_json, created_ts
             FROM lead_events WHERE lead_id = ?1 ORDER BY created_ts ASC, id ASC"
        )?;

        let rows = stmt.query_map([lead_id], event_from_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Get the most recent events across all leads, newest first
    pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<LeadEvent>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, kind, detail_json, created_ts
             FROM lead_events ORDER BY created_ts DESC, id DESC LIMIT ?1"
        )?;

        let rows = stmt.query_map([limit as i64], event_from_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

fn event_from_row(row: &rusqlite::Row) -> rusqlite::Result<LeadEvent> {
    let kind_str: String = row.get(2)?;
    let detail_json: Option<String> = row.get(3)?;
    Ok(LeadEvent {
        id: Some(row.get(0)?),
        lead_id: row.get(1)?,
        kind: LeadEventKind::from_str(&kind_str).unwrap_or(LeadEventKind::Created),
        detail: detail_json.and_then(|j| serde_json::from_str(&j).ok()),
        created_ts: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::LeadInput;
    use crate::repo::LeadRepo;

    fn sample_lead(conn: &Connection) -> i64 {
        let input = LeadInput {
            name: "Ana Souza".to_string(),
            email: "ana@x.gov".to_string(),
            phone: "(45) 9999-0000".to_string(),
            organization_id: None,
            role: "Assessora".to_string(),
            source: None,
        };
        LeadRepo::create(conn, &input, Stage::New).unwrap().id.unwrap()
    }

    #[test]
    fn test_created_event_recorded_on_create() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead_id = sample_lead(&conn);

        let events = EventRepo::get_by_lead(&conn, lead_id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LeadEventKind::Created);
        assert_eq!(events[0].detail.as_ref().unwrap()["stage"], "new");
    }

    #[test]
    fn test_stage_changed_detail() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead_id = sample_lead(&conn);

        EventRepo::record_stage_changed(&conn, lead_id, Stage::New, Stage::Qualified).unwrap();

        let events = EventRepo::get_by_lead(&conn, lead_id).unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.kind, LeadEventKind::StageChanged);
        assert_eq!(last.detail.as_ref().unwrap()["from"], "new");
        assert_eq!(last.detail.as_ref().unwrap()["to"], "qualified");
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead_id = sample_lead(&conn);
        EventRepo::record_note_added(&conn, lead_id, 1).unwrap();
        EventRepo::record_stage_changed(&conn, lead_id, Stage::New, Stage::Contacted).unwrap();

        let recent = EventRepo::recent(&conn, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].kind, LeadEventKind::StageChanged);
        assert_eq!(recent[1].kind, LeadEventKind::NoteAdded);
    }
}
