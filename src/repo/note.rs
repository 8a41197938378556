use rusqlite::{Connection, OptionalExtension};
use crate::models::Note;
use crate::repo::{EventRepo, LeadRepo};
use anyhow::{Context, Result};

/// Note repository for database operations
///
/// Notes are the free-text entries shown in a lead's detail view. Adding a
/// note records a note_added event and touches the lead's modified
/// timestamp.
pub struct NoteRepo;

impl NoteRepo {
    /// Create a new note on a lead
    pub fn create(conn: &Connection, lead_id: i64, note: String) -> Result<Note> {
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO lead_notes (lead_id, note, entry_ts, created_ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![lead_id, note, now, now],
        )
        .with_context(|| format!("Failed to add note to lead {}", lead_id))?;

        let id = conn.last_insert_rowid();

        EventRepo::record_note_added(conn, lead_id, id)?;
        LeadRepo::touch_modified(conn, lead_id)?;

        Ok(Note {
            id: Some(id),
            lead_id,
            note,
            entry_ts: now,
            created_ts: now,
        })
    }

    /// Get all notes for a lead, oldest first
    pub fn get_by_lead(conn: &Connection, lead_id: i64) -> Result<Vec<Note>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, note, entry_ts, created_ts
             FROM lead_notes WHERE lead_id = ?1 ORDER BY entry_ts ASC, id ASC"
        )?;

        let rows = stmt.query_map([lead_id], note_from_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    /// Get note by ID
    pub fn get_by_id(conn: &Connection, note_id: i64) -> Result<Option<Note>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, note, entry_ts, created_ts
             FROM lead_notes WHERE id = ?1"
        )?;

        stmt.query_row([note_id], note_from_row)
            .optional()
            .context("Failed to query note")
    }

    /// Delete a note, verifying it belongs to the specified lead
    pub fn delete_for_lead(conn: &Connection, lead_id: i64, note_id: i64) -> Result<()> {
        let rows_affected = conn.execute(
            "DELETE FROM lead_notes WHERE id = ?1 AND lead_id = ?2",
            rusqlite::params![note_id, lead_id],
        )?;

        if rows_affected == 0 {
            if Self::get_by_id(conn, note_id)?.is_some() {
                anyhow::bail!("Note {} does not belong to lead {}", note_id, lead_id);
            } else {
                anyhow::bail!("Note {} not found", note_id);
            }
        }

        LeadRepo::touch_modified(conn, lead_id)?;
        Ok(())
    }
}

fn note_from_row(row: &rusqlite::Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: Some(row.get(0)?),
        lead_id: row.get(1)?,
        note: row.get(2)?,
        entry_ts: row.get(3)?,
        created_ts: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::{LeadInput, Stage};

    fn sample_lead(conn: &Connection) -> i64 {
        let input = LeadInput {
            name: "Ana".to_string(),
            email: "ana@x.gov".to_string(),
            phone: "(45) 9999-0000".to_string(),
            organization_id: None,
            role: "Assessora".to_string(),
            source: None,
        };
        LeadRepo::create(conn, &input, Stage::New).unwrap().id.unwrap()
    }

    #[test]
    fn test_create_note() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead_id = sample_lead(&conn);

        let note = NoteRepo::create(&conn, lead_id, "Ligou pedindo proposta".to_string()).unwrap();
        assert_eq!(note.lead_id, lead_id);
        assert_eq!(note.note, "Ligou pedindo proposta");
        assert!(note.id.is_some());
    }

    #[test]
    fn test_get_by_lead_oldest_first() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead_id = sample_lead(&conn);

        NoteRepo::create(&conn, lead_id, "First note".to_string()).unwrap();
        NoteRepo::create(&conn, lead_id, "Second note".to_string()).unwrap();

        let notes = NoteRepo::get_by_lead(&conn, lead_id).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].note, "First note");
        assert_eq!(notes[1].note, "Second note");
    }

    #[test]
    fn test_delete_for_lead_guards_ownership() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead1 = sample_lead(&conn);
        let lead2 = sample_lead(&conn);

        let note = NoteRepo::create(&conn, lead1, "Note for lead 1".to_string()).unwrap();
        let note_id = note.id.unwrap();

        assert!(NoteRepo::delete_for_lead(&conn, lead2, note_id).is_err());
        NoteRepo::delete_for_lead(&conn, lead1, note_id).unwrap();
        assert_eq!(NoteRepo::get_by_lead(&conn, lead1).unwrap().len(), 0);
    }
}
