use rusqlite::{Connection, OptionalExtension};
use crate::models::Organization;
use crate::repo::LeadRepo;
use anyhow::{Context, Result};

/// Organization repository for database operations
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Create a new organization
    pub fn create(conn: &Connection, name: &str, city: Option<&str>) -> Result<Organization> {
        let org = Organization::new(name.to_string(), city.map(|c| c.to_string()));

        conn.execute(
            "INSERT INTO organizations (name, city, is_archived, created_ts, modified_ts)
             VALUES (?1, ?2, 0, ?3, ?4)",
            rusqlite::params![org.name, org.city, org.created_ts, org.modified_ts],
        )
        .with_context(|| format!("Failed to create organization: {}", name))?;

        let id = conn.last_insert_rowid();
        Ok(Organization {
            id: Some(id),
            ..org
        })
    }

    /// Get organization by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Organization>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, city, is_archived, created_ts, modified_ts
             FROM organizations WHERE id = ?1"
        )?;
        let org = stmt.query_row([id], org_from_row).optional()?;
        Ok(org)
    }

    /// Get organization by name (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Organization>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, city, is_archived, created_ts, modified_ts
             FROM organizations WHERE name = ?1 COLLATE NOCASE"
        )?;
        let org = stmt.query_row([name], org_from_row).optional()?;
        Ok(org)
    }

    /// List organizations, optionally including archived ones
    pub fn list(conn: &Connection, include_archived: bool) -> Result<Vec<Organization>> {
        let sql = if include_archived {
            "SELECT id, name, city, is_archived, created_ts, modified_ts
             FROM organizations ORDER BY name"
        } else {
            "SELECT id, name, city, is_archived, created_ts, modified_ts
             FROM organizations WHERE is_archived = 0 ORDER BY name"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], org_from_row)?;

        let mut orgs = Vec::new();
        for row in rows {
            orgs.push(row?);
        }
        Ok(orgs)
    }

    /// Number of leads pointing at an organization
    pub fn lead_count(conn: &Connection, org_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE organization_id = ?1",
            [org_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Rename an organization
    pub fn rename(conn: &Connection, old_name: &str, new_name: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let rows = conn.execute(
            "UPDATE organizations SET name = ?1, modified_ts = ?2 WHERE name = ?3 COLLATE NOCASE",
            rusqlite::params![new_name, now, old_name],
        )
        .with_context(|| format!("Failed to rename organization '{}'", old_name))?;

        if rows == 0 {
            anyhow::bail!("Organization '{}' not found", old_name);
        }
        Ok(())
    }

    /// Merge one organization into another: repoint its leads, then remove
    /// the emptied record. Returns the number of leads repointed.
    pub fn merge(conn: &Connection, from_name: &str, into_name: &str) -> Result<usize> {
        let from = Self::get_by_name(conn, from_name)?
            .ok_or_else(|| anyhow::anyhow!("Organization '{}' not found", from_name))?;
        let into = Self::get_by_name(conn, into_name)?
            .ok_or_else(|| anyhow::anyhow!("Organization '{}' not found", into_name))?;

        if from.id == into.id {
            anyhow::bail!("Cannot merge organization '{}' into itself", from_name);
        }

        let tx = conn.unchecked_transaction()?;
        let moved = LeadRepo::reassign_organization(&tx, from.id.unwrap(), into.id.unwrap())?;
        tx.execute(
            "DELETE FROM organizations WHERE id = ?1",
            [from.id.unwrap()],
        )?;
        tx.commit()?;
        Ok(moved)
    }

    /// Archive an organization
    pub fn archive(conn: &Connection, name: &str) -> Result<()> {
        Self::set_archived(conn, name, true)
    }

    /// Unarchive an organization
    pub fn unarchive(conn: &Connection, name: &str) -> Result<()> {
        Self::set_archived(conn, name, false)
    }

    fn set_archived(conn: &Connection, name: &str, archived: bool) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let rows = conn.execute(
            "UPDATE organizations SET is_archived = ?1, modified_ts = ?2 WHERE name = ?3 COLLATE NOCASE",
            rusqlite::params![archived as i64, now, name],
        )?;
        if rows == 0 {
            anyhow::bail!("Organization '{}' not found", name);
        }
        Ok(())
    }
}

fn org_from_row(row: &rusqlite::Row) -> rusqlite::Result<Organization> {
    let archived: i64 = row.get(3)?;
    Ok(Organization {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        city: row.get(2)?,
        is_archived: archived != 0,
        created_ts: row.get(4)?,
        modified_ts: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::{LeadInput, Stage};

    #[test]
    fn test_create_and_get_by_name() {
        let conn = DbConnection::connect_in_memory().unwrap();
        OrganizationRepo::create(&conn, "Prefeitura X", Some("Cascavel")).unwrap();

        let org = OrganizationRepo::get_by_name(&conn, "prefeitura x").unwrap().unwrap();
        assert_eq!(org.name, "Prefeitura X");
        assert_eq!(org.city.as_deref(), Some("Cascavel"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let conn = DbConnection::connect_in_memory().unwrap();
        OrganizationRepo::create(&conn, "Prefeitura X", None).unwrap();
        assert!(OrganizationRepo::create(&conn, "Prefeitura X", None).is_err());
    }

    #[test]
    fn test_list_excludes_archived_by_default() {
        let conn = DbConnection::connect_in_memory().unwrap();
        OrganizationRepo::create(&conn, "Ativa", None).unwrap();
        OrganizationRepo::create(&conn, "Antiga", None).unwrap();
        OrganizationRepo::archive(&conn, "Antiga").unwrap();

        let active = OrganizationRepo::list(&conn, false).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Ativa");

        let all = OrganizationRepo::list(&conn, true).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_rename() {
        let conn = DbConnection::connect_in_memory().unwrap();
        OrganizationRepo::create(&conn, "Prefeitura X", None).unwrap();
        OrganizationRepo::rename(&conn, "Prefeitura X", "Prefeitura de X").unwrap();

        assert!(OrganizationRepo::get_by_name(&conn, "Prefeitura X").unwrap().is_none());
        assert!(OrganizationRepo::get_by_name(&conn, "Prefeitura de X").unwrap().is_some());
    }

    #[test]
    fn test_merge_repoints_leads() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let old = OrganizationRepo::create(&conn, "Pref. X", None).unwrap();
        let kept = OrganizationRepo::create(&conn, "Prefeitura X", None).unwrap();

        let input = LeadInput {
            name: "Ana".to_string(),
            email: "ana@x.gov".to_string(),
            phone: "(45) 9999-0000".to_string(),
            organization_id: old.id,
            role: "Assessora".to_string(),
            source: None,
        };
        let lead = LeadRepo::create(&conn, &input, Stage::New).unwrap();

        let moved = OrganizationRepo::merge(&conn, "Pref. X", "Prefeitura X").unwrap();
        assert_eq!(moved, 1);

        let fetched = LeadRepo::get_by_id(&conn, lead.id.unwrap()).unwrap().unwrap();
        assert_eq!(fetched.organization_id, kept.id);
        assert!(OrganizationRepo::get_by_name(&conn, "Pref. X").unwrap().is_none());
    }

    #[test]
    fn test_merge_into_itself_fails() {
        let conn = DbConnection::connect_in_memory().unwrap();
        OrganizationRepo::create(&conn, "Prefeitura X", None).unwrap();
        assert!(OrganizationRepo::merge(&conn, "Prefeitura X", "prefeitura x").is_err());
    }
}
