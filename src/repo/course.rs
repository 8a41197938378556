use rusqlite::{Connection, OptionalExtension};
use crate::models::{Course, Enrollment};
use crate::repo::EventRepo;
use anyhow::{Context, Result};

/// Course catalog repository
pub struct CourseRepo;

impl CourseRepo {
    /// Create a new course
    pub fn create(conn: &Connection, name: &str, title: &str) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO courses (name, title, is_archived, created_ts, modified_ts)
             VALUES (?1, ?2, 0, ?3, ?4)",
            rusqlite::params![name, title, now, now],
        )
        .with_context(|| format!("Failed to create course: {}", name))?;

        let id = conn.last_insert_rowid();
        Ok(Course {
            id: Some(id),
            name: name.to_string(),
            title: title.to_string(),
            is_archived: false,
            created_ts: now,
            modified_ts: now,
        })
    }

    /// Get course by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Course>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, title, is_archived, created_ts, modified_ts
             FROM courses WHERE id = ?1"
        )?;
        let course = stmt.query_row([id], course_from_row).optional()?;
        Ok(course)
    }

    /// Get course by name (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Course>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, title, is_archived, created_ts, modified_ts
             FROM courses WHERE name = ?1 COLLATE NOCASE"
        )?;
        let course = stmt.query_row([name], course_from_row).optional()?;
        Ok(course)
    }

    /// List courses, optionally including archived ones
    pub fn list(conn: &Connection, include_archived: bool) -> Result<Vec<Course>> {
        let sql = if include_archived {
            "SELECT id, name, title, is_archived, created_ts, modified_ts
             FROM courses ORDER BY name"
        } else {
            "SELECT id, name, title, is_archived, created_ts, modified_ts
             FROM courses WHERE is_archived = 0 ORDER BY name"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], course_from_row)?;

        let mut courses = Vec::new();
        for row in rows {
            courses.push(row?);
        }
        Ok(courses)
    }

    /// Archive a course
    pub fn archive(conn: &Connection, name: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let rows = conn.execute(
            "UPDATE courses SET is_archived = 1, modified_ts = ?1 WHERE name = ?2 COLLATE NOCASE",
            rusqlite::params![now, name],
        )?;
        if rows == 0 {
            anyhow::bail!("Course '{}' not found", name);
        }
        Ok(())
    }
}

/// Enrollment repository
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Enroll a lead in a course. A lead can be enrolled in a course at most
    /// once.
    pub fn enroll(conn: &Connection, lead_id: i64, course_id: i64) -> Result<Enrollment> {
        if Self::get(conn, lead_id, course_id)?.is_some() {
            anyhow::bail!("Lead {} is already enrolled in this course", lead_id);
        }

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO enrollments (lead_id, course_id, enrolled_ts) VALUES (?1, ?2, ?3)",
            rusqlite::params![lead_id, course_id, now],
        )
        .with_context(|| format!("Failed to enroll lead {} in course {}", lead_id, course_id))?;

        let id = conn.last_insert_rowid();
        EventRepo::record_enrolled(conn, lead_id, course_id)?;

        Ok(Enrollment {
            id: Some(id),
            lead_id,
            course_id,
            enrolled_ts: now,
        })
    }

    /// Get a specific enrollment
    pub fn get(conn: &Connection, lead_id: i64, course_id: i64) -> Result<Option<Enrollment>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, course_id, enrolled_ts
             FROM enrollments WHERE lead_id = ?1 AND course_id = ?2"
        )?;
        let enrollment = stmt
            .query_row([lead_id, course_id], enrollment_from_row)
            .optional()?;
        Ok(enrollment)
    }

    /// List all enrollments, newest first
    pub fn list_all(conn: &Connection) -> Result<Vec<Enrollment>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, course_id, enrolled_ts
             FROM enrollments ORDER BY enrolled_ts DESC, id DESC"
        )?;
        let rows = stmt.query_map([], enrollment_from_row)?;

        let mut enrollments = Vec::new();
        for row in rows {
            enrollments.push(row?);
        }
        Ok(enrollments)
    }

    /// List enrollments for one course, newest first
    pub fn list_by_course(conn: &Connection, course_id: i64) -> Result<Vec<Enrollment>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, course_id, enrolled_ts
             FROM enrollments WHERE course_id = ?1 ORDER BY enrolled_ts DESC, id DESC"
        )?;
        let rows = stmt.query_map([course_id], enrollment_from_row)?;

        let mut enrollments = Vec::new();
        for row in rows {
            enrollments.push(row?);
        }
        Ok(enrollments)
    }

    /// Total number of enrollments
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM enrollments", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn course_from_row(row: &rusqlite::Row) -> rusqlite::Result<Course> {
    let archived: i64 = row.get(3)?;
    Ok(Course {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        title: row.get(2)?,
        is_archived: archived != 0,
        created_ts: row.get(4)?,
        modified_ts: row.get(5)?,
    })
}

fn enrollment_from_row(row: &rusqlite::Row) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: Some(row.get(0)?),
        lead_id: row.get(1)?,
        course_id: row.get(2)?,
        enrolled_ts: row.get(3)?,
    })
}
