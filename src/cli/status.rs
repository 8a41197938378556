// Dashboard computation for the status command

use crate::board::LeadStore;
use crate::repo::{EnrollmentRepo, CourseRepo, EventRepo, LeadRepo, OrganizationRepo};
use crate::utils::format_relative_time;
use anyhow::Result;
use rusqlite::Connection;

/// Number of recent activity entries shown on the dashboard
const RECENT_EVENTS: usize = 5;

/// Compute the text dashboard for `funil status`
pub fn format_status(conn: &Connection) -> Result<String> {
    let store = LeadStore::from_leads(LeadRepo::list_all(conn)?);
    let organizations = OrganizationRepo::list(conn, false)?.len();
    let courses = CourseRepo::list(conn, false)?.len();
    let enrollments = EnrollmentRepo::count(conn)?;

    let mut out = String::new();
    out.push_str(&format!("Pipeline: {} lead(s)\n", store.len()));
    for (stage, count) in store.counts() {
        out.push_str(&format!("  {:<10} {}\n", stage.label(), count));
    }
    out.push_str(&format!(
        "\nOrganizations: {}   Courses: {}   Enrollments: {}\n",
        organizations, courses, enrollments
    ));

    let recent = EventRepo::recent(conn, RECENT_EVENTS)?;
    if !recent.is_empty() {
        out.push_str("\nRecent activity:\n");
        for event in recent {
            let name = LeadRepo::get_by_id(conn, event.lead_id)?
                .map(|l| l.name)
                .unwrap_or_else(|| format!("lead {}", event.lead_id));
            out.push_str(&format!(
                "  {:<8} {} - {}\n",
                format_relative_time(event.created_ts),
                name,
                describe_kind(&event)
            ));
        }
    }

    Ok(out)
}

fn describe_kind(event: &crate::models::LeadEvent) -> String {
    use crate::models::LeadEventKind;
    let detail = event.detail.as_ref();
    match event.kind {
        LeadEventKind::Created => "created".to_string(),
        LeadEventKind::StageChanged => {
            let from = detail.and_then(|d| d["from"].as_str()).unwrap_or("?");
            let to = detail.and_then(|d| d["to"].as_str()).unwrap_or("?");
            format!("moved {} to {}", from, to)
        }
        LeadEventKind::NoteAdded => "note added".to_string(),
        LeadEventKind::Enrolled => "enrolled".to_string(),
    }
}

/// JSON variant of the dashboard
pub fn status_json(conn: &Connection) -> Result<String> {
    let store = LeadStore::from_leads(LeadRepo::list_all(conn)?);

    let mut stages = serde_json::Map::new();
    for (stage, count) in store.counts() {
        stages.insert(stage.as_str().to_string(), serde_json::json!(count));
    }

    let value = serde_json::json!({
        "leads": store.len(),
        "stages": stages,
        "organizations": OrganizationRepo::list(conn, false)?.len(),
        "courses": CourseRepo::list(conn, false)?.len(),
        "enrollments": EnrollmentRepo::count(conn)?,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
