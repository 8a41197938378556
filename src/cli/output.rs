// Output formatting utilities

use crate::board::LeadStore;
use crate::models::{Course, Enrollment, Lead, LeadEvent, LeadEventKind, Note, Organization, Stage};
use crate::repo::{CourseRepo, LeadRepo, OrganizationRepo};
use crate::utils::{format_date, format_relative_date, format_relative_time};
use rusqlite::Connection;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BLUE: &str = "\x1b[34m";
const ANSI_FG_MAGENTA: &str = "\x1b[35m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

/// Semantic color for a pipeline stage
fn stage_color(stage: Stage) -> &'static str {
    match stage {
        Stage::New => ANSI_FG_BLUE,
        Stage::Qualified => ANSI_FG_YELLOW,
        Stage::Contacted => ANSI_FG_MAGENTA,
        Stage::Converted => ANSI_FG_GREEN,
    }
}

/// Whether output should be colored. The config `color` key overrides
/// terminal detection.
pub fn color_enabled(override_color: Option<bool>) -> bool {
    override_color.unwrap_or_else(|| std::io::stdout().is_terminal())
}

fn paint(text: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{}{}{}", color, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Truncate a string to `max` chars, ellipsizing when cut
fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max {
        s.to_string()
    } else if max <= 1 {
        "…".to_string()
    } else {
        let mut out: String = chars[..max - 1].iter().collect();
        out.push('…');
        out
    }
}

/// Pad a string to `width` chars (char count, not bytes)
fn pad_to(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}

/// Resolve organization names for a batch of leads
fn organization_names(conn: &Connection, leads: &[Lead]) -> Result<HashMap<i64, String>> {
    let mut names = HashMap::new();
    for lead in leads {
        if let Some(org_id) = lead.organization_id {
            if !names.contains_key(&org_id) {
                if let Some(org) = OrganizationRepo::get_by_id(conn, org_id)? {
                    names.insert(org_id, org.name);
                }
            }
        }
    }
    Ok(names)
}

fn org_display(lead: &Lead, names: &HashMap<i64, String>) -> String {
    match lead.organization_id {
        Some(org_id) => names
            .get(&org_id)
            .cloned()
            .unwrap_or_else(|| format!("[{}]", org_id)),
        None => String::new(),
    }
}

pub struct LeadListOptions {
    pub use_relative_time: bool,
    pub color: bool,
}

/// Format leads as a table in store order
pub fn format_lead_list_table(
    conn: &Connection,
    leads: &[Lead],
    options: &LeadListOptions,
) -> Result<String> {
    if leads.is_empty() {
        return Ok("No leads found.".to_string());
    }

    let org_names = organization_names(conn, leads)?;

    struct Row {
        id: String,
        name: String,
        org: String,
        role: String,
        stage: Stage,
        source: String,
        created: String,
    }

    let rows: Vec<Row> = leads
        .iter()
        .map(|lead| Row {
            id: lead.id.map(|id| id.to_string()).unwrap_or_default(),
            name: truncate_with_ellipsis(&lead.name, 28),
            org: truncate_with_ellipsis(&org_display(lead, &org_names), 26),
            role: truncate_with_ellipsis(&lead.role, 18),
            stage: lead.stage,
            source: truncate_with_ellipsis(lead.source.as_deref().unwrap_or(""), 12),
            created: if options.use_relative_time {
                format_relative_date(lead.created_ts)
            } else {
                format_date(lead.created_ts)
            },
        })
        .collect();

    let headers = ["ID", "Name", "Organization", "Role", "Stage", "Source", "Created"];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        let cells = [
            row.id.as_str(),
            row.name.as_str(),
            row.org.as_str(),
            row.role.as_str(),
            row.stage.as_str(),
            row.source.as_str(),
            row.created.as_str(),
        ];
        for (i, cell) in cells.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad_to(h, widths[i]))
        .collect();
    out.push_str(&paint(&header_line.join("  "), ANSI_BOLD, options.color));
    out.push('\n');

    for row in &rows {
        let stage_cell = pad_to(row.stage.as_str(), widths[4]);
        let stage_cell = paint(&stage_cell, stage_color(row.stage), options.color);
        let line = [
            pad_to(&row.id, widths[0]),
            pad_to(&row.name, widths[1]),
            pad_to(&row.org, widths[2]),
            pad_to(&row.role, widths[3]),
            stage_cell,
            pad_to(&row.source, widths[5]),
            pad_to(&row.created, widths[6]),
        ]
        .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }

    Ok(out)
}

pub struct BoardOptions {
    pub color: bool,
    /// Fixed board width; falls back to the detected terminal width
    pub width: Option<usize>,
}

/// Render the pipeline board: one column per stage, cards in store order
pub fn format_board(
    store: &LeadStore,
    visible: &HashSet<i64>,
    stages: &[Stage],
    options: &BoardOptions,
) -> String {
    let total_width = options.width.unwrap_or_else(|| {
        terminal_size::terminal_size()
            .map(|(terminal_size::Width(w), _)| w as usize)
            .unwrap_or(100)
    });
    let gap = 2;
    let ncols = stages.len().max(1);
    let col_width = ((total_width.saturating_sub(gap * (ncols - 1))) / ncols).clamp(14, 32);

    let columns: Vec<Vec<&Lead>> = stages
        .iter()
        .map(|&stage| {
            store.column_for(stage, |l| l.id.map(|id| visible.contains(&id)).unwrap_or(false))
        })
        .collect();

    let mut out = String::new();

    // Headers: "NEW (2)" per column
    let header_cells: Vec<String> = stages
        .iter()
        .zip(&columns)
        .map(|(&stage, col)| {
            let text = format!("{} ({})", stage.label().to_uppercase(), col.len());
            let padded = pad_to(&truncate_with_ellipsis(&text, col_width), col_width);
            if options.color {
                format!("{}{}{}{}", ANSI_BOLD, stage_color(stage), padded, ANSI_RESET)
            } else {
                padded
            }
        })
        .collect();
    out.push_str(header_cells.join(&" ".repeat(gap)).trim_end());
    out.push('\n');

    let separator: Vec<String> = (0..ncols).map(|_| "-".repeat(col_width)).collect();
    out.push_str(&separator.join(&" ".repeat(gap)));
    out.push('\n');

    let depth = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    for row in 0..depth {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| match col.get(row) {
                Some(lead) => {
                    let card = format!("#{} {}", lead.id.unwrap_or(0), lead.name);
                    pad_to(&truncate_with_ellipsis(&card, col_width), col_width)
                }
                None => " ".repeat(col_width),
            })
            .collect();
        out.push_str(cells.join(&" ".repeat(gap)).trim_end());
        out.push('\n');
    }

    if depth == 0 {
        out.push_str("No leads on the board.\n");
    }

    out
}

/// Human description of an activity log entry
fn describe_event(conn: &Connection, event: &LeadEvent) -> String {
    let detail = event.detail.as_ref();
    match event.kind {
        LeadEventKind::Created => {
            let stage = detail
                .and_then(|d| d["stage"].as_str())
                .unwrap_or("new");
            format!("created in {}", stage)
        }
        LeadEventKind::StageChanged => {
            let from = detail.and_then(|d| d["from"].as_str()).unwrap_or("?");
            let to = detail.and_then(|d| d["to"].as_str()).unwrap_or("?");
            format!("moved from {} to {}", from, to)
        }
        LeadEventKind::NoteAdded => "note added".to_string(),
        LeadEventKind::Enrolled => {
            let course = detail
                .and_then(|d| d["course_id"].as_i64())
                .and_then(|id| CourseRepo::get_by_id(conn, id).ok().flatten())
                .map(|c| c.title)
                .unwrap_or_else(|| "course".to_string());
            format!("enrolled in {}", course)
        }
    }
}

/// Format the detail view of one lead
pub fn format_lead_summary(
    conn: &Connection,
    lead: &Lead,
    notes: &[Note],
    events: &[LeadEvent],
    color: bool,
) -> Result<String> {
    let org_names = organization_names(conn, std::slice::from_ref(lead))?;

    let mut out = String::new();
    let title = format!("Lead #{}: {}", lead.id.unwrap_or(0), lead.name);
    let badge = paint(
        &format!("[{}]", lead.stage.as_str()),
        stage_color(lead.stage),
        color,
    );
    out.push_str(&format!("{}  {}\n", paint(&title, ANSI_BOLD, color), badge));

    out.push_str(&format!("  Email:        {}\n", lead.email));
    out.push_str(&format!("  Phone:        {}\n", lead.phone));
    let org = org_display(lead, &org_names);
    if !org.is_empty() {
        out.push_str(&format!("  Organization: {}\n", org));
    }
    out.push_str(&format!("  Role:         {}\n", lead.role));
    if let Some(source) = &lead.source {
        out.push_str(&format!("  Source:       {}\n", source));
    }
    out.push_str(&format!(
        "  Created:      {} ({})\n",
        format_date(lead.created_ts),
        format_relative_date(lead.created_ts)
    ));

    if !notes.is_empty() {
        out.push_str("\nNotes:\n");
        for note in notes {
            out.push_str(&format!(
                "  [{}] {}  {}\n",
                note.id.unwrap_or(0),
                format_date(note.entry_ts),
                note.note
            ));
        }
    }

    if !events.is_empty() {
        out.push_str("\nActivity:\n");
        for event in events {
            let when = pad_to(&format_relative_time(event.created_ts), 8);
            let when = paint(&when, ANSI_FG_BRIGHT_BLACK, color);
            out.push_str(&format!("  {}  {}\n", when, describe_event(conn, event)));
        }
    }

    Ok(out)
}

/// Serialize leads to JSON with the organization resolved to its name
pub fn leads_to_json(conn: &Connection, leads: &[Lead]) -> Result<String> {
    let org_names = organization_names(conn, leads)?;
    let items: Vec<serde_json::Value> = leads
        .iter()
        .map(|lead| {
            serde_json::json!({
                "id": lead.id,
                "uuid": lead.uuid,
                "name": lead.name,
                "email": lead.email,
                "phone": lead.phone,
                "organization": lead.organization_id.and_then(|id| org_names.get(&id).cloned()),
                "role": lead.role,
                "source": lead.source,
                "stage": lead.stage.as_str(),
                "created_ts": lead.created_ts,
                "modified_ts": lead.modified_ts,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&items)?)
}

/// Format organizations as a table with lead counts
pub fn format_org_list_table(conn: &Connection, orgs: &[Organization]) -> Result<String> {
    if orgs.is_empty() {
        return Ok("No organizations found.".to_string());
    }

    let mut out = String::new();
    let name_width = orgs
        .iter()
        .map(|o| o.name.chars().count())
        .max()
        .unwrap_or(4)
        .max("Name".len());
    let city_width = orgs
        .iter()
        .map(|o| o.city.as_deref().unwrap_or("").chars().count())
        .max()
        .unwrap_or(4)
        .max("City".len());

    out.push_str(&format!(
        "{}  {}  {}\n",
        pad_to("Name", name_width),
        pad_to("City", city_width),
        "Leads"
    ));
    for org in orgs {
        let leads = OrganizationRepo::lead_count(conn, org.id.unwrap_or(0))?;
        let archived = if org.is_archived { " (archived)" } else { "" };
        let line = format!(
            "{}  {}  {}{}",
            pad_to(&org.name, name_width),
            pad_to(org.city.as_deref().unwrap_or(""), city_width),
            leads,
            archived
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    Ok(out)
}

/// Format courses as a table with enrollment counts
pub fn format_course_list_table(conn: &Connection, courses: &[Course]) -> Result<String> {
    if courses.is_empty() {
        return Ok("No courses found.".to_string());
    }

    let name_width = courses
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(4)
        .max("Name".len());

    let mut out = String::new();
    out.push_str(&format!("{}  {}  {}\n", pad_to("Name", name_width), pad_to("Enrolled", 8), "Title"));
    for course in courses {
        let enrolled = crate::repo::EnrollmentRepo::list_by_course(conn, course.id.unwrap_or(0))?.len();
        let archived = if course.is_archived { " (archived)" } else { "" };
        out.push_str(&format!(
            "{}  {}  {}{}\n",
            pad_to(&course.name, name_width),
            pad_to(&enrolled.to_string(), 8),
            course.title,
            archived
        ));
    }
    Ok(out)
}

/// Format enrollments with lead and course names resolved
pub fn format_enrollments_table(conn: &Connection, enrollments: &[Enrollment]) -> Result<String> {
    if enrollments.is_empty() {
        return Ok("No enrollments found.".to_string());
    }

    let mut out = String::new();
    out.push_str("Lead                          Course                Enrolled\n");
    for enrollment in enrollments {
        let lead = LeadRepo::get_by_id(conn, enrollment.lead_id)?
            .map(|l| format!("#{} {}", l.id.unwrap_or(0), l.name))
            .unwrap_or_else(|| format!("#{}", enrollment.lead_id));
        let course = CourseRepo::get_by_id(conn, enrollment.course_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| format!("[{}]", enrollment.course_id));
        out.push_str(&format!(
            "{}  {}  {}\n",
            pad_to(&truncate_with_ellipsis(&lead, 28), 28),
            pad_to(&truncate_with_ellipsis(&course, 20), 20),
            format_relative_date(enrollment.enrolled_ts)
        ));
    }
    Ok(out)
}
