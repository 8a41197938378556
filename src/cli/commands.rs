use clap::{Parser, Subcommand};
use rusqlite::Connection;
use crate::board::{apply_move, LeadStore, MoveOutcome, MoveRequest};
use crate::config::Config;
use crate::db::DbConnection;
use crate::models::{LeadInput, Stage};
use crate::repo::{CourseRepo, EnrollmentRepo, EventRepo, LeadRepo, NoteRepo, OrganizationRepo};
use crate::cli::abbrev;
use crate::cli::error::{user_error, validate_lead_id, validate_non_empty, validate_note_id, validate_course_name};
use crate::cli::output::{
    color_enabled, format_board, format_course_list_table, format_enrollments_table,
    format_lead_list_table, format_lead_summary, format_org_list_table, leads_to_json,
    BoardOptions, LeadListOptions,
};
use crate::cli::parser::{join_name, parse_lead_args};
use crate::cli::status::{format_status, status_json};
use crate::filter::{filter_leads, parse_filter};
use crate::utils::fuzzy;
use std::collections::HashSet;
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "funil")]
#[command(about = "Funil - A command-line lead pipeline and CRM for consulting teams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new lead
    Add {
        /// Auto-confirm prompts (e.g., create new organizations)
        #[arg(short = 'y', long)]
        yes: bool,
        /// Lead name and fields (e.g., "Ana Souza email=ana@x.gov org=Prefeitura role=Assessora")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List leads
    List {
        /// Filter arguments (e.g., "stage=qualified org=prefeitura")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Show Created dates as relative age (e.g., "3d ago")
        #[arg(long)]
        relative: bool,
    },
    /// Show the pipeline board
    Board {
        /// Show a single stage column
        #[arg(long)]
        stage: Option<String>,
        /// Filter arguments applied to the cards (e.g., "org=prefeitura")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
    },
    /// Show detailed summary of a lead
    Show {
        /// Lead ID
        target: String,
    },
    /// Move a lead to another pipeline stage
    Move {
        /// Lead ID
        target: String,
        /// Destination stage (new, qualified, contacted, converted)
        stage: String,
    },
    /// Modify a lead's contact fields
    Modify {
        /// Lead ID
        target: String,
        /// Modification arguments (name, fields)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        /// Auto-confirm prompts (e.g., create new organizations)
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Add or delete a note on a lead
    Note {
        /// Lead ID
        target: String,
        /// Note text
        #[arg(trailing_var_arg = true)]
        note: Vec<String>,
        /// Delete note by ID
        #[arg(long)]
        delete: Option<String>,
    },
    /// Organization management commands
    Orgs {
        #[command(subcommand)]
        subcommand: OrgCommands,
    },
    /// Course catalog commands
    Courses {
        #[command(subcommand)]
        subcommand: CourseCommands,
    },
    /// Enroll a lead in a course
    Enroll {
        /// Lead ID
        target: String,
        /// Course name
        course: String,
    },
    /// List enrollments
    Enrollments {
        /// Restrict to one course
        course: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show dashboard with pipeline status
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum OrgCommands {
    /// Create a new organization
    Add {
        /// Organization name
        name: String,
        /// City
        #[arg(long)]
        city: Option<String>,
    },
    /// List organizations
    List {
        /// Include archived organizations
        #[arg(long)]
        archived: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Rename an organization
    Rename {
        /// Current name
        old_name: String,
        /// New name
        new_name: String,
    },
    /// Merge one organization into another (repoints its leads)
    Merge {
        /// Organization to merge away
        from: String,
        /// Organization to keep
        into: String,
    },
    /// Archive an organization
    Archive {
        name: String,
    },
    /// Unarchive an organization
    Unarchive {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum CourseCommands {
    /// Create a new course
    Add {
        /// Course name (short handle, e.g. licitacoes)
        name: String,
        /// Course title
        #[arg(trailing_var_arg = true)]
        title: Vec<String>,
    },
    /// List courses
    List {
        /// Include archived courses
        #[arg(long)]
        archived: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Archive a course
    Archive {
        name: String,
    },
}

pub fn run() -> Result<()> {
    let _ = env_logger::try_init();
    // No-op outside Windows; enables ANSI escape processing on cmd/PowerShell
    let _ = enable_ansi_support::enable_ansi_support();

    // Get raw args
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // Check for version flag early (before any processing)
    if args.iter().any(|a| a == "--version" || a == "-V") {
        let cli = Cli::try_parse_from(std::env::args());
        match cli {
            Ok(_) => return Ok(()), // Version was printed by clap
            Err(_e) => {
                println!("funil {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
        }
    }

    // Expand command abbreviations before processing
    args = match abbrev::expand_command_abbreviations(args) {
        Ok(expanded) => expanded,
        Err(e) => {
            user_error(&e);
        }
    };

    // Implicit default: `funil 3` means `funil show 3`
    if args.len() == 1 && validate_lead_id(&args[0]).is_ok() {
        args.insert(0, "show".to_string());
    }

    // Check for help requests or empty args (before clap parsing)
    let is_help_request = args.is_empty()
        || args.iter().any(|a| a == "--help" || a == "-h" || a == "help");

    if is_help_request {
        match Cli::try_parse() {
            Ok(_) => return Ok(()),
            Err(e) => {
                e.print()?;
                return Ok(());
            }
        }
    }

    // Use clap parsing with expanded args
    let clap_args = std::iter::once("funil".to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>();
    let cli = match Cli::try_parse_from(clap_args) {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(());
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Add { yes, args } => handle_lead_add(args, yes),
        Commands::List { filter, json, relative } => handle_lead_list(filter, json, relative),
        Commands::Board { stage, filter } => handle_board(stage, filter),
        Commands::Show { target } => handle_lead_show(target),
        Commands::Move { target, stage } => handle_lead_move(target, stage),
        Commands::Modify { target, args, yes } => handle_lead_modify(target, args, yes),
        Commands::Note { target, note, delete } => {
            if let Some(note_id) = delete {
                handle_note_delete(target, note_id)
            } else {
                handle_note_add(target, note)
            }
        }
        Commands::Orgs { subcommand } => handle_orgs(subcommand),
        Commands::Courses { subcommand } => handle_courses(subcommand),
        Commands::Enroll { target, course } => handle_enroll(target, course),
        Commands::Enrollments { course, json } => handle_enrollments(course, json),
        Commands::Status { json } => handle_status(json),
    }
}

fn load_config() -> Config {
    Config::load(&DbConnection::config_path())
}

/// Prompt user to create a new organization
/// Returns: Some(true) to create, Some(false) if declined, None if cancelled
fn prompt_create_organization(org_name: &str) -> Result<Option<bool>> {
    eprint!(
        "This is a new organization '{}'. Add new organization? [y/n/c] (default: y): ",
        org_name
    );
    std::io::Write::flush(&mut std::io::stderr())
        .map_err(|e| anyhow::anyhow!("Failed to flush stderr: {}", e))?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;

    let input = input.trim().to_lowercase();
    match input.as_str() {
        "y" | "yes" | "" => Ok(Some(true)),
        "n" | "no" => Ok(Some(false)),
        "c" | "cancel" => Ok(None),
        _ => {
            println!("Invalid response. Cancelled.");
            Ok(None)
        }
    }
}

/// Resolve an organization name to its id, offering to create unknown ones.
/// Returns None when the user declines or cancels.
fn resolve_organization(conn: &Connection, name: &str, auto_yes: bool) -> Result<Option<i64>> {
    if let Some(org) = OrganizationRepo::get_by_name(conn, name)? {
        return Ok(org.id);
    }

    // Suggest near matches before offering to create
    let names: Vec<String> = OrganizationRepo::list(conn, true)?
        .into_iter()
        .map(|o| o.name)
        .collect();
    let matches = fuzzy::find_near_org_matches(name, &names, 3);
    if !matches.is_empty() {
        let suggestions: Vec<String> = matches.iter().map(|(n, _)| format!("'{}'", n)).collect();
        eprintln!("Organization '{}' not found. Did you mean {}?", name, suggestions.join(", "));
    }

    let create = if auto_yes {
        Some(true)
    } else {
        prompt_create_organization(name)?
    };

    match create {
        Some(true) => {
            let org = OrganizationRepo::create(conn, name, None)?;
            println!("Created organization '{}'", org.name);
            Ok(org.id)
        }
        _ => Ok(None),
    }
}

fn handle_lead_add(args: Vec<String>, auto_yes: bool) -> Result<()> {
    let parsed = match parse_lead_args(args) {
        Ok(parsed) => parsed,
        Err(e) => user_error(&e.to_string()),
    };

    let name = join_name(&parsed.name);
    if let Err(e) = validate_non_empty(&name, "Lead name") {
        user_error(&e);
    }

    // All contact fields are required on creation
    let mut missing = Vec::new();
    if parsed.email.is_none() {
        missing.push("email");
    }
    if parsed.phone.is_none() {
        missing.push("phone");
    }
    if parsed.org.is_none() {
        missing.push("org");
    }
    if parsed.role.is_none() {
        missing.push("role");
    }
    if !missing.is_empty() {
        user_error(&format!(
            "Missing required field(s): {}. Provide them as field=value.",
            missing.join(", ")
        ));
    }

    let target_stage = match parsed.stage.as_deref() {
        Some(s) => match Stage::from_str(s) {
            Some(stage) => Some(stage),
            None => user_error(&format!(
                "Invalid stage '{}'. Valid stages: new, qualified, contacted, converted.",
                s
            )),
        },
        None => None,
    };

    let conn = DbConnection::connect().context("Failed to connect to database")?;

    let org_name = parsed.org.unwrap();
    let Some(org_id) = resolve_organization(&conn, &org_name, auto_yes)? else {
        println!("Cancelled.");
        return Ok(());
    };

    let input = LeadInput {
        name,
        email: parsed.email.unwrap(),
        phone: parsed.phone.unwrap(),
        organization_id: Some(org_id),
        role: parsed.role.unwrap(),
        source: parsed.source.filter(|s| s != "none"),
    };

    let stage = target_stage.unwrap_or(Stage::New);
    let lead = LeadRepo::create(&conn, &input, stage)?;
    println!(
        "Created lead {}: {} ({})",
        lead.id.unwrap_or(0),
        lead.name,
        lead.stage.as_str()
    );
    Ok(())
}

fn handle_lead_list(filter_args: Vec<String>, json: bool, relative: bool) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;

    let expr = match parse_filter(&filter_args) {
        Ok(expr) => expr,
        Err(e) => user_error(&e.to_string()),
    };
    let leads = filter_leads(&conn, &expr)?;

    if json {
        println!("{}", leads_to_json(&conn, &leads)?);
    } else {
        let config = load_config();
        let options = LeadListOptions {
            use_relative_time: relative,
            color: color_enabled(config.color),
        };
        print!("{}", format_lead_list_table(&conn, &leads, &options)?);
    }
    Ok(())
}

fn handle_board(stage_arg: Option<String>, filter_args: Vec<String>) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;
    let config = load_config();

    let stages: Vec<Stage> = match stage_arg.as_deref() {
        Some(s) => match Stage::from_str(s) {
            Some(stage) => vec![stage],
            None => user_error(&format!(
                "Invalid stage '{}'. Valid stages: new, qualified, contacted, converted.",
                s
            )),
        },
        None => Stage::ALL.to_vec(),
    };

    let expr = match parse_filter(&filter_args) {
        Ok(expr) => expr,
        Err(e) => user_error(&e.to_string()),
    };

    let store = LeadStore::from_leads(LeadRepo::list_all(&conn)?);
    let mut visible: HashSet<i64> = HashSet::new();
    for lead in store.list() {
        if expr.matches(lead, &conn)? {
            if let Some(id) = lead.id {
                visible.insert(id);
            }
        }
    }

    let options = BoardOptions {
        color: color_enabled(config.color),
        width: config.board_width,
    };
    print!("{}", format_board(&store, &visible, &stages, &options));
    Ok(())
}

fn handle_lead_show(target: String) -> Result<()> {
    let lead_id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let conn = DbConnection::connect().context("Failed to connect to database")?;
    let Some(lead) = LeadRepo::get_by_id(&conn, lead_id)? else {
        user_error(&format!("Lead {} not found", lead_id));
    };

    let notes = NoteRepo::get_by_lead(&conn, lead_id)?;
    let events = EventRepo::get_by_lead(&conn, lead_id)?;
    let config = load_config();
    print!(
        "{}",
        format_lead_summary(&conn, &lead, &notes, &events, color_enabled(config.color))?
    );
    Ok(())
}

fn handle_lead_move(target: String, stage_str: String) -> Result<()> {
    let lead_id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };
    let Some(destination) = Stage::from_str(&stage_str) else {
        user_error(&format!(
            "Invalid stage '{}'. Valid stages: new, qualified, contacted, converted.",
            stage_str
        ));
    };

    let conn = DbConnection::connect().context("Failed to connect to database")?;
    let mut store = LeadStore::from_leads(LeadRepo::list_all(&conn)?);
    let lead_name = store.get(lead_id).map(|l| l.name.clone());

    match apply_move(&mut store, MoveRequest { lead_id, destination }) {
        MoveOutcome::UnknownLead => {
            user_error(&format!("Lead {} not found", lead_id));
        }
        MoveOutcome::NoChange { stage } => {
            println!("Lead {} is already in {}; nothing to do.", lead_id, stage.as_str());
        }
        MoveOutcome::Moved { from, to } => {
            LeadRepo::set_stage(&conn, lead_id, from, to)?;
            println!(
                "Moved lead {} '{}' from {} to {}",
                lead_id,
                lead_name.unwrap_or_default(),
                from.as_str(),
                to.as_str()
            );
        }
    }
    Ok(())
}

fn handle_lead_modify(target: String, args: Vec<String>, auto_yes: bool) -> Result<()> {
    let lead_id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let parsed = match parse_lead_args(args) {
        Ok(parsed) => parsed,
        Err(e) => user_error(&e.to_string()),
    };

    if parsed.stage.is_some() {
        user_error(
            "Field 'stage' cannot be modified directly.\n  Use 'funil move <id> <stage>' to change a lead's stage.",
        );
    }

    let conn = DbConnection::connect().context("Failed to connect to database")?;
    let Some(mut lead) = LeadRepo::get_by_id(&conn, lead_id)? else {
        user_error(&format!("Lead {} not found", lead_id));
    };

    let mut changed = false;
    if !parsed.name.is_empty() {
        lead.name = join_name(&parsed.name);
        changed = true;
    }
    if let Some(email) = parsed.email {
        lead.email = email;
        changed = true;
    }
    if let Some(phone) = parsed.phone {
        lead.phone = phone;
        changed = true;
    }
    if let Some(role) = parsed.role {
        lead.role = role;
        changed = true;
    }
    if let Some(source) = parsed.source {
        lead.source = if source == "none" { None } else { Some(source) };
        changed = true;
    }
    if let Some(org_name) = parsed.org {
        let Some(org_id) = resolve_organization(&conn, &org_name, auto_yes)? else {
            println!("Cancelled.");
            return Ok(());
        };
        lead.organization_id = Some(org_id);
        changed = true;
    }

    if !changed {
        user_error("No modifications specified");
    }

    LeadRepo::update(&conn, &lead)?;
    println!("Modified lead {}: {}", lead_id, lead.name);
    Ok(())
}

fn handle_note_add(target: String, note_args: Vec<String>) -> Result<()> {
    let lead_id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };
    let note_text = note_args.join(" ");
    if let Err(e) = validate_non_empty(&note_text, "Note text") {
        user_error(&e);
    }

    let conn = DbConnection::connect().context("Failed to connect to database")?;
    if LeadRepo::get_by_id(&conn, lead_id)?.is_none() {
        user_error(&format!("Lead {} not found", lead_id));
    }

    let note = NoteRepo::create(&conn, lead_id, note_text)?;
    println!("Added note {} to lead {}", note.id.unwrap_or(0), lead_id);
    Ok(())
}

fn handle_note_delete(target: String, note_id_str: String) -> Result<()> {
    let lead_id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };
    let note_id = match validate_note_id(&note_id_str) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let conn = DbConnection::connect().context("Failed to connect to database")?;
    if let Err(e) = NoteRepo::delete_for_lead(&conn, lead_id, note_id) {
        user_error(&e.to_string());
    }
    println!("Deleted note {} from lead {}", note_id, lead_id);
    Ok(())
}

fn handle_orgs(cmd: OrgCommands) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;

    match cmd {
        OrgCommands::Add { name, city } => {
            if let Err(e) = validate_non_empty(&name, "Organization name") {
                user_error(&e);
            }
            if OrganizationRepo::get_by_name(&conn, &name)?.is_some() {
                user_error(&format!("Organization '{}' already exists", name));
            }
            let org = OrganizationRepo::create(&conn, &name, city.as_deref())?;
            println!("Created organization '{}'", org.name);
        }
        OrgCommands::List { archived, json } => {
            let orgs = OrganizationRepo::list(&conn, archived)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&orgs)?);
            } else {
                print!("{}", format_org_list_table(&conn, &orgs)?);
            }
        }
        OrgCommands::Rename { old_name, new_name } => {
            if let Err(e) = validate_non_empty(&new_name, "Organization name") {
                user_error(&e);
            }
            if let Err(e) = OrganizationRepo::rename(&conn, &old_name, &new_name) {
                user_error(&e.to_string());
            }
            println!("Renamed organization '{}' to '{}'", old_name, new_name);
        }
        OrgCommands::Merge { from, into } => {
            match OrganizationRepo::merge(&conn, &from, &into) {
                Ok(moved) => println!(
                    "Merged '{}' into '{}' ({} lead(s) repointed)",
                    from, into, moved
                ),
                Err(e) => user_error(&e.to_string()),
            }
        }
        OrgCommands::Archive { name } => {
            if let Err(e) = OrganizationRepo::archive(&conn, &name) {
                user_error(&e.to_string());
            }
            println!("Archived organization '{}'", name);
        }
        OrgCommands::Unarchive { name } => {
            if let Err(e) = OrganizationRepo::unarchive(&conn, &name) {
                user_error(&e.to_string());
            }
            println!("Unarchived organization '{}'", name);
        }
    }
    Ok(())
}

fn handle_courses(cmd: CourseCommands) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;

    match cmd {
        CourseCommands::Add { name, title } => {
            if let Err(e) = validate_course_name(&name) {
                user_error(&e);
            }
            let title = if title.is_empty() {
                name.clone()
            } else {
                title.join(" ")
            };
            if CourseRepo::get_by_name(&conn, &name)?.is_some() {
                user_error(&format!("Course '{}' already exists", name));
            }
            let course = CourseRepo::create(&conn, &name, &title)?;
            println!("Created course '{}': {}", course.name, course.title);
        }
        CourseCommands::List { archived, json } => {
            let courses = CourseRepo::list(&conn, archived)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&courses)?);
            } else {
                print!("{}", format_course_list_table(&conn, &courses)?);
            }
        }
        CourseCommands::Archive { name } => {
            if let Err(e) = CourseRepo::archive(&conn, &name) {
                user_error(&e.to_string());
            }
            println!("Archived course '{}'", name);
        }
    }
    Ok(())
}

fn handle_enroll(target: String, course_name: String) -> Result<()> {
    let lead_id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let conn = DbConnection::connect().context("Failed to connect to database")?;
    let Some(lead) = LeadRepo::get_by_id(&conn, lead_id)? else {
        user_error(&format!("Lead {} not found", lead_id));
    };
    let Some(course) = CourseRepo::get_by_name(&conn, &course_name)? else {
        user_error(&format!(
            "Course '{}' not found. To add: funil courses add {}",
            course_name, course_name
        ));
    };

    match EnrollmentRepo::enroll(&conn, lead_id, course.id.unwrap()) {
        Ok(_) => println!("Enrolled lead {} '{}' in '{}'", lead_id, lead.name, course.name),
        Err(e) => user_error(&e.to_string()),
    }
    Ok(())
}

fn handle_enrollments(course_name: Option<String>, json: bool) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;

    let enrollments = match course_name {
        Some(name) => {
            let Some(course) = CourseRepo::get_by_name(&conn, &name)? else {
                user_error(&format!("Course '{}' not found", name));
            };
            EnrollmentRepo::list_by_course(&conn, course.id.unwrap())?
        }
        None => EnrollmentRepo::list_all(&conn)?,
    };

    if json {
        let items: Vec<serde_json::Value> = enrollments
            .iter()
            .map(|e| {
                let lead = LeadRepo::get_by_id(&conn, e.lead_id).ok().flatten();
                let course = CourseRepo::get_by_id(&conn, e.course_id).ok().flatten();
                serde_json::json!({
                    "lead_id": e.lead_id,
                    "lead": lead.map(|l| l.name),
                    "course": course.map(|c| c.name),
                    "enrolled_ts": e.enrolled_ts,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        print!("{}", format_enrollments_table(&conn, &enrollments)?);
    }
    Ok(())
}

fn handle_status(json: bool) -> Result<()> {
    let conn = DbConnection::connect().context("Failed to connect to database")?;
    if json {
        println!("{}", status_json(&conn)?);
    } else {
        print!("{}", format_status(&conn)?);
    }
    Ok(())
}
