// Command abbreviation expansion
//
// Top-level commands may be abbreviated to any unambiguous prefix, so
// `funil bo` runs the board and `funil st` the status dashboard. Exact
// command names always win, which is how `enroll` stays reachable despite
// being a prefix of `enrollments`.

/// Top-level commands eligible for abbreviation
const COMMANDS: &[&str] = &[
    "add",
    "list",
    "board",
    "show",
    "move",
    "modify",
    "note",
    "orgs",
    "courses",
    "enroll",
    "enrollments",
    "status",
];

/// Expand an abbreviated first argument to its full command name.
/// Unknown words pass through unchanged so clap can report them.
pub fn expand_command_abbreviations(mut args: Vec<String>) -> Result<Vec<String>, String> {
    let Some(first) = args.first() else {
        return Ok(args);
    };
    let first_lower = first.to_lowercase();

    // Exact matches, flags, and numeric ids (implicit show) pass through
    if COMMANDS.contains(&first_lower.as_str())
        || first_lower.starts_with('-')
        || first_lower.parse::<i64>().is_ok()
    {
        return Ok(args);
    }

    let matches: Vec<&str> = COMMANDS
        .iter()
        .filter(|c| c.starts_with(&first_lower))
        .copied()
        .collect();

    match matches.len() {
        0 => Ok(args),
        1 => {
            args[0] = matches[0].to_string();
            Ok(args)
        }
        _ => Err(format!(
            "Ambiguous command '{}'. Matches: {}",
            first,
            matches.join(", ")
        )),
    }
}
