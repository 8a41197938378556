// CLI parsing utilities for lead commands

use crate::utils::fuzzy::levenshtein_distance;

/// Parsed lead arguments from command line
#[derive(Debug, Default)]
pub struct ParsedLeadArgs {
    pub name: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub org: Option<String>,
    pub role: Option<String>,
    pub source: Option<String>,
    pub stage: Option<String>,
}

/// Field name parse error
#[derive(Debug)]
pub enum FieldParseError {
    InvalidFieldName {
        field: String,
        suggestion: String,
    },
    ReadOnlyField {
        field: String,
        hint: String,
    },
    UnknownFieldToken {
        token: String,
    },
}

impl std::fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldParseError::InvalidFieldName { field, suggestion } => {
                write!(f, "Unrecognized field name '{}'\n  Did you mean '{}'?", field, suggestion)
            }
            FieldParseError::ReadOnlyField { field, hint } => {
                write!(f, "Field '{}' cannot be modified directly.\n  {}", field, hint)
            }
            FieldParseError::UnknownFieldToken { token } => {
                write!(f, "Unrecognized field token '{}'\n  If this is meant to be part of the name, remove the equals sign or quote the entire name.", token)
            }
        }
    }
}

/// Valid field names (exact match only, no abbreviations)
const FIELD_NAMES: &[&str] = &[
    "email",
    "phone",
    "org",
    "role",
    "source",
    "stage",
];

/// Fields that cannot be set through add/modify arguments.
/// These exist to give helpful error messages when users try.
const READ_ONLY_FIELDS: &[&str] = &[
    "id",
    "uuid",
    "created",
    "modified",
];

/// Find the most similar field name using fuzzy matching
fn find_similar_field_name(field: &str) -> Option<String> {
    let mut best_match: Option<(&str, usize)> = None;

    for name in FIELD_NAMES {
        let distance = levenshtein_distance(&field.to_lowercase(), name);
        if distance <= 2 {
            match best_match {
                None => best_match = Some((name, distance)),
                Some((_, best_dist)) if distance < best_dist => {
                    best_match = Some((name, distance));
                }
                _ => {}
            }
        }
    }

    best_match.map(|(name, _)| name.to_string())
}

/// Get hint for read-only field
fn get_read_only_hint(field: &str) -> String {
    match field.to_lowercase().as_str() {
        "id" => "Lead ID is assigned automatically and cannot be changed.".to_string(),
        "uuid" => "Lead UUID is assigned automatically and cannot be changed.".to_string(),
        "created" => "Created timestamp is set automatically and cannot be changed.".to_string(),
        "modified" => "Modified timestamp is updated automatically.".to_string(),
        _ => "This field is read-only.".to_string(),
    }
}

/// Parse a field token (field=value)
/// Handles empty values (field=) by converting to field=none
fn parse_field_token(token: &str) -> Result<Option<(String, String)>, FieldParseError> {
    if let Some(eq_pos) = token.find('=') {
        let field = token[..eq_pos].to_string();
        let value = token[eq_pos + 1..].to_string();

        let final_value = if value.is_empty() {
            "none".to_string()
        } else {
            value
        };

        // Check for read-only fields first
        if READ_ONLY_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(&field)) {
            return Err(FieldParseError::ReadOnlyField {
                field: field.clone(),
                hint: get_read_only_hint(&field),
            });
        }

        // Exact match only
        if FIELD_NAMES.contains(&field.as_str()) {
            return Ok(Some((field, final_value)));
        }

        // No exact match - try fuzzy matching for typo suggestions
        if let Some(suggestion) = find_similar_field_name(&field) {
            Err(FieldParseError::InvalidFieldName { field, suggestion })
        } else {
            Ok(None)
        }
    } else {
        Ok(None)
    }
}

/// Parse lead add/modify arguments
/// Name is the tokens that don't match field patterns or flags; field tokens
/// can appear anywhere in the argument list
pub fn parse_lead_args(args: Vec<String>) -> Result<ParsedLeadArgs, FieldParseError> {
    let mut parsed = ParsedLeadArgs::default();
    let mut name_parts = Vec::new();

    for arg in args {
        // Flags are handled by the command handler
        if arg.starts_with("--") || arg == "-y" {
            continue;
        }

        match parse_field_token(&arg)? {
            Some((field, value)) => match field.as_str() {
                "email" => parsed.email = Some(value),
                "phone" => parsed.phone = Some(value),
                "org" => parsed.org = Some(value),
                "role" => parsed.role = Some(value),
                "source" => parsed.source = Some(value),
                "stage" => parsed.stage = Some(value),
                _ => name_parts.push(arg),
            },
            None => {
                // Tokens with an '=' after an alphabetic word are almost
                // certainly misspelled fields, not name parts
                if let Some(eq_pos) = arg.find('=') {
                    let potential_field = &arg[..eq_pos];
                    if potential_field.len() >= 2
                        && potential_field.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
                    {
                        return Err(FieldParseError::UnknownFieldToken { token: arg });
                    }
                }
                name_parts.push(arg);
            }
        }
    }

    parsed.name = name_parts;
    Ok(parsed)
}

/// Join name parts into a single string
pub fn join_name(parts: &[String]) -> String {
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_name() {
        let parsed = parse_lead_args(args(&["Ana", "Souza"])).unwrap();
        assert_eq!(parsed.name, vec!["Ana", "Souza"]);
        assert!(parsed.email.is_none());
    }

    #[test]
    fn test_parse_with_fields() {
        let parsed = parse_lead_args(args(&[
            "Ana", "Souza",
            "email=ana@x.gov",
            "phone=(45)", // phone values with spaces must be quoted by the shell
            "org=Prefeitura",
            "role=Assessora",
        ])).unwrap();
        assert_eq!(parsed.name, vec!["Ana", "Souza"]);
        assert_eq!(parsed.email.as_deref(), Some("ana@x.gov"));
        assert_eq!(parsed.org.as_deref(), Some("Prefeitura"));
        assert_eq!(parsed.role.as_deref(), Some("Assessora"));
    }

    #[test]
    fn test_parse_mixed_order() {
        let parsed = parse_lead_args(args(&["email=ana@x.gov", "Ana", "stage=qualified"])).unwrap();
        assert_eq!(parsed.name, vec!["Ana"]);
        assert_eq!(parsed.stage.as_deref(), Some("qualified"));
    }

    #[test]
    fn test_field_empty_value_is_none_token() {
        let parsed = parse_lead_args(args(&["Ana", "source="])).unwrap();
        assert_eq!(parsed.source.as_deref(), Some("none"));
    }

    #[test]
    fn test_invalid_field_name_suggestion() {
        let result = parse_lead_args(args(&["Ana", "emial=ana@x.gov"]));
        match result {
            Err(FieldParseError::InvalidFieldName { field, suggestion }) => {
                assert_eq!(field, "emial");
                assert_eq!(suggestion, "email");
            }
            other => panic!("Expected InvalidFieldName error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_only_field() {
        let result = parse_lead_args(args(&["Ana", "id=7"]));
        assert!(matches!(result, Err(FieldParseError::ReadOnlyField { .. })));
    }

    #[test]
    fn test_unknown_field_token() {
        let result = parse_lead_args(args(&["Ana", "country=BR"]));
        assert!(matches!(result, Err(FieldParseError::UnknownFieldToken { .. })));
    }

    #[test]
    fn test_flags_are_skipped() {
        let parsed = parse_lead_args(args(&["--yes", "Ana"])).unwrap();
        assert_eq!(parsed.name, vec!["Ana"]);
    }
}
