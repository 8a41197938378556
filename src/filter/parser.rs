//! Filter parser for lead queries
//!
//! Implements boolean expression parsing with AND/OR/NOT operators.
//!
//! # Grammar
//!
//! ```text
//! filter := group | filter "or" group
//! group := term | group term        (implicit AND)
//! term := "not" term | id | stage=<stage> | org=<name> | source=<tag>
//!       | role=<text> | created<op><date-expr> | <pattern>
//! ```
//!
//! # Precedence
//!
//! 1. `not` (highest)
//! 2. Implicit `and` (between adjacent terms)
//! 3. `or` (lowest)
//!
//! # Examples
//!
//! ```text
//! // Implicit AND
//! stage=qualified org=prefeitura
//!
//! // Explicit OR
//! stage=new or stage=qualified
//!
//! // NOT
//! not source=site
//!
//! // Comparison operators on dates
//! created>=7d created<today
//!
//! // Bare words match name, email, and organization
//! ana
//! ```

use crate::filter::evaluator::FilterExpr;
use crate::models::Stage;
use crate::utils::parse_date_expr;

/// Comparison operators for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,    // =
    Neq,   // !=
    Gt,    // >
    Lt,    // <
    Gte,   // >=
    Lte,   // <=
}

/// A single filter term
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    /// Match by lead id
    Id(i64),
    /// Match by pipeline stage
    Stage(Stage),
    /// Match by organization name (case-insensitive prefix)
    Org(String),
    /// Match by source tag (case-insensitive equality)
    Source(String),
    /// Match by role (case-insensitive substring)
    Role(String),
    /// Match by creation date
    Created { op: ComparisonOp, expr: String },
    /// Bare word: case-insensitive substring on name, email, organization
    Pattern(String),
}

/// Filter parse failure
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FilterParseError {
    #[error("Invalid stage '{0}'. Valid stages: new, qualified, contacted, converted.")]
    InvalidStage(String),
    #[error("Unknown filter field '{0}'. Valid fields: stage, org, source, role, created.")]
    UnknownField(String),
    #[error("Field '{field}' does not support the '{op}' operator.")]
    UnsupportedOperator { field: String, op: String },
    #[error("Invalid date expression '{0}'. Use today, yesterday, YYYY-MM-DD, or <N>d.")]
    InvalidDate(String),
    #[error("Dangling '{0}' at end of filter.")]
    Dangling(String),
}

/// Parse filter tokens into a FilterExpr
///
/// An empty token list matches everything.
pub fn parse_filter(tokens: &[String]) -> Result<FilterExpr, FilterParseError> {
    if tokens.is_empty() {
        return Ok(FilterExpr::All);
    }

    let mut or_groups: Vec<Vec<FilterExpr>> = vec![Vec::new()];
    let mut negate_next = false;

    for token in tokens {
        if token.eq_ignore_ascii_case("or") {
            if or_groups.last().map(|g| g.is_empty()).unwrap_or(true) {
                return Err(FilterParseError::Dangling("or".to_string()));
            }
            or_groups.push(Vec::new());
            continue;
        }
        if token.eq_ignore_ascii_case("not") {
            negate_next = true;
            continue;
        }

        let mut expr = FilterExpr::Term(parse_term(token)?);
        if negate_next {
            expr = FilterExpr::Not(Box::new(expr));
            negate_next = false;
        }
        or_groups.last_mut().unwrap().push(expr);
    }

    if negate_next {
        return Err(FilterParseError::Dangling("not".to_string()));
    }
    if or_groups.last().map(|g| g.is_empty()).unwrap_or(true) {
        return Err(FilterParseError::Dangling("or".to_string()));
    }

    let mut alternatives: Vec<FilterExpr> = or_groups
        .into_iter()
        .map(|mut group| {
            if group.len() == 1 {
                group.pop().unwrap()
            } else {
                FilterExpr::And(group)
            }
        })
        .collect();

    if alternatives.len() == 1 {
        Ok(alternatives.pop().unwrap())
    } else {
        Ok(FilterExpr::Or(alternatives))
    }
}

/// Parse one token into a term
fn parse_term(token: &str) -> Result<FilterTerm, FilterParseError> {
    // Numeric token is a lead id
    if let Ok(id) = token.parse::<i64>() {
        if id > 0 {
            return Ok(FilterTerm::Id(id));
        }
    }

    if let Some((field, op, value)) = split_field_op(token) {
        let op_str = op_as_str(op);
        return match field.to_lowercase().as_str() {
            "stage" => {
                require_eq(&field, op, op_str)?;
                Stage::from_str(&value)
                    .map(FilterTerm::Stage)
                    .ok_or(FilterParseError::InvalidStage(value))
            }
            "org" => {
                require_eq(&field, op, op_str)?;
                Ok(FilterTerm::Org(value))
            }
            "source" => {
                require_eq(&field, op, op_str)?;
                Ok(FilterTerm::Source(value))
            }
            "role" => {
                require_eq(&field, op, op_str)?;
                Ok(FilterTerm::Role(value))
            }
            "created" => {
                // Validate the date expression up front so typos fail loudly
                parse_date_expr(&value).map_err(|_| FilterParseError::InvalidDate(value.clone()))?;
                Ok(FilterTerm::Created { op, expr: value })
            }
            _ => Err(FilterParseError::UnknownField(field)),
        };
    }

    Ok(FilterTerm::Pattern(token.to_string()))
}

fn require_eq(field: &str, op: ComparisonOp, op_str: &str) -> Result<(), FilterParseError> {
    if op == ComparisonOp::Eq {
        Ok(())
    } else {
        Err(FilterParseError::UnsupportedOperator {
            field: field.to_string(),
            op: op_str.to_string(),
        })
    }
}

fn op_as_str(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "=",
        ComparisonOp::Neq => "!=",
        ComparisonOp::Gt => ">",
        ComparisonOp::Lt => "<",
        ComparisonOp::Gte => ">=",
        ComparisonOp::Lte => "<=",
    }
}

/// Split `field<op>value` tokens. Returns None when the token has no
/// operator (a bare pattern) or no field name before it.
fn split_field_op(token: &str) -> Option<(String, ComparisonOp, String)> {
    // Longest operators first so ">=" is not read as ">"
    const OPS: &[(&str, ComparisonOp)] = &[
        ("!=", ComparisonOp::Neq),
        (">=", ComparisonOp::Gte),
        ("<=", ComparisonOp::Lte),
        ("=", ComparisonOp::Eq),
        (">", ComparisonOp::Gt),
        ("<", ComparisonOp::Lt),
    ];

    // Earliest operator wins; on ties the longer spelling wins
    let mut best: Option<(usize, &'static str, ComparisonOp)> = None;
    for (op_str, op) in OPS {
        if let Some(pos) = token.find(op_str) {
            let better = match best {
                None => true,
                Some((best_pos, best_str, _)) => {
                    pos < best_pos || (pos == best_pos && op_str.len() > best_str.len())
                }
            };
            if better {
                best = Some((pos, op_str, *op));
            }
        }
    }

    let (pos, op_str, op) = best?;
    if pos == 0 {
        return None;
    }
    let field = token[..pos].to_string();
    if !field.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let value = token[pos + op_str.len()..].to_string();
    Some((field, op, value))
}
