//! Filter expression evaluator
//!
//! Evaluates filter expressions against leads to decide which leads match.
//! Organization terms resolve the lead's organization name through the
//! repository; everything else matches on the lead record itself.

use crate::filter::parser::{ComparisonOp, FilterTerm};
use crate::models::Lead;
use crate::repo::{LeadRepo, OrganizationRepo};
use crate::utils::{local_date, parse_date_expr};
use rusqlite::Connection;
use anyhow::Result;

#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// Match all
    All,
    Term(FilterTerm),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Evaluate filter against a lead
    pub fn matches(&self, lead: &Lead, conn: &Connection) -> Result<bool> {
        match self {
            FilterExpr::All => Ok(true),
            FilterExpr::Term(term) => term.matches(lead, conn),
            FilterExpr::And(exprs) => {
                for expr in exprs {
                    if !expr.matches(lead, conn)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            FilterExpr::Or(exprs) => {
                for expr in exprs {
                    if expr.matches(lead, conn)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            FilterExpr::Not(expr) => Ok(!expr.matches(lead, conn)?),
        }
    }
}

impl FilterTerm {
    pub fn matches(&self, lead: &Lead, conn: &Connection) -> Result<bool> {
        match self {
            FilterTerm::Id(id) => Ok(lead.id == Some(*id)),
            FilterTerm::Stage(stage) => Ok(lead.stage == *stage),
            FilterTerm::Org(name) => {
                let org_name = organization_name(lead, conn)?;
                Ok(org_name
                    .map(|n| n.to_lowercase().starts_with(&name.to_lowercase()))
                    .unwrap_or(false))
            }
            FilterTerm::Source(tag) => Ok(lead
                .source
                .as_ref()
                .map(|s| s.eq_ignore_ascii_case(tag))
                .unwrap_or(false)),
            FilterTerm::Role(text) => {
                Ok(lead.role.to_lowercase().contains(&text.to_lowercase()))
            }
            FilterTerm::Created { op, expr } => match_created(lead.created_ts, *op, expr),
            FilterTerm::Pattern(pattern) => {
                let needle = pattern.to_lowercase();
                if lead.name.to_lowercase().contains(&needle)
                    || lead.email.to_lowercase().contains(&needle)
                {
                    return Ok(true);
                }
                let org_name = organization_name(lead, conn)?;
                Ok(org_name
                    .map(|n| n.to_lowercase().contains(&needle))
                    .unwrap_or(false))
            }
        }
    }
}

fn organization_name(lead: &Lead, conn: &Connection) -> Result<Option<String>> {
    match lead.organization_id {
        Some(org_id) => Ok(OrganizationRepo::get_by_id(conn, org_id)?.map(|o| o.name)),
        None => Ok(None),
    }
}

/// Compare creation timestamp against a date expression at day granularity
fn match_created(created_ts: i64, op: ComparisonOp, expr: &str) -> Result<bool> {
    let filter_ts = parse_date_expr(expr)?;
    let (Some(lead_date), Some(filter_date)) = (local_date(created_ts), local_date(filter_ts))
    else {
        return Ok(false);
    };

    Ok(match op {
        ComparisonOp::Eq => lead_date == filter_date,
        ComparisonOp::Neq => lead_date != filter_date,
        ComparisonOp::Gt => lead_date > filter_date,
        ComparisonOp::Lt => lead_date < filter_date,
        ComparisonOp::Gte => lead_date >= filter_date,
        ComparisonOp::Lte => lead_date <= filter_date,
    })
}

/// Load all leads and keep those matching the filter, preserving store
/// order (newest first).
pub fn filter_leads(conn: &Connection, expr: &FilterExpr) -> Result<Vec<Lead>> {
    let mut leads = LeadRepo::list_all(conn)?;
    let mut result = Vec::new();
    for lead in leads.drain(..) {
        if expr.matches(&lead, conn)? {
            result.push(lead);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::filter::parse_filter;
    use crate::models::{LeadInput, Stage};

    fn seed(conn: &Connection) {
        let org = OrganizationRepo::create(conn, "Prefeitura X", None).unwrap();
        let other = OrganizationRepo::create(conn, "Secretaria Y", None).unwrap();

        let leads = [
            ("Ana Souza", "ana@x.gov", org.id, Stage::New, Some("site")),
            ("Bruno Lima", "bruno@y.gov", other.id, Stage::Qualified, Some("indicacao")),
            ("Clara Dias", "clara@x.gov", org.id, Stage::Converted, None),
        ];
        for (name, email, org_id, stage, source) in leads {
            let input = LeadInput {
                name: name.to_string(),
                email: email.to_string(),
                phone: "(45) 9999-0000".to_string(),
                organization_id: org_id,
                role: "Assessora".to_string(),
                source: source.map(|s| s.to_string()),
            };
            LeadRepo::create(conn, &input, stage).unwrap();
        }
    }

    fn run_filter(conn: &Connection, args: &[&str]) -> Vec<String> {
        let tokens: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let expr = parse_filter(&tokens).unwrap();
        filter_leads(conn, &expr)
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect()
    }

    #[test]
    fn test_match_all_preserves_store_order() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        let names = run_filter(&conn, &[]);
        assert_eq!(names, vec!["Clara Dias", "Bruno Lima", "Ana Souza"]);
    }

    #[test]
    fn test_stage_term() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        assert_eq!(run_filter(&conn, &["stage=qualified"]), vec!["Bruno Lima"]);
    }

    #[test]
    fn test_org_prefix_term() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        let names = run_filter(&conn, &["org=prefeitura"]);
        assert_eq!(names, vec!["Clara Dias", "Ana Souza"]);
    }

    #[test]
    fn test_source_term() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        assert_eq!(run_filter(&conn, &["source=site"]), vec!["Ana Souza"]);
    }

    #[test]
    fn test_pattern_matches_name_email_org() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        assert_eq!(run_filter(&conn, &["bruno"]), vec!["Bruno Lima"]);
        // Email domain
        let names = run_filter(&conn, &["x.gov"]);
        assert_eq!(names, vec!["Clara Dias", "Ana Souza"]);
        // Organization name
        let names = run_filter(&conn, &["secretaria"]);
        assert_eq!(names, vec!["Bruno Lima"]);
    }

    #[test]
    fn test_or_and_not() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        let names = run_filter(&conn, &["stage=new", "or", "stage=converted"]);
        assert_eq!(names, vec!["Clara Dias", "Ana Souza"]);

        let names = run_filter(&conn, &["not", "stage=new"]);
        assert_eq!(names, vec!["Clara Dias", "Bruno Lima"]);
    }

    #[test]
    fn test_created_today() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        // Everything was just created
        assert_eq!(run_filter(&conn, &["created=today"]).len(), 3);
        assert_eq!(run_filter(&conn, &["created<today"]).len(), 0);
        assert_eq!(run_filter(&conn, &["created<=today"]).len(), 3);
    }

    #[test]
    fn test_id_term() {
        let conn = DbConnection::connect_in_memory().unwrap();
        seed(&conn);
        let names = run_filter(&conn, &["1"]);
        assert_eq!(names, vec!["Ana Souza"]);
    }
}
