use serde::{Deserialize, Serialize};

/// Course model
///
/// A catalog entry leads can be enrolled in after conversion. `name` is the
/// short unique handle used on the command line; `title` is the display
/// title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<i64>,
    pub name: String,
    pub title: String,
    pub is_archived: bool,
    pub created_ts: i64,
    pub modified_ts: i64,
}

/// Enrollment of a lead in a course. A lead can be enrolled in a course at
/// most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub course_id: i64,
    pub enrolled_ts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_fields() {
        let now = chrono::Utc::now().timestamp();
        let course = Course {
            id: Some(1),
            name: "licitacoes".to_string(),
            title: "Licitações e Contratos".to_string(),
            is_archived: false,
            created_ts: now,
            modified_ts: now,
        };
        assert_eq!(course.name, "licitacoes");
        assert!(!course.is_archived);
    }
}
