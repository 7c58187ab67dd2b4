//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taskboard_core::types::{DbId, Timestamp};
use taskboard_core::validation::{rules, Violations};

use crate::models::task::TaskWithDetails;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CreateProject {
    pub fn validate(&self) -> Violations {
        let mut v = Violations::new();
        rules::title(&mut v, "title", &self.title);
        rules::description(&mut v, "description", &self.description);
        v
    }
}

/// A project together with every task on its board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<TaskWithDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_project_reports_both_fields() {
        let input = CreateProject {
            title: String::new(),
            description: " ".into(),
        };
        let violations = input.validate().into_vec();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "description"]);
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let input: CreateProject = serde_json::from_str("{}").unwrap();
        assert!(input.title.is_empty());
        assert!(!input.validate().is_empty());
    }
}
