use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProjectId, ProjectName, ProjectPassword, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
    #[serde(rename = "projectName")]
    pub project_name: ProjectName,
    #[serde(rename = "ownerId")]
    pub owner_id: UserId,
    #[serde(rename = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub password: Option<ProjectPassword>,
    #[serde(rename = "memberCount")]
    pub member_count: i64,
}

impl Project {
    pub fn new(
        project_name: ProjectName,
        owner_id: UserId,
        due_date: Option<DateTime<Utc>>,
        password: Option<ProjectPassword>,
    ) -> Self {
        Self {
            project_id: ProjectId::default(),
            project_name,
            owner_id,
            due_date,
            password,
            member_count: 0,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}
