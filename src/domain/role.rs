use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProjectId, RoleId, RoleName};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "roleId")]
    pub role_id: RoleId,
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
    #[serde(rename = "roleName")]
    pub role_name: RoleName,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(rename = "taskDescription")]
    pub task_description: String,
}

impl Role {
    pub fn new(
        project_id: ProjectId,
        role_name: RoleName,
        deadline: Option<DateTime<Utc>>,
        task_description: String,
    ) -> Self {
        Self {
            role_id: RoleId::default(),
            project_id,
            role_name,
            deadline,
            task_description,
        }
    }
}
