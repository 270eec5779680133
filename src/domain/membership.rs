use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Profile, ProjectId, UserId, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "memberRole")]
    pub member_role: MemberRole,
}

impl Membership {
    pub fn new(
        project_id: ProjectId,
        user_id: UserId,
        member_role: MemberRole,
    ) -> Self {
        Self {
            project_id,
            user_id,
            member_role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }
}

impl FromStr for MemberRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            _ => Err(ValidationError::new(format!("Invalid member role: {s}"))),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// A membership joined with its profile row, as the members screen shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMember {
    pub membership: Membership,
    pub profile: Profile,
}
