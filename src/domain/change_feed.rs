use color_eyre::eyre::Report;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{OriginId, ProjectId, RoleId, UserId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Projects,
    ProjectMembers,
    Roles,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Projects => "projects",
            Relation::ProjectMembers => "project_members",
            Relation::Roles => "roles",
        }
    }
}

impl FromStr for Relation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projects" => Ok(Relation::Projects),
            "project_members" => Ok(Relation::ProjectMembers),
            "roles" => Ok(Relation::Roles),
            _ => Err(ValidationError::new(format!("Unknown relation: {s}"))),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// One row-level event as delivered on the notification channel. `user_id`
// is the owner for `projects` rows and the member for `project_members`
// rows; `roles` rows carry neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub relation: Relation,
    pub kind: ChangeKind,
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(rename = "roleId", default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<OriginId>,
}

impl RowChange {
    pub fn originated_by(&self, origin: &OriginId) -> bool {
        self.origin.as_ref() == Some(origin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    OwnerId,
    UserId,
    ProjectId,
}

impl FilterColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterColumn::OwnerId => "owner_id",
            FilterColumn::UserId => "user_id",
            FilterColumn::ProjectId => "project_id",
        }
    }
}

// A row predicate in the backend's textual filter syntax, e.g.
// `user_id=eq.5e90ca28-e1ad-4795-a190-089959c16e0b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    column: FilterColumn,
    value: Uuid,
}

lazy_static! {
    static ref PREDICATE_RE: regex::Regex = regex::Regex::new(
        r"^(owner_id|user_id|project_id)=eq\.([0-9a-fA-F-]{36})$"
    )
    .expect("Failed to compile predicate regex");
}

impl Predicate {
    pub fn owner(id: &UserId) -> Self {
        Self {
            column: FilterColumn::OwnerId,
            value: *id.as_ref(),
        }
    }

    pub fn user(id: &UserId) -> Self {
        Self {
            column: FilterColumn::UserId,
            value: *id.as_ref(),
        }
    }

    pub fn project(id: &ProjectId) -> Self {
        Self {
            column: FilterColumn::ProjectId,
            value: *id.as_ref(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let captures = PREDICATE_RE.captures(s).ok_or_else(|| {
            ValidationError::new(format!("Invalid predicate: {s}"))
        })?;

        let column = match &captures[1] {
            "owner_id" => FilterColumn::OwnerId,
            "user_id" => FilterColumn::UserId,
            _ => FilterColumn::ProjectId,
        };
        let value = Uuid::try_parse(&captures[2]).map_err(|e| {
            ValidationError::new(format!("Invalid predicate value: {e}"))
        })?;

        Ok(Self { column, value })
    }

    pub fn matches(&self, change: &RowChange) -> bool {
        match self.column {
            FilterColumn::OwnerId | FilterColumn::UserId => change
                .user_id
                .map(|user| *user.as_ref() == self.value)
                .unwrap_or(false),
            FilterColumn::ProjectId => *change.project_id.as_ref() == self.value,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column.as_str(), self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeFilter {
    pub relation: Relation,
    pub predicate: Option<Predicate>,
}

impl ChangeFilter {
    pub fn relation(relation: Relation) -> Self {
        Self {
            relation,
            predicate: None,
        }
    }

    pub fn with_predicate(relation: Relation, predicate: Predicate) -> Self {
        Self {
            relation,
            predicate: Some(predicate),
        }
    }

    pub fn matches(&self, change: &RowChange) -> bool {
        self.relation == change.relation
            && self
                .predicate
                .map(|predicate| predicate.matches(change))
                .unwrap_or(true)
    }
}

#[async_trait::async_trait]
pub trait ChangeFeed {
    async fn subscribe(
        &self,
        filter: ChangeFilter,
    ) -> Result<ChangeSubscription, ChangeFeedError>;
}

#[derive(Debug, Error)]
pub enum ChangeFeedError {
    #[error("Change feed closed")]
    Closed,
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
}

impl PartialEq for ChangeFeedError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Closed, Self::Closed)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

// Live subscription handle. The pump task forwarding matching events is
// aborted when the handle is dropped.
pub struct ChangeSubscription {
    events: mpsc::Receiver<RowChange>,
    pump: JoinHandle<()>,
}

impl ChangeSubscription {
    pub fn new(events: mpsc::Receiver<RowChange>, pump: JoinHandle<()>) -> Self {
        Self { events, pump }
    }

    pub async fn next(&mut self) -> Option<RowChange> {
        self.events.recv().await
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
