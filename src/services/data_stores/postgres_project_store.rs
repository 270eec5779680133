use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use secrecy::Secret;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{
    MemberRole, Membership, OriginId, Project, ProjectId, ProjectName,
    ProjectPassword, ProjectStore, ProjectStoreError, UserId,
};

pub struct PostgresProjectStore {
    pool: PgPool,
    origin: OriginId,
}

impl PostgresProjectStore {
    pub fn new(pool: PgPool, origin: OriginId) -> Self {
        Self { pool, origin }
    }

    // Mutations run inside a transaction that stamps this client's origin,
    // so the notify triggers can attach it to the emitted events.
    async fn begin_tagged(
        &self,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('crewhub.origin_id', $1, true)")
            .bind(self.origin.as_ref().to_string())
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    project_id: Uuid,
    project_name: String,
    owner_id: Uuid,
    due_date: Option<DateTime<Utc>>,
    password: Option<String>,
    member_count: i64,
}

impl TryFrom<ProjectRow> for Project {
    type Error = ProjectStoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let password = row
            .password
            .map(|password| ProjectPassword::parse(Secret::new(password)))
            .transpose()
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        Ok(Project {
            project_id: ProjectId::new(row.project_id),
            project_name: ProjectName::parse(&row.project_name)
                .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?,
            owner_id: UserId::new(row.owner_id),
            due_date: row.due_date,
            password,
            member_count: row.member_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    project_id: Uuid,
    user_id: Uuid,
    member_role: String,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = ProjectStoreError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let member_role = row
            .member_role
            .parse::<MemberRole>()
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;
        Ok(Membership {
            project_id: ProjectId::new(row.project_id),
            user_id: UserId::new(row.user_id),
            member_role,
        })
    }
}

const PROJECT_COLUMNS: &str = r#"
    p.project_id, p.project_name, p.owner_id, p.due_date, p.password,
    (SELECT COUNT(*) FROM project_members m
     WHERE m.project_id = p.project_id) AS member_count
"#;

#[async_trait::async_trait]
impl ProjectStore for PostgresProjectStore {
    #[tracing::instrument(
        name = "Getting owned projects from PostgreSQL",
        skip_all
    )]
    async fn get_owned_projects(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Project>, ProjectStoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.owner_id = $1"
        ))
        .bind(owner.as_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        rows.into_iter().map(Project::try_from).collect()
    }

    #[tracing::instrument(
        name = "Getting joined project IDs from PostgreSQL",
        skip_all
    )]
    async fn get_joined_project_ids(
        &self,
        user: &UserId,
    ) -> Result<Vec<ProjectId>, ProjectStoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT project_id FROM project_members WHERE user_id = $1",
        )
        .bind(user.as_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        Ok(ids.into_iter().map(ProjectId::new).collect())
    }

    #[tracing::instrument(
        name = "Getting projects by ID from PostgreSQL",
        skip_all
    )]
    async fn get_projects(
        &self,
        ids: &[ProjectId],
    ) -> Result<Vec<Project>, ProjectStoreError> {
        let raw_ids: Vec<Uuid> =
            ids.iter().map(|id| *id.as_ref()).collect();
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.project_id = ANY($1)"
        ))
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        rows.into_iter().map(Project::try_from).collect()
    }

    #[tracing::instrument(name = "Getting project from PostgreSQL", skip_all)]
    async fn get_project(
        &self,
        id: &ProjectId,
    ) -> Result<Project, ProjectStoreError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.project_id = $1"
        ))
        .bind(id.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => ProjectStoreError::ProjectIdNotFound,
            e => ProjectStoreError::UnexpectedError(eyre!(e)),
        })?;

        Project::try_from(row)
    }

    #[tracing::instrument(name = "Adding project to PostgreSQL", skip_all)]
    async fn add_project(
        &mut self,
        project: &Project,
    ) -> Result<(), ProjectStoreError> {
        use secrecy::ExposeSecret;

        let mut tx = self
            .begin_tagged()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        sqlx::query(
            r#"
            INSERT INTO projects
                (project_id, project_name, owner_id, due_date, password)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(project.project_id.as_ref())
        .bind(project.project_name.as_ref())
        .bind(project.owner_id.as_ref())
        .bind(project.due_date)
        .bind(
            project
                .password
                .as_ref()
                .map(|password| password.as_ref().expose_secret().to_owned()),
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ProjectStoreError::ProjectIdExists
            }
            e => ProjectStoreError::UnexpectedError(eyre!(e)),
        })?;

        tx.commit()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))
    }

    #[tracing::instrument(name = "Deleting project from PostgreSQL", skip_all)]
    async fn delete_project(
        &mut self,
        id: &ProjectId,
    ) -> Result<(), ProjectStoreError> {
        let mut tx = self
            .begin_tagged()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        let result = sqlx::query("DELETE FROM projects WHERE project_id = $1")
            .bind(id.as_ref())
            .execute(&mut *tx)
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        if result.rows_affected() == 0 {
            return Err(ProjectStoreError::ProjectIdNotFound);
        }

        tx.commit()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))
    }

    #[tracing::instrument(
        name = "Verifying project password via RPC",
        skip_all
    )]
    async fn verify_password(
        &self,
        id: &ProjectId,
        candidate: &ProjectPassword,
    ) -> Result<bool, ProjectStoreError> {
        use secrecy::ExposeSecret;

        sqlx::query_scalar::<_, bool>(
            "SELECT verify_project_password($1, $2)",
        )
        .bind(id.as_ref())
        .bind(candidate.as_ref().expose_secret())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))
    }

    #[tracing::instrument(
        name = "Getting project members from PostgreSQL",
        skip_all
    )]
    async fn get_members(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Membership>, ProjectStoreError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT project_id, user_id, member_role
            FROM project_members
            WHERE project_id = $1
            "#,
        )
        .bind(project.as_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    #[tracing::instrument(name = "Upserting membership in PostgreSQL", skip_all)]
    async fn upsert_membership(
        &mut self,
        membership: &Membership,
    ) -> Result<(), ProjectStoreError> {
        let mut tx = self
            .begin_tagged()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, member_role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id)
            DO UPDATE SET member_role = EXCLUDED.member_role
            "#,
        )
        .bind(membership.project_id.as_ref())
        .bind(membership.user_id.as_ref())
        .bind(membership.member_role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err)
                if db_err.is_foreign_key_violation() =>
            {
                ProjectStoreError::ProjectIdNotFound
            }
            e => ProjectStoreError::UnexpectedError(eyre!(e)),
        })?;

        tx.commit()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))
    }

    #[tracing::instrument(
        name = "Removing membership from PostgreSQL",
        skip_all
    )]
    async fn remove_membership(
        &mut self,
        project: &ProjectId,
        user: &UserId,
    ) -> Result<(), ProjectStoreError> {
        let mut tx = self
            .begin_tagged()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        let result = sqlx::query(
            "DELETE FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project.as_ref())
        .bind(user.as_ref())
        .execute(&mut *tx)
        .await
        .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))?;

        if result.rows_affected() == 0 {
            return Err(ProjectStoreError::MembershipNotFound);
        }

        tx.commit()
            .await
            .map_err(|e| ProjectStoreError::UnexpectedError(eyre!(e)))
    }
}
