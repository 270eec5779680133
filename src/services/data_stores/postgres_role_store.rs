use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{
    OriginId, ProjectId, Role, RoleId, RoleName, RoleStore, RoleStoreError,
};

pub struct PostgresRoleStore {
    pool: PgPool,
    origin: OriginId,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool, origin: OriginId) -> Self {
        Self { pool, origin }
    }

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
struct RoleRow {
    role_id: Uuid,
    project_id: Uuid,
    role_name: String,
    deadline: Option<DateTime<Utc>>,
    task_description: String,
}

impl TryFrom<RoleRow> for Role {
    type Error = RoleStoreError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Role {
            role_id: RoleId::new(row.role_id),
            project_id: ProjectId::new(row.project_id),
            role_name: RoleName::parse(&row.role_name)
                .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?,
            deadline: row.deadline,
            task_description: row.task_description,
        })
    }
}

#[async_trait::async_trait]
impl RoleStore for PostgresRoleStore {
    #[tracing::instrument(
        name = "Getting project roles from PostgreSQL",
        skip_all
    )]
    async fn get_roles_for_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Role>, RoleStoreError> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT role_id, project_id, role_name, deadline, task_description
            FROM roles
            WHERE project_id = $1
            "#,
        )
        .bind(project.as_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    #[tracing::instrument(name = "Adding role to PostgreSQL", skip_all)]
    async fn add_role(&mut self, role: &Role) -> Result<(), RoleStoreError> {
        let mut tx = self
            .begin_tagged()
            .await
            .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?;

        sqlx::query(
            r#"
            INSERT INTO roles
                (role_id, project_id, role_name, deadline, task_description)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(role.role_id.as_ref())
        .bind(role.project_id.as_ref())
        .bind(role.role_name.as_ref())
        .bind(role.deadline)
        .bind(&role.task_description)
        .execute(&mut *tx)
        .await
        .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?;

        tx.commit()
            .await
            .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))
    }

    #[tracing::instrument(name = "Updating role in PostgreSQL", skip_all)]
    async fn update_role(
        &mut self,
        role: &Role,
    ) -> Result<(), RoleStoreError> {
        let mut tx = self
            .begin_tagged()
            .await
            .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?;

        let result = sqlx::query(
            r#"
            UPDATE roles
            SET role_name = $2, deadline = $3, task_description = $4
            WHERE role_id = $1
            "#,
        )
        .bind(role.role_id.as_ref())
        .bind(role.role_name.as_ref())
        .bind(role.deadline)
        .bind(&role.task_description)
        .execute(&mut *tx)
        .await
        .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?;

        if result.rows_affected() == 0 {
            return Err(RoleStoreError::RoleIdNotFound);
        }

        tx.commit()
            .await
            .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))
    }

    #[tracing::instrument(name = "Deleting role from PostgreSQL", skip_all)]
    async fn delete_role(
        &mut self,
        id: &RoleId,
    ) -> Result<(), RoleStoreError> {
        let mut tx = self
            .begin_tagged()
            .await
            .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?;

        let result = sqlx::query("DELETE FROM roles WHERE role_id = $1")
            .bind(id.as_ref())
            .execute(&mut *tx)
            .await
            .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))?;

        if result.rows_affected() == 0 {
            return Err(RoleStoreError::RoleIdNotFound);
        }

        tx.commit()
            .await
            .map_err(|e| RoleStoreError::UnexpectedError(eyre!(e)))
    }
}
