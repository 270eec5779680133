use color_eyre::eyre::eyre;
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Email, Profile, ProfileStore, ProfileStoreError, UserId,
};

pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    email: String,
    display_name: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = ProfileStoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            user_id: UserId::new(row.user_id),
            email: Email::parse(Secret::new(row.email))
                .map_err(|e| ProfileStoreError::UnexpectedError(eyre!(e)))?,
            display_name: row.display_name,
        })
    }
}

#[async_trait::async_trait]
impl ProfileStore for PostgresProfileStore {
    #[tracing::instrument(name = "Getting profile from PostgreSQL", skip_all)]
    async fn get_profile(
        &self,
        user: &UserId,
    ) -> Result<Profile, ProfileStoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, email, display_name FROM profiles WHERE user_id = $1",
        )
        .bind(user.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => ProfileStoreError::ProfileNotFound,
            e => ProfileStoreError::UnexpectedError(eyre!(e)),
        })?;

        Profile::try_from(row)
    }

    #[tracing::instrument(name = "Getting profiles from PostgreSQL", skip_all)]
    async fn get_profiles(
        &self,
        users: &[UserId],
    ) -> Result<Vec<Profile>, ProfileStoreError> {
        let raw_ids: Vec<Uuid> =
            users.iter().map(|user| *user.as_ref()).collect();
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, email, display_name FROM profiles WHERE user_id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProfileStoreError::UnexpectedError(eyre!(e)))?;

        rows.into_iter().map(Profile::try_from).collect()
    }

    #[tracing::instrument(name = "Upserting profile in PostgreSQL", skip_all)]
    async fn upsert_profile(
        &mut self,
        profile: &Profile,
    ) -> Result<(), ProfileStoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET email = EXCLUDED.email,
                          display_name = EXCLUDED.display_name
            "#,
        )
        .bind(profile.user_id.as_ref())
        .bind(profile.email.as_ref().expose_secret())
        .bind(&profile.display_name)
        .execute(&self.pool)
        .await
        .map_err(|e| ProfileStoreError::UnexpectedError(eyre!(e)))?;

        Ok(())
    }
}
