use secrecy::{ExposeSecret, Secret};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub mod app_state;
pub mod domain;
pub mod services;
pub mod utils;

pub use app_state::AppState;
pub use domain::SyncError;
pub use services::{ProjectSync, RoleSync, SessionState, SessionStore};

pub async fn get_postgres_pool(
    url: &Secret<String>,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(url.expose_secret())
        .await
}

pub async fn run_migrations(
    pool: &PgPool,
) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
