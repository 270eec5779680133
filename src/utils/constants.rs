use dotenvy::dotenv;
use lazy_static::lazy_static;
use secrecy::Secret;
use std::env as std_env;

lazy_static! {
    pub static ref DATABASE_URL: Secret<String> = get_db_url();
    pub static ref AUTH_BASE_URL: String =
        load_or_default(env::AUTH_BASE_URL_ENV_VAR, "http://localhost:9999");
    pub static ref AUTH_API_KEY: Secret<String> = set_auth_api_key();
}

fn load_env() {
    dotenv().ok();
}

fn get_db_url() -> Secret<String> {
    load_env();
    let db_url = std_env::var(env::DATABASE_URL_ENV_VAR)
        .expect("DATABASE_URL must be set.");
    if db_url.is_empty() {
        panic!("DATABASE_URL must not be empty.");
    }
    Secret::new(db_url)
}

fn set_auth_api_key() -> Secret<String> {
    load_env();
    Secret::new(
        std_env::var(env::AUTH_API_KEY_ENV_VAR)
            .expect("AUTH_API_KEY must be set."),
    )
}

fn load_or_default(variable_name: &str, default_value: &str) -> String {
    load_env();

    match std_env::var(variable_name) {
        Ok(value) => {
            if value.is_empty() {
                String::from(default_value)
            } else {
                value
            }
        }
        Err(_) => String::from(default_value),
    }
}

pub mod env {
    pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
    pub const AUTH_BASE_URL_ENV_VAR: &str = "AUTH_BASE_URL";
    pub const AUTH_API_KEY_ENV_VAR: &str = "AUTH_API_KEY";
}

// Channel the backend's notify triggers publish row events on.
pub const NOTIFY_CHANNEL: &str = "row_changes";

pub mod prod {
    pub mod auth_client {
        use std::time::Duration;

        pub const TIMEOUT: Duration = std::time::Duration::from_secs(10);
    }
}

pub mod test {
    pub mod auth_client {
        use std::time::Duration;

        pub const TIMEOUT: Duration = std::time::Duration::from_millis(200);
    }
}
