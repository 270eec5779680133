pub mod data_stores;
pub mod project_sync;
pub mod rest_auth_client;
pub mod role_sync;
pub mod session_store;

pub use project_sync::ProjectSync;
pub use rest_auth_client::RestAuthClient;
pub use role_sync::RoleSync;
pub use session_store::{SessionState, SessionStore};
