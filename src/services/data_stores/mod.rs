mod broadcast_change_feed;
mod hashmap_profile_store;
mod hashmap_project_store;
mod hashmap_role_store;
mod postgres_change_feed;
mod postgres_profile_store;
mod postgres_project_store;
mod postgres_role_store;

pub use broadcast_change_feed::*;
pub use hashmap_profile_store::*;
pub use hashmap_project_store::*;
pub use hashmap_role_store::*;
pub use postgres_change_feed::*;
pub use postgres_profile_store::*;
pub use postgres_project_store::*;
pub use postgres_role_store::*;
