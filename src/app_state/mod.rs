use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{
    AuthClient, ChangeFeed, OriginId, ProfileStore, ProjectStore, RoleStore,
};

pub type ProjectStoreType = Arc<RwLock<dyn ProjectStore + Send + Sync>>;
pub type RoleStoreType = Arc<RwLock<dyn RoleStore + Send + Sync>>;
pub type ProfileStoreType = Arc<RwLock<dyn ProfileStore + Send + Sync>>;
pub type ChangeFeedType = Arc<dyn ChangeFeed + Send + Sync>;
pub type AuthClientType = Arc<dyn AuthClient + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub project_store: ProjectStoreType,
    pub role_store: RoleStoreType,
    pub profile_store: ProfileStoreType,
    pub change_feed: ChangeFeedType,
    pub origin: OriginId,
}

impl AppState {
    pub fn new(
        project_store: ProjectStoreType,
        role_store: RoleStoreType,
        profile_store: ProfileStoreType,
        change_feed: ChangeFeedType,
        origin: OriginId,
    ) -> Self {
        Self {
            project_store,
            role_store,
            profile_store,
            change_feed,
            origin,
        }
    }
}
