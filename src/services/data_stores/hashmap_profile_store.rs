use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Profile, ProfileStore, ProfileStoreError, UserId};

// In-memory stand-in for the backend's `profiles` relation.
#[derive(Clone, Default)]
pub struct HashmapProfileStore {
    profiles: Arc<Mutex<HashMap<Uuid, Profile>>>,
}

impl HashmapProfileStore {
    pub fn handle(&self) -> Self {
        Self {
            profiles: self.profiles.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ProfileStore for HashmapProfileStore {
    async fn get_profile(
        &self,
        user: &UserId,
    ) -> Result<Profile, ProfileStoreError> {
        self.profiles
            .lock()
            .await
            .get(user.as_ref())
            .cloned()
            .ok_or(ProfileStoreError::ProfileNotFound)
    }

    async fn get_profiles(
        &self,
        users: &[UserId],
    ) -> Result<Vec<Profile>, ProfileStoreError> {
        let profiles = self.profiles.lock().await;
        Ok(users
            .iter()
            .filter_map(|user| profiles.get(user.as_ref()))
            .cloned()
            .collect())
    }

    async fn upsert_profile(
        &mut self,
        profile: &Profile,
    ) -> Result<(), ProfileStoreError> {
        self.profiles
            .lock()
            .await
            .insert(*profile.user_id.as_ref(), profile.clone());
        Ok(())
    }
}
