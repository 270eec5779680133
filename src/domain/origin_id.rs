use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Identifies the client instance that performed a mutation. Change events
// stamped with the local origin are already reflected in local state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct OriginId(Uuid);

impl OriginId {
    pub fn parse(id: &str) -> Result<Self, ValidationError> {
        let parsed = uuid::Uuid::try_parse(id).map_err(|e| {
            ValidationError::new(format!("Invalid origin ID: {e}"))
        })?;
        Ok(Self(parsed))
    }

    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for OriginId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl AsRef<Uuid> for OriginId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

#[test]
fn test_fresh_origins_are_distinct() {
    assert_ne!(OriginId::default(), OriginId::default());
}
