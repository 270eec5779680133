use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleName(String);

impl RoleName {
    pub fn parse(name: &str) -> Result<Self> {
        match name.chars().count() {
            x if x < 1 => Err(eyre!("Role name cannot be empty")),
            x if x > 100 => Err(eyre!("Max name length is 100 characters")),
            _ => Ok(Self(name.to_owned())),
        }
    }
}

impl AsRef<String> for RoleName {
    fn as_ref(&self) -> &String {
        &self.0
    }
}

#[test]
fn test_valid_role_names() {
    for valid_name in ["Stage manager", &"a".repeat(100)] {
        let parsed =
            RoleName::parse(valid_name).expect("Failed to parse role name");
        assert_eq!(parsed.as_ref(), valid_name);
    }
}

#[test]
fn test_invalid_role_names() {
    assert!(RoleName::parse("").is_err());
    assert!(RoleName::parse(&"a".repeat(101)).is_err());
}
