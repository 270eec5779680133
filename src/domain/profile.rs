use super::{Email, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: UserId,
    pub email: Email,
    pub display_name: String,
}

impl Profile {
    pub fn new(user_id: UserId, email: Email, display_name: String) -> Self {
        Self {
            user_id,
            email,
            display_name,
        }
    }
}
