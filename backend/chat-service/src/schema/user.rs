//! User object type.

use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

#[derive(SimpleObject, Clone, Debug, Serialize, Deserialize)]
#[graphql(name = "User")]
pub struct UserObject {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        UserObject {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}
