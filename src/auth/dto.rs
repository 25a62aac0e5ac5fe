use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

/// Public part of the user returned to outside callers. Carries neither the
/// password hash nor the version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub uuid: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.unwrap_or_else(|| ObjectId::from_bytes([0; 12])).to_hex(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            username: u.username.clone(),
            role: u.role.clone(),
            uuid: u.uuid.to_string(),
        }
    }
}

/// Credentials as they arrive from a caller: plaintext password, not a hash.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl From<LoginRequest> for User {
    fn from(req: LoginRequest) -> Self {
        Self {
            username: req.username,
            password: req.password,
            ..Default::default()
        }
    }
}

impl User {
    pub fn to_public(&self) -> PublicUser {
        PublicUser::from(self)
    }

    /// External transfer encoding.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_public())
    }
}
