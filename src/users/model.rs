//! User record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Body of `PUT /api/users/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    pub fn from_new(id: String, new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new.username.trim().to_string(),
            email: new.email.trim().to_lowercase(),
            name: new.name.trim().to_string(),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: UserUpdate, now: DateTime<Utc>) {
        if let Some(username) = update.username {
            self.username = username.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = email.trim().to_lowercase();
        }
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
    }
}
