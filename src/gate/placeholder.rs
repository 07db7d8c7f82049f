//! Fixed records served in degraded mode.

use chrono::{DateTime, Utc};

use crate::users::User;

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(0, 0).unwrap_or_default()
}

fn record(id: &str, username: &str, email: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        is_active: true,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

/// The two records returned for a list while the datastore is unavailable.
pub fn user_list() -> Vec<User> {
    vec![
        record("placeholder-1", "johndoe", "john@example.com", "John Doe"),
        record("placeholder-2", "janesmith", "jane@example.com", "Jane Smith"),
    ]
}

/// The record returned for a lookup while the datastore is unavailable.
pub fn user(id: &str) -> User {
    record(id, "placeholder", "placeholder@example.com", "Placeholder User")
}
