//! In-process user store.
//!
//! Stands in for the datastore collection. Only reached once the request
//! gate has admitted an operation, i.e. while the datastore is connected.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::users::model::{NewUser, User, UserUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(String),

    #[error("{field} '{value}' is already taken")]
    Conflict { field: &'static str, value: String },
}

/// Thread-safe user collection with unique username and email.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    inner: Arc<DashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All users, newest first.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.inner.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        users
    }

    pub fn get(&self, id: &str) -> Result<User, StoreError> {
        self.inner
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let user = User::from_new(Uuid::new_v4().simple().to_string(), new, Utc::now());
        self.ensure_unique(None, &user.username, &user.email)?;
        self.inner.insert(user.id.clone(), user.clone());
        tracing::debug!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub fn update(&self, id: &str, update: UserUpdate) -> Result<User, StoreError> {
        let mut candidate = self.get(id)?;
        candidate.apply(update, Utc::now());
        self.ensure_unique(Some(id), &candidate.username, &candidate.email)?;

        match self.inner.get_mut(id) {
            Some(mut entry) => {
                *entry = candidate.clone();
                Ok(candidate)
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    pub fn delete(&self, id: &str) -> Result<User, StoreError> {
        self.inner
            .remove(id)
            .map(|(_, user)| user)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn ensure_unique(&self, except: Option<&str>, username: &str, email: &str) -> Result<(), StoreError> {
        for entry in self.inner.iter() {
            if Some(entry.key().as_str()) == except {
                continue;
            }
            if entry.username == username {
                return Err(StoreError::Conflict { field: "username", value: username.to_string() });
            }
            if entry.email == email {
                return Err(StoreError::Conflict { field: "email", value: email.to_string() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            name: "Test User".into(),
            is_active: true,
        }
    }

    #[test]
    fn test_create_get_delete() {
        let store = UserStore::new();
        let user = store.create(new_user("alice", "alice@example.com")).unwrap();
        assert_eq!(store.get(&user.id).unwrap().username, "alice");

        store.delete(&user.id).unwrap();
        assert_eq!(store.get(&user.id), Err(StoreError::NotFound(user.id.clone())));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unique_username_and_email() {
        let store = UserStore::new();
        store.create(new_user("alice", "alice@example.com")).unwrap();

        let err = store.create(new_user("alice", "other@example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { field: "username", .. }));

        let err = store.create(new_user("bob", "ALICE@example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { field: "email", .. }));
    }

    #[test]
    fn test_update_keeps_own_values_and_rejects_taken() {
        let store = UserStore::new();
        let alice = store.create(new_user("alice", "alice@example.com")).unwrap();
        store.create(new_user("bob", "bob@example.com")).unwrap();

        let updated = store
            .update(&alice.id, UserUpdate { name: Some("Alice A".into()), ..Default::default() })
            .unwrap();
        assert_eq!(updated.name, "Alice A");
        assert_eq!(updated.username, "alice");

        let err = store
            .update(&alice.id, UserUpdate { username: Some("bob".into()), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn test_update_missing_user() {
        let store = UserStore::new();
        assert!(matches!(store.update("nope", UserUpdate::default()), Err(StoreError::NotFound(_))));
    }
}
