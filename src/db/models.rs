use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user row that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hash: String,
}

impl NewUser {
    pub fn new(email: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            hash: hash.into(),
        }
    }

    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            email: self.email,
            hash: self.hash,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TodoItem {
    pub id: i64,
    pub name: String,
    pub completed: bool,
    pub importance: i32,
    pub owner_id: Uuid,
}

/// Body of a create or update request. Update replaces every field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTodo {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    pub importance: i32,
}

impl NewTodo {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}
