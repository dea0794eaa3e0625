use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{NewTodo, NewUser, TodoItem, User};
use crate::error::DatabaseError;

#[cfg(test)]
use mockall::automock;

/// Durable storage for accounts.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Persists a new account. A taken email yields `DatabaseError::Duplicate`.
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;
}

/// Durable storage for list items.
///
/// Every operation takes the owner's id and only ever sees rows owned by it.
/// A row belonging to someone else behaves exactly like a missing row.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn list(&self, owner: Uuid) -> Result<Vec<TodoItem>, DatabaseError>;

    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<TodoItem>, DatabaseError>;

    async fn create(&self, owner: Uuid, todo: NewTodo) -> Result<TodoItem, DatabaseError>;

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        todo: NewTodo,
    ) -> Result<Option<TodoItem>, DatabaseError>;

    async fn delete(&self, owner: Uuid, id: i64) -> Result<Option<TodoItem>, DatabaseError>;
}
