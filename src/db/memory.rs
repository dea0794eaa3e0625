use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{NewTodo, NewUser, TodoItem, User};
use crate::db::repository::{TodoRepository, UserRepository};
use crate::error::DatabaseError;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    todos: BTreeMap<i64, TodoItem>,
    next_todo_id: i64,
}

/// Process-local storage with the same semantics as the Postgres backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(owner: Uuid) -> impl Fn(&&TodoItem) -> bool {
    move |item| item.owner_id == owner
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.email) {
            return Err(DatabaseError::Duplicate);
        }
        let user = user.into_user();
        tables.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TodoRepository for InMemoryStore {
    async fn list(&self, owner: Uuid) -> Result<Vec<TodoItem>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.todos.values().filter(owned_by(owner)).cloned().collect())
    }

    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<TodoItem>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.todos.get(&id).filter(owned_by(owner)).cloned())
    }

    async fn create(&self, owner: Uuid, todo: NewTodo) -> Result<TodoItem, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.next_todo_id += 1;
        let item = TodoItem {
            id: tables.next_todo_id,
            name: todo.name,
            completed: todo.completed,
            importance: todo.importance,
            owner_id: owner,
        };
        tables.todos.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        todo: NewTodo,
    ) -> Result<Option<TodoItem>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.todos.get_mut(&id).filter(|item| item.owner_id == owner) else {
            return Ok(None);
        };
        item.name = todo.name;
        item.completed = todo.completed;
        item.importance = todo.importance;
        Ok(Some(item.clone()))
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<Option<TodoItem>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.todos.get(&id).filter(owned_by(owner)).is_none() {
            return Ok(None);
        }
        Ok(tables.todos.remove(&id))
    }
}
