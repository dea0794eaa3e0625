use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{NewTodo, NewUser, TodoItem, User};
use crate::db::repository::{TodoRepository, UserRepository};
use crate::error::DatabaseError;

/// Postgres-backed storage for users and list items.
#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }
}

// List-item statements. Each binds the owner as `$1` and filters on it.
const LIST_TODOS: &str = r#"
    SELECT id, name, completed, importance, owner_id
    FROM todo_list
    WHERE owner_id = $1
    ORDER BY id
"#;

const GET_TODO: &str = r#"
    SELECT id, name, completed, importance, owner_id
    FROM todo_list
    WHERE owner_id = $1 AND id = $2
"#;

const CREATE_TODO: &str = r#"
    INSERT INTO todo_list (owner_id, name, completed, importance)
    VALUES ($1, $2, $3, $4)
    RETURNING id, name, completed, importance, owner_id
"#;

const UPDATE_TODO: &str = r#"
    UPDATE todo_list
    SET name = $3, completed = $4, importance = $5
    WHERE owner_id = $1 AND id = $2
    RETURNING id, name, completed, importance, owner_id
"#;

const DELETE_TODO: &str = r#"
    DELETE FROM todo_list
    WHERE owner_id = $1 AND id = $2
    RETURNING id, name, completed, importance, owner_id
"#;

/// Builds a list-item query with the owner bound as `$1`.
fn owned(sql: &'static str, owner: Uuid) -> QueryAs<'static, Postgres, TodoItem, PgArguments> {
    sqlx::query_as::<_, TodoItem>(sql).bind(owner)
}

#[async_trait]
impl UserRepository for DbOperations {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = user.into_user();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hash)
        .bind(user.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl TodoRepository for DbOperations {
    async fn list(&self, owner: Uuid) -> Result<Vec<TodoItem>, DatabaseError> {
        let items = owned(LIST_TODOS, owner)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(items)
    }

    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<TodoItem>, DatabaseError> {
        let item = owned(GET_TODO, owner)
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(item)
    }

    async fn create(&self, owner: Uuid, todo: NewTodo) -> Result<TodoItem, DatabaseError> {
        let item = owned(CREATE_TODO, owner)
        .bind(todo.name)
        .bind(todo.completed)
        .bind(todo.importance)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(item)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        todo: NewTodo,
    ) -> Result<Option<TodoItem>, DatabaseError> {
        let item = owned(UPDATE_TODO, owner)
        .bind(id)
        .bind(todo.name)
        .bind(todo.completed)
        .bind(todo.importance)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(item)
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<Option<TodoItem>, DatabaseError> {
        let item = owned(DELETE_TODO, owner)
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(item)
    }
}
