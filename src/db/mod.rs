//! Database module for the to-do list server
//!
//! Repository traits that every storage backend implements, the Postgres
//! backend used in production and an in-memory backend for tests.

pub mod memory;
pub mod models;
pub mod operations;
pub mod repository;

pub use memory::InMemoryStore;
pub use models::{NewTodo, NewUser, TodoItem, User};
pub use operations::DbOperations;
pub use repository::{TodoRepository, UserRepository};
