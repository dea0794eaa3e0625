//! Authentication module for the to-do list server
//!
//! This module handles account credentials, token issuance and
//! verification, and the gate that guards the `/api` routes.

mod credentials;
pub mod handlers;
mod middleware;
mod token;

pub use credentials::CredentialStore;
pub use middleware::{extract_token, AuthGate, AuthenticatedUser};
pub use token::{Claims, TokenService};
