//! Loads a demo account and a few list items into the configured database.

use anyhow::Context;
use dotenv::dotenv;
use todo_list_server::db::NewTodo;
use todo_list_server::error::AuthError;
use todo_list_server::{AppError, AppState, Settings};
use tracing::info;

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo-password";

fn demo_items() -> Vec<NewTodo> {
    [
        ("wash dishes", false, 1),
        ("take out trash", false, 2),
        ("clean ceiling", true, 3),
    ]
    .into_iter()
    .map(|(name, completed, importance)| NewTodo {
        name: name.to_string(),
        completed,
        importance,
    })
    .collect()
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let config = Settings::new().context("failed to load configuration")?;
    let state = AppState::new(config)
        .await
        .context("failed to connect to the database")?;

    let owner = match state.credentials.register(DEMO_EMAIL, DEMO_PASSWORD).await {
        Ok(owner) => {
            info!("Created demo user {} ({})", DEMO_EMAIL, owner);
            owner
        }
        Err(AppError::AuthError(AuthError::DuplicateEmail)) => state
            .credentials
            .verify(DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .context("demo user exists with a different password")?,
        Err(e) => return Err(e).context("failed to create demo user"),
    };

    // An earlier run may have stopped between signup and the inserts.
    let existing = state.todos.list(owner).await?;
    if !existing.is_empty() {
        info!("Demo user already has {} items, leaving them alone", existing.len());
        return Ok(());
    }

    for item in demo_items() {
        state.todos.create(owner, item).await?;
    }

    info!("Seed data load complete");
    Ok(())
}
