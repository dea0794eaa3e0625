use actix_cors::Cors;
use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use todo_list_server::{configure_routes, not_found, AppError, AppState, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cors(config: &Settings) -> Cors {
    if !config.cors.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let cors_config = if config.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
    };

    cors_config.max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> todo_list_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration. A missing signing secret stops the process here.
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({} environment)", config.environment);

    let state = AppState::new(config).await?;
    let data = web::Data::new(state.clone());

    let server = &state.config.server;
    info!("Starting server at {}:{}", server.host, server.port);
    let workers = server.workers as usize;
    let listener = TcpListener::bind(format!("{}:{}", server.host, server.port))?;

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&state.config))
            .wrap(NormalizePath::trim())
            .app_data(data.clone())
            .configure(|cfg| configure_routes(cfg, &state))
            .default_service(web::route().to(not_found))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
