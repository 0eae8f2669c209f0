use axum::{
    extract::State,
    http::{header::SERVER, HeaderValue},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;

pub mod config;
pub mod fanout;
pub mod handlers;
pub mod model;
pub mod store;
pub mod telemetry;

pub use model::{Fortune, World};
pub use store::{connect, SqliteStore, Store};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("SQLx error occurred: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error occurred: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Template error occurred: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Read config error occured: {0}")]
    ConfigError(#[from] ::config::ConfigError),

    #[error("Invalid server header value: {0}")]
    HeaderValue(#[from] axum::http::header::InvalidHeaderValue),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("HTTP server error occurred: {0}")]
    Server(#[from] hyper::Error),

    #[error("Logging setup error occurred: {0}")]
    Telemetry(String),

    #[error("Unknown error")]
    Unknown,
}

/// Builds the benchmark router on top of `store`. Every response, including
/// the 404 fallback, is stamped with `Server: <server_name>`.
pub fn prepare_bench_router(server_name: &str, store: Arc<dyn Store>) -> Result<Router, Error> {
    let server = HeaderValue::from_str(server_name)?;
    let state = handlers::AppState {
        store,
        templates: Arc::new(handlers::template_environment()?),
    };

    Ok(Router::new()
        .route("/db", get(handlers::db))
        .route("/queries", get(handlers::queries))
        .route("/fortunes", get(handlers::fortunes))
        .route("/updates", get(handlers::updates))
        .layer(middleware::map_response_with_state(
            server,
            add_server_header,
        ))
        .with_state(state))
}

async fn add_server_header(State(server): State<HeaderValue>, mut response: Response) -> Response {
    response.headers_mut().insert(SERVER, server);
    response
}
