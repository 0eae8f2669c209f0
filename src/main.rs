use clap::Parser;
use std::sync::Arc;
use tracing::info;
use world_bench::{
    config::Cli, connect, prepare_bench_router, telemetry, Error, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Cli::parse().settings()?;
    telemetry::init(&settings.log_level)?;

    let pool = connect(&settings).await?;
    let app = prepare_bench_router(&settings.server_name, Arc::new(SqliteStore::new(pool)))?;

    let addr = settings.address()?;
    info!("Listening on {addr}");
    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
