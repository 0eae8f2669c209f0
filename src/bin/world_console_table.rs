use clap::Parser;
use prettytable::{row, Table};
use world_bench::{
    config::Cli, connect, handlers::with_additional_fortune, telemetry, Error, SqliteStore, Store,
};

/// Prints what `/fortunes` would render, plus the size of the world table.
#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Cli::parse().settings()?;
    telemetry::init(&settings.log_level)?;

    let store = SqliteStore::new(connect(&settings).await?);
    let fortunes = with_additional_fortune(store.fortunes().await?);
    let mut table = Table::new();
    table.add_row(row!["Id", "Message"]);
    for fortune in fortunes {
        table.add_row(row![fortune.id, fortune.message]);
    }
    table.printstd();

    let worlds: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM world")
        .fetch_one(store.pool())
        .await?;
    println!("World rows: {worlds}");
    let sample = store.random_world().await?;
    println!("Random world: {}", serde_json::to_string(&sample).unwrap_or_default());

    Ok(())
}
