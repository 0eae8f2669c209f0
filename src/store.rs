use futures::{future::BoxFuture, FutureExt};
use rand::Rng;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::{str::FromStr, time::Duration};
use tracing::info;

use crate::{config::Settings, Error, Fortune, World};

/// Cardinality of the seeded `world` table; ids are 1..=WORLD_ROWS.
pub const WORLD_ROWS: i64 = 10_000;

/// Backing store of the benchmark tables.
pub trait Store: Send + Sync + 'static {
    /// Fetches the world row with a uniformly random id.
    fn random_world(&self) -> BoxFuture<'_, Result<World, Error>>;

    /// Gives world `id` a fresh random number and returns the row as stored.
    fn update_world(&self, id: i64) -> BoxFuture<'_, Result<World, Error>>;

    fn fortunes(&self) -> BoxFuture<'_, Result<Vec<Fortune>, Error>>;
}

pub fn random_id() -> i64 {
    rand::thread_rng().gen_range(1..=WORLD_ROWS)
}

pub async fn connect(settings: &Settings) -> Result<SqlitePool, Error> {
    open_pool(&settings.database_url, settings.max_connections).await
}

/// Opens `url`, creating the database file when missing, and brings schema
/// and seed data up to date.
///
/// An in-memory database lives inside a single connection, so the pool is
/// pinned to one connection that is never recycled.
pub async fn open_pool(url: &str, max_connections: u32) -> Result<SqlitePool, Error> {
    let in_memory = url.contains(":memory:") || url.contains("mode=memory");
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        info!("Creating database {url}");
        Sqlite::create_database(url).await?;
    }

    let mut options = SqliteConnectOptions::from_str(url)?.busy_timeout(Duration::from_secs(5));
    let mut pool = SqlitePoolOptions::new();
    if in_memory {
        pool = pool
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
        pool = pool.max_connections(max_connections);
    }

    let db = pool.connect_with(options).await?;
    sqlx::migrate!().run(&db).await?;
    Ok(db)
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Store for SqliteStore {
    fn random_world(&self) -> BoxFuture<'_, Result<World, Error>> {
        let id = random_id();
        async move {
            Ok(
                sqlx::query_as::<_, World>("SELECT id, randomnumber FROM world WHERE id = $1")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?,
            )
        }
        .boxed()
    }

    fn update_world(&self, id: i64) -> BoxFuture<'_, Result<World, Error>> {
        let random_number = random_id();
        async move {
            let done = sqlx::query("UPDATE world SET randomnumber = $1 WHERE id = $2")
                .bind(random_number)
                .bind(id)
                .execute(&self.pool)
                .await?;
            if done.rows_affected() == 0 {
                return Err(sqlx::Error::RowNotFound.into());
            }
            Ok(World { id, random_number })
        }
        .boxed()
    }

    fn fortunes(&self) -> BoxFuture<'_, Result<Vec<Fortune>, Error>> {
        async move {
            Ok(
                sqlx::query_as::<_, Fortune>("SELECT id, message FROM fortune")
                    .fetch_all(&self.pool)
                    .await?,
            )
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::new(open_pool("sqlite::memory:", 4).await.unwrap())
    }

    #[tokio::test]
    async fn seeded_world_table_has_fixed_cardinality() {
        let store = store().await;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM world")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, WORLD_ROWS);

        let out_of_range: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM world WHERE randomnumber < 1 OR randomnumber > 10000",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(out_of_range, 0);
    }

    #[tokio::test]
    async fn random_world_stays_in_range() {
        let store = store().await;
        for _ in 0..50 {
            let world = store.random_world().await.unwrap();
            assert!((1..=WORLD_ROWS).contains(&world.id));
            assert!((1..=WORLD_ROWS).contains(&world.random_number));
        }
    }

    #[tokio::test]
    async fn update_world_persists_new_number() {
        let store = store().await;
        let updated = store.update_world(17).await.unwrap();
        let stored: i64 = sqlx::query_scalar("SELECT randomnumber FROM world WHERE id = 17")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(updated.id, 17);
        assert_eq!(updated.random_number, stored);
    }

    #[tokio::test]
    async fn update_of_missing_row_fails() {
        let store = store().await;
        let err = store.update_world(WORLD_ROWS + 1).await.unwrap_err();
        assert!(matches!(err, Error::SqlxError(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn fortunes_are_seeded() {
        let fortunes = store().await.fortunes().await.unwrap();
        assert_eq!(fortunes.len(), 12);
        assert!(fortunes.iter().all(|fortune| fortune.id != 0));
    }
}
