use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use polarhub_migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

// A wedged store must fail the request instead of stalling the pipeline.
const STORE_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct DatabaseHandler {
    pub(crate) db: DatabaseConnection,
}

impl DatabaseHandler {
    /// Connects to the store and brings the measurement schema up to date.
    /// A hub without its store is useless, so failures surface to the
    /// caller instead of being retried here.
    pub async fn new<C>(url: C) -> anyhow::Result<Self>
    where
        C: Into<ConnectOptions>,
    {
        let db = Database::connect(url)
            .await
            .context("failed to connect to the time-series store")?;

        Migrator::up(&db, None)
            .await
            .context("measurement schema migration failed")?;

        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub(crate) async fn with_deadline<T, F>(fut: F) -> anyhow::Result<T>
where
    F: Future<Output = Result<T, DbErr>>,
{
    let result = tokio::time::timeout(STORE_DEADLINE, fut)
        .await
        .context("store operation timed out")?;
    Ok(result?)
}
