//! DigiSewa Database Library
//!
//! sqlx/Postgres implementations of the persistence seams defined in
//! `digisewa-core::records`, plus pool construction and migrations.

pub mod db;

pub use db::audit::PgAuditLog;
pub use db::documents::PgDocumentRepository;

use digisewa_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Connect to Postgres and run pending migrations.
pub async fn connect_and_migrate(config: &Config) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
