use std::time::Duration;

use common::retry::{RetryPolicy, retry_fixed};
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::datacenter;
use crate::error::AppError;

pub const UNIQUE_INDEX: &str = "idx_datacenter_group_name_type";

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let timeout = Duration::from_secs(config.connect_timeout_secs);
    let mut opt = ConnectOptions::new(config.url.clone());

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("datacenter_store::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Connect and sync the schema, retrying with the configured fixed delay.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let policy = RetryPolicy::new(
        config.max_connect_attempts,
        Duration::from_millis(config.retry_delay_ms),
    );

    retry_fixed(policy, "database connection", || init_db(config))
        .await
        .map_err(|e| AppError::StorageUnavailable(e.to_string()))
}

/// Ensure the `(group_id, name, type)` unique index exists.
///
/// Schema sync creates tables and columns only, so composite indexes are
/// created here.
pub async fn ensure_indexes<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name(UNIQUE_INDEX)
        .table(datacenter::Entity)
        .col(datacenter::Column::GroupId)
        .col(datacenter::Column::Name)
        .col(datacenter::Column::Type)
        .to_string(PostgresQueryBuilder);

    db.execute_unprepared(&stmt).await?;
    info!("Ensured index {UNIQUE_INDEX} exists");
    Ok(())
}
