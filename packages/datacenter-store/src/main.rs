use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use datacenter_store::config::AppConfig;
use datacenter_store::consumers::spawn_consumers;
use datacenter_store::crypto::CredentialCodec;
use datacenter_store::database;
use datacenter_store::models::SensitivityPolicy;
use datacenter_store::{DatacenterStore, Handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;
    let codec = CredentialCodec::from_secret(&config.crypto.key)
        .context("Invalid crypto.key, expected a 32-byte secret")?;
    let policy = SensitivityPolicy::from(&config.crypto);
    info!(
        encrypt_username = policy.encrypt_username,
        encrypt_password = policy.encrypt_password,
        "Credential policy loaded"
    );

    let db = database::connect_with_retry(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    let mq = Arc::new(
        mq::connect_with_retry(&config.mq)
            .await
            .context("Failed to initialize MQ")?,
    );
    info!(prefix = %config.mq.subject_prefix, "MQ connected");

    let handler = Arc::new(Handler::new(DatacenterStore::new(db, codec, policy)));
    let consumers = spawn_consumers(
        handler,
        mq,
        &config.mq.subject_prefix,
        config.mq.concurrency,
    );

    for result in futures::future::join_all(consumers).await {
        if let Err(e) = result {
            error!(error = %e, "Consumer task panicked");
        }
    }

    info!("All consumers stopped, shutting down");
    Ok(())
}
