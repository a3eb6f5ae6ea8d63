use std::time::Duration;

pub use broccoli_queue::{
    brokers::broker::BrokerMessage,
    error::BroccoliError,
    queue::BroccoliQueue,
};
use common::retry::{RetryPolicy, retry_fixed};
use common::{BusReply, config::MqAppConfig};
use tracing::debug;

use crate::error::MqError;

pub type MqQueue = BroccoliQueue;

pub struct MqConfig {
    pub url: String,
    pub pool_size: u8,
}

impl From<&MqAppConfig> for MqConfig {
    fn from(config: &MqAppConfig) -> Self {
        Self {
            url: config.url.clone(),
            pool_size: config.pool_size,
        }
    }
}

pub async fn init_mq(config: &MqConfig) -> Result<MqQueue, MqError> {
    BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .build()
        .await
        .map_err(|e| MqError::Unavailable(e.to_string()))
}

/// Connect to the broker, retrying with the fixed delay from `config`.
pub async fn connect_with_retry(config: &MqAppConfig) -> Result<MqQueue, MqError> {
    let policy = RetryPolicy::new(
        config.max_connect_attempts,
        Duration::from_millis(config.retry_delay_ms),
    );
    let mq_config = MqConfig::from(config);

    retry_fixed(policy, "broker connection", || init_mq(&mq_config))
        .await
        .map_err(|e| e.into_last())
}

/// Publish a reply on the requester's queue.
pub async fn publish_reply(mq: &MqQueue, reply_to: &str, reply: &BusReply) -> Result<(), MqError> {
    debug!(reply_to, request_id = %reply.request_id, "Publishing reply");
    mq.publish(reply_to, None, reply, None).await?;
    Ok(())
}
