use serde::Deserialize;

/// Bus connection and subject settings shared by every bus-bound service.
#[derive(Debug, Deserialize, Clone)]
pub struct MqAppConfig {
    /// Redis connection URL. Default: "redis://localhost:6379".
    #[serde(default = "default_mq_url")]
    pub url: String,
    /// Connection pool size. Default: 5.
    #[serde(default = "default_mq_pool_size")]
    pub pool_size: u8,
    /// Prefix owned by the deployment; subjects are `<prefix>.<verb>`. Default: "datacenter".
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// Concurrent handlers per subject. Default: 4.
    #[serde(default = "default_mq_concurrency")]
    pub concurrency: usize,
    /// Attempts to reach the broker at startup, 0 means forever. Default: 0.
    #[serde(default)]
    pub max_connect_attempts: u32,
    /// Fixed delay between broker connection attempts. Default: 2000.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_mq_url() -> String {
    "redis://localhost:6379".into()
}
fn default_mq_pool_size() -> u8 {
    5
}
fn default_subject_prefix() -> String {
    "datacenter".into()
}
fn default_mq_concurrency() -> usize {
    4
}
pub fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for MqAppConfig {
    fn default() -> Self {
        Self {
            url: default_mq_url(),
            pool_size: default_mq_pool_size(),
            subject_prefix: default_subject_prefix(),
            concurrency: default_mq_concurrency(),
            max_connect_attempts: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}
