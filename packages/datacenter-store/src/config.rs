use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::MqAppConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Attempts to reach the database at startup, 0 means forever.
    #[serde(default)]
    pub max_connect_attempts: u32,
    #[serde(default = "common::config::default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_timeout_secs() -> u64 {
    8
}

/// Credential encryption settings.
///
/// `key` has no default: a deployment without a secret must not start.
#[derive(Deserialize, Clone)]
pub struct CryptoConfig {
    pub key: String,
    /// Store `username` as ciphertext. Default: false.
    #[serde(default)]
    pub encrypt_username: bool,
    /// Store `password` as ciphertext. Default: true.
    #[serde(default = "default_encrypt_password")]
    pub encrypt_password: bool,
}

fn default_encrypt_password() -> bool {
    true
}

impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("key", &"[REDACTED]")
            .field("encrypt_username", &self.encrypt_username)
            .field("encrypt_password", &self.encrypt_password)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub crypto: CryptoConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("DATACENTER_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("database.url", "postgres://postgres@127.0.0.1/datacenters")?
            .set_default("mq.subject_prefix", "datacenter")?
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., DATACENTER__CRYPTO__KEY)
            .add_source(Environment::with_prefix("DATACENTER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
