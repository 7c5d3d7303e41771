use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Rpc {
    pub http_url: String,
    /// WebSocket endpoint for event subscriptions; without it the engine
    /// falls back to the polling backstop alone.
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default = "default_fresh_read_max_attempts")]
    pub fresh_read_max_attempts: u32,
    #[serde(default = "default_fresh_read_base_delay_ms")]
    pub fresh_read_base_delay_ms: u64,
}

fn default_fresh_read_max_attempts() -> u32 {
    3
}
fn default_fresh_read_base_delay_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct Contracts {
    pub marketplace: String,
    pub collection: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetadataSettings {
    #[serde(default = "default_gateway_base")]
    pub gateway_base: String,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_metadata_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_metadata_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_metadata_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_gateway_base() -> String {
    "https://ipfs.io/ipfs/".to_string()
}
fn default_max_in_flight() -> usize {
    4
}
fn default_min_spacing_ms() -> u64 {
    200
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_metadata_max_retries() -> u32 {
    2
}
fn default_metadata_retry_delay_ms() -> u64 {
    500
}
fn default_metadata_cache_capacity() -> usize {
    512
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            gateway_base: default_gateway_base(),
            max_in_flight: default_max_in_flight(),
            min_spacing_ms: default_min_spacing_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_metadata_max_retries(),
            retry_delay_ms: default_metadata_retry_delay_ms(),
            cache_capacity: default_metadata_cache_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Hydration {
    /// Small chunks bound peak concurrency against both the RPC endpoint and
    /// the metadata queue; latency is traded for reliability.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_inter_chunk_delay_ms")]
    pub inter_chunk_delay_ms: u64,
}

fn default_chunk_size() -> usize {
    2
}
fn default_inter_chunk_delay_ms() -> u64 {
    300
}

impl Default for Hydration {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            inter_chunk_delay_ms: default_inter_chunk_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Refresh {
    #[serde(default = "default_debounce_seconds")]
    pub debounce_seconds: u64,
    #[serde(default = "default_true")]
    pub enable_polling: bool,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
}

fn default_debounce_seconds() -> u64 {
    4
}
fn default_true() -> bool {
    true
}
fn default_poll_interval_seconds() -> u64 {
    120
}

impl Default for Refresh {
    fn default() -> Self {
        Self {
            debounce_seconds: default_debounce_seconds(),
            enable_polling: default_true(),
            poll_interval_seconds: default_poll_interval_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[default]
    #[serde(rename = "pretty")]
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Metrics {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9464
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub rpc: Rpc,
    pub contracts: Contracts,
    #[serde(default)]
    pub metadata: MetadataSettings,
    #[serde(default)]
    pub hydration: Hydration,
    #[serde(default)]
    pub refresh: Refresh,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub metrics: Metrics,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("Config.toml"))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Environment variable overrides for deployment without a config file edit
        if let Ok(url) = env::var("NFT_SDK_RPC_HTTP_URL") {
            if !url.trim().is_empty() {
                settings.rpc.http_url = url.trim().to_string();
            }
        }
        if let Ok(url) = env::var("NFT_SDK_RPC_WS_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                settings.rpc.ws_url = Some(trimmed.to_string());
            }
        }
        if let Ok(addr) = env::var("NFT_SDK_CONTRACTS_MARKETPLACE") {
            if !addr.trim().is_empty() {
                settings.contracts.marketplace = addr.trim().to_string();
            }
        }
        if let Ok(addr) = env::var("NFT_SDK_CONTRACTS_COLLECTION") {
            if !addr.trim().is_empty() {
                settings.contracts.collection = addr.trim().to_string();
            }
        }
        if let Ok(base) = env::var("NFT_SDK_METADATA_GATEWAY") {
            if !base.trim().is_empty() {
                settings.metadata.gateway_base = base.trim().to_string();
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_defaults_are_sane() {
        let hydration = Hydration::default();
        assert_eq!(hydration.chunk_size, 2);
        let refresh = Refresh::default();
        assert_eq!(refresh.debounce_seconds, 4);
        assert!(refresh.enable_polling);
        let metadata = MetadataSettings::default();
        assert_eq!(metadata.max_in_flight, 4);
        assert!(metadata.gateway_base.ends_with('/'));
    }
}
