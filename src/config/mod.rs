//! Configuration management for the maker exposure monitor.
//!
//! Loads settings from an optional `config` file and `MX_`-prefixed
//! environment variables (`MX_USER_ADDRESS`, `MX_SOURCE__KIND`, ...).

use crate::exposure::{Address, PositionView};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account whose maker positions are reported
    #[serde(default)]
    pub user_address: String,
    /// Chain the markets live on
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Where snapshots come from
    #[serde(default)]
    pub source: SourceConfig,
    /// Update triggers
    #[serde(default)]
    pub watch: WatchConfig,
    /// Calculation settings
    #[serde(default)]
    pub exposure: ExposureConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    /// Snapshot file for the `file` source
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
    /// Base URL of the snapshot service for the `http` source
    #[serde(default)]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between polling refreshes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Websocket RPC endpoint for market log subscriptions (disabled if unset)
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Event signature hash to filter market logs on (all logs if unset)
    #[serde(default)]
    pub event_topic: Option<String>,
    /// Pending update signals buffered between triggers and the monitor
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Global position used for the skew: `next` (with pending) or `current`
    #[serde(default)]
    pub position_view: PositionView,
}

/// Supported chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Arbitrum,
    ArbitrumGoerli,
    ArbitrumSepolia,
    Base,
}

impl Chain {
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            42161 => Some(Chain::Arbitrum),
            421613 => Some(Chain::ArbitrumGoerli),
            421614 => Some(Chain::ArbitrumSepolia),
            8453 => Some(Chain::Base),
            _ => None,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Chain::Arbitrum => 42161,
            Chain::ArbitrumGoerli => 421613,
            Chain::ArbitrumSepolia => 421614,
            Chain::Base => 8453,
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self, Chain::ArbitrumGoerli | Chain::ArbitrumSepolia)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::Arbitrum => write!(f, "Arbitrum One"),
            Chain::ArbitrumGoerli => write!(f, "Arbitrum Goerli"),
            Chain::ArbitrumSepolia => write!(f, "Arbitrum Sepolia"),
            Chain::Base => write!(f, "Base"),
        }
    }
}

// Default value functions
fn default_chain_id() -> u64 {
    42161
}

fn default_source_kind() -> SourceKind {
    SourceKind::File
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/snapshot.json")
}

fn default_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    60
}

fn default_channel_capacity() -> usize {
    16
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("MX")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Parsed user address.
    pub fn user(&self) -> Result<Address> {
        self.user_address
            .parse::<Address>()
            .map_err(|e| anyhow::anyhow!("Invalid user_address: {e}"))
    }

    pub fn chain(&self) -> Result<Chain> {
        Chain::from_id(self.chain_id)
            .with_context(|| format!("Unsupported chain id {}", self.chain_id))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.user_address.is_empty(),
            "Missing user address configuration"
        );
        self.user()?;
        self.chain()?;

        match self.source.kind {
            SourceKind::File => anyhow::ensure!(
                !self.source.path.as_os_str().is_empty(),
                "source.path must be set for the file source"
            ),
            SourceKind::Http => anyhow::ensure!(
                self.source.url.starts_with("http://") || self.source.url.starts_with("https://"),
                "source.url must be an http(s) URL for the http source"
            ),
        }

        anyhow::ensure!(self.source.timeout_secs > 0, "source.timeout_secs must be > 0");
        anyhow::ensure!(
            self.watch.poll_interval_secs > 0,
            "watch.poll_interval_secs must be > 0"
        );
        anyhow::ensure!(
            self.watch.channel_capacity > 0,
            "watch.channel_capacity must be > 0"
        );

        if let Some(url) = &self.watch.ws_url {
            anyhow::ensure!(
                url.starts_with("ws://") || url.starts_with("wss://"),
                "watch.ws_url must be a ws(s) URL"
            );
        }

        if let Some(topic) = &self.watch.event_topic {
            let digits = topic.strip_prefix("0x").unwrap_or_default();
            anyhow::ensure!(
                digits.len() == 64 && hex::decode(digits).is_ok(),
                "watch.event_topic must be a 0x-prefixed 32-byte hash"
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_address: String::new(),
            chain_id: default_chain_id(),
            source: SourceConfig::default(),
            watch: WatchConfig::default(),
            exposure: ExposureConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            path: default_snapshot_path(),
            url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            ws_url: None,
            event_topic: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}
