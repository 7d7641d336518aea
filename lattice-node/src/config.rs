//! Node configuration
//!
//! Options come from command-line flags with `LATTICE_*` environment
//! fallbacks and are validated before the node starts.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::time::Duration;

/// Scheme used to reach the job server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "lattice-node")]
#[command(about = "Lattice compute-grid worker node", long_about = None)]
pub struct NodeArgs {
    /// Machine identity override (defaults to the host name)
    #[arg(long, env = "LATTICE_NODE_ID")]
    pub id: Option<String>,

    /// Job server host name
    #[arg(long, env = "LATTICE_HOST", default_value = "localhost")]
    pub host: String,

    /// Job server protocol
    #[arg(long, env = "LATTICE_PROTOCOL", value_enum, default_value_t = Protocol::Http)]
    pub protocol: Protocol,

    /// Job server port
    #[arg(long, env = "LATTICE_PORT")]
    pub port: Option<u16>,

    /// Path prefix of the job server API (e.g. "/api")
    #[arg(long, env = "LATTICE_BASE_PATH")]
    pub base_path: Option<String>,

    /// Polling interval in milliseconds
    #[arg(long, env = "LATTICE_LOOP_INTERVAL_MS", default_value_t = 1000)]
    pub loop_interval_ms: u64,

    /// Render every log record, including traces
    #[arg(long, env = "LATTICE_VERBOSE")]
    pub verbose: bool,

    /// Ask models to include their full execution trace in results
    #[arg(long, env = "LATTICE_SAVE_FULL_TRACE")]
    pub save_full_trace: bool,

    /// Print a progress marker every N trace records in quiet mode (<= 0 disables)
    #[arg(
        long,
        env = "LATTICE_PROGRESS_EVERY",
        default_value_t = 1000,
        allow_negative_numbers = true
    )]
    pub progress_every: i64,

    /// Capacity of the log broadcast buffer
    #[arg(long, env = "LATTICE_LOG_CAPACITY", default_value_t = 1024)]
    pub log_capacity: usize,

    /// HTTP request timeout in seconds
    #[arg(long, env = "LATTICE_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl NodeArgs {
    pub fn into_config(self) -> NodeConfig {
        NodeConfig {
            id: self.id,
            host: self.host,
            protocol: self.protocol,
            port: self.port,
            base_path: self.base_path,
            loop_interval: Duration::from_millis(self.loop_interval_ms),
            verbose: self.verbose,
            save_full_trace: self.save_full_trace,
            progress_every: self.progress_every,
            log_capacity: self.log_capacity,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Machine identity override
    pub id: Option<String>,

    pub host: String,

    pub protocol: Protocol,

    pub port: Option<u16>,

    pub base_path: Option<String>,

    /// Period of the polling clock
    pub loop_interval: Duration,

    pub verbose: bool,

    pub save_full_trace: bool,

    /// Quiet-mode trace marker period
    pub progress_every: i64,

    pub log_capacity: usize,

    pub request_timeout: Duration,
}

impl NodeConfig {
    /// Creates a configuration with defaults for everything but the host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            id: None,
            host: host.into(),
            protocol: Protocol::Http,
            port: None,
            base_path: None,
            loop_interval: Duration::from_secs(1),
            verbose: false,
            save_full_trace: false,
            progress_every: 1000,
            log_capacity: 1024,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Base URL of the job server API
    pub fn server_url(&self) -> String {
        let mut url = format!("{}://{}", self.protocol, self.host);

        if let Some(port) = self.port {
            url.push_str(&format!(":{}", port));
        }

        if let Some(path) = self
            .base_path
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
        {
            url.push('/');
            url.push_str(path);
        }

        url
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("host cannot be empty");
        }

        if self.host.contains("://") {
            anyhow::bail!("host must not include a scheme; use --protocol instead");
        }

        if let Some(path) = &self.base_path {
            if path.contains('?') || path.contains('#') {
                anyhow::bail!("base_path must not contain a query or fragment");
            }
        }

        if self.loop_interval.is_zero() {
            anyhow::bail!("loop interval must be greater than 0");
        }

        if self.log_capacity == 0 {
            anyhow::bail!("log_capacity must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}
