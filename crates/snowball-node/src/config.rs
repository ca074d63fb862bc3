//! Node configuration types.

use serde::{Deserialize, Serialize};
use snowball_consensus::EngineConfig;
use snowball_p2p::{TcpConfig, TerminationConfig, Timeouts};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`NodeConfig`].
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// The file that was parsed.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a Snowball node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Host every peer listens on.
    pub host: IpAddr,
    /// This node's listen port.
    pub port: u16,
    /// First peer port (inclusive).
    pub min_port: u16,
    /// End of the peer port range (exclusive).
    pub max_port: u16,

    /// Folder receiving the decided sequences.
    pub folder: PathBuf,
    /// Sub-folder of this run. Drawn at random when absent.
    pub run_name: Option<String>,

    /// Number of indices to decide.
    pub n: usize,
    /// Peers sampled per round.
    pub k: usize,
    /// Quorum threshold.
    pub alpha: usize,
    /// Finality threshold.
    pub beta: u64,

    /// RNG seed. Drawn from the OS when absent.
    pub seed: Option<u64>,

    /// Connection timeout, in milliseconds.
    pub dial_timeout_ms: u64,
    /// Request/response timeout, in milliseconds.
    pub io_timeout_ms: u64,
    /// Pause between two decision attempts, in milliseconds.
    pub round_delay_ms: u64,
    /// Pause between two termination probes of a peer, in milliseconds.
    pub poll_interval_ms: u64,
    /// Upper bound on the termination sweep, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 60000,
            min_port: 60000,
            max_port: 60200,
            folder: PathBuf::from("storage"),
            run_name: None,
            n: 10,
            k: 4,
            alpha: 3,
            beta: 5,
            seed: None,
            dial_timeout_ms: 500,
            io_timeout_ms: 2_000,
            round_delay_ms: 1_000,
            poll_interval_ms: 1_000,
            shutdown_timeout_ms: 120_000,
        }
    }
}

impl NodeConfig {
    /// Loads a configuration from a YAML file.
    ///
    /// Keys missing from the file keep their default value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.n == 0 {
            return Err(ConfigError::Invalid("n must be at least 1".into()));
        }
        if self.min_port >= self.max_port {
            return Err(ConfigError::Invalid(format!(
                "empty port range {}..{}",
                self.min_port, self.max_port
            )));
        }
        if !(self.min_port..self.max_port).contains(&self.port) {
            return Err(ConfigError::Invalid(format!(
                "port {} outside {}..{}",
                self.port, self.min_port, self.max_port
            )));
        }
        if let Some(run) = &self.run_name {
            if run.is_empty() || !run.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Invalid(format!(
                    "run name {run:?} must be non-empty and alphanumeric"
                )));
            }
        }
        for (name, ms) in [
            ("dial_timeout_ms", self.dial_timeout_ms),
            ("io_timeout_ms", self.io_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("shutdown_timeout_ms", self.shutdown_timeout_ms),
        ] {
            if ms == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// Returns the consensus thresholds.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            k: self.k,
            alpha: self.alpha,
            beta: self.beta,
        }
    }

    /// Returns the TCP transport settings.
    pub fn tcp(&self) -> TcpConfig {
        TcpConfig {
            host: self.host,
            port: self.port,
            min_port: self.min_port,
            max_port: self.max_port,
            timeouts: Timeouts {
                dial: Duration::from_millis(self.dial_timeout_ms),
                io: Duration::from_millis(self.io_timeout_ms),
            },
        }
    }

    /// Returns the termination sweep settings.
    pub fn termination(&self) -> TerminationConfig {
        TerminationConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_millis(self.shutdown_timeout_ms),
        }
    }

    /// Returns the pause between decision attempts.
    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }
}
