//! Command-line arguments.

use crate::config::{ConfigError, NodeConfig};
use clap::Parser;
use std::path::PathBuf;

/// Snowball Node - repeated-sampling consensus over a localhost port range
///
/// Flags override the values of the configuration file, which override the
/// built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "snowball-node")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// The listening port [default: 60000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// The minimum peer port [default: 60000]
    #[arg(long)]
    pub min_port: Option<u16>,

    /// The maximum peer port, exclusive [default: 60200]
    #[arg(long)]
    pub max_port: Option<u16>,

    /// The folder receiving final results [default: storage]
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Sub-folder of this run [default: random]
    #[arg(long)]
    pub run_name: Option<String>,

    /// Number of values to decide [default: 10]
    #[arg(short, long)]
    pub n: Option<usize>,

    /// Number of peers sampled per round [default: 4]
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Votes needed to win a round [default: 3]
    #[arg(short, long)]
    pub alpha: Option<usize>,

    /// Consecutive wins needed to decide [default: 5]
    #[arg(short, long)]
    pub beta: Option<u64>,

    /// RNG seed, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (pretty, json)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,
}

impl Cli {
    /// Builds the node configuration: defaults, then the file, then flags.
    pub fn resolve(&self) -> Result<NodeConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, mut config: NodeConfig) -> NodeConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(min_port) = self.min_port {
            config.min_port = min_port;
        }
        if let Some(max_port) = self.max_port {
            config.max_port = max_port;
        }
        if let Some(folder) = &self.folder {
            config.folder.clone_from(folder);
        }
        if self.run_name.is_some() {
            config.run_name.clone_from(&self.run_name);
        }
        if let Some(n) = self.n {
            config.n = n;
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(beta) = self.beta {
            config.beta = beta;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_without_flags() {
        let cli = Cli::parse_from(["snowball-node"]);
        assert_eq!(cli.resolve().unwrap(), NodeConfig::default());
    }

    #[test]
    fn short_flags() {
        let cli = Cli::parse_from([
            "snowball-node", "-p", "60010", "-n", "3", "-k", "6", "-a", "4", "-b", "2",
        ]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.port, 60010);
        assert_eq!(config.n, 3);
        assert_eq!(config.k, 6);
        assert_eq!(config.alpha, 4);
        assert_eq!(config.beta, 2);
    }

    #[test]
    fn flags_override_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: 60001\nk: 8\nalpha: 5").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["snowball-node", "--config", path, "--alpha", "7"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.port, 60001);
        assert_eq!(config.k, 8);
        assert_eq!(config.alpha, 7);
    }

    #[test]
    fn invalid_combinations_fail() {
        let cli = Cli::parse_from(["snowball-node", "-k", "2", "-a", "3"]);
        assert!(matches!(cli.resolve(), Err(ConfigError::Invalid(_))));

        let cli = Cli::parse_from(["snowball-node", "--min-port", "7000", "--max-port", "7000"]);
        assert!(cli.resolve().is_err());
    }
}
