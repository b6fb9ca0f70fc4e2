//! Runtime configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. the Solana CLI config file (`~/.config/solana/cli/config.yml`)
//! 2. environment variables (`MINTER_*`, `HELIUS_*`, optionally from `.env`)
//! 3. command-line flags, applied by the CLI on top of [`MinterConfig`]

use std::path::{Path, PathBuf};
use std::time::Duration;

use minter_core::credentials::default_keypair_path;
use minter_core::PipelineConfig;
use minter_transport::network::{infer_cluster_from_url, resolve_rpc_endpoint};
use minter_transport::Cluster;
use minter_types::env_utils::{
    env_bool, env_millis_or, env_secs_or, env_var, env_var_or,
};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_COMMITMENT: &str = "confirmed";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Fields of the Solana CLI config this tool reads. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SolanaCliConfig {
    #[serde(default)]
    pub json_rpc_url: Option<String>,
    #[serde(default)]
    pub keypair_path: Option<String>,
    #[serde(default)]
    pub commitment: Option<String>,
}

impl SolanaCliConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("solana")
            .join("cli")
            .join("config.yml")
    })
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// `MINTER_COMMITMENT` beats the config file; both fall back to [`DEFAULT_COMMITMENT`].
fn commitment_from(env: Option<String>, file: Option<String>) -> String {
    env.or(file)
        .unwrap_or_else(|| DEFAULT_COMMITMENT.to_string())
}

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct MinterConfig {
    pub rpc_url: String,
    pub cluster: Option<Cluster>,
    pub keypair_path: Option<PathBuf>,
    pub commitment: String,
    pub inter_item_delay: Option<Duration>,
    pub activation_delay: Option<Duration>,
    pub max_attempts: Option<u32>,
    pub verify_limit: Option<usize>,
}

impl MinterConfig {
    /// Load the CLI config file (default location unless `path` is given) and
    /// layer environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => SolanaCliConfig::load(&path)?,
            None => SolanaCliConfig::default(),
        };
        Ok(Self::from_file(file))
    }

    pub fn from_file(file: SolanaCliConfig) -> Self {
        let rpc_url = resolve_rpc_endpoint(file.json_rpc_url.as_deref());
        let keypair_path = file
            .keypair_path
            .as_deref()
            .map(expand_tilde)
            .or_else(default_keypair_path);

        Self {
            cluster: infer_cluster_from_url(&rpc_url),
            rpc_url,
            keypair_path,
            commitment: commitment_from(env_var("MINTER_COMMITMENT"), file.commitment),
            inter_item_delay: env_var::<u64>("MINTER_INTER_ITEM_DELAY_MS").map(Duration::from_millis),
            activation_delay: env_var::<u64>("MINTER_ACTIVATION_DELAY_SECS").map(Duration::from_secs),
            max_attempts: env_var("MINTER_MAX_ATTEMPTS"),
            verify_limit: env_var("MINTER_VERIFY_LIMIT"),
        }
    }

    /// Apply environment-sourced overrides to a pipeline config.
    pub fn apply(&self, pipeline: &mut PipelineConfig) {
        if let Some(delay) = self.inter_item_delay {
            pipeline.inter_item_delay = delay;
        }
        if let Some(delay) = self.activation_delay {
            pipeline.activation_delay = delay;
        }
        if let Some(attempts) = self.max_attempts {
            pipeline.retry.max_attempts = attempts.max(1);
        }
        if let Some(limit) = self.verify_limit {
            pipeline.verify_limit = limit;
        }
        if env_bool("MINTER_SKIP_VERIFY") {
            pipeline.verify = false;
        }
        pipeline.retry.rate_limit_backoff =
            env_millis_or("MINTER_RATE_LIMIT_BACKOFF_MS", pipeline.retry.rate_limit_backoff);
        pipeline.retry.not_yet_active_delay =
            env_secs_or("MINTER_NOT_YET_ACTIVE_DELAY_SECS", pipeline.retry.not_yet_active_delay);
        pipeline.retry.max_backoff = Duration::from_millis(env_var_or(
            "MINTER_MAX_BACKOFF_MS",
            pipeline.retry.max_backoff.as_millis() as u64,
        ));
    }
}
