//! Configuration for the neobridge MCP server.

use serde::Deserialize;

/// Bridge-level configuration.
///
/// Loaded from `neobridge.toml` `[bridge]` section or `NEOBRIDGE__BRIDGE__`
/// environment variables, once at startup; immutable thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Reject mutating statements passed through `execute_query`.
    #[serde(default)]
    pub read_only: bool,

    /// Hard wall-clock deadline per invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub query_timeout_secs: u64,

    /// `find_nodes` row cap when the caller supplies no limit.
    #[serde(default = "default_find_limit")]
    pub default_find_limit: i64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_find_limit() -> i64 {
    100
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            query_timeout_secs: default_timeout_secs(),
            default_find_limit: default_find_limit(),
        }
    }
}

impl BridgeConfig {
    /// Load from `<file_prefix>.toml` plus `NEOBRIDGE__BRIDGE__*`
    /// environment variables. The shared `NEOBRIDGE` prefix with `__`
    /// separator maps `NEOBRIDGE__BRIDGE__READ_ONLY` onto
    /// `bridge.read_only`.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("NEOBRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_loaded(&cfg)
    }

    /// An absent `[bridge]` section falls back to defaults; a malformed
    /// one is an error, never a silent default.
    fn from_loaded(cfg: &config::Config) -> Result<Self, config::ConfigError> {
        match cfg.get::<Self>("bridge") {
            Ok(c) => Ok(c),
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}
