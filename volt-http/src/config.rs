use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use volt_cache::CacheConfig;

/// Typed deployment configuration, loaded from YAML.
///
/// Every section and field has a default so a missing file or a partial
/// one still yields a runnable configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub flow: FlowSection,
    pub cache: CacheSection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address the HTTP listener binds to.
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8090".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FlowSection {
    /// Directory scanned for flow graph definitions at startup.
    pub graph_dir: String,
    /// How long an in-flight flow survives between requests.
    pub session_ttl_secs: u64,
}

impl Default for FlowSection {
    fn default() -> Self {
        Self {
            graph_dir: "graphs".into(),
            session_ttl_secs: 600,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_size: usize,
    pub cleanup_interval_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 600,
            max_size: 1000,
            cleanup_interval_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))
    }

    /// Resolve configuration for the server binary: the file named by
    /// `VOLT_CONFIG` (default `volt.yaml`) when present, defaults
    /// otherwise, with `VOLT_BIND` overriding the bind address.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("VOLT_CONFIG").unwrap_or_else(|_| "volt.yaml".into());
        let mut config = if Path::new(&path).exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        if let Ok(bind) = std::env::var("VOLT_BIND") {
            config.server.bind = bind;
        }
        Ok(config)
    }

    pub fn session_validity(&self) -> Duration {
        Duration::from_secs(self.flow.session_ttl_secs)
    }

    /// Project the cache section onto the L1 cache's own config type.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.cache.enabled,
            ttl: Duration::from_secs(self.cache.ttl_secs),
            max_size: self.cache.max_size,
            cleanup_interval: Duration::from_secs(self.cache.cleanup_interval_secs),
        }
    }
}

/// Configuration loading errors; fatal at startup.
#[derive(Debug)]
pub enum ConfigError {
    Load(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "cannot read configuration: {msg}"),
            ConfigError::Parse(msg) => write!(f, "cannot parse configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
