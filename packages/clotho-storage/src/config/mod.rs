//! Store configuration
//!
//! Configuration comes from three places, later ones winning:
//! - `StoreConfig::default()` (SQLite file `clotho.db`, 1024 resolver hops)
//! - a versioned YAML file (`StoreConfig::from_yaml`)
//! - `CLOTHO_*` environment variables (`apply_env_overrides`)
//!
//! # Examples
//!
//! ```rust,ignore
//! use clotho_storage::config::StoreConfig;
//!
//! let config = StoreConfig::from_yaml("clotho.yaml")?.apply_env_overrides()?;
//! let store = clotho_storage::infrastructure::connect(&config)?;
//! ```
//!
//! ```yaml
//! version: 1
//! backend: sqlite
//! sqlite:
//!   path: /var/lib/clotho/clotho.db
//! resolver:
//!   max_hops: 1024
//! ```

pub mod error;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::{ConfigError, ConfigResult};

/// Schema versions this build understands
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

pub const ENV_BACKEND: &str = "CLOTHO_BACKEND";
pub const ENV_DB_PATH: &str = "CLOTHO_DB_PATH";
pub const ENV_MAX_HOPS: &str = "CLOTHO_MAX_HOPS";

const MAX_HOPS_LIMIT: usize = 1_000_000;

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process-local, nothing persisted
    Memory,
    /// Embedded SQLite database file
    Sqlite,
}

impl Backend {
    pub fn parse(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::Sqlite
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Database file (created if missing)
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Upper bound on store lookups for one chain walk
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
}

fn default_max_hops() -> usize {
    1024
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
        }
    }
}

/// Validated store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: Backend,
    pub sqlite: Option<SqliteConfig>,
    pub resolver: ResolverConfig,
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    #[serde(default)]
    version: Option<u32>,

    #[serde(default)]
    backend: Backend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    sqlite: Option<SqliteConfig>,

    #[serde(default)]
    resolver: ResolverConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            sqlite: Some(SqliteConfig {
                path: PathBuf::from("clotho.db"),
            }),
            resolver: ResolverConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Process-local store, nothing persisted
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            sqlite: None,
            resolver: ResolverConfig::default(),
        }
    }

    /// SQLite store at `path`
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Sqlite,
            sqlite: Some(SqliteConfig { path: path.into() }),
            resolver: ResolverConfig::default(),
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.resolver.max_hops = max_hops;
        self
    }

    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(text)?;

        match file.version {
            None => return Err(ConfigError::MissingVersion),
            Some(found) if !SUPPORTED_VERSIONS.contains(&found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                })
            }
            Some(_) => {}
        }

        let config = Self {
            backend: file.backend,
            sqlite: file.sqlite,
            resolver: file.resolver,
        };
        config.validate()?;
        Ok(config)
    }

    /// Export as YAML schema v1
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            backend: self.backend,
            sqlite: self.sqlite.clone(),
            resolver: self.resolver.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Apply `CLOTHO_BACKEND`, `CLOTHO_DB_PATH` and `CLOTHO_MAX_HOPS`
    pub fn apply_env_overrides(self) -> ConfigResult<Self> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        if let Some(raw) = lookup(ENV_BACKEND) {
            self.backend = Backend::parse(&raw)?;
        }

        if let Some(raw) = lookup(ENV_DB_PATH) {
            self.sqlite = Some(SqliteConfig {
                path: PathBuf::from(raw),
            });
        }

        if let Some(raw) = lookup(ENV_MAX_HOPS) {
            self.resolver.max_hops = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_MAX_HOPS.to_string(),
                value: raw.clone(),
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Range checks and backend/section consistency
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolver.max_hops == 0 || self.resolver.max_hops > MAX_HOPS_LIMIT {
            return Err(ConfigError::range_with_hint(
                "resolver.max_hops",
                self.resolver.max_hops,
                1,
                MAX_HOPS_LIMIT,
                "Version chains rarely exceed a few hundred revisions; 1024 is the default.",
            ));
        }

        if self.backend == Backend::Sqlite && self.sqlite.is_none() {
            return Err(ConfigError::MissingSection {
                backend: self.backend.to_string(),
                section: "sqlite".to_string(),
            });
        }

        Ok(())
    }
}
