use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Process-wide configuration for the binary.
///
/// Sources, later ones winning: built-in defaults, `config.toml`, then
/// `NRC_` environment variables with `__` as the section separator
/// (`NRC_STORAGE__BACKEND=sqlite`).
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| panic!("invalid configuration: {e}"))
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub followup: FollowupConfig,
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        let path = std::env::var("NRC_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("NRC_").split("__"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub loglevel: String,
    /// Guards the admin-only routes. Empty disables them.
    pub admin_key: String,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            admin_key: String::new(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding one CSV file per table.
    pub data_dir: PathBuf,
    pub database_url: String,
    /// Beds created in ward `general` when the bed table is empty.
    pub seed_beds: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Csv,
            data_dir: PathBuf::from("data"),
            database_url: "sqlite:data/nrc.sqlite".to_string(),
            seed_beds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub login_attempts_per_minute: u32,
    /// Creates an `admin` user at startup when no admin exists.
    pub bootstrap_admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_attempts_per_minute: 10,
            bootstrap_admin_password: None,
        }
    }
}

/// Post-discharge follow-up schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowupConfig {
    pub visits: u32,
    pub interval_days: u32,
}

impl Default for FollowupConfig {
    fn default() -> Self {
        Self {
            visits: 4,
            interval_days: 15,
        }
    }
}
