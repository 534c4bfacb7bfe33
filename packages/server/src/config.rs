//! Server configuration from environment variables.

use std::path::PathBuf;

use hotspot_map_dataset::paths;

/// Startup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`, default `127.0.0.1`).
    pub bind_addr: String,
    /// Port to bind (`PORT`, default `8080`).
    pub port: u16,
    /// Location table (`HOTSPOT_DATA_PATH`).
    pub data_path: PathBuf,
    /// Exported model (`HOTSPOT_MODEL_PATH`).
    pub model_path: PathBuf,
    /// Static asset directory (`HOTSPOT_STATIC_DIR`).
    pub static_dir: PathBuf,
    /// Classification config (`HOTSPOT_CONFIG_PATH`); embedded default
    /// when unset.
    pub config_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            data_path: paths::default_csv_path(),
            model_path: paths::default_model_path(),
            static_dir: paths::static_dir(),
            config_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// Unparseable ports fall back to the default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_path: lookup("HOTSPOT_DATA_PATH").map_or(defaults.data_path, PathBuf::from),
            model_path: lookup("HOTSPOT_MODEL_PATH").map_or(defaults.model_path, PathBuf::from),
            static_dir: lookup("HOTSPOT_STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
            config_path: lookup("HOTSPOT_CONFIG_PATH").map(PathBuf::from),
        }
    }
}
