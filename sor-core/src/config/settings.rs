use serde::{Deserialize, Serialize};

use crate::routing::RoutingConfig;

/// Top-level service configuration, loaded via the `config` crate layered
/// over `.env` (`dotenvy`) and environment variables prefixed `SOR_`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
            routing: RoutingConfig::default(),
        }
    }
}

impl Settings {
    /// Load `.env` if present, then layer environment overrides
    /// (`SOR_SERVER__PORT`, `SOR_ROUTING__MAX_HOPS`, ...) onto the
    /// defaults. Missing `.env` is not an error.
    pub fn load() -> crate::utils::Result<Self> {
        let _ = dotenvy::dotenv();

        let figure = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default()).map_err(|e| {
                crate::utils::RouterError::ConfigError(format!("default config serialization: {e}"))
            })?)
            .add_source(
                config::Environment::with_prefix("SOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::utils::RouterError::ConfigError(e.to_string()))?;

        figure
            .try_deserialize()
            .map_err(|e| crate::utils::RouterError::ConfigError(e.to_string()))
    }
}
