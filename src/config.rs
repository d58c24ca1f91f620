use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

/// Runtime settings for the user store and the demo binary.
///
/// Sources, lowest priority first:
/// - built-in defaults
/// - `DB_URL`
/// - `DATABASE_URL`, `LOGLEVEL`, `MAX_CONNECTIONS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub loglevel: String,
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://users.db".to_string(),
            loglevel: "info".to_string(),
            max_connections: 5,
        }
    }
}

impl Config {
    /// Build the config from defaults and the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if `.env` files should be honoured.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["db_url"]).map(|_| "database_url".into()))
            .merge(Env::raw().only(&["database_url", "loglevel", "max_connections"]))
    }
}
