/// All process configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
///
/// Per-invocation configuration (provider API key, supported pairs) lives in
/// the `system_config` table instead — see `RuntimeConfig`.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // HTTP surface
    pub port: u16,
    /// Shared secret required as `?key=` on the signals trigger endpoint.
    pub edge_secret_key: String,

    // Quote provider
    pub provider_base_url: String,

    // Pair metadata file path
    pub pairs_config_path: String,

    // In-process scheduler (0 = disabled, externally triggered only)
    pub signals_interval_secs: u64,
    pub indicators_interval_secs: u64,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            database_url: required_env("DATABASE_URL"),
            port: optional_env("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            edge_secret_key: required_env("EDGE_SECRET_KEY"),
            provider_base_url: optional_env("TWELVEDATA_BASE_URL")
                .unwrap_or_else(|| "https://api.twelvedata.com".to_string()),
            pairs_config_path: optional_env("PAIRS_CONFIG_PATH")
                .unwrap_or_else(|| "config/pairs.toml".to_string()),
            signals_interval_secs: optional_env("SIGNALS_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            indicators_interval_secs: optional_env("INDICATORS_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
