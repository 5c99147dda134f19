use tracing::Level;

/// Failures while resolving startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Endpoint used when neither the command line nor the environment
/// names one.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:3000/ws";

/// Environment variable naming the conversation endpoint.
pub const ENDPOINT_VAR: &str = "VOICEWIRE_WS_ENDPOINT";

/// Holds all configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub endpoint: String,
    pub log_level: Level,
}

impl Config {
    /// Resolves configuration from an optional explicit endpoint and
    /// the environment.
    ///
    /// Endpoint precedence: explicit argument, then `VOICEWIRE_WS_ENDPOINT`,
    /// then the built-in default.
    pub fn load(endpoint_arg: Option<String>) -> Result<Self, ConfigError> {
        // Tests manage their environment themselves; read .env only outside them
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let endpoint = endpoint_arg
            .or_else(|| std::env::var(ENDPOINT_VAR).ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let level_raw = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = level_raw.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{level_raw}' is not a valid log level"),
            )
        })?;

        Ok(Self { endpoint, log_level })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var(ENDPOINT_VAR);
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    #[serial]
    fn test_defaults_apply_without_environment() {
        clear_env_vars();

        let config = Config::load(None).expect("config should resolve");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_default_endpoint() {
        clear_env_vars();
        unsafe {
            env::set_var(ENDPOINT_VAR, "wss://agent.example.com/ws");
        }

        let config = Config::load(None).expect("config should resolve");
        assert_eq!(config.endpoint, "wss://agent.example.com/ws");
    }

    #[test]
    #[serial]
    fn test_explicit_argument_wins_over_environment() {
        clear_env_vars();
        unsafe {
            env::set_var(ENDPOINT_VAR, "wss://agent.example.com/ws");
        }

        let config = Config::load(Some("ws://localhost:9000/ws".to_string()))
            .expect("config should resolve");
        assert_eq!(config.endpoint, "ws://localhost:9000/ws");
    }

    #[test]
    #[serial]
    fn test_log_level_parsed_from_environment() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::load(None).expect("config should resolve");
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_invalid_log_level_is_rejected() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::load(None).unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
        }
    }
}
