use crate::{Error, Result};

/// Default capacity of the delivery queue's bounded buffer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub openclaw: OpenClawConfig,
    pub queue: QueueConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    /// Bearer token required on inbound webhook requests. Auth is disabled
    /// when unset.
    pub webhook_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenClawConfig {
    pub base_url: String,
    pub token: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup, so tests can
    /// supply values without touching the process environment.
    fn from_env(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Config {
            server: ServerConfig {
                addr: var("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
                webhook_token: var("WEBHOOK_TOKEN").filter(|t| !t.is_empty()),
            },
            openclaw: OpenClawConfig {
                base_url: var("OPENCLAW_URL").unwrap_or_default(),
                token: var("OPENCLAW_TOKEN").unwrap_or_default(),
                model: var("OPENCLAW_MODEL").unwrap_or_else(|| "openclaw:main".to_string()),
            },
            queue: QueueConfig {
                capacity: var("QUEUE_CAPACITY")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            },
        };

        if config.openclaw.base_url.is_empty() {
            return Err(Error::Config("OPENCLAW_URL must be set".to_string()));
        }
        if config.openclaw.token.is_empty() {
            return Err(Error::Config("OPENCLAW_TOKEN must be set".to_string()));
        }
        if config.queue.capacity == 0 {
            return Err(Error::Config(
                "QUEUE_CAPACITY must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
                webhook_token: None,
            },
            openclaw: OpenClawConfig {
                base_url: "http://localhost:18789".to_string(),
                token: "".to_string(),
                model: "openclaw:main".to_string(),
            },
            queue: QueueConfig {
                capacity: DEFAULT_QUEUE_CAPACITY,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert!(config.server.webhook_token.is_none());
        assert_eq!(config.openclaw.model, "openclaw:main");
        assert_eq!(config.queue.capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn from_env_requires_openclaw_url() {
        let err = Config::from_env(|_| None).unwrap_err();
        assert!(err.to_string().contains("OPENCLAW_URL"));
    }

    #[test]
    fn from_env_applies_defaults_and_overrides() {
        let config = Config::from_env(|key| match key {
            "OPENCLAW_URL" => Some("http://openclaw:18789".to_string()),
            "OPENCLAW_TOKEN" => Some("secret".to_string()),
            "QUEUE_CAPACITY" => Some("25".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.openclaw.base_url, "http://openclaw:18789");
        assert_eq!(config.openclaw.model, "openclaw:main");
        assert_eq!(config.queue.capacity, 25);
    }
}

