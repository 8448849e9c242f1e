//! Daemon configuration.
//!
//! Read from `habridge.toml` in the working directory, or from the file named
//! by `HABRIDGE_CONFIG`. The file is optional and every key has a default.
//! `HABRIDGE_*` environment variables are applied on top of the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use habridge_adapter_mqtt::MqttConfig;
use habridge_app::config::BridgeConfig;

const DEFAULT_PATH: &str = "habridge.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub mqtt: MqttConfig,
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Where the inspection/write API listens.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

/// Backing store for the host object model and the bridge attributes.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite:habridge.db?mode=rwc`.
    pub url: String,
    /// Name of the bridge instance owning the persisted entity map. Two
    /// bridges sharing a database need distinct instances.
    pub instance: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives.
    pub filter: String,
}

impl Config {
    /// Read the config file if there is one, apply environment overrides and
    /// validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when the merged configuration is unusable.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("HABRIDGE_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from);
        let mut config = Self::read(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.check()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        fn parsed<V: FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<V> {
            env(key).and_then(|raw| raw.trim().parse().ok())
        }

        if let Some(host) = env("HABRIDGE_HOST") {
            self.http.host = host;
        }
        if let Some(port) = parsed(&env, "HABRIDGE_PORT") {
            self.http.port = port;
        }
        if let Some(bind) = env("HABRIDGE_BIND")
            && let Some((host, port)) = bind.rsplit_once(':')
            && let Ok(port) = port.parse()
        {
            self.http.host = host.to_string();
            self.http.port = port;
        }

        if let Some(url) = env("HABRIDGE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(instance) = env("HABRIDGE_INSTANCE") {
            self.database.instance = instance;
        }

        if let Some(base) = env("HABRIDGE_BASE_TOPIC") {
            self.bridge.base_topic = base;
        }
        if let Some(classes) = env("HABRIDGE_DEVICE_CLASSES") {
            self.bridge.device_classes = BridgeConfig::parse_whitelist(&classes);
        }
        if let Some(retain) = parsed(&env, "HABRIDGE_PUBLISH_RETAIN") {
            self.bridge.publish_retain = retain;
        }

        if let Some(host) = env("HABRIDGE_MQTT_HOST") {
            self.mqtt.broker_host = host;
        }
        if let Some(port) = parsed(&env, "HABRIDGE_MQTT_PORT") {
            self.mqtt.broker_port = port;
        }
        if let Some(client_id) = env("HABRIDGE_MQTT_CLIENT_ID") {
            self.mqtt.client_id = client_id;
        }
        if let Some(username) = env("HABRIDGE_MQTT_USERNAME") {
            self.mqtt.username = Some(username);
        }
        if let Some(password) = env("HABRIDGE_MQTT_PASSWORD") {
            self.mqtt.password = Some(password);
        }

        // RUST_LOG wins over HABRIDGE_LOG.
        if let Some(filter) = env("RUST_LOG").or_else(|| env("HABRIDGE_LOG")) {
            self.logging.filter = filter;
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Invalid("http.port must be non-zero".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url is empty".into()));
        }
        if self.database.instance.trim().is_empty() {
            return Err(ConfigError::Invalid("database.instance is empty".into()));
        }
        self.bridge
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("bridge: {err}")))?;
        self.mqtt
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("mqtt: {err}")))
    }

    /// `host:port` for the HTTP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:habridge.db?mode=rwc".to_string(),
            instance: "default".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "habridged=info,habridge_app=info,habridge_adapter_mqtt=info,tower_http=debug"
                .to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
