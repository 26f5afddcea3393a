//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use service::{domain::session::Login, infra::postgres};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: Server,

    /// Service configuration.
    #[serde(default)]
    pub service: Service,

    /// Postgres configuration.
    #[serde(default)]
    pub postgres: Postgres,

    /// Log configuration.
    #[serde(default)]
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(SecretString::from("secret".to_owned()))]
    pub jwt_secret: SecretString,

    /// Duration a newly issued session stays valid for.
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub session_ttl: time::Duration,

    /// Credentials of the hotel staff.
    pub staff: Staff,
}

impl TryFrom<Service> for service::Config {
    type Error = ConfigError;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            jwt_secret,
            session_ttl,
            staff: Staff { login, password },
        } = value;

        let login = Login::new(login.as_str()).ok_or_else(|| {
            ConfigError::Message(format!(
                "`service.staff.login` is invalid: `{login}`",
            ))
        })?;

        let secret = jwt_secret.expose_secret().as_bytes();
        Ok(Self {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            session_ttl,
            staff: service::StaffCredentials { login, password },
        })
    }
}

/// Credentials of the hotel staff.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Staff {
    /// Login of the staff.
    #[default("admin".to_owned())]
    pub login: String,

    /// Password of the staff.
    #[default(SecretString::from("admin".to_owned()))]
    pub password: SecretString,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,

    /// Maximum time to wait for a free connection in the pool.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub pool_wait_timeout: time::Duration,

    /// Maximum time a single statement may run for.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub statement_timeout: time::Duration,
}

impl From<Postgres> for postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
            pool_wait_timeout,
            statement_timeout,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            options: Some(format!(
                "-c statement_timeout={}",
                statement_timeout.as_millis(),
            )),
            pool: Some(postgres::PoolConfig {
                timeouts: postgres::Timeouts {
                    wait: Some(pool_wait_timeout),
                    ..postgres::Timeouts::default()
                },
                ..postgres::PoolConfig::default()
            }),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use secrecy::ExposeSecret as _;

    use super::{Config, Postgres, Service};

    #[test]
    fn falls_back_to_defaults() {
        let conf = Config::new("non-existent.toml").unwrap();

        assert_eq!(conf.server.port, 8080);
        assert_eq!(conf.service.staff.login, "admin");
        assert_eq!(conf.service.session_ttl, Duration::from_secs(86_400));
        assert_eq!(conf.postgres.statement_timeout, Duration::from_secs(10));
    }

    #[test]
    fn builds_service_config() {
        let conf = service::Config::try_from(Service::default()).unwrap();

        assert_eq!(conf.staff.login.to_string(), "admin");
        assert_eq!(conf.staff.password.expose_secret(), "admin");
        assert_eq!(conf.session_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn rejects_blank_staff_login() {
        let mut conf = Service::default();
        conf.staff.login = "  ".to_owned();

        assert!(service::Config::try_from(conf).is_err());
    }

    #[test]
    fn passes_timeouts_to_pool() {
        let conf = service::infra::postgres::Config::from(Postgres::default());

        assert_eq!(conf.options.as_deref(), Some("-c statement_timeout=10000"));
        assert_eq!(
            conf.pool.unwrap().timeouts.wait,
            Some(Duration::from_secs(5)),
        );
    }
}
