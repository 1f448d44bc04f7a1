use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub lifecycle: LifecycleConfig,
    pub notifications: NotificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = LifecycleConfig::default();
        let conflict_retries = numeric_var("APP_CONFLICT_RETRIES", defaults.conflict_retries)?;
        let attempts = numeric_var("APP_PARENT_SYNC_ATTEMPTS", defaults.parent_sync.attempts)?;
        let backoff_ms = numeric_var(
            "APP_PARENT_SYNC_BACKOFF_MS",
            defaults.parent_sync.backoff.as_millis() as u64,
        )?;
        let reconcile_secs = numeric_var(
            "APP_RECONCILE_INTERVAL_SECS",
            defaults.reconcile_interval.as_secs(),
        )?;

        let buffer = numeric_var("APP_NOTIFICATION_BUFFER", NotificationConfig::default().buffer)?;
        if buffer == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "APP_NOTIFICATION_BUFFER",
                value: buffer.to_string(),
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            lifecycle: LifecycleConfig {
                conflict_retries,
                parent_sync: ParentSyncConfig {
                    attempts: attempts.max(1),
                    backoff: Duration::from_millis(backoff_ms),
                },
                reconcile_interval: Duration::from_secs(reconcile_secs),
            },
            notifications: NotificationConfig { buffer },
        })
    }
}

fn numeric_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the vacancy application lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// How many times a check-then-write sequence is replayed after losing a version race.
    pub conflict_retries: u32,
    pub parent_sync: ParentSyncConfig,
    /// Period of the background parent reconciliation pass. Zero disables it.
    pub reconcile_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            conflict_retries: 8,
            parent_sync: ParentSyncConfig::default(),
            reconcile_interval: Duration::from_secs(30),
        }
    }
}

/// Retry policy for the parent status write that follows an acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentSyncConfig {
    pub attempts: u32,
    /// Delay before the second attempt; doubles on each later attempt.
    pub backoff: Duration,
}

impl Default for ParentSyncConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// Sizing for the in-process notification fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    pub buffer: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { buffer: 64 }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
