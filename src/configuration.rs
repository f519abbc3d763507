use chrono::Duration;
use secrecy::{ExposeSecret, Secret};

/// Longest lifetime an access token may be configured with (one hour)
const MAX_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;
/// Longest lifetime a refresh token may be configured with (about ten years)
const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    Production,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub platform: Platform,
    /// Directory served under `/app`
    pub static_dir: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name
        ))
    }
}

/// Session and credential settings.
///
/// Secrets are read once at start-up and never change afterwards.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthSettings {
    /// HMAC key for access tokens
    pub jwt_secret: Secret<String>,
    /// Shared key expected from the billing webhook (`Authorization: ApiKey <key>`)
    pub polka_key: Secret<String>,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_days: i64,
    pub hashing: HashingSettings,
}

impl AuthSettings {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_ttl_seconds)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_ttl_days)
    }
}

/// Argon2id cost parameters plus the cap on concurrent hash operations.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct HashingSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub max_concurrent: usize,
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let auth = &self.auth;

        if auth.jwt_secret.expose_secret().is_empty() {
            return Err(SettingsError::Invalid("auth.jwt_secret is empty".to_string()));
        }
        if auth.polka_key.expose_secret().is_empty() {
            return Err(SettingsError::Invalid("auth.polka_key is empty".to_string()));
        }
        if !(1..=MAX_ACCESS_TOKEN_TTL_SECONDS).contains(&auth.access_token_ttl_seconds) {
            return Err(SettingsError::Invalid(format!(
                "auth.access_token_ttl_seconds must be between 1 and {}",
                MAX_ACCESS_TOKEN_TTL_SECONDS
            )));
        }
        if !(1..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&auth.refresh_token_ttl_days) {
            return Err(SettingsError::Invalid(format!(
                "auth.refresh_token_ttl_days must be between 1 and {}",
                MAX_REFRESH_TOKEN_TTL_DAYS
            )));
        }
        if auth.hashing.max_concurrent == 0 {
            return Err(SettingsError::Invalid(
                "auth.hashing.max_concurrent must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load `configuration.yaml` (if present) overlaid with `APP__*` environment variables,
/// e.g. `APP__AUTH__JWT_SECRET`.
pub fn get_configuration() -> Result<Settings, SettingsError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
