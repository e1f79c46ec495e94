use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

/// Business policy knobs for the booking lifecycle.
#[derive(Debug, Deserialize, Clone)]
pub struct PolicyConfig {
    #[serde(default = "default_cancellation_hours")]
    pub default_cancellation_hours: i32,
    #[serde(default = "default_reminder_hours_min")]
    pub reminder_hours_min: i64,
    #[serde(default = "default_reminder_hours_max")]
    pub reminder_hours_max: i64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_cancellation_hours: default_cancellation_hours(),
            reminder_hours_min: default_reminder_hours_min(),
            reminder_hours_max: default_reminder_hours_max(),
        }
    }
}

fn default_cancellation_hours() -> i32 {
    24
}
fn default_reminder_hours_min() -> i64 {
    23
}
fn default_reminder_hours_max() -> i64 {
    25
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotifyConfig {
    /// Webhook receiving reminder payloads; None disables delivery.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific overrides, optional.
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // GLINT__SERVER__PORT=9000 style environment overrides.
            .add_source(config::Environment::with_prefix("GLINT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
