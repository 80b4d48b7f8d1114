use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_platform_fee_bps")]
    pub platform_fee_bps: u32,
    #[serde(default = "default_office_fee_bps")]
    pub office_fee_bps: u32,
    #[serde(default = "default_expiry_sweep_seconds")]
    pub expiry_sweep_seconds: u64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            platform_fee_bps: default_platform_fee_bps(),
            office_fee_bps: default_office_fee_bps(),
            expiry_sweep_seconds: default_expiry_sweep_seconds(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

fn default_platform_fee_bps() -> u32 { 1000 }
fn default_office_fee_bps() -> u32 { 500 }
fn default_expiry_sweep_seconds() -> u64 { 3600 }
fn default_rate_limit() -> i64 { 100 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    /// Enables POST /v1/auth/dev-token; never on in production
    #[serde(default)]
    pub allow_dev_tokens: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Without a URL the API runs on the in-memory store
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

/// Without a URL rate limiting is off
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// Without brokers lifecycle events are only broadcast in-process
#[derive(Debug, Deserialize, Clone, Default)]
pub struct KafkaConfig {
    pub brokers: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // SAWA__AUTH__JWT_SECRET=... sets auth.jwt_secret
            .add_source(config::Environment::with_prefix("SAWA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
