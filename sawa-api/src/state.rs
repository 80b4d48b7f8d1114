use std::sync::Arc;
use sawa_booking::BookingDesk;
use sawa_store::app_config::BusinessRules;
use sawa_store::RedisClient;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub allow_dev_tokens: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<BookingDesk>,
    /// Rate limiting is skipped without Redis
    pub redis: Option<Arc<RedisClient>>,
    pub metrics: Arc<Metrics>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
