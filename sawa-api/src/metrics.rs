use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::{error::AppError, state::AppState};

/// Marketplace counters, exposed in Prometheus text format on `/metrics`
pub struct Metrics {
    registry: Registry,
    pub bookings_created: IntCounterVec,
    pub offers_submitted: IntCounter,
    pub offers_accepted: IntCounter,
    pub cancellations: IntCounterVec,
    pub bookings_expired: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("sawa".to_string()), None)?;

        let bookings_created = IntCounterVec::new(
            Opts::new("bookings_created_total", "Bookings created, by kind"),
            &["kind"],
        )?;
        let offers_submitted = IntCounter::new("offers_submitted_total", "Offers submitted by hosts")?;
        let offers_accepted = IntCounter::new("offers_accepted_total", "Offers accepted")?;
        let cancellations = IntCounterVec::new(
            Opts::new("cancellations_total", "Cancellation requests, by outcome"),
            &["outcome"],
        )?;
        let bookings_expired = IntCounter::new("bookings_expired_total", "Pending bookings expired by the sweep")?;

        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(offers_submitted.clone()))?;
        registry.register(Box::new(offers_accepted.clone()))?;
        registry.register(Box::new(cancellations.clone()))?;
        registry.register(Box::new(bookings_expired.clone()))?;

        Ok(Self {
            registry,
            bookings_created,
            offers_submitted,
            offers_accepted,
            cancellations,
            bookings_expired,
        })
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(scrape))
}

async fn scrape(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::InternalServerError(format!("Metrics encoding failed: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())], body))
}
