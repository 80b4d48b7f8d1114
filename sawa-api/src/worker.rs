use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};
use sawa_booking::BookingDesk;

use crate::metrics::Metrics;

/// Expires pending bookings whose start date has passed, once per tick.
pub async fn start_expiry_worker(desk: Arc<BookingDesk>, metrics: Arc<Metrics>, every_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(every_seconds.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Expiry worker started, sweeping every {}s", every_seconds);

    loop {
        ticker.tick().await;
        match desk.expire_stale(Utc::now().date_naive()).await {
            Ok(0) => {}
            Ok(expired) => metrics.bookings_expired.inc_by(expired as u64),
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}
