use redis::RedisResult;
use tracing::debug;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    /// Opening does not connect; the first command does.
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter: true while `key` has seen at most `limit`
    /// hits in the current `window_seconds`.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        if count > limit {
            debug!("Rate limit hit for {} ({} > {})", key, count, limit);
        }
        Ok(count <= limit)
    }
}

pub fn rate_limit_key(client: &str) -> String {
    format!("sawa:ratelimit:{}", client)
}
