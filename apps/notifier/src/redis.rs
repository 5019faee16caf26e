use redis::Client;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{info, warn};

/// Connect to Redis and return a ConnectionManager.
///
/// The ConnectionManager handles reconnection on its own once the
/// initial connection succeeds; the PING verifies the server is
/// actually reachable before startup continues.
pub async fn connect(url: &str) -> redis::RedisResult<ConnectionManager> {
    info!("Attempting to connect to Redis at {}", url);

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// Connect to Redis with exponential-backoff retry.
///
/// Useful for handling transient network issues during startup, e.g.
/// when Redis comes up alongside this service in the same deployment.
pub async fn connect_with_retry(
    url: &str,
    max_retries: u32,
) -> redis::RedisResult<ConnectionManager> {
    let mut attempt = 0;
    let mut delay = Duration::from_millis(100);

    loop {
        match connect(url).await {
            Ok(manager) => return Ok(manager),
            Err(e) => {
                attempt += 1;
                if attempt > max_retries {
                    warn!("Redis connection failed after {} attempts: {}", attempt, e);
                    return Err(e);
                }

                warn!(
                    "Redis connection attempt {} failed ({}), retrying in {:?}",
                    attempt, e, delay
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(5));
            }
        }
    }
}
