use async_trait::async_trait;
use skywings_core::repository::{RepoResult, SeatKey, SeatLock};
use std::time::Duration;
use tracing::debug;

// Delete only if the key still belongs to the caller.
const RELEASE_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl SeatLock for RedisClient {
    async fn acquire(&self, key: &SeatKey, owner: &str, ttl: Duration) -> RepoResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = key.to_string();

        // SET NX: Only set if key does not exist
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(owner)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        debug!(key = %key, acquired = result.is_some(), "Seat lock attempt");
        Ok(result.is_some())
    }

    async fn release(&self, key: &SeatKey, owner: &str) -> RepoResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(key.to_string())
            .arg(owner)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }
}
