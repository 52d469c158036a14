pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod error;
pub mod redis_repo;

use std::sync::Arc;
use std::time::Duration;

use skywings_core::memory::{InMemoryBookingRepository, InMemorySeatLock};
use skywings_core::{BookingRepository, SeatLock};
use tracing::info;

pub use app_config::{Config, StoreBackend};
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use error::StoreError;
pub use redis_repo::RedisClient;

/// Store handles assembled from configuration.
pub struct Stores {
    pub bookings: Arc<dyn BookingRepository>,
    pub seat_lock: Option<Arc<dyn SeatLock>>,
    pub seat_lock_ttl: Duration,
    pub db: Option<DbClient>,
}

/// Picks the booking backend and the optional seat lock named in `config`.
pub async fn connect(config: &Config) -> Result<Stores, StoreError> {
    let (bookings, db): (Arc<dyn BookingRepository>, Option<DbClient>) = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory booking store");
            (Arc::new(InMemoryBookingRepository::new()) as Arc<dyn BookingRepository>, None)
        }
        StoreBackend::Postgres => {
            let db_config = config
                .database
                .as_ref()
                .ok_or_else(|| StoreError::Config("[database] is required for the postgres backend".into()))?;
            let db = DbClient::new(db_config).await?;
            if db_config.run_migrations {
                db.migrate().await?;
            }
            info!("Connected to Postgres booking store");
            (Arc::new(PgBookingRepository::new(db.pool.clone())) as Arc<dyn BookingRepository>, Some(db))
        }
    };

    let seat_lock: Option<Arc<dyn SeatLock>> = if !config.seat_locks.enabled {
        None
    } else if let Some(redis) = &config.redis {
        let client = RedisClient::new(&redis.url).await?;
        client.ping().await?;
        info!("Seat locks backed by Redis");
        Some(Arc::new(client))
    } else {
        info!("Seat locks enabled without Redis, using process-local locks");
        Some(Arc::new(InMemorySeatLock::new()))
    };

    Ok(Stores {
        bookings,
        seat_lock,
        seat_lock_ttl: Duration::from_secs(config.seat_locks.ttl_seconds),
        db,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_needs_no_services() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3000

            [store]
            backend = "memory"

            [seat_locks]
            enabled = true
            ttl_seconds = 60
            "#,
        )
        .unwrap();

        let stores = connect(&config).await.unwrap();
        assert!(stores.db.is_none());
        assert!(stores.seat_lock.is_some());
        assert_eq!(stores.seat_lock_ttl, Duration::from_secs(60));
        assert!(stores.bookings.query_by_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_postgres_backend_requires_database_section() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3000
            "#,
        )
        .unwrap();

        assert!(matches!(connect(&config).await, Err(StoreError::Config(_))));
    }
}
