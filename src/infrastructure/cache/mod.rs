//! Cache Module
//!
//! In-process state kept in front of (or instead of) the stores:
//!
//! - [`MessageSequencer`]: per-conversation timestamp slots
//! - [`UnreadTracker`]: per-recipient unread cursors
//! - [`UserDirectory`] / [`GroupDirectory`]: read-through entity caches
//!
//! plus Redis connection management for the notification backend.

mod group_directory;
mod message_sequencer;
mod unread_tracker;
mod user_directory;

pub use group_directory::GroupDirectory;
pub use message_sequencer::MessageSequencer;
pub use unread_tracker::UnreadTracker;
pub use user_directory::UserDirectory;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

/// Creates a Redis connection manager with automatic reconnection.
///
/// # Arguments
/// * `url` - Redis connection URL
///
/// # Returns
/// * `Ok(ConnectionManager)` - On successful connection
/// * `Err(redis::RedisError)` - If connection fails
#[instrument(skip(url))]
pub async fn create_redis_client(url: &str) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}
