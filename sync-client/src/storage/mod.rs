//! Position storage for upsync.
//!
//! The engine keeps positions in memory and only needs a narrow
//! key/value contract from durable storage: load everything at session
//! start, write everything back at checkpoints.

mod memory;

pub use memory::MemoryPositionStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use upsync_core::{GlobalPosition, Identity};
use upsync_types::{ChannelId, Pts};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Stored data could not be decoded.
    #[error("corrupt stored value for {key}: {reason}")]
    Corrupt {
        /// Key that failed to decode.
        key: String,
        /// Why decoding failed.
        reason: String,
    },
}

/// Trait for position storage backends.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Prepare the backend before the first read.
    async fn load(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Flush pending writes after a checkpoint.
    async fn save(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Get the account-wide position, if one was stored.
    async fn global_position(&self) -> Result<Option<GlobalPosition>, StorageError>;

    /// Store the account-wide position.
    async fn set_global_position(&self, position: GlobalPosition) -> Result<(), StorageError>;

    /// Get a channel's position, if one was stored.
    async fn scope_position(&self, channel: ChannelId) -> Result<Option<Pts>, StorageError>;

    /// Store many channel positions at once.
    async fn set_scope_positions(
        &self,
        positions: &HashMap<ChannelId, Pts>,
    ) -> Result<(), StorageError>;

    /// Get the session identity, if one was stored.
    async fn identity(&self) -> Result<Option<Identity>, StorageError>;

    /// Store the session identity.
    async fn set_identity(&self, identity: Identity) -> Result<(), StorageError>;
}
