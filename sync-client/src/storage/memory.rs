//! In-memory position store.
//!
//! Keeps everything in process memory. Useful for tests and for
//! sessions that do not need to survive a restart.

use super::{PositionStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use upsync_core::{GlobalPosition, Identity};
use upsync_types::{ChannelId, Pts};

#[derive(Debug, Default)]
struct Stored {
    global: Option<GlobalPosition>,
    scopes: HashMap<ChannelId, Pts>,
    identity: Option<Identity>,
    loads: u32,
    saves: u32,
}

/// Position store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    stored: Mutex<Stored>,
}

impl MemoryPositionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    pub fn with_session(identity: Identity, position: GlobalPosition) -> Self {
        Self {
            stored: Mutex::new(Stored {
                global: Some(position),
                identity: Some(identity),
                ..Stored::default()
            }),
        }
    }

    /// Every stored channel position.
    pub async fn scope_positions(&self) -> HashMap<ChannelId, Pts> {
        self.stored.lock().await.scopes.clone()
    }

    /// How many times `save()` was called.
    pub async fn save_count(&self) -> u32 {
        self.stored.lock().await.saves
    }

    /// How many times `load()` was called.
    pub async fn load_count(&self) -> u32 {
        self.stored.lock().await.loads
    }
}

#[async_trait]
impl PositionStore for MemoryPositionStore {
    async fn load(&self) -> Result<(), StorageError> {
        self.stored.lock().await.loads += 1;
        Ok(())
    }

    async fn save(&self) -> Result<(), StorageError> {
        self.stored.lock().await.saves += 1;
        Ok(())
    }

    async fn global_position(&self) -> Result<Option<GlobalPosition>, StorageError> {
        Ok(self.stored.lock().await.global)
    }

    async fn set_global_position(&self, position: GlobalPosition) -> Result<(), StorageError> {
        self.stored.lock().await.global = Some(position);
        Ok(())
    }

    async fn scope_position(&self, channel: ChannelId) -> Result<Option<Pts>, StorageError> {
        Ok(self.stored.lock().await.scopes.get(&channel).copied())
    }

    async fn set_scope_positions(
        &self,
        positions: &HashMap<ChannelId, Pts>,
    ) -> Result<(), StorageError> {
        let mut stored = self.stored.lock().await;
        stored
            .scopes
            .extend(positions.iter().map(|(channel, pts)| (*channel, *pts)));
        Ok(())
    }

    async fn identity(&self) -> Result<Option<Identity>, StorageError> {
        Ok(self.stored.lock().await.identity)
    }

    async fn set_identity(&self, identity: Identity) -> Result<(), StorageError> {
        self.stored.lock().await.identity = Some(identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upsync_types::UserId;

    fn identity() -> Identity {
        Identity {
            account_id: UserId::new(42),
            is_service_account: false,
        }
    }

    #[tokio::test]
    async fn empty_store_has_no_session() {
        let store = MemoryPositionStore::new();
        assert!(store.global_position().await.unwrap().is_none());
        assert!(store.identity().await.unwrap().is_none());
        assert!(store
            .scope_position(ChannelId::new(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn with_session_is_loaded() {
        let position = GlobalPosition::new(Pts::new(100), 1_700_000_000);
        let store = MemoryPositionStore::with_session(identity(), position);

        assert_eq!(store.global_position().await.unwrap(), Some(position));
        assert_eq!(store.identity().await.unwrap(), Some(identity()));
    }

    #[tokio::test]
    async fn scope_positions_merge() {
        let store = MemoryPositionStore::new();

        let mut first = HashMap::new();
        first.insert(ChannelId::new(1), Pts::new(10));
        first.insert(ChannelId::new(2), Pts::new(20));
        store.set_scope_positions(&first).await.unwrap();

        let mut second = HashMap::new();
        second.insert(ChannelId::new(2), Pts::new(25));
        store.set_scope_positions(&second).await.unwrap();

        assert_eq!(
            store.scope_position(ChannelId::new(1)).await.unwrap(),
            Some(Pts::new(10))
        );
        assert_eq!(
            store.scope_position(ChannelId::new(2)).await.unwrap(),
            Some(Pts::new(25))
        );
        assert_eq!(store.scope_positions().await.len(), 2);
    }

    #[tokio::test]
    async fn load_and_save_are_counted() {
        let store = MemoryPositionStore::new();
        store.load().await.unwrap();
        store.save().await.unwrap();
        store.save().await.unwrap();

        assert_eq!(store.load_count().await, 1);
        assert_eq!(store.save_count().await, 2);
    }
}
