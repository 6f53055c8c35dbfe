//! Entity resolution.
//!
//! Payloads reference users, chats and channels by numeric id. To fetch
//! a channel's difference, or to look up the entities a terse message
//! mentions, the engine needs addressable handles. [`EntityResolver`]
//! provides them; [`CachingResolver`] is the default implementation,
//! remembering every entity that passes through the engine and asking
//! the server for the rest.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use upsync_types::{
    ChannelId, ChatId, ChatRecord, EntityIndex, InputChannel, InputUser, UserId, UserRecord,
};

use crate::api::{Api, ApiError};

/// Resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No handle is known for this channel.
    #[error("unknown channel: {0}")]
    UnknownChannel(ChannelId),

    /// The lookup request failed.
    #[error("lookup failed: {0}")]
    Lookup(#[from] ApiError),
}

/// Translates numeric references into handles and records.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Addressable handle for a channel.
    async fn resolve_channel(&self, channel: ChannelId) -> Result<InputChannel, ResolveError>;

    /// Fetch user records in one batch.
    async fn fetch_users(&self, ids: Vec<InputUser>) -> Result<Vec<UserRecord>, ResolveError>;

    /// Fetch channel records in one batch.
    async fn fetch_channels(
        &self,
        ids: Vec<InputChannel>,
    ) -> Result<Vec<ChatRecord>, ResolveError>;

    /// Fetch basic group records in one batch.
    async fn fetch_chats(&self, ids: Vec<ChatId>) -> Result<Vec<ChatRecord>, ResolveError>;

    /// Record the entities that arrived with a container.
    fn remember(&self, entities: &EntityIndex);
}

/// Resolver that caches handles and fetches records through an [`Api`].
pub struct CachingResolver {
    api: Arc<dyn Api>,
    channels: DashMap<ChannelId, InputChannel>,
    users: DashMap<UserId, i64>,
}

impl std::fmt::Debug for CachingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingResolver")
            .field("channels", &self.channels.len())
            .field("users", &self.users.len())
            .finish_non_exhaustive()
    }
}

impl CachingResolver {
    /// Create a resolver with an empty cache.
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            channels: DashMap::new(),
            users: DashMap::new(),
        }
    }

    /// Number of cached channel handles.
    pub fn cached_channels(&self) -> usize {
        self.channels.len()
    }

    /// Cached access hash for a user.
    pub fn user_access_hash(&self, user: UserId) -> Option<i64> {
        self.users.get(&user).map(|hash| *hash)
    }

    fn remember_users(&self, users: &[UserRecord]) {
        for user in users {
            self.users.insert(user.id, user.access_hash);
        }
    }

    fn remember_chats(&self, chats: &[ChatRecord]) {
        for input in chats.iter().filter_map(ChatRecord::input_channel) {
            self.channels.insert(input.channel_id, input);
        }
    }

    /// Fill in access hashes the cache already knows.
    fn with_known_hash(&self, input: InputUser) -> InputUser {
        match input {
            InputUser::User {
                user_id,
                access_hash: 0,
            } => match self.users.get(&user_id) {
                Some(hash) => InputUser::User {
                    user_id,
                    access_hash: *hash,
                },
                None => input,
            },
            other => other,
        }
    }
}

#[async_trait]
impl EntityResolver for CachingResolver {
    async fn resolve_channel(&self, channel: ChannelId) -> Result<InputChannel, ResolveError> {
        self.channels
            .get(&channel)
            .map(|input| *input)
            .ok_or(ResolveError::UnknownChannel(channel))
    }

    async fn fetch_users(&self, ids: Vec<InputUser>) -> Result<Vec<UserRecord>, ResolveError> {
        let ids = ids.into_iter().map(|id| self.with_known_hash(id)).collect();
        let users = self.api.get_users(ids).await?;
        self.remember_users(&users);
        Ok(users)
    }

    async fn fetch_channels(
        &self,
        ids: Vec<InputChannel>,
    ) -> Result<Vec<ChatRecord>, ResolveError> {
        let chats = self.api.get_channels(ids).await?;
        self.remember_chats(&chats);
        Ok(chats)
    }

    async fn fetch_chats(&self, ids: Vec<ChatId>) -> Result<Vec<ChatRecord>, ResolveError> {
        let chats = self.api.get_chats(ids).await?;
        self.remember_chats(&chats);
        Ok(chats)
    }

    fn remember(&self, entities: &EntityIndex) {
        for user in entities.users.values() {
            self.users.insert(user.id, user.access_hash);
        }
        for input in entities.chats.values().filter_map(ChatRecord::input_channel) {
            self.channels.insert(input.channel_id, input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, MockApi};
    use upsync_types::ChatKind;

    fn channel(id: i64, access_hash: i64) -> ChatRecord {
        ChatRecord {
            id,
            title: format!("channel {}", id),
            kind: ChatKind::Channel {
                access_hash,
                megagroup: true,
            },
        }
    }

    fn user(id: i64, access_hash: i64) -> UserRecord {
        UserRecord {
            id: UserId::new(id),
            access_hash,
            first_name: "someone".into(),
            username: None,
            is_self: false,
            is_bot: false,
        }
    }

    #[tokio::test]
    async fn unknown_channel_fails() {
        let resolver = CachingResolver::new(Arc::new(MockApi::new()));
        let result = resolver.resolve_channel(ChannelId::new(5)).await;
        assert!(matches!(result, Err(ResolveError::UnknownChannel(id)) if id == ChannelId::new(5)));
    }

    #[tokio::test]
    async fn remembered_channel_resolves() {
        let resolver = CachingResolver::new(Arc::new(MockApi::new()));
        resolver.remember(&EntityIndex::from_lists(vec![], vec![channel(5, 555)]));

        let input = resolver.resolve_channel(ChannelId::new(5)).await.unwrap();
        assert_eq!(input.access_hash, 555);
        assert_eq!(resolver.cached_channels(), 1);
    }

    #[tokio::test]
    async fn basic_groups_are_not_channel_handles() {
        let resolver = CachingResolver::new(Arc::new(MockApi::new()));
        resolver.remember(&EntityIndex::from_lists(
            vec![],
            vec![ChatRecord {
                id: 8,
                title: "group".into(),
                kind: ChatKind::Group,
            }],
        ));
        assert_eq!(resolver.cached_channels(), 0);
    }

    #[tokio::test]
    async fn fetched_channels_are_remembered() {
        let api = MockApi::new();
        api.queue_channels(vec![channel(9, 999)]);
        let resolver = CachingResolver::new(Arc::new(api));

        let fetched = resolver
            .fetch_channels(vec![InputChannel {
                channel_id: ChannelId::new(9),
                access_hash: 0,
            }])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(
            resolver
                .resolve_channel(ChannelId::new(9))
                .await
                .unwrap()
                .access_hash,
            999
        );
    }

    #[tokio::test]
    async fn user_lookup_uses_cached_hashes() {
        let api = MockApi::new();
        let resolver = CachingResolver::new(Arc::new(api.clone()));
        resolver.remember(&EntityIndex::from_lists(vec![user(3, 33)], vec![]));

        resolver
            .fetch_users(vec![
                InputUser::Myself,
                InputUser::bare(UserId::new(3)),
                InputUser::bare(UserId::new(4)),
            ])
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![ApiCall::GetUsers(vec![
                InputUser::Myself,
                InputUser::User {
                    user_id: UserId::new(3),
                    access_hash: 33
                },
                InputUser::bare(UserId::new(4)),
            ])]
        );
    }

    #[tokio::test]
    async fn lookup_failure_is_reported() {
        let api = MockApi::new();
        api.fail_next_call("flood wait");
        let resolver = CachingResolver::new(Arc::new(api));

        let result = resolver.fetch_chats(vec![ChatId::new(1)]).await;
        assert!(matches!(result, Err(ResolveError::Lookup(_))));
    }

    #[tokio::test]
    async fn fetched_users_are_remembered() {
        let api = MockApi::new();
        api.queue_users(vec![user(6, 66)]);
        let resolver = CachingResolver::new(Arc::new(api));

        resolver
            .fetch_users(vec![InputUser::bare(UserId::new(6))])
            .await
            .unwrap();
        assert_eq!(resolver.user_access_hash(UserId::new(6)), Some(66));
    }
}
