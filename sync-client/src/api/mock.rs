//! Mock RPC surface for testing.
//!
//! Allows queueing responses and capturing issued calls for verification.

use super::{Api, ApiError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use upsync_types::{
    ChannelDifference, ChatId, ChatRecord, Difference, InputChannel, InputUser, Pts,
    ServerConfig, UpdatesState, UserRecord,
};

/// A call issued against [`MockApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `get_state()`
    GetState,
    /// `get_difference(pts, date)`
    GetDifference {
        /// Requested position
        pts: Pts,
        /// Requested date
        date: i32,
    },
    /// `get_channel_difference(channel, pts, limit)`
    GetChannelDifference {
        /// Requested channel
        channel: InputChannel,
        /// Requested position
        pts: Pts,
        /// Page limit
        limit: u32,
    },
    /// `get_users(ids)`
    GetUsers(Vec<InputUser>),
    /// `get_channels(ids)`
    GetChannels(Vec<InputChannel>),
    /// `get_chats(ids)`
    GetChats(Vec<ChatId>),
    /// `get_config()`
    GetConfig,
}

/// Mock RPC surface for testing.
///
/// Responses are queued per method. Entity lookups answer with an empty
/// list when nothing is queued; every other method fails with
/// [`ApiError::NoResponse`].
#[derive(Debug, Default)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug, Default)]
struct MockApiInner {
    calls: Vec<ApiCall>,
    states: VecDeque<UpdatesState>,
    differences: VecDeque<Difference>,
    channel_differences: VecDeque<ChannelDifference>,
    users: VecDeque<Vec<UserRecord>>,
    channels: VecDeque<Vec<ChatRecord>>,
    chats: VecDeque<Vec<ChatRecord>>,
    configs: VecDeque<ServerConfig>,
    fail_next: Option<String>,
}

impl MockApi {
    /// Create a new mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next `get_state()`.
    pub fn queue_state(&self, state: UpdatesState) {
        self.inner.lock().unwrap().states.push_back(state);
    }

    /// Queue a response for the next `get_difference()`.
    pub fn queue_difference(&self, diff: Difference) {
        self.inner.lock().unwrap().differences.push_back(diff);
    }

    /// Queue a response for the next `get_channel_difference()`.
    pub fn queue_channel_difference(&self, diff: ChannelDifference) {
        self.inner.lock().unwrap().channel_differences.push_back(diff);
    }

    /// Queue a response for the next `get_users()`.
    pub fn queue_users(&self, users: Vec<UserRecord>) {
        self.inner.lock().unwrap().users.push_back(users);
    }

    /// Queue a response for the next `get_channels()`.
    pub fn queue_channels(&self, channels: Vec<ChatRecord>) {
        self.inner.lock().unwrap().channels.push_back(channels);
    }

    /// Queue a response for the next `get_chats()`.
    pub fn queue_chats(&self, chats: Vec<ChatRecord>) {
        self.inner.lock().unwrap().chats.push_back(chats);
    }

    /// Queue a response for the next `get_config()`.
    pub fn queue_config(&self, config: ServerConfig) {
        self.inner.lock().unwrap().configs.push_back(config);
    }

    /// Cause the next call, whatever it is, to fail with the given error.
    pub fn fail_next_call(&self, error: &str) {
        self.inner.lock().unwrap().fail_next = Some(error.to_string());
    }

    /// All calls issued so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of calls issued so far.
    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }

    /// Clear all state (calls, queues, failures).
    pub fn reset(&self) {
        *self.inner.lock().unwrap() = MockApiInner::default();
    }

    fn record(&self, call: ApiCall) -> Result<std::sync::MutexGuard<'_, MockApiInner>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);

        // Check for forced failure
        if let Some(error) = inner.fail_next.take() {
            return Err(ApiError::Transport(error));
        }
        Ok(inner)
    }
}

impl Clone for MockApi {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Api for MockApi {
    async fn get_state(&self) -> Result<UpdatesState, ApiError> {
        self.record(ApiCall::GetState)?
            .states
            .pop_front()
            .ok_or(ApiError::NoResponse("get_state"))
    }

    async fn get_difference(&self, pts: Pts, date: i32) -> Result<Difference, ApiError> {
        self.record(ApiCall::GetDifference { pts, date })?
            .differences
            .pop_front()
            .ok_or(ApiError::NoResponse("get_difference"))
    }

    async fn get_channel_difference(
        &self,
        channel: InputChannel,
        pts: Pts,
        limit: u32,
    ) -> Result<ChannelDifference, ApiError> {
        self.record(ApiCall::GetChannelDifference {
            channel,
            pts,
            limit,
        })?
        .channel_differences
        .pop_front()
        .ok_or(ApiError::NoResponse("get_channel_difference"))
    }

    async fn get_users(&self, ids: Vec<InputUser>) -> Result<Vec<UserRecord>, ApiError> {
        Ok(self
            .record(ApiCall::GetUsers(ids))?
            .users
            .pop_front()
            .unwrap_or_default())
    }

    async fn get_channels(&self, ids: Vec<InputChannel>) -> Result<Vec<ChatRecord>, ApiError> {
        Ok(self
            .record(ApiCall::GetChannels(ids))?
            .channels
            .pop_front()
            .unwrap_or_default())
    }

    async fn get_chats(&self, ids: Vec<ChatId>) -> Result<Vec<ChatRecord>, ApiError> {
        Ok(self
            .record(ApiCall::GetChats(ids))?
            .chats
            .pop_front()
            .unwrap_or_default())
    }

    async fn get_config(&self) -> Result<ServerConfig, ApiError> {
        self.record(ApiCall::GetConfig)?
            .configs
            .pop_front()
            .ok_or(ApiError::NoResponse("get_config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upsync_types::{ChannelId, UserId};

    fn state(pts: i32) -> UpdatesState {
        UpdatesState {
            pts: Pts::new(pts),
            date: 1_700_000_000,
        }
    }

    // ===========================================
    // MockApi Basic Tests
    // ===========================================

    #[tokio::test]
    async fn mock_api_returns_queued_state() {
        let api = MockApi::new();
        api.queue_state(state(10));
        api.queue_state(state(20));

        assert_eq!(api.get_state().await.unwrap().pts, Pts::new(10));
        assert_eq!(api.get_state().await.unwrap().pts, Pts::new(20));
    }

    #[tokio::test]
    async fn mock_api_records_calls() {
        let api = MockApi::new();
        api.queue_difference(Difference::Empty { date: 0 });

        api.get_difference(Pts::new(5), 99).await.unwrap();
        api.get_users(vec![InputUser::Myself]).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                ApiCall::GetDifference {
                    pts: Pts::new(5),
                    date: 99
                },
                ApiCall::GetUsers(vec![InputUser::Myself]),
            ]
        );
    }

    #[tokio::test]
    async fn empty_queue_is_no_response() {
        let api = MockApi::new();
        let result = api.get_difference(Pts::new(1), 0).await;
        assert!(matches!(result, Err(ApiError::NoResponse("get_difference"))));
    }

    #[tokio::test]
    async fn lookups_default_to_empty() {
        let api = MockApi::new();
        assert!(api.get_users(vec![]).await.unwrap().is_empty());
        assert!(api.get_chats(vec![]).await.unwrap().is_empty());
        assert!(api
            .get_channels(vec![InputChannel {
                channel_id: ChannelId::new(1),
                access_hash: 0,
            }])
            .await
            .unwrap()
            .is_empty());
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[tokio::test]
    async fn forced_failure_hits_next_call_only() {
        let api = MockApi::new();
        api.queue_state(state(1));
        api.fail_next_call("connection reset");

        let result = api.get_users(vec![InputUser::bare(UserId::new(3))]).await;
        assert!(matches!(result, Err(ApiError::Transport(_))));

        // Next call works and the failed one was still recorded
        assert_eq!(api.get_state().await.unwrap().pts, Pts::new(1));
        assert_eq!(api.call_count(), 2);
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn mock_api_clone_shares_state() {
        let api1 = MockApi::new();
        let api2 = api1.clone();

        api1.queue_state(state(7));
        assert_eq!(api2.get_state().await.unwrap().pts, Pts::new(7));
        assert_eq!(api1.calls(), vec![ApiCall::GetState]);
    }

    #[tokio::test]
    async fn mock_api_reset_clears_all() {
        let api = MockApi::new();
        api.queue_state(state(7));
        api.get_users(vec![]).await.unwrap();

        api.reset();

        assert_eq!(api.call_count(), 0);
        assert!(api.get_state().await.is_err());
    }
}
