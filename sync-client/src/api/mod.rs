//! RPC abstraction for upsync.
//!
//! The engine never talks to the network directly. Every request it
//! issues goes through the [`Api`] trait, so the transport, session and
//! encryption layers stay outside the engine.
//!
//! # Design
//!
//! Each method is one round trip and one suspension point:
//! - `get_state()` fetches the account-wide position
//! - `get_difference()` / `get_channel_difference()` page through missed events
//! - `get_users()` / `get_channels()` / `get_chats()` fetch entity records
//! - `get_config()` refetches server configuration
//!
//! Retries and timeouts belong to the implementation, not to the engine.
//! A call that hangs stalls the engine's gate until it fails.

mod mock;

pub use mock::{ApiCall, MockApi};

use async_trait::async_trait;
use thiserror::Error;
use upsync_types::{
    ChannelDifference, ChatId, ChatRecord, Difference, InputChannel, InputUser, Pts,
    ServerConfig, UpdatesState, UserRecord,
};

/// RPC errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an error.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Error code
        code: i32,
        /// Error message
        message: String,
    },

    /// No response was available.
    #[error("no response to {0}")]
    NoResponse(&'static str),

    /// Request failed at the transport level.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("request timeout")]
    Timeout,
}

/// The RPC surface the engine depends on.
#[async_trait]
pub trait Api: Send + Sync {
    /// Fetch the current account-wide state.
    async fn get_state(&self) -> Result<UpdatesState, ApiError>;

    /// Fetch events missed since `(pts, date)`.
    async fn get_difference(&self, pts: Pts, date: i32) -> Result<Difference, ApiError>;

    /// Fetch up to `limit` channel events missed since `pts`, unfiltered.
    async fn get_channel_difference(
        &self,
        channel: InputChannel,
        pts: Pts,
        limit: u32,
    ) -> Result<ChannelDifference, ApiError>;

    /// Fetch user records in one batch.
    async fn get_users(&self, ids: Vec<InputUser>) -> Result<Vec<UserRecord>, ApiError>;

    /// Fetch channel records in one batch.
    async fn get_channels(&self, ids: Vec<InputChannel>) -> Result<Vec<ChatRecord>, ApiError>;

    /// Fetch basic group records in one batch.
    async fn get_chats(&self, ids: Vec<ChatId>) -> Result<Vec<ChatRecord>, ApiError>;

    /// Fetch the current server configuration.
    async fn get_config(&self) -> Result<ServerConfig, ApiError>;
}
