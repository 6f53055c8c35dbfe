//! # sync-types
//!
//! Wire shapes for the upsync update synchronization engine.
//!
//! This crate provides the foundational types used across all upsync crates:
//! - [`UserId`], [`ChatId`], [`ChannelId`], [`Pts`] - Identity and ordering types
//! - [`RawContainer`] - The five container shapes the server pushes
//! - [`Update`] - Embedded events, with their pts bookkeeping
//! - [`Difference`], [`ChannelDifference`] - Bulk catch-up responses
//! - [`EntityIndex`] - Per-container user/chat lookup tables
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod containers;
mod dc;
mod difference;
mod entities;
mod error;
mod ids;
mod message;
mod updates;

pub use containers::{Batch, RawContainer, ShortChatMessage, ShortMessage, ShortUpdate};
pub use dc::{DcOption, ServerConfig};
pub use difference::{ChannelDifference, Difference, DifferenceBody, UpdatesState};
pub use entities::{ChatKind, ChatRecord, EntityIndex, InputChannel, InputUser, UserRecord};
pub use error::WireError;
pub use ids::{ChannelId, ChatId, Peer, Pts, UserId};
pub use message::{ForwardHeader, Message, MessageEntity, ReplyHeader};
pub use updates::{Counted, Event, Update};
