//! Entity records and addressable handles.
//!
//! Containers and difference pages arrive together with the users and
//! chats they reference. Those lists are folded into an [`EntityIndex`]
//! that lives exactly as long as the container being processed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ChannelId, ChatId, UserId};

/// A user as returned by the server alongside events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier
    pub id: UserId,
    /// Access hash needed to address this user
    pub access_hash: i64,
    /// Display name
    pub first_name: String,
    /// Public username, if any
    pub username: Option<String>,
    /// Whether this record describes the current account
    pub is_self: bool,
    /// Whether this user is a bot
    pub is_bot: bool,
}

/// Kind of a chat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    /// A basic group.
    Group,
    /// A broadcast channel or supergroup.
    Channel {
        /// Access hash needed to address this channel
        access_hash: i64,
        /// Whether this is a supergroup rather than a broadcast channel
        megagroup: bool,
    },
}

/// A chat (basic group or channel) as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Raw chat identifier (basic group id or channel id)
    pub id: i64,
    /// Chat title
    pub title: String,
    /// Basic group or channel
    pub kind: ChatKind,
}

impl ChatRecord {
    /// The channel id, if this record is a channel.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self.kind {
            ChatKind::Channel { .. } => Some(ChannelId::new(self.id)),
            ChatKind::Group => None,
        }
    }

    /// The addressable handle, if this record is a channel.
    pub fn input_channel(&self) -> Option<InputChannel> {
        match self.kind {
            ChatKind::Channel { access_hash, .. } => Some(InputChannel {
                channel_id: ChannelId::new(self.id),
                access_hash,
            }),
            ChatKind::Group => None,
        }
    }
}

/// Addressable handle for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputUser {
    /// The current account.
    Myself,
    /// Another user.
    User {
        /// User identifier
        user_id: UserId,
        /// Access hash (zero when unknown)
        access_hash: i64,
    },
}

impl InputUser {
    /// A handle for a user whose access hash is not known.
    pub fn bare(user_id: UserId) -> Self {
        InputUser::User {
            user_id,
            access_hash: 0,
        }
    }
}

/// Addressable handle for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputChannel {
    /// Channel identifier
    pub channel_id: ChannelId,
    /// Access hash
    pub access_hash: i64,
}

/// Lookup tables for the entities referenced by one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIndex {
    /// Users keyed by id.
    pub users: HashMap<UserId, UserRecord>,
    /// Chats keyed by raw id.
    pub chats: HashMap<i64, ChatRecord>,
}

impl EntityIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the lists returned by the server.
    pub fn from_lists(users: Vec<UserRecord>, chats: Vec<ChatRecord>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            chats: chats.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Look up a user.
    pub fn user(&self, id: UserId) -> Option<&UserRecord> {
        self.users.get(&id)
    }

    /// Look up a chat or channel by raw id.
    pub fn chat(&self, id: i64) -> Option<&ChatRecord> {
        self.chats.get(&id)
    }

    /// Add everything from `other`, replacing records with the same id.
    pub fn merge(&mut self, other: EntityIndex) {
        self.users.extend(other.users);
        self.chats.extend(other.chats);
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.chats.is_empty()
    }
}
