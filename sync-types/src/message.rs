//! Message records.
//!
//! Both the full event envelopes and the terse shapes end up as a
//! [`Message`] before they reach a consumer.

use serde::{Deserialize, Serialize};

use crate::{Peer, UserId};

/// A formatting entity attached to message text.
///
/// Opaque to the engine; carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    /// Entity kind (bold, url, mention, ...)
    pub kind: String,
    /// Offset into the text, in UTF-16 code units
    pub offset: i32,
    /// Length, in UTF-16 code units
    pub length: i32,
}

/// Where a forwarded message originally came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardHeader {
    /// Original author, either a user or a channel
    pub from_id: Option<Peer>,
    /// Original author name, for hidden forward origins
    pub from_name: Option<String>,
    /// Date of the original message
    pub date: i32,
    /// Id of the original message in a channel, if any
    pub channel_post: Option<i32>,
}

/// The message a message replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyHeader {
    /// Id of the message being replied to
    pub reply_to_msg_id: i32,
    /// Id of the thread root, for replies inside threads
    pub reply_to_top_id: Option<i32>,
}

/// A full message record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id
    pub id: i32,
    /// Whether the message was sent by the current account
    pub out: bool,
    /// Whether the current account was mentioned
    pub mentioned: bool,
    /// Whether attached media has not been opened yet
    pub media_unread: bool,
    /// Whether the message was sent silently
    pub silent: bool,
    /// Sender
    pub from_id: Option<Peer>,
    /// Conversation the message belongs to
    pub peer_id: Peer,
    /// Forward origin
    pub fwd_from: Option<ForwardHeader>,
    /// Bot the message was sent via
    pub via_bot_id: Option<UserId>,
    /// Reply target
    pub reply_to: Option<ReplyHeader>,
    /// Send date (unix seconds)
    pub date: i32,
    /// Message text
    pub text: String,
    /// Formatting entities
    pub entities: Vec<MessageEntity>,
    /// Self-destruct period in seconds
    pub ttl_period: Option<i32>,
}
