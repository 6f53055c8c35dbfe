//! Containers pushed by the server.
//!
//! A [`RawContainer`] is what the transport hands to the engine. It is
//! one of five shapes; every shape must be handled.

use serde::{Deserialize, Serialize};

use crate::{
    ChatId, ChatRecord, ForwardHeader, MessageEntity, Pts, ReplyHeader, Update, UserId,
    UserRecord, WireError,
};

/// All possible container shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawContainer {
    /// Too many events are pending to enumerate; fetch them instead
    Overflow,
    /// Ordered list of events plus the entities they reference
    Batch(Batch),
    /// A single event without envelope
    TerseGeneric(ShortUpdate),
    /// A private message in compact form
    TersePrivateMessage(ShortMessage),
    /// A basic group message in compact form
    TerseGroupMessage(ShortChatMessage),
}

impl RawContainer {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec_named(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.is_empty() {
            return Err(WireError::InvalidData("empty container frame".into()));
        }
        rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)
    }

    /// Short name of the shape, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RawContainer::Overflow => "Overflow",
            RawContainer::Batch(_) => "Batch",
            RawContainer::TerseGeneric(_) => "TerseGeneric",
            RawContainer::TersePrivateMessage(_) => "TersePrivateMessage",
            RawContainer::TerseGroupMessage(_) => "TerseGroupMessage",
        }
    }
}

/// An ordered batch of events.
///
/// Array order is the application order. `seq` is carried but not used
/// for ordering: only pts counters are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Events, in application order
    pub updates: Vec<Update>,
    /// Users referenced by the events
    pub users: Vec<UserRecord>,
    /// Chats referenced by the events
    pub chats: Vec<ChatRecord>,
    /// Server date of the batch
    pub date: i32,
    /// Sequence number of the last event
    pub seq: i32,
    /// Sequence number of the first event, for combined batches
    pub seq_start: Option<i32>,
}

/// A single event with only a date attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUpdate {
    /// The event
    pub update: Update,
    /// Server date
    pub date: i32,
}

/// Compact private message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortMessage {
    /// Message id
    pub id: i32,
    /// The other party of the conversation
    pub user_id: UserId,
    /// Whether the current account sent this message
    pub out: bool,
    /// Whether the current account was mentioned
    pub mentioned: bool,
    /// Whether attached media has not been opened yet
    pub media_unread: bool,
    /// Whether the message was sent silently
    pub silent: bool,
    /// Message text
    pub text: String,
    /// Account-wide position after this message
    pub pts: Pts,
    /// Increments represented
    pub pts_count: i32,
    /// Send date
    pub date: i32,
    /// Forward origin
    pub fwd_from: Option<ForwardHeader>,
    /// Bot the message was sent via
    pub via_bot_id: Option<UserId>,
    /// Reply target
    pub reply_to: Option<ReplyHeader>,
    /// Formatting entities
    pub entities: Vec<MessageEntity>,
    /// Self-destruct period
    pub ttl_period: Option<i32>,
}

/// Compact basic group message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortChatMessage {
    /// Message id
    pub id: i32,
    /// Sender
    pub from_id: UserId,
    /// Group
    pub chat_id: ChatId,
    /// Whether the current account sent this message
    pub out: bool,
    /// Whether the current account was mentioned
    pub mentioned: bool,
    /// Whether attached media has not been opened yet
    pub media_unread: bool,
    /// Whether the message was sent silently
    pub silent: bool,
    /// Message text
    pub text: String,
    /// Account-wide position after this message
    pub pts: Pts,
    /// Increments represented
    pub pts_count: i32,
    /// Send date
    pub date: i32,
    /// Forward origin
    pub fwd_from: Option<ForwardHeader>,
    /// Bot the message was sent via
    pub via_bot_id: Option<UserId>,
    /// Reply target
    pub reply_to: Option<ReplyHeader>,
    /// Formatting entities
    pub entities: Vec<MessageEntity>,
    /// Self-destruct period
    pub ttl_period: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelId, Peer};

    fn batch() -> RawContainer {
        RawContainer::Batch(Batch {
            updates: vec![
                Update::DeleteChannelMessages {
                    channel_id: ChannelId::new(5),
                    ids: vec![1, 2],
                    pts: Pts::new(11),
                    pts_count: 2,
                },
                Update::ChannelTooLong {
                    channel_id: ChannelId::new(6),
                    pts: None,
                },
            ],
            users: vec![],
            chats: vec![],
            date: 1_700_000_000,
            seq: 0,
            seq_start: None,
        })
    }

    #[test]
    fn batch_survives_framing() {
        let container = batch();
        let bytes = container.to_bytes().unwrap();
        let restored = RawContainer::from_bytes(&bytes).unwrap();
        assert_eq!(container, restored);
    }

    #[test]
    fn terse_message_survives_framing() {
        let container = RawContainer::TersePrivateMessage(ShortMessage {
            id: 3,
            user_id: UserId::new(77),
            out: true,
            mentioned: false,
            media_unread: false,
            silent: false,
            text: "hi".into(),
            pts: Pts::new(20),
            pts_count: 1,
            date: 1_700_000_000,
            fwd_from: Some(ForwardHeader {
                from_id: Some(Peer::Channel(ChannelId::new(9))),
                from_name: None,
                date: 1_600_000_000,
                channel_post: None,
            }),
            via_bot_id: None,
            reply_to: None,
            entities: vec![],
            ttl_period: None,
        });
        let restored = RawContainer::from_bytes(&container.to_bytes().unwrap()).unwrap();
        assert_eq!(container, restored);
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert!(matches!(
            RawContainer::from_bytes(&[]),
            Err(WireError::InvalidData(_))
        ));
    }

    #[test]
    fn garbage_frame_is_rejected() {
        assert!(matches!(
            RawContainer::from_bytes(&[0xc1, 0x00, 0x13]),
            Err(WireError::Deserialization(_))
        ));
    }

    #[test]
    fn kind_names() {
        assert_eq!(RawContainer::Overflow.kind(), "Overflow");
        assert_eq!(batch().kind(), "Batch");
    }
}
