//! Embedded events.
//!
//! Every event the server can push is a variant of [`Update`]. Events
//! that advance a pts counter expose it through [`Update::counted`];
//! the rest are applied unconditionally.

use serde::{Deserialize, Serialize};

use crate::{ChannelId, DcOption, Message, Peer, Pts, UserId};

/// Position bookkeeping carried by a counted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counted {
    /// Channel whose counter this event advances (`None` = account-wide)
    pub scope: Option<ChannelId>,
    /// Position after applying the event
    pub pts: Pts,
    /// Number of increments the event represents
    pub pts_count: i32,
}

/// A single event embedded in a container or difference page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Update {
    /// New message in a private chat or basic group
    NewMessage {
        /// The message
        message: Message,
        /// Position after this event
        pts: Pts,
        /// Increments represented
        pts_count: i32,
    },
    /// Edited message in a private chat or basic group
    EditMessage {
        /// The edited message
        message: Message,
        /// Position after this event
        pts: Pts,
        /// Increments represented
        pts_count: i32,
    },
    /// Messages deleted from private chats or basic groups
    DeleteMessages {
        /// Deleted message ids
        ids: Vec<i32>,
        /// Position after this event
        pts: Pts,
        /// Increments represented
        pts_count: i32,
    },
    /// Incoming messages were read
    ReadHistoryInbox {
        /// Conversation
        peer: Peer,
        /// Highest read message id
        max_id: i32,
        /// Position after this event
        pts: Pts,
        /// Increments represented
        pts_count: i32,
    },
    /// New message in a channel or supergroup
    NewChannelMessage {
        /// The message (its `peer_id` names the channel)
        message: Message,
        /// Channel position after this event
        pts: Pts,
        /// Increments represented
        pts_count: i32,
    },
    /// Edited message in a channel or supergroup
    EditChannelMessage {
        /// The edited message
        message: Message,
        /// Channel position after this event
        pts: Pts,
        /// Increments represented
        pts_count: i32,
    },
    /// Messages deleted from a channel
    DeleteChannelMessages {
        /// Channel
        channel_id: ChannelId,
        /// Deleted message ids
        ids: Vec<i32>,
        /// Channel position after this event
        pts: Pts,
        /// Increments represented
        pts_count: i32,
    },
    /// Incoming channel messages were read
    ReadChannelInbox {
        /// Channel
        channel_id: ChannelId,
        /// Highest read message id
        max_id: i32,
        /// Current channel position (informational, not counted)
        pts: Pts,
    },
    /// Too many events are pending for a channel; they must be fetched
    ChannelTooLong {
        /// Channel
        channel_id: ChannelId,
        /// Last known channel position, if the server supplied one
        pts: Option<Pts>,
    },
    /// A user went online or offline
    UserStatus {
        /// User
        user_id: UserId,
        /// Whether the user is online now
        online: bool,
    },
    /// The datacenter topology changed
    DcOptions {
        /// New endpoint list
        dc_options: Vec<DcOption>,
    },
    /// The server configuration changed and must be refetched
    ConfigChanged,
}

impl Update {
    /// Channel this event belongs to, if any.
    pub fn scope(&self) -> Option<ChannelId> {
        match self {
            Update::NewChannelMessage { message, .. }
            | Update::EditChannelMessage { message, .. } => message.peer_id.channel_id(),
            Update::DeleteChannelMessages { channel_id, .. }
            | Update::ReadChannelInbox { channel_id, .. }
            | Update::ChannelTooLong { channel_id, .. } => Some(*channel_id),
            _ => None,
        }
    }

    /// The `(scope, pts, pts_count)` triple, for events that advance a counter.
    pub fn counted(&self) -> Option<Counted> {
        let (pts, pts_count) = match self {
            Update::NewMessage { pts, pts_count, .. }
            | Update::EditMessage { pts, pts_count, .. }
            | Update::DeleteMessages { pts, pts_count, .. }
            | Update::ReadHistoryInbox { pts, pts_count, .. }
            | Update::NewChannelMessage { pts, pts_count, .. }
            | Update::EditChannelMessage { pts, pts_count, .. }
            | Update::DeleteChannelMessages { pts, pts_count, .. } => (*pts, *pts_count),
            Update::ReadChannelInbox { .. }
            | Update::ChannelTooLong { .. }
            | Update::UserStatus { .. }
            | Update::DcOptions { .. }
            | Update::ConfigChanged => return None,
        };
        Some(Counted {
            scope: self.scope(),
            pts,
            pts_count,
        })
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Update::NewMessage { .. } => "NewMessage",
            Update::EditMessage { .. } => "EditMessage",
            Update::DeleteMessages { .. } => "DeleteMessages",
            Update::ReadHistoryInbox { .. } => "ReadHistoryInbox",
            Update::NewChannelMessage { .. } => "NewChannelMessage",
            Update::EditChannelMessage { .. } => "EditChannelMessage",
            Update::DeleteChannelMessages { .. } => "DeleteChannelMessages",
            Update::ReadChannelInbox { .. } => "ReadChannelInbox",
            Update::ChannelTooLong { .. } => "ChannelTooLong",
            Update::UserStatus { .. } => "UserStatus",
            Update::DcOptions { .. } => "DcOptions",
            Update::ConfigChanged => "ConfigChanged",
        }
    }
}

/// What the engine hands to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A bare message, from a difference page or a reconstructed terse shape.
    Message(Message),
    /// Any other event.
    Update(Update),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_in(peer: Peer) -> Message {
        Message {
            id: 1,
            out: false,
            mentioned: false,
            media_unread: false,
            silent: false,
            from_id: None,
            peer_id: peer,
            fwd_from: None,
            via_bot_id: None,
            reply_to: None,
            date: 0,
            text: String::new(),
            entities: vec![],
            ttl_period: None,
        }
    }

    #[test]
    fn account_wide_events_have_no_scope() {
        let update = Update::NewMessage {
            message: message_in(Peer::User(UserId::new(1))),
            pts: Pts::new(5),
            pts_count: 1,
        };
        let counted = update.counted().unwrap();
        assert_eq!(counted.scope, None);
        assert_eq!(counted.pts, Pts::new(5));
        assert_eq!(counted.pts_count, 1);
    }

    #[test]
    fn channel_events_are_scoped_by_message_peer() {
        let update = Update::NewChannelMessage {
            message: message_in(Peer::Channel(ChannelId::new(42))),
            pts: Pts::new(7),
            pts_count: 1,
        };
        assert_eq!(update.scope(), Some(ChannelId::new(42)));
        assert_eq!(update.counted().unwrap().scope, Some(ChannelId::new(42)));
    }

    #[test]
    fn uncounted_events() {
        assert!(Update::ConfigChanged.counted().is_none());
        assert!(Update::UserStatus {
            user_id: UserId::new(1),
            online: true
        }
        .counted()
        .is_none());

        let too_long = Update::ChannelTooLong {
            channel_id: ChannelId::new(3),
            pts: Some(Pts::new(10)),
        };
        assert!(too_long.counted().is_none());
        assert_eq!(too_long.scope(), Some(ChannelId::new(3)));
    }

    #[test]
    fn update_json_is_tagged() {
        let json = serde_json::to_value(Update::ConfigChanged).unwrap();
        assert_eq!(json["type"], "ConfigChanged");
    }
}
