//! Rebuilding full messages from terse container shapes.
//!
//! Terse shapes carry only ids for the people and chats involved. The
//! engine needs the matching entity records before it can dispatch, so
//! alongside the rebuilt [`Message`] this module produces a
//! [`LookupPlan`]: one batched user lookup, plus a chat lookup for
//! group messages and a channel lookup when the forward origin is a
//! channel.

use upsync_types::{
    ChannelId, ChatId, ForwardHeader, InputUser, Message, Peer, ShortChatMessage, ShortMessage,
    UserId,
};

/// Build the full record for a compact private message.
///
/// Outgoing messages are attributed to `self_id`; the wire `user_id` is
/// always the other party of the conversation.
pub fn private_message(short: &ShortMessage, self_id: UserId) -> Message {
    let sender = if short.out { self_id } else { short.user_id };
    Message {
        id: short.id,
        out: short.out,
        mentioned: short.mentioned,
        media_unread: short.media_unread,
        silent: short.silent,
        from_id: Some(Peer::User(sender)),
        peer_id: Peer::User(short.user_id),
        fwd_from: short.fwd_from.clone(),
        via_bot_id: short.via_bot_id,
        reply_to: short.reply_to.clone(),
        date: short.date,
        text: short.text.clone(),
        entities: short.entities.clone(),
        ttl_period: short.ttl_period,
    }
}

/// Build the full record for a compact group message.
pub fn group_message(short: &ShortChatMessage, self_id: UserId) -> Message {
    let sender = if short.out { self_id } else { short.from_id };
    Message {
        id: short.id,
        out: short.out,
        mentioned: short.mentioned,
        media_unread: short.media_unread,
        silent: short.silent,
        from_id: Some(Peer::User(sender)),
        peer_id: Peer::Chat(short.chat_id),
        fwd_from: short.fwd_from.clone(),
        via_bot_id: short.via_bot_id,
        reply_to: short.reply_to.clone(),
        date: short.date,
        text: short.text.clone(),
        entities: short.entities.clone(),
        ttl_period: short.ttl_period,
    }
}

/// Entity lookups needed to dispatch a rebuilt message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPlan {
    /// Users to fetch in one batched call.
    pub users: Vec<InputUser>,
    /// Basic group to fetch, for group messages.
    pub chat: Option<ChatId>,
    /// Channel to fetch when the forward origin is a channel.
    pub channel: Option<ChannelId>,
}

impl LookupPlan {
    /// Lookups for a compact private message.
    pub fn for_private(short: &ShortMessage) -> Self {
        Self::build(short.user_id, None, short.fwd_from.as_ref())
    }

    /// Lookups for a compact group message.
    pub fn for_group(short: &ShortChatMessage) -> Self {
        Self::build(short.from_id, Some(short.chat_id), short.fwd_from.as_ref())
    }

    fn build(counterpart: UserId, chat: Option<ChatId>, fwd: Option<&ForwardHeader>) -> Self {
        let mut users = vec![InputUser::Myself, InputUser::bare(counterpart)];
        let mut channel = None;

        match fwd.and_then(|f| f.from_id) {
            Some(Peer::User(user_id)) => users.push(InputUser::bare(user_id)),
            Some(Peer::Channel(channel_id)) => channel = Some(channel_id),
            Some(Peer::Chat(_)) | None => {}
        }

        Self {
            users,
            chat,
            channel,
        }
    }
}
