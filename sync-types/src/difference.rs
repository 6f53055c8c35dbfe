//! Bulk catch-up responses.

use serde::{Deserialize, Serialize};

use crate::{ChatRecord, Message, Pts, Update, UserRecord};

/// Account-wide state as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatesState {
    /// Account-wide position
    pub pts: Pts,
    /// Server date
    pub date: i32,
}

/// Events and entities carried by one difference page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferenceBody {
    /// Messages that arrived while the client was away
    pub new_messages: Vec<Message>,
    /// Any other events, in server order
    pub other_updates: Vec<Update>,
    /// Users referenced by the page
    pub users: Vec<UserRecord>,
    /// Chats referenced by the page
    pub chats: Vec<ChatRecord>,
}

/// Response to an account-wide difference request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difference {
    /// Nothing happened since the requested state
    Empty {
        /// Current server date
        date: i32,
    },
    /// The gap is too large to enumerate
    TooLong {
        /// Current server position
        pts: Pts,
    },
    /// A partial page; more remain after `intermediate_state`
    Slice {
        /// Page contents
        body: DifferenceBody,
        /// State to request the next page from
        intermediate_state: UpdatesState,
    },
    /// The last page
    Full {
        /// Page contents
        body: DifferenceBody,
        /// State after this page
        state: UpdatesState,
    },
}

/// Response to a per-channel difference request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelDifference {
    /// Nothing happened since the requested position
    Empty {
        /// Current channel position
        pts: Pts,
        /// Whether there is nothing more to fetch
        is_final: bool,
    },
    /// The gap is too large to enumerate
    TooLong {
        /// Whether there is nothing more to fetch
        is_final: bool,
    },
    /// A page of channel events
    Page {
        /// Page contents
        body: DifferenceBody,
        /// Channel position after this page
        pts: Pts,
        /// Whether this is the last page
        is_final: bool,
    },
}
