//! Identity and ordering types for upsync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of a user account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Create a UserId from its raw value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// Numeric identifier of a basic group chat.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChatId(i64);

impl ChatId {
    /// Create a ChatId from its raw value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChatId({})", self.0)
    }
}

/// Numeric identifier of a channel or supergroup.
///
/// Channels are the independently sequenced scopes: each one carries
/// its own pts counter, separate from the account-wide one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(i64);

impl ChannelId {
    /// Create a ChannelId from its raw value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

/// A reference to a peer embedded in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Peer {
    /// A user (private conversation).
    User(UserId),
    /// A basic group chat.
    Chat(ChatId),
    /// A channel or supergroup.
    Channel(ChannelId),
}

impl Peer {
    /// The channel this peer refers to, if it is one.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Peer::Channel(id) => Some(*id),
            _ => None,
        }
    }

    /// The user this peer refers to, if it is one.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Peer::User(id) => Some(*id),
            _ => None,
        }
    }
}

/// A position in a server-maintained event sequence.
///
/// Assigned by the server. Positions arrive from an untrusted peer, so
/// arithmetic on them is done in `i64` and never overflows.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Pts(i32);

impl Pts {
    /// Create a new Pts with the given value.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the numeric value of this Pts.
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Create a Pts representing "nothing applied yet".
    pub fn zero() -> Self {
        Self(0)
    }

    /// Whether this is the zero position.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The position expected after applying an event worth `count` increments.
    pub fn expected_after(&self, count: i32) -> i64 {
        i64::from(self.0) + i64::from(count)
    }
}

impl fmt::Display for Pts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Pts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pts({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_ordering() {
        let p1 = Pts::new(100);
        let p2 = Pts::new(200);
        assert!(p1 < p2);
        assert!(p2 > p1);
    }

    #[test]
    fn pts_zero() {
        assert_eq!(Pts::zero().value(), 0);
        assert!(Pts::zero().is_zero());
        assert!(!Pts::new(1).is_zero());
    }

    #[test]
    fn expected_after_does_not_overflow() {
        let p = Pts::new(i32::MAX);
        assert_eq!(p.expected_after(1), i64::from(i32::MAX) + 1);
        assert_eq!(Pts::new(i32::MIN).expected_after(-1), i64::from(i32::MIN) - 1);
    }

    #[test]
    fn peer_accessors() {
        let channel = Peer::Channel(ChannelId::new(7));
        assert_eq!(channel.channel_id(), Some(ChannelId::new(7)));
        assert_eq!(channel.user_id(), None);

        let user = Peer::User(UserId::new(3));
        assert_eq!(user.user_id(), Some(UserId::new(3)));
        assert_eq!(user.channel_id(), None);
    }

    #[test]
    fn ids_debug_names_their_kind() {
        assert_eq!(format!("{:?}", UserId::new(1)), "UserId(1)");
        assert_eq!(format!("{:?}", ChannelId::new(2)), "ChannelId(2)");
        assert_eq!(format!("{:?}", ChatId::new(3)), "ChatId(3)");
        assert_eq!(format!("{:?}", Pts::new(4)), "Pts(4)");
    }
}
