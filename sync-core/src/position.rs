//! Positions the engine keeps in memory between checkpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use upsync_types::{ChannelId, Pts, UpdatesState, UserId};

/// Account-wide sequence cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPosition {
    /// Account-wide position.
    pub pts: Pts,
    /// Date of the last applied container.
    pub date: i32,
}

impl GlobalPosition {
    /// Create a position.
    pub fn new(pts: Pts, date: i32) -> Self {
        Self { pts, date }
    }
}

impl From<UpdatesState> for GlobalPosition {
    fn from(state: UpdatesState) -> Self {
        Self {
            pts: state.pts,
            date: state.date,
        }
    }
}

/// Who the session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The current account.
    pub account_id: UserId,
    /// Service (bot) accounts page through larger differences.
    pub is_service_account: bool,
}

/// Write-through overlay of per-channel positions.
///
/// Populated lazily on first reference to a channel and flushed to the
/// position store at checkpoint time. A cached value is never lower than
/// the value persisted at the last checkpoint.
#[derive(Debug, Clone, Default)]
pub struct ScopePtsCache {
    entries: HashMap<ChannelId, Pts>,
}

impl ScopePtsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached position for a channel.
    pub fn get(&self, channel: ChannelId) -> Option<Pts> {
        self.entries.get(&channel).copied()
    }

    /// Set a channel's position.
    pub fn set(&mut self, channel: ChannelId, pts: Pts) {
        self.entries.insert(channel, pts);
    }

    /// Whether a channel has a cached position.
    pub fn contains(&self, channel: ChannelId) -> bool {
        self.entries.contains_key(&channel)
    }

    /// Copy of every cached position, for checkpointing.
    pub fn snapshot(&self) -> HashMap<ChannelId, Pts> {
        self.entries.clone()
    }

    /// Number of cached channels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
