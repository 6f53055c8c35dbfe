//! Gap detection for pts-counted events.
//!
//! Every counted event declares the position it leads to (`pts`) and how
//! many increments it represents (`pts_count`). Comparing the locally
//! expected position with the declared one tells whether the event is
//! the next one, one we already saw, or whether something was missed.
//!
//! Counters come from the network, so the comparison is done on `i64`.

use upsync_types::{ChannelId, Pts};

/// What to do with one counted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapDecision {
    /// The event is the next one: apply it and move to its pts.
    Apply,
    /// Already applied by an earlier batch or recovery: drop it.
    Duplicate,
    /// Events were missed: do not apply, fetch the difference instead.
    Gap,
    /// The counter is negative: the event would move the position
    /// backwards. Drop it.
    Malformed,
}

/// Decide what to do with an incoming counted event.
///
/// `current` is `None` when no position is known yet for the event's
/// scope. The first event of an unknown scope is applied as-is and
/// establishes the position. A negative `pts_count` is never applied.
pub fn decide(current: Option<Pts>, incoming: Pts, pts_count: i32) -> GapDecision {
    if pts_count < 0 {
        return GapDecision::Malformed;
    }

    let current = match current {
        Some(pts) => pts,
        None => return GapDecision::Apply,
    };

    let expected = current.expected_after(pts_count);
    let incoming = i64::from(incoming.value());

    if expected == incoming && incoming >= i64::from(current.value()) {
        GapDecision::Apply
    } else if expected > incoming {
        GapDecision::Duplicate
    } else {
        GapDecision::Gap
    }
}

/// Which difference loader a gap calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The account-wide counter skipped.
    Global,
    /// A channel's counter skipped.
    Scope(ChannelId),
}

impl Recovery {
    /// Pick the loader for an event with the given scope.
    pub fn for_scope(scope: Option<ChannelId>) -> Self {
        match scope {
            Some(channel) => Recovery::Scope(channel),
            None => Recovery::Global,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_event_is_applied() {
        assert_eq!(
            decide(Some(Pts::new(100)), Pts::new(101), 1),
            GapDecision::Apply
        );
        assert_eq!(
            decide(Some(Pts::new(100)), Pts::new(103), 3),
            GapDecision::Apply
        );
    }

    #[test]
    fn zero_count_event_at_current_position_is_applied() {
        assert_eq!(
            decide(Some(Pts::new(100)), Pts::new(100), 0),
            GapDecision::Apply
        );
    }

    #[test]
    fn already_seen_event_is_duplicate() {
        assert_eq!(
            decide(Some(Pts::new(100)), Pts::new(100), 1),
            GapDecision::Duplicate
        );
        assert_eq!(
            decide(Some(Pts::new(100)), Pts::new(50), 1),
            GapDecision::Duplicate
        );
    }

    #[test]
    fn skipped_events_are_a_gap() {
        // expected 110, declared 150
        assert_eq!(
            decide(Some(Pts::new(100)), Pts::new(150), 10),
            GapDecision::Gap
        );
    }

    #[test]
    fn unknown_scope_applies_first_event() {
        assert_eq!(decide(None, Pts::new(5000), 1), GapDecision::Apply);
        assert_eq!(decide(None, Pts::new(0), 0), GapDecision::Apply);
    }

    #[test]
    fn hostile_counts_do_not_overflow() {
        assert_eq!(
            decide(Some(Pts::new(i32::MAX)), Pts::new(i32::MIN), i32::MAX),
            GapDecision::Duplicate
        );
        assert_eq!(
            decide(Some(Pts::new(i32::MIN)), Pts::new(i32::MAX), i32::MIN),
            GapDecision::Malformed
        );
    }

    #[test]
    fn negative_count_never_moves_backwards() {
        // 101 - 1 == 100 would otherwise look like the next event
        assert_eq!(
            decide(Some(Pts::new(101)), Pts::new(100), -1),
            GapDecision::Malformed
        );
        assert_eq!(
            decide(Some(Pts::new(101)), Pts::new(200), -1),
            GapDecision::Malformed
        );
        assert_eq!(decide(None, Pts::new(100), -1), GapDecision::Malformed);
    }

    #[test]
    fn recovery_follows_scope() {
        assert_eq!(Recovery::for_scope(None), Recovery::Global);
        assert_eq!(
            Recovery::for_scope(Some(ChannelId::new(4))),
            Recovery::Scope(ChannelId::new(4))
        );
    }
}
