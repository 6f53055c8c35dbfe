//! Interpreting bulk catch-up pages.
//!
//! A difference loader requests pages until the server says it is done.
//! Each response maps to one [`DiffStep`]:
//!
//! ```text
//! Requesting ──► CaughtUp     (nothing to apply, position unchanged)
//!            ├─► Overflowed   (gap too large, position unchanged)
//!            └─► Page         (apply events, move to page position,
//!                              request again unless final)
//! ```

use upsync_types::{ChannelDifference, Difference, DifferenceBody, Pts};

use crate::GlobalPosition;

/// One page worth of events, with the position it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPage<P> {
    /// Events and entities to apply, in server order.
    pub body: DifferenceBody,
    /// Position after applying the page.
    pub next: P,
    /// Whether no further pages remain.
    pub is_final: bool,
}

/// Outcome of one difference request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStep<P> {
    /// Nothing left to fetch.
    CaughtUp,
    /// The server refused to enumerate the gap.
    Overflowed,
    /// Events to apply.
    Page(DiffPage<P>),
}

impl<P> DiffStep<P> {
    /// Whether the loader should stop after this step.
    pub fn is_terminal(&self) -> bool {
        match self {
            DiffStep::CaughtUp | DiffStep::Overflowed => true,
            DiffStep::Page(page) => page.is_final,
        }
    }
}

/// Interpret an account-wide difference response.
pub fn global_step(diff: Difference) -> DiffStep<GlobalPosition> {
    match diff {
        Difference::Empty { .. } => DiffStep::CaughtUp,
        Difference::TooLong { .. } => DiffStep::Overflowed,
        Difference::Slice {
            body,
            intermediate_state,
        } => DiffStep::Page(DiffPage {
            body,
            next: intermediate_state.into(),
            is_final: false,
        }),
        Difference::Full { body, state } => DiffStep::Page(DiffPage {
            body,
            next: state.into(),
            is_final: true,
        }),
    }
}

/// Interpret a per-channel difference response.
pub fn scope_step(diff: ChannelDifference) -> DiffStep<Pts> {
    match diff {
        ChannelDifference::Empty { .. } => DiffStep::CaughtUp,
        ChannelDifference::TooLong { .. } => DiffStep::Overflowed,
        ChannelDifference::Page {
            body,
            pts,
            is_final,
        } => DiffStep::Page(DiffPage {
            body,
            next: pts,
            is_final,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upsync_types::UpdatesState;

    fn state(pts: i32) -> UpdatesState {
        UpdatesState {
            pts: Pts::new(pts),
            date: 1_700_000_000 + pts,
        }
    }

    #[test]
    fn empty_and_too_long_are_terminal() {
        let empty = global_step(Difference::Empty { date: 0 });
        assert_eq!(empty, DiffStep::CaughtUp);
        assert!(empty.is_terminal());

        let too_long = global_step(Difference::TooLong { pts: Pts::new(9) });
        assert_eq!(too_long, DiffStep::Overflowed);
        assert!(too_long.is_terminal());
    }

    #[test]
    fn slice_continues_from_intermediate_state() {
        let step = global_step(Difference::Slice {
            body: DifferenceBody::default(),
            intermediate_state: state(150),
        });
        assert!(!step.is_terminal());
        match step {
            DiffStep::Page(page) => {
                assert_eq!(page.next, GlobalPosition::new(Pts::new(150), 1_700_000_150));
                assert!(!page.is_final);
            }
            other => panic!("Expected page, got {:?}", other),
        }
    }

    #[test]
    fn full_difference_is_final() {
        let step = global_step(Difference::Full {
            body: DifferenceBody::default(),
            state: state(200),
        });
        assert!(step.is_terminal());
        assert!(matches!(step, DiffStep::Page(ref page) if page.next.pts == Pts::new(200)));
    }

    #[test]
    fn channel_pages_follow_final_flag() {
        let more = scope_step(ChannelDifference::Page {
            body: DifferenceBody::default(),
            pts: Pts::new(30),
            is_final: false,
        });
        assert!(!more.is_terminal());

        let last = scope_step(ChannelDifference::Page {
            body: DifferenceBody::default(),
            pts: Pts::new(40),
            is_final: true,
        });
        assert!(last.is_terminal());
        assert!(matches!(last, DiffStep::Page(ref page) if page.next == Pts::new(40)));
    }

    #[test]
    fn channel_empty_and_too_long() {
        assert_eq!(
            scope_step(ChannelDifference::Empty {
                pts: Pts::new(5),
                is_final: true
            }),
            DiffStep::CaughtUp
        );
        assert_eq!(
            scope_step(ChannelDifference::TooLong { is_final: true }),
            DiffStep::Overflowed
        );
    }
}
