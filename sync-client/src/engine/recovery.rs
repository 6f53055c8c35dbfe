//! Difference loaders.
//!
//! Both loaders request pages until the server reports it is done. Page
//! contents are authoritative: they are dispatched without a gap check,
//! and the position moves to the one the page names.

use std::sync::Arc;
use upsync_core::{global_step, scope_step, DiffStep, Recovery};
use upsync_types::{ChannelId, DifferenceBody, EntityIndex, Event, Pts};

use super::{EngineError, RecoveryOutcome, Report, SyncContext, UpdateEngine};
use crate::metrics::EngineMetrics;

impl UpdateEngine {
    /// Run the loader a gap (or overflow) calls for, recording its outcome.
    pub(super) async fn recover(
        &self,
        ctx: &mut SyncContext,
        recovery: Recovery,
        report: &mut Report,
    ) -> Result<RecoveryOutcome, EngineError> {
        EngineMetrics::bump(&self.metrics.recoveries_total);

        let outcome = match recovery {
            Recovery::Global => self.load_difference(ctx, report).await?,
            Recovery::Scope(channel) => self.load_scope_difference(ctx, channel, report).await?,
        };

        tracing::debug!("Recovery finished: {:?}", outcome);
        report.recoveries.push(outcome);
        Ok(outcome)
    }

    async fn load_difference(
        &self,
        ctx: &mut SyncContext,
        report: &mut Report,
    ) -> Result<RecoveryOutcome, EngineError> {
        let recovery = Recovery::Global;
        let mut pages = 0;

        loop {
            let position = ctx.global.ok_or(EngineError::NotAuthorized)?;
            let diff = self
                .api
                .get_difference(position.pts, position.date)
                .await?;

            let page = match global_step(diff) {
                DiffStep::CaughtUp => return Ok(RecoveryOutcome::CaughtUp { recovery, pages }),
                DiffStep::Overflowed => {
                    tracing::warn!("Difference too long at {}, position kept", position.pts);
                    return Ok(RecoveryOutcome::Overflowed { recovery, pages });
                }
                DiffStep::Page(page) => page,
            };

            pages += 1;
            tracing::debug!(
                "Difference page {}: {} messages, {} other updates, next {}",
                pages,
                page.body.new_messages.len(),
                page.body.other_updates.len(),
                page.next.pts
            );

            let applied = self.apply_page(page.body, report).await;
            ctx.global = Some(page.next);
            applied?;

            if page.is_final {
                return Ok(RecoveryOutcome::CaughtUp { recovery, pages });
            }
        }
    }

    async fn load_scope_difference(
        &self,
        ctx: &mut SyncContext,
        channel: ChannelId,
        report: &mut Report,
    ) -> Result<RecoveryOutcome, EngineError> {
        let input = match self.resolver.resolve_channel(channel).await {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!("Cannot fetch difference for channel {}: {}", channel, e);
                return Ok(RecoveryOutcome::Unresolvable(channel));
            }
        };

        let recovery = Recovery::Scope(channel);
        let mut pts = match ctx.scopes.get(channel).filter(|pts| !pts.is_zero()) {
            Some(pts) => pts,
            None => self
                .store
                .scope_position(channel)
                .await?
                .unwrap_or_else(Pts::zero),
        };
        let is_service_account = ctx
            .identity
            .map_or(false, |identity| identity.is_service_account);
        let limit = self.config.recovery.diff_limit(is_service_account);
        let mut pages = 0;

        loop {
            let diff = self.api.get_channel_difference(input, pts, limit).await?;

            let page = match scope_step(diff) {
                DiffStep::CaughtUp => return Ok(RecoveryOutcome::CaughtUp { recovery, pages }),
                DiffStep::Overflowed => {
                    tracing::warn!(
                        "Channel {} difference too long at {}, position kept",
                        channel,
                        pts
                    );
                    return Ok(RecoveryOutcome::Overflowed { recovery, pages });
                }
                DiffStep::Page(page) => page,
            };

            pages += 1;
            tracing::debug!(
                "Channel {} difference page {}: next {}",
                channel,
                pages,
                page.next
            );

            let applied = self.apply_page(page.body, report).await;
            pts = page.next;
            ctx.scopes.set(channel, pts);
            applied?;

            if page.is_final {
                return Ok(RecoveryOutcome::CaughtUp { recovery, pages });
            }
        }
    }

    /// Dispatch every message, then every other event, in server order.
    ///
    /// A dispatch failure does not stop the page; the first one is
    /// returned once the whole page went out.
    async fn apply_page(
        &self,
        body: DifferenceBody,
        report: &mut Report,
    ) -> Result<(), EngineError> {
        EngineMetrics::bump(&self.metrics.recovery_pages);

        let entities = Arc::new(EntityIndex::from_lists(body.users, body.chats));
        self.resolver.remember(&entities);

        let events = body
            .new_messages
            .into_iter()
            .map(Event::Message)
            .chain(body.other_updates.into_iter().map(Event::Update));

        let mut first_error = None;
        for event in events {
            if let Err(e) = self.deliver(event, Arc::clone(&entities), report).await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
