//! Container classification and live event application.

use std::sync::Arc;
use upsync_core::{decide, terse, GapDecision, LookupPlan, Recovery};
use upsync_types::{
    Batch, ChannelId, Counted, DcOption, EntityIndex, Event, InputChannel, Message, Pts,
    RawContainer, ShortUpdate, Update, UserId,
};

use super::{EngineError, Report, SyncContext, UpdateEngine};
use crate::metrics::EngineMetrics;
use crate::resolver::ResolveError;

/// Whether the rest of the container should still be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Abort,
}

impl UpdateEngine {
    pub(super) async fn process(
        &self,
        ctx: &mut SyncContext,
        container: RawContainer,
        report: &mut Report,
    ) -> Result<(), EngineError> {
        let flow = match container {
            RawContainer::Overflow => {
                self.recover(ctx, Recovery::Global, report).await?;
                Flow::Abort
            }
            RawContainer::Batch(batch) => self.process_batch(ctx, batch, report).await?,
            RawContainer::TerseGeneric(ShortUpdate { update, date }) => {
                let flow = self
                    .apply_one(ctx, update, &Arc::new(EntityIndex::new()), report)
                    .await?;
                if flow == Flow::Continue {
                    set_date(ctx, date);
                }
                flow
            }
            RawContainer::TersePrivateMessage(short) => {
                let counted = Counted {
                    scope: None,
                    pts: short.pts,
                    pts_count: short.pts_count,
                };
                let plan = LookupPlan::for_private(&short);
                let rebuild = |self_id| terse::private_message(&short, self_id);
                self.apply_terse(ctx, counted, plan, short.date, rebuild, report)
                    .await?
            }
            RawContainer::TerseGroupMessage(short) => {
                let counted = Counted {
                    scope: None,
                    pts: short.pts,
                    pts_count: short.pts_count,
                };
                let plan = LookupPlan::for_group(&short);
                let rebuild = |self_id| terse::group_message(&short, self_id);
                self.apply_terse(ctx, counted, plan, short.date, rebuild, report)
                    .await?
            }
        };

        report.aborted = flow == Flow::Abort;
        Ok(())
    }

    async fn process_batch(
        &self,
        ctx: &mut SyncContext,
        batch: Batch,
        report: &mut Report,
    ) -> Result<Flow, EngineError> {
        let entities = Arc::new(EntityIndex::from_lists(batch.users, batch.chats));
        self.resolver.remember(&entities);

        for update in batch.updates {
            if let Update::ChannelTooLong { channel_id, pts } = &update {
                let (channel, pts) = (*channel_id, *pts);
                tracing::debug!("Channel {} is too long, fetching difference", channel);
                if let Some(pts) = pts {
                    ctx.scopes.set(channel, pts);
                }
                self.recover(ctx, Recovery::Scope(channel), report).await?;
                return Ok(Flow::Abort);
            }

            if self.apply_one(ctx, update, &entities, report).await? == Flow::Abort {
                return Ok(Flow::Abort);
            }
        }

        set_date(ctx, batch.date);
        Ok(Flow::Continue)
    }

    /// Apply one embedded event: config changes update the cached server
    /// configuration, counted events go through the gap check, and the
    /// rest are dispatched as they come.
    async fn apply_one(
        &self,
        ctx: &mut SyncContext,
        update: Update,
        entities: &Arc<EntityIndex>,
        report: &mut Report,
    ) -> Result<Flow, EngineError> {
        let update = match update {
            Update::DcOptions { dc_options } => {
                apply_dc_options(ctx, dc_options);
                return Ok(Flow::Continue);
            }
            Update::ConfigChanged => {
                ctx.server_config = Some(self.api.get_config().await?);
                tracing::info!("Server configuration refreshed");
                return Ok(Flow::Continue);
            }
            other => other,
        };

        let counted = match update.counted() {
            Some(counted) => counted,
            None => {
                self.deliver(Event::Update(update), Arc::clone(entities), report)
                    .await?;
                return Ok(Flow::Continue);
            }
        };

        match self.check(ctx, counted, report).await? {
            GapDecision::Apply => {
                advance(ctx, counted);
                self.deliver(Event::Update(update), Arc::clone(entities), report)
                    .await?;
                Ok(Flow::Continue)
            }
            GapDecision::Duplicate | GapDecision::Malformed => Ok(Flow::Continue),
            GapDecision::Gap => {
                self.recover(ctx, Recovery::for_scope(counted.scope), report)
                    .await?;
                Ok(Flow::Abort)
            }
        }
    }

    /// Gap-check a terse message, then rebuild it and look up the
    /// entities it mentions. A failed lookup skips this message only.
    async fn apply_terse<F>(
        &self,
        ctx: &mut SyncContext,
        counted: Counted,
        plan: LookupPlan,
        date: i32,
        rebuild: F,
        report: &mut Report,
    ) -> Result<Flow, EngineError>
    where
        F: FnOnce(UserId) -> Message + Send,
    {
        match self.check(ctx, counted, report).await? {
            GapDecision::Apply => {}
            GapDecision::Duplicate | GapDecision::Malformed => return Ok(Flow::Continue),
            GapDecision::Gap => {
                self.recover(ctx, Recovery::Global, report).await?;
                return Ok(Flow::Abort);
            }
        }

        let identity = ctx.identity.ok_or(EngineError::NoIdentity)?;
        let message = rebuild(identity.account_id);
        advance(ctx, counted);

        match self.lookup(plan).await {
            Ok(entities) => {
                let entities = Arc::new(entities);
                self.resolver.remember(&entities);
                self.deliver(Event::Message(message), entities, report)
                    .await?;
            }
            Err(e) => {
                tracing::warn!("Skipping message {}: entity lookup failed: {}", message.id, e);
                report.skipped += 1;
                self.observe(&EngineError::Resolve(e));
            }
        }
        // The position moved past this message either way
        set_date(ctx, date);
        Ok(Flow::Continue)
    }

    /// One batched user lookup, plus the group and forward-origin channel
    /// when the plan names them.
    async fn lookup(&self, plan: LookupPlan) -> Result<EntityIndex, ResolveError> {
        let users = self.resolver.fetch_users(plan.users).await?;

        let mut chats = Vec::new();
        if let Some(chat) = plan.chat {
            chats.extend(self.resolver.fetch_chats(vec![chat]).await?);
        }
        if let Some(channel) = plan.channel {
            let input = self.forward_channel_handle(channel).await?;
            chats.extend(self.resolver.fetch_channels(vec![input]).await?);
        }

        Ok(EntityIndex::from_lists(users, chats))
    }

    async fn forward_channel_handle(
        &self,
        channel: ChannelId,
    ) -> Result<InputChannel, ResolveError> {
        match self.resolver.resolve_channel(channel).await {
            Ok(input) => Ok(input),
            Err(ResolveError::UnknownChannel(_)) => Ok(InputChannel {
                channel_id: channel,
                access_hash: 0,
            }),
            Err(e) => Err(e),
        }
    }

    /// Run the gap check for a counted event against its scope's position.
    async fn check(
        &self,
        ctx: &mut SyncContext,
        counted: Counted,
        report: &mut Report,
    ) -> Result<GapDecision, EngineError> {
        let current = self.current_pts(ctx, counted.scope).await?;
        let decision = decide(current, counted.pts, counted.pts_count);

        match decision {
            GapDecision::Apply => {}
            GapDecision::Duplicate => {
                tracing::debug!(
                    "Ignoring duplicate event at {} (count {})",
                    counted.pts,
                    counted.pts_count
                );
                report.duplicates += 1;
                EngineMetrics::bump(&self.metrics.duplicates_ignored);
            }
            GapDecision::Gap => {
                tracing::debug!(
                    "Gap detected: local {:?} + {} < {}",
                    current,
                    counted.pts_count,
                    counted.pts
                );
                EngineMetrics::bump(&self.metrics.gaps_detected);
            }
            GapDecision::Malformed => {
                tracing::warn!(
                    "Dropping event at {} with negative count {}",
                    counted.pts,
                    counted.pts_count
                );
                report.skipped += 1;
            }
        }
        Ok(decision)
    }

    /// Local position for a scope: the in-memory value, else the stored
    /// one (which is then cached), else unknown.
    async fn current_pts(
        &self,
        ctx: &mut SyncContext,
        scope: Option<ChannelId>,
    ) -> Result<Option<Pts>, EngineError> {
        let channel = match scope {
            None => return Ok(ctx.global.map(|position| position.pts)),
            Some(channel) => channel,
        };

        if let Some(pts) = ctx.scopes.get(channel) {
            return Ok(Some(pts));
        }

        match self.store.scope_position(channel).await? {
            Some(saved) if !saved.is_zero() => {
                ctx.scopes.set(channel, saved);
                Ok(Some(saved))
            }
            _ => Ok(None),
        }
    }

    pub(super) async fn deliver(
        &self,
        event: Event,
        entities: Arc<EntityIndex>,
        report: &mut Report,
    ) -> Result<(), EngineError> {
        self.dispatcher.dispatch(event, entities).await?;
        report.applied += 1;
        EngineMetrics::bump(&self.metrics.events_applied);
        Ok(())
    }
}

fn advance(ctx: &mut SyncContext, counted: Counted) {
    match counted.scope {
        Some(channel) => ctx.scopes.set(channel, counted.pts),
        None => {
            if let Some(global) = ctx.global.as_mut() {
                global.pts = counted.pts;
            }
        }
    }
}

fn set_date(ctx: &mut SyncContext, date: i32) {
    if let Some(global) = ctx.global.as_mut() {
        global.date = date;
    }
}

/// New endpoints only matter once a configuration has been fetched.
fn apply_dc_options(ctx: &mut SyncContext, dc_options: Vec<DcOption>) {
    match ctx.server_config.as_mut() {
        Some(config) => {
            tracing::debug!("DC options updated ({} endpoints)", dc_options.len());
            config.dc_options = dc_options;
        }
        None => tracing::debug!("DC options update ignored, no configuration cached"),
    }
}
