//! UpdateEngine - ordered application of pushed updates.
//!
//! This module provides [`UpdateEngine`], which takes containers from the
//! transport, applies their events in order, detects gaps in the pts
//! counters and fetches missed events through the difference loaders.
//!
//! # Architecture
//!
//! Decisions come from `sync-core` (gap detection, terse reconstruction,
//! difference-page interpretation); this module performs the I/O they
//! call for through the collaborator traits.
//!
//! ```text
//! transport ─► submit ─► [gate] ─► classify ─► gap check ─► dispatch
//!                                      │            │
//!                                      │            └─► difference loader ─► Api
//!                                      └─► EntityResolver (terse lookups)
//! ```
//!
//! # The gate
//!
//! One `tokio::sync::Mutex` guards the whole pipeline and the
//! [`SyncContext`] it mutates. Waiters are served in FIFO order, so
//! containers are processed strictly in arrival order, and recovery
//! started by one container finishes before the next one begins. The
//! guard is dropped on every exit path. Errors raised inside the
//! pipeline are caught at the gate and handed to the [`ErrorObserver`];
//! [`UpdateEngine::submit`] never returns an error.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upsync_client::{EngineConfig, EngineParts, UpdateEngine};
//!
//! let engine = Arc::new(UpdateEngine::new(EngineConfig::default(), parts));
//! engine.bootstrap().await?;
//!
//! let (inbox, _pump) = engine.spawn_inbox();
//! inbox.send(container).await?;
//! ```

mod checkpoint;
mod classify;
mod recovery;


pub use checkpoint::spawn_checkpoint_task;

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use upsync_core::{GlobalPosition, Identity, Recovery, ScopePtsCache};
use upsync_types::{ChannelId, Pts, RawContainer, ServerConfig, WireError};

use crate::api::{Api, ApiError};
use crate::config::EngineConfig;
use crate::dispatch::{DispatchError, ErrorObserver, UpdateDispatcher};
use crate::metrics::EngineMetrics;
use crate::resolver::{EntityResolver, ResolveError};
use crate::storage::{PositionStore, StorageError};

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// RPC error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Entity resolution error.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Downstream consumer error.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Container could not be decoded.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// No global position is known yet.
    #[error("no updates state (not authorized)")]
    NotAuthorized,

    /// The account identity is needed but unknown.
    #[error("account identity unknown")]
    NoIdentity,
}

/// The collaborators an engine is built from.
pub struct EngineParts {
    /// RPC surface.
    pub api: Arc<dyn Api>,
    /// Durable position storage.
    pub store: Arc<dyn PositionStore>,
    /// Entity lookups and handle cache.
    pub resolver: Arc<dyn EntityResolver>,
    /// Downstream consumer.
    pub dispatcher: Arc<dyn UpdateDispatcher>,
    /// Sink for errors caught at the gate.
    pub observer: Arc<dyn ErrorObserver>,
}

/// How one difference loader run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The server reported nothing left to fetch.
    CaughtUp {
        /// Which loader ran.
        recovery: Recovery,
        /// Pages applied before catching up.
        pages: usize,
    },
    /// The server refused to enumerate the gap; position left as is.
    Overflowed {
        /// Which loader ran.
        recovery: Recovery,
        /// Pages applied before the overflow.
        pages: usize,
    },
    /// The channel handle could not be resolved; nothing was fetched.
    Unresolvable(ChannelId),
}

/// What happened while processing one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Events handed to the dispatcher (live and recovered).
    pub applied: usize,
    /// Counted events ignored as already applied.
    pub duplicates: usize,
    /// Events skipped: entities could not be looked up, or the counter
    /// was negative.
    pub skipped: usize,
    /// Whether a gap or overflow cut the container short.
    pub aborted: bool,
    /// Difference loader runs, in order.
    pub recoveries: Vec<RecoveryOutcome>,
}

/// Result of [`UpdateEngine::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The container went through the pipeline.
    Processed(Report),
    /// No global position was known; the container was ignored.
    Dropped,
    /// The pipeline failed; the error went to the observer.
    Failed,
}

/// Result of [`UpdateEngine::bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// No session is stored; call [`UpdateEngine::authorize`] first.
    Unauthorized,
    /// Positions were loaded from the store.
    Resumed(GlobalPosition),
    /// A session existed without positions; fresh state was fetched.
    Fresh(GlobalPosition),
}

/// Sending half of the inbox returned by [`UpdateEngine::spawn_inbox`].
pub type UpdateSender = mpsc::Sender<RawContainer>;

/// Everything the gate protects.
#[derive(Debug, Default)]
pub(crate) struct SyncContext {
    pub(crate) global: Option<GlobalPosition>,
    pub(crate) scopes: ScopePtsCache,
    pub(crate) identity: Option<Identity>,
    pub(crate) server_config: Option<ServerConfig>,
}

/// The update synchronization engine.
pub struct UpdateEngine {
    config: EngineConfig,
    api: Arc<dyn Api>,
    store: Arc<dyn PositionStore>,
    resolver: Arc<dyn EntityResolver>,
    dispatcher: Arc<dyn UpdateDispatcher>,
    observer: Arc<dyn ErrorObserver>,
    state: Mutex<SyncContext>,
    /// Held across snapshot and writes so checkpoints land in order.
    checkpoint_lock: Mutex<()>,
    metrics: EngineMetrics,
}

impl std::fmt::Debug for UpdateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateEngine")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl UpdateEngine {
    /// Create an engine with no session loaded.
    pub fn new(config: EngineConfig, parts: EngineParts) -> Self {
        Self {
            config,
            api: parts.api,
            store: parts.store,
            resolver: parts.resolver,
            dispatcher: parts.dispatcher,
            observer: parts.observer,
            state: Mutex::new(SyncContext::default()),
            checkpoint_lock: Mutex::new(()),
            metrics: EngineMetrics::default(),
        }
    }

    /// Load the session from the position store.
    ///
    /// With no stored identity nothing else is loaded. With an identity
    /// but no stored position (a session that never synced) the initial
    /// state is fetched from the server.
    pub async fn bootstrap(&self) -> Result<Bootstrap, EngineError> {
        self.store.load().await?;
        let identity = self.store.identity().await?;
        let position = self.store.global_position().await?;

        let mut ctx = self.state.lock().await;
        ctx.identity = identity;

        if identity.is_none() {
            tracing::info!("No stored session, waiting for authorization");
            return Ok(Bootstrap::Unauthorized);
        }

        match position {
            Some(position) => {
                tracing::info!("Resumed session at {} (date {})", position.pts, position.date);
                ctx.global = Some(position);
                Ok(Bootstrap::Resumed(position))
            }
            None => {
                let position = self.fetch_state_locked(&mut ctx).await?;
                Ok(Bootstrap::Fresh(position))
            }
        }
    }

    /// Record a freshly authorized identity and start from the server's
    /// current state.
    pub async fn authorize(&self, identity: Identity) -> Result<GlobalPosition, EngineError> {
        let position = {
            let mut ctx = self.state.lock().await;
            ctx.identity = Some(identity);
            self.fetch_state_locked(&mut ctx).await?
        };
        tracing::info!("Authorized as {}", identity.account_id);
        self.checkpoint().await?;
        Ok(position)
    }

    /// Replace the global position with the server's current state.
    pub async fn fetch_state(&self) -> Result<GlobalPosition, EngineError> {
        let mut ctx = self.state.lock().await;
        self.fetch_state_locked(&mut ctx).await
    }

    async fn fetch_state_locked(
        &self,
        ctx: &mut SyncContext,
    ) -> Result<GlobalPosition, EngineError> {
        let position = GlobalPosition::from(self.api.get_state().await?);
        tracing::info!("Fetched updates state: {} (date {})", position.pts, position.date);
        ctx.global = Some(position);
        Ok(position)
    }

    /// Process one container.
    ///
    /// Waits for the gate, runs the whole pipeline (including any
    /// recovery it triggers) and releases the gate. Failures are handed
    /// to the error observer, never returned.
    pub async fn submit(&self, container: RawContainer) -> Outcome {
        let mut ctx = self.state.lock().await;

        if ctx.global.is_none() {
            tracing::warn!(
                "Received {} before updates state is available, dropping",
                container.kind()
            );
            EngineMetrics::bump(&self.metrics.containers_dropped);
            return Outcome::Dropped;
        }

        tracing::debug!("Received {}", container.kind());

        let mut report = Report::default();
        match self.process(&mut ctx, container, &mut report).await {
            Ok(()) => {
                EngineMetrics::bump(&self.metrics.containers_processed);
                Outcome::Processed(report)
            }
            Err(e) => {
                self.observe(&e);
                Outcome::Failed
            }
        }
    }

    /// Decode a MessagePack frame and process it.
    pub async fn submit_bytes(&self, bytes: &[u8]) -> Outcome {
        match RawContainer::from_bytes(bytes) {
            Ok(container) => self.submit(container).await,
            Err(e) => {
                self.observe(&EngineError::Wire(e));
                Outcome::Failed
            }
        }
    }

    /// Run the global difference loader from the current position.
    pub async fn catch_up(&self) -> Result<RecoveryOutcome, EngineError> {
        let mut ctx = self.state.lock().await;
        if ctx.global.is_none() {
            return Err(EngineError::NotAuthorized);
        }
        let mut report = Report::default();
        self.recover(&mut ctx, Recovery::Global, &mut report).await
    }

    /// Persist positions and identity.
    ///
    /// The snapshot is taken under the gate, so a container in flight is
    /// never persisted half-applied. Writing happens after the gate is
    /// released, so containers keep flowing while the store is slow.
    /// Checkpoints themselves run one at a time: a later snapshot is never
    /// overwritten by an earlier one. Before any position exists only the
    /// identity is written.
    pub async fn checkpoint(&self) -> Result<(), EngineError> {
        let _serial = self.checkpoint_lock.lock().await;
        let (global, scopes, identity) = {
            let ctx = self.state.lock().await;
            (ctx.global, ctx.scopes.snapshot(), ctx.identity)
        };

        if let Some(position) = global {
            self.store.set_global_position(position).await?;
            self.store.set_scope_positions(&scopes).await?;
        }
        if let Some(identity) = identity {
            self.store.set_identity(identity).await?;
        }
        self.store.save().await?;

        tracing::debug!(
            "Checkpoint saved ({} channel positions)",
            if global.is_some() { scopes.len() } else { 0 }
        );
        Ok(())
    }

    /// Spawn a task that submits containers in the order they are sent.
    ///
    /// The task ends when every sender is dropped.
    pub fn spawn_inbox(self: &Arc<Self>) -> (UpdateSender, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(self.config.inbox.capacity.max(1));
        let engine = Arc::clone(self);

        let handle = tokio::spawn(async move {
            while let Some(container) = rx.recv().await {
                engine.submit(container).await;
            }
            tracing::debug!("Update inbox closed");
        });

        (tx, handle)
    }

    /// Current account-wide position.
    pub async fn position(&self) -> Option<GlobalPosition> {
        self.state.lock().await.global
    }

    /// Cached position for a channel.
    pub async fn scope_position(&self, channel: ChannelId) -> Option<Pts> {
        self.state.lock().await.scopes.get(channel)
    }

    /// Current account identity.
    pub async fn identity(&self) -> Option<Identity> {
        self.state.lock().await.identity
    }

    /// Last server configuration fetched.
    pub async fn server_config(&self) -> Option<ServerConfig> {
        self.state.lock().await.server_config.clone()
    }

    /// Operational counters.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn observe(&self, error: &EngineError) {
        EngineMetrics::bump(&self.metrics.errors_total);
        tracing::error!("Update processing failed: {}", error);
        self.observer.observe(error);
    }
}
