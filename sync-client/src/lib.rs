//! # sync-client
//!
//! Update synchronization engine for upsync.
//!
//! This is the library a client embeds between its transport and its
//! update handlers. It keeps the account-wide and per-channel pts
//! counters, applies pushed events strictly in order, and fetches
//! whatever it missed.
//!
//! ## Features
//!
//! - **Ordered application**: one gate serializes every container
//! - **Gap recovery**: global and per-channel difference loaders
//! - **Terse reconstruction**: compact message shapes rebuilt with entity lookups
//! - **Pluggable collaborators**: RPC, storage, resolver and dispatcher are traits
//! - **Pure decisions**: gap checks and page interpretation come from sync-core
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upsync_client::{
//!     CachingResolver, ChannelDispatcher, EngineConfig, EngineParts, LogObserver,
//!     MemoryPositionStore, UpdateEngine,
//! };
//!
//! let (dispatcher, mut events) = ChannelDispatcher::new();
//! let engine = Arc::new(UpdateEngine::new(
//!     EngineConfig::default(),
//!     EngineParts {
//!         api: api.clone(),
//!         store: Arc::new(MemoryPositionStore::new()),
//!         resolver: Arc::new(CachingResolver::new(api)),
//!         dispatcher: Arc::new(dispatcher),
//!         observer: Arc::new(LogObserver),
//!     },
//! ));
//!
//! engine.bootstrap().await?;
//! engine.submit(container).await;
//!
//! while let Some((event, entities)) = events.recv().await {
//!     // handle event
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod metrics;
pub mod resolver;
pub mod storage;

pub use api::{Api, ApiCall, ApiError, MockApi};
pub use config::{CheckpointConfig, ConfigError, EngineConfig, InboxConfig, RecoveryConfig};
pub use dispatch::{
    ChannelDispatcher, DispatchError, Dispatched, ErrorObserver, LogObserver, UpdateDispatcher,
};
pub use engine::{
    spawn_checkpoint_task, Bootstrap, EngineError, EngineParts, Outcome, RecoveryOutcome, Report,
    UpdateEngine, UpdateSender,
};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use resolver::{CachingResolver, EntityResolver, ResolveError};
pub use storage::{MemoryPositionStore, PositionStore, StorageError};
