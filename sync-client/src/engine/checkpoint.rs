//! Background checkpoint task.
//!
//! Periodically persists positions so a restart resumes close to where
//! the engine stopped.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use super::UpdateEngine;
use crate::config::CheckpointConfig;

/// Spawn a background checkpoint task.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_checkpoint_task(
    engine: Arc<UpdateEngine>,
    config: CheckpointConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Checkpoint task disabled");
            return;
        }

        let interval_secs = config.interval_secs.max(1);
        tracing::info!("Checkpoint task started (interval: {}s)", interval_secs);

        let mut timer = interval(Duration::from_secs(interval_secs));

        loop {
            timer.tick().await;

            if let Err(e) = engine.checkpoint().await {
                tracing::error!("Checkpoint error: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::dispatch::{ChannelDispatcher, LogObserver};
    use crate::resolver::CachingResolver;
    use crate::storage::{MemoryPositionStore, PositionStore};
    use crate::{EngineConfig, EngineParts};
    use upsync_core::{GlobalPosition, Identity};
    use upsync_types::{Pts, UserId};

    fn engine_with(store: Arc<MemoryPositionStore>) -> Arc<UpdateEngine> {
        let api = Arc::new(MockApi::new());
        let (dispatcher, _rx) = ChannelDispatcher::new();
        Arc::new(UpdateEngine::new(
            EngineConfig::default(),
            EngineParts {
                api: api.clone(),
                store,
                resolver: Arc::new(CachingResolver::new(api)),
                dispatcher: Arc::new(dispatcher),
                observer: Arc::new(LogObserver),
            },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_task_saves_periodically() {
        let store = Arc::new(MemoryPositionStore::with_session(
            Identity {
                account_id: UserId::new(1),
                is_service_account: false,
            },
            GlobalPosition::new(Pts::new(10), 1_700_000_000),
        ));
        let engine = engine_with(store.clone());
        engine.bootstrap().await.unwrap();

        let handle = spawn_checkpoint_task(
            engine,
            CheckpointConfig {
                enabled: true,
                interval_secs: 60,
            },
        );

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.save_count().await >= 2);
        assert_eq!(
            store.global_position().await.unwrap(),
            Some(GlobalPosition::new(Pts::new(10), 1_700_000_000))
        );

        handle.abort();
    }

    #[tokio::test]
    async fn checkpoint_task_disabled() {
        let store = Arc::new(MemoryPositionStore::new());
        let config = CheckpointConfig {
            enabled: false,
            interval_secs: 1,
        };

        let handle = spawn_checkpoint_task(engine_with(store.clone()), config);

        // Task should complete immediately when disabled
        tokio::time::timeout(Duration::from_millis(100), handle)
            .await
            .expect("Task should complete when disabled")
            .expect("Task should not panic");
        assert_eq!(store.save_count().await, 0);
    }
}
