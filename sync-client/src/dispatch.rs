//! Downstream hand-off.
//!
//! The engine delivers every applied event to an [`UpdateDispatcher`]
//! together with the entities that arrived alongside it. Errors that
//! cannot be returned to a caller go to an [`ErrorObserver`].

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use upsync_types::{EntityIndex, Event};

use crate::engine::EngineError;

/// Dispatch errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The consumer is gone.
    #[error("dispatch channel closed")]
    Closed,

    /// The consumer rejected the event.
    #[error("consumer failed: {0}")]
    Consumer(String),
}

/// Receives applied events, in application order.
///
/// `dispatch` runs while the engine gate is held. A slow consumer delays
/// all further processing; a consumer that needs to do real work should
/// queue the event and return.
#[async_trait]
pub trait UpdateDispatcher: Send + Sync {
    /// Deliver one event.
    async fn dispatch(&self, event: Event, entities: Arc<EntityIndex>)
        -> Result<(), DispatchError>;
}

/// An event paired with the entities it references.
pub type Dispatched = (Event, Arc<EntityIndex>);

/// Dispatcher that forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<Dispatched>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiving half consumers read from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Dispatched>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl UpdateDispatcher for ChannelDispatcher {
    async fn dispatch(
        &self,
        event: Event,
        entities: Arc<EntityIndex>,
    ) -> Result<(), DispatchError> {
        self.tx
            .send((event, entities))
            .map_err(|_| DispatchError::Closed)
    }
}

/// Sink for errors raised outside a caller's reach.
pub trait ErrorObserver: Send + Sync {
    /// Observe one error. Must not block.
    fn observe(&self, error: &EngineError);
}

/// Observer that logs every error.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ErrorObserver for LogObserver {
    fn observe(&self, error: &EngineError) {
        tracing::error!("Update engine error: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upsync_types::Update;

    #[tokio::test]
    async fn channel_dispatcher_preserves_order() {
        let (dispatcher, mut rx) = ChannelDispatcher::new();
        let entities = Arc::new(EntityIndex::new());

        dispatcher
            .dispatch(Event::Update(Update::ConfigChanged), entities.clone())
            .await
            .unwrap();
        dispatcher
            .dispatch(
                Event::Update(Update::DcOptions { dc_options: vec![] }),
                entities,
            )
            .await
            .unwrap();

        let (first, _) = rx.recv().await.unwrap();
        let (second, _) = rx.recv().await.unwrap();
        assert_eq!(first, Event::Update(Update::ConfigChanged));
        assert!(matches!(second, Event::Update(Update::DcOptions { .. })));
    }

    #[tokio::test]
    async fn closed_channel_is_reported() {
        let (dispatcher, rx) = ChannelDispatcher::new();
        drop(rx);

        let result = dispatcher
            .dispatch(
                Event::Update(Update::ConfigChanged),
                Arc::new(EntityIndex::new()),
            )
            .await;
        assert!(matches!(result, Err(DispatchError::Closed)));
    }

    #[test]
    fn log_observer_accepts_errors() {
        LogObserver.observe(&EngineError::NoIdentity);
    }
}
