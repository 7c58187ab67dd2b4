//! [`RealtimeService`]: the WebSocket layer as a registry-managed singleton.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use taskboard_core::lifecycle::{LifecycleError, Service};
use taskboard_events::EventBus;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::TaskEngine;
use crate::ws::fanout::run_fanout;
use crate::ws::heartbeat::start_heartbeat;
use crate::ws::manager::WsManager;

/// How long `destroy` waits for each background task to finish.
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the connection manager and its background tasks.
///
/// `initialize` starts the heartbeat and the board fan-out; `destroy`
/// cancels both, closes every connection and waits for the tasks.
pub struct RealtimeService {
    ws_manager: Arc<WsManager>,
    engine: Arc<TaskEngine>,
    events: Arc<EventBus>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl RealtimeService {
    pub fn new(engine: Arc<TaskEngine>, events: Arc<EventBus>) -> Self {
        Self {
            ws_manager: Arc::new(WsManager::new()),
            engine,
            events,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn ws_manager(&self) -> Arc<WsManager> {
        Arc::clone(&self.ws_manager)
    }

    fn running_tasks(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

#[async_trait]
impl Service for RealtimeService {
    async fn initialize(&self) -> Result<(), LifecycleError> {
        let heartbeat = start_heartbeat(self.ws_manager(), self.cancel.clone());
        let fanout = tokio::spawn(run_fanout(
            Arc::clone(&self.engine),
            self.ws_manager(),
            self.events.subscribe(),
            self.cancel.clone(),
        ));

        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([heartbeat, fanout]);
        tracing::info!("Realtime service started (heartbeat, board fan-out)");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), LifecycleError> {
        self.cancel.cancel();
        self.ws_manager.shutdown_all().await;

        let handles: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if tokio::time::timeout(TASK_STOP_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Realtime background task did not stop in time");
            }
        }
        tracing::info!("Realtime service stopped");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.cancel.is_cancelled() && self.running_tasks() == 2
    }
}
