//! Pushes a project's refreshed board to its channel after every task change.

use std::sync::Arc;

use taskboard_events::TaskChange;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::engine::TaskEngine;
use crate::ws::manager::{project_channel, text_message, WsManager};
use crate::ws::protocol::TasksUpdated;

/// Consume task changes until `cancel` fires or the bus closes.
///
/// Each change re-reads the whole project board; nobody computes diffs.
/// Projects without subscribers are skipped.
pub async fn run_fanout(
    engine: Arc<TaskEngine>,
    ws_manager: Arc<WsManager>,
    mut changes: broadcast::Receiver<TaskChange>,
    cancel: CancellationToken,
) {
    tracing::debug!("Realtime fan-out started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = changes.recv() => match received {
                Ok(change) => push_board(&engine, &ws_manager, &change).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Realtime fan-out lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    tracing::debug!("Realtime fan-out stopped");
}

async fn push_board(engine: &TaskEngine, ws_manager: &WsManager, change: &TaskChange) {
    let channel = project_channel(change.project_id);
    if ws_manager.subscriber_count(&channel).await == 0 {
        return;
    }

    let tasks = match engine.list_project_tasks(change.project_id).await {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::error!(project_id = change.project_id, error = %e, "Failed to load board for push");
            return;
        }
    };

    let json = match serde_json::to_string(&TasksUpdated::new(change.project_id, &tasks)) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(project_id = change.project_id, error = %e, "Failed to encode board push");
            return;
        }
    };

    let delivered = ws_manager.broadcast_to_channel(&channel, text_message(json)).await;
    tracing::debug!(
        project_id = change.project_id,
        task_id = change.task_id,
        kind = ?change.kind,
        delivered,
        "Pushed board update"
    );
}
