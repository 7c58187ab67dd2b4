use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use taskboard_db::models::task::TaskWithDetails;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::shutdown::as_request;
use crate::state::AppState;
use crate::ws::manager::{project_channel, text_message};
use crate::ws::protocol::{self, Ack, ClientRequest, StatusUpdateRequest, TasksRequest};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The upgrade itself is unauthenticated; every request frame carries its
/// own access token.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| as_request(handle_socket(socket, state)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Answers inbound requests on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), None).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let ack = handle_request(&state, &conn_id, text.as_str()).await;
                match serde_json::to_string(&ack) {
                    Ok(json) => {
                        state.ws_manager.send_to(&conn_id, text_message(json)).await;
                    }
                    Err(e) => {
                        tracing::error!(conn_id = %conn_id, error = %e, "Failed to encode ack");
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state.ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Run one client request and build its acknowledgement.
async fn handle_request(state: &AppState, conn_id: &str, text: &str) -> Ack {
    let (request, ack, event) = match protocol::parse(text) {
        Ok(parsed) => parsed,
        Err(failure) => {
            tracing::debug!(conn_id, reason = %failure.reason, "Rejected realtime message");
            return Ack::error(failure.event, failure.ack, failure.reason);
        }
    };

    let result = match request {
        ClientRequest::Tasks(req) => subscribe_to_board(state, conn_id, req).await,
        ClientRequest::TaskStatusUpdate(req) => move_task(state, conn_id, req).await,
    };

    match result {
        Ok(tasks) => Ack::ok(event, ack, tasks),
        Err(e) => {
            tracing::debug!(conn_id, event = %event, code = e.code(), error = %e, "Realtime request failed");
            Ack::error(event, ack, e.public_message())
        }
    }
}

/// `tasks`: return the board and subscribe the connection to its channel.
async fn subscribe_to_board(
    state: &AppState,
    conn_id: &str,
    req: TasksRequest,
) -> AppResult<Vec<TaskWithDetails>> {
    let user = AuthUser::from_token(&req.token, &state.config.jwt)?;
    state.ws_manager.set_user(conn_id, user.user_id).await;

    let tasks = state.engine.list_project_tasks(req.project_id).await?;
    state
        .ws_manager
        .subscribe(conn_id, &project_channel(req.project_id))
        .await;
    tracing::debug!(
        conn_id,
        user_id = user.user_id,
        project_id = req.project_id,
        "Subscribed to project board"
    );
    Ok(tasks)
}

/// `task_status_update`: move the task, then return its project's board.
async fn move_task(
    state: &AppState,
    conn_id: &str,
    req: StatusUpdateRequest,
) -> AppResult<Vec<TaskWithDetails>> {
    let user = AuthUser::from_token(&req.token, &state.config.jwt)?;
    state.ws_manager.set_user(conn_id, user.user_id).await;

    let moved = state
        .engine
        .update_task_status(req.task.id, req.task.status, user.user_id)
        .await?;
    state.engine.list_project_tasks(moved.task.project_id).await
}
