//! Process-level shutdown triggers.
//!
//! The server stops on SIGINT, SIGTERM, or a panic outside request
//! handling. Panics inside a request are already turned into a 500 by
//! `CatchPanicLayer`; [`mark_request`] tags request futures so the panic
//! hook can tell the two apart.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tokio_util::sync::CancellationToken;

tokio::task_local! {
    static IN_REQUEST: ();
}

/// Middleware that runs the rest of the stack inside the request marker.
pub async fn mark_request(request: Request, next: Next) -> Response {
    IN_REQUEST.scope((), next.run(request)).await
}

/// Run `fut` as request work. Used for tasks spawned on behalf of a single
/// client, such as an upgraded WebSocket connection.
pub async fn as_request<F: Future>(fut: F) -> F::Output {
    IN_REQUEST.scope((), fut).await
}

fn in_request() -> bool {
    IN_REQUEST.try_with(|_| ()).is_ok()
}

/// Cancelled to begin graceful shutdown; remembers whether the cause was
/// a failure so the process can exit non-zero.
#[derive(Debug, Clone, Default)]
pub struct ShutdownTrigger {
    token: CancellationToken,
    failed: Arc<AtomicBool>,
}

impl ShutdownTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a clean shutdown.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Request a shutdown and mark the run as failed.
    pub fn fail(&self) {
        self.failed.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

/// Log every panic through `tracing`, then start a failing shutdown unless
/// the panic happened while serving a request.
pub fn install_panic_hook(trigger: ShutdownTrigger) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        if in_request() {
            tracing::error!(%location, panic = %payload, "Panic while handling request");
        } else {
            tracing::error!(%location, panic = %payload, "Unhandled panic, shutting down");
            trigger.fail();
        }
        default_hook(info);
    }));
}
