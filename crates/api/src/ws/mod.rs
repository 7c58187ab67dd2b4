//! WebSocket infrastructure for the realtime board.
//!
//! Provides connection and channel management, the request protocol,
//! heartbeat monitoring, the board fan-out and the HTTP upgrade handler.

mod fanout;
mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;
mod realtime;

pub use fanout::run_fanout;
pub use handler::ws_handler;
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL_SECS};
pub use manager::{project_channel, WsManager};
pub use realtime::RealtimeService;
