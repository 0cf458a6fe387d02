//! Binance WebSocket ingestion.
//!
//! Each [`SubscriptionKey`](crate::subscription::SubscriptionKey) runs in its own task
//! ([`connection::run_connection`]) that connects, decodes frames into
//! [`StreamUpdate`](crate::event::StreamUpdate)s, and reconnects with exponential backoff. The
//! [`StreamSupervisor`] owns those tasks and their cancellation signals.

/// Exponential reconnect backoff.
pub mod backoff;

/// Connection state machine and per-subscription session loop.
pub mod connection;

/// Start/stop bookkeeping for subscription tasks.
pub mod supervisor;

/// Idle read timeout wrapper.
pub mod timeout;

pub use backoff::{Backoff, BackoffConfig};
pub use connection::{ConnectionState, StreamConfig};
pub use supervisor::StreamSupervisor;
