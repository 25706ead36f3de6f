//! # Leveled logging for lifecycle events.
//!
//! The runtime never writes to a concrete destination. It calls leveled
//! methods on a [`Logger`] handle, which forwards to a pluggable [`LogSink`].
//!
//! ```text
//! Daemon / ServiceController / Lifecycle adapter
//!        │  logger.info("db: up")
//!        ▼
//!     Logger { prefix, max_level } ──► LogSink::write(level, prefix, message)
//!                                            ├─► TracingSink (default, `tracing` macros)
//!                                            └─► custom sinks
//! ```
//!
//! - [`Level`] severity, ordered `Fatal < Error < Warn < Info < Debug`
//! - [`LogSink`] destination trait
//! - [`Logger`] cheap-clone handle with prefix decoration and level filter
//! - [`TracingSink`] default sink

mod logger;
mod tracing_sink;

#[cfg(test)]
pub(crate) mod testing;

pub use logger::{Level, LogSink, Logger};
pub use tracing_sink::TracingSink;
