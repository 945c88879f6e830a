//! Logging utilities.
//!
//! Centralizes logger initialization plus a timestamp-gated helper for
//! per-frame diagnostics. Everything goes through the `log` facade.

mod init;
mod throttle;

pub use init::{init_logging, LoggingConfig};
pub use throttle::ThrottledLog;
