//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (rotation / reload / write counters)
//! nginx produces:
//!     → logs/error.log → lifecycle::tailer → `tracing` target "nginx"
//! ```

pub mod logging;
pub mod metrics;
