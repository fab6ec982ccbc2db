//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Launch phase (supervisor.rs):
//!     create layout → write TLS files → render nginx.conf → truncate error log
//!     spawn: tailer, one watcher per credential file, launcher
//!
//! Startup ordering (startup.rs):
//!     every watcher ready ──→ nginx -c <conf> -p <dir>/
//!
//! Steady state:
//!     watcher callback → re-extract one bundle → rewrite files
//!         → nginx -c <conf> -p <dir>/ -s reload (process.rs)
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → binary drops the supervisor → tasks aborted, child killed
//! ```
//!
//! # Design Decisions
//! - All tasks live in one JoinSet; the first result wins and the rest are aborted
//! - Nothing is retried; a failed reload ends the run
//! - The process boundary is a trait so tests can substitute a recording fake

pub mod process;
pub mod signals;
pub mod startup;
pub mod supervisor;
pub mod tailer;

pub use process::{CommandRunner, TokioCommandRunner};
pub use signals::shutdown_signal;
pub use supervisor::Supervisor;
pub use tailer::LogTailer;
