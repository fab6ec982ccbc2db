//! Credential rotation subsystem.
//!
//! # Responsibilities
//! - Watch a single credential file for replacement
//! - Collapse the burst of raw events one replace produces
//! - Skip events that leave the file empty
//!
//! # Data Flow
//! ```text
//! publisher writes tmp + rename ──→ notify backend ──→ mpsc
//!     → settle window, drain queued events
//!     → re-register watch
//!     → stat: empty? ──yes──→ false alarm, keep waiting
//!                    ──no───→ on_change().await
//! ```
//!
//! # Design Decisions
//! - Readiness is a oneshot sent after registration, consumed by the launch barrier
//! - Any callback error ends the watch and propagates to the supervisor

pub mod watcher;

pub use watcher::RotationWatcher;
