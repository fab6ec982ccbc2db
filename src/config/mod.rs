//! Bridge configuration subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional bridge.toml (loader.rs)
//!     → CLI flag overrides (cli.rs)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (immutable, handed to the supervisor)
//! ```
//!
//! # Design Decisions
//! - No process-wide default paths; everything flows through BridgeConfig
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BridgeConfig;
pub use schema::{LogFormat, NginxSettings, RotationSettings};
