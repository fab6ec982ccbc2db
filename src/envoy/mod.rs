//! Envoy configuration input.
//!
//! # Data Flow
//! ```text
//! envoy.yaml
//!     → schema.rs (serde types, snake_case + camelCase)
//!     → parser.rs (read & unmarshal, ConfigSource)
//!     → model.rs (clusters + listener bindings, validated)
//!     → nginx::render
//! ```

pub mod model;
pub mod parser;
pub mod schema;

pub use model::{ClusterSpec, ListenerBinding, MeshModel, TranslationMode, Upstream};
pub use parser::{ConfigSource, EnvoyConfParser};
