//! envoy-nginx: runs nginx as a drop-in for an envoy sidecar.

pub mod cli;
pub mod config;
pub mod envoy;
pub mod error;
pub mod lifecycle;
pub mod nginx;
pub mod observability;
pub mod rotation;
pub mod sds;

pub use config::schema::BridgeConfig;
pub use error::BridgeError;
pub use lifecycle::Supervisor;
