//! nginx output subsystem.
//!
//! # Data Flow
//! ```text
//! MeshModel ──→ render.rs ──→ <root>/conf/nginx.conf
//! CredentialBundle ──→ tls.rs ──→ <root>/{cert,key}.pem | c2c-{cert,key}.pem
//! ValidationBundle ──→ tls.rs ──→ <root>/ca.pem (when non-empty)
//! ```
//!
//! # Design Decisions
//! - All paths come from one WorkingLayout; writers own disjoint files
//! - Files are rewritten in place with a fixed mode

pub mod layout;
pub mod render;
pub mod tls;

pub use layout::{normalize_path, WorkingLayout};
pub use render::NginxConfig;
