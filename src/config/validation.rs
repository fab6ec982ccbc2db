//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the nginx binary is present before anything is written
//! - Validate value ranges (worker counts and settle window > 0, parseable addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure apart from one stat of the nginx binary

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with the bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    ZeroWorkerProcesses,
    ZeroWorkerConnections,
    ZeroSettle,
    NginxBinaryMissing(PathBuf),
    InvalidMetricsAddress(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroWorkerProcesses => write!(f, "nginx.worker_processes must be > 0"),
            ValidationError::ZeroWorkerConnections => write!(f, "nginx.worker_connections must be > 0"),
            ValidationError::ZeroSettle => write!(f, "rotation.settle_ms must be > 0"),
            ValidationError::NginxBinaryMissing(path) => write!(f, "stat nginx binary: {} not found", path.display()),
            ValidationError::InvalidMetricsAddress(addr) => write!(f, "metrics.bind_address {:?} is not a socket address", addr),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nginx.worker_processes == 0 {
        errors.push(ValidationError::ZeroWorkerProcesses);
    }
    if config.nginx.worker_connections == 0 {
        errors.push(ValidationError::ZeroWorkerConnections);
    }

    if config.rotation.settle_ms == 0 {
        errors.push(ValidationError::ZeroSettle);
    }

    let binary = config.nginx_binary();
    if !binary.is_file() {
        errors.push(ValidationError::NginxBinaryMissing(binary));
    }

    if let Some(addr) = &config.metrics.bind_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
