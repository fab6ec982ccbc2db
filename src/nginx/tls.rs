//! Credential file persistence.
//!
//! # Responsibilities
//! - Write a bundle's certificate chain and key to its fixed paths
//! - Write the trusted CA, skipping (not failing) when it is empty

use crate::error::BridgeError;
use crate::nginx::layout::{write_file, WorkingLayout};
use crate::observability::metrics;
use crate::sds::{CredentialBundle, ValidationBundle};

/// Persist one credential bundle.
pub fn write_bundle(layout: &WorkingLayout, bundle: &CredentialBundle) -> Result<(), BridgeError> {
    write_file(&layout.cert_file(bundle.kind), bundle.certificate_chain.as_bytes(), "cert")?;
    write_file(&layout.key_file(bundle.kind), bundle.private_key.as_bytes(), "key")?;

    metrics::record_tls_write(bundle.kind.label());
    tracing::debug!(bundle = %bundle.kind, "Wrote certificate and key");
    Ok(())
}

/// Persist the trusted CA. Returns whether a file was written.
pub fn write_ca(layout: &WorkingLayout, ca: &ValidationBundle) -> Result<bool, BridgeError> {
    if ca.trusted_ca.is_empty() {
        tracing::info!("Validation context has no trusted CA, not writing ca.pem");
        return Ok(false);
    }

    write_file(&layout.ca_file(), ca.trusted_ca.as_bytes(), "ca cert")?;
    metrics::record_tls_write("ca");
    Ok(true)
}
