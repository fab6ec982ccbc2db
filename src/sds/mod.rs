//! SDS credential documents.
//!
//! # Responsibilities
//! - Define the credential and validation bundle types
//! - Define the source traits the supervisor extracts through
//! - Parse SDS-shaped YAML (inline certificate, key and CA strings)
//!
//! # Design Decisions
//! - First resource wins; an empty resource list is `MissingResource`
//! - The bundle kind routes output files only, it never changes parsing

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::loader::read_yaml;
use crate::error::BridgeError;

pub mod creds;
pub mod validation;

pub use creds::SdsCredParser;
pub use validation::SdsValidationParser;

/// The two independently rotated credential sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BundleKind {
    /// Instance identity credentials.
    #[default]
    Identity,
    /// Container-to-container credentials.
    C2c,
}

impl BundleKind {
    /// Classify an SDS secret config name such as `c2c-cert-and-key`.
    pub fn from_secret_name(name: &str) -> Self {
        if name.contains("c2c") {
            BundleKind::C2c
        } else {
            BundleKind::Identity
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BundleKind::Identity => "id",
            BundleKind::C2c => "c2c",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Certificate chain and private key for one bundle kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    pub kind: BundleKind,
    pub certificate_chain: String,
    pub private_key: String,
}

/// Trusted CA used to verify client certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationBundle {
    pub trusted_ca: String,
}

/// Yields a certificate chain and key.
pub trait CredentialSource: Send + Sync {
    fn kind(&self) -> BundleKind;

    /// Document the credentials are read from.
    fn path(&self) -> &Path;

    fn cert_and_key(&self) -> Result<CredentialBundle, BridgeError>;
}

/// Yields a trusted CA.
pub trait ValidationSource: Send + Sync {
    fn path(&self) -> &Path;

    fn ca_cert(&self) -> Result<ValidationBundle, BridgeError>;
}

/// An SDS discovery response as written to disk.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SdsDocument {
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Resource {
    pub name: String,

    #[serde(alias = "tlsCertificate")]
    pub tls_certificate: TlsCertificate,

    #[serde(alias = "validationContext")]
    pub validation_context: ValidationContext,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsCertificate {
    #[serde(alias = "certificateChain")]
    pub certificate_chain: DataSource,

    #[serde(alias = "privateKey")]
    pub private_key: DataSource,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ValidationContext {
    #[serde(alias = "trustedCa")]
    pub trusted_ca: DataSource,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DataSource {
    #[serde(alias = "inlineString")]
    pub inline_string: String,
}

/// Read `path` and return its first resource.
pub(crate) fn first_resource(path: &Path, what: &'static str) -> Result<Resource, BridgeError> {
    let missing = || BridgeError::MissingResource {
        path: PathBuf::from(path),
    };

    let doc: Option<SdsDocument> = read_yaml(path, what)?;
    doc.and_then(|d| d.resources.into_iter().next())
        .ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_kind_from_secret_name() {
        assert_eq!(BundleKind::from_secret_name("id-cert-and-key"), BundleKind::Identity);
        assert_eq!(BundleKind::from_secret_name("c2c-cert-and-key"), BundleKind::C2c);
        assert_eq!(BundleKind::from_secret_name(""), BundleKind::Identity);
    }
}
