//! Certificate and key extraction from SDS credential documents.

use std::path::{Path, PathBuf};

use crate::error::BridgeError;
use crate::sds::{first_resource, BundleKind, CredentialBundle, CredentialSource};

/// Reads `tls_certificate` material from one SDS document.
#[derive(Debug, Clone)]
pub struct SdsCredParser {
    path: PathBuf,
    kind: BundleKind,
}

impl SdsCredParser {
    pub fn new(path: impl Into<PathBuf>, kind: BundleKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl CredentialSource for SdsCredParser {
    fn kind(&self) -> BundleKind {
        self.kind
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn cert_and_key(&self) -> Result<CredentialBundle, BridgeError> {
        let resource = first_resource(&self.path, "sds creds")?;
        let tls = resource.tls_certificate;
        Ok(CredentialBundle {
            kind: self.kind,
            certificate_chain: tls.certificate_chain.inline_string,
            private_key: tls.private_key.inline_string,
        })
    }
}
