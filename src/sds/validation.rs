//! Trusted CA extraction from SDS validation-context documents.

use std::path::{Path, PathBuf};

use crate::error::BridgeError;
use crate::sds::{first_resource, ValidationBundle, ValidationSource};

/// Reads `validation_context.trusted_ca` from one SDS document.
#[derive(Debug, Clone)]
pub struct SdsValidationParser {
    path: PathBuf,
}

impl SdsValidationParser {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ValidationSource for SdsValidationParser {
    fn path(&self) -> &Path {
        &self.path
    }

    fn ca_cert(&self) -> Result<ValidationBundle, BridgeError> {
        let resource = first_resource(&self.path, "sds validation context")?;
        Ok(ValidationBundle {
            trusted_ca: resource.validation_context.trusted_ca.inline_string,
        })
    }
}
