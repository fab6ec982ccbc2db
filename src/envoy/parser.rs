//! Envoy configuration parsing.

use std::path::{Path, PathBuf};

use crate::config::loader::read_yaml;
use crate::envoy::model::{MeshModel, TranslationMode};
use crate::envoy::schema::EnvoyConf;
use crate::error::BridgeError;

/// Something that yields the cluster/listener model to translate.
pub trait ConfigSource: Send + Sync {
    /// Read and validate the model.
    fn model(&self) -> Result<MeshModel, BridgeError>;
}

/// Reads an Envoy static configuration document from disk.
#[derive(Debug, Clone)]
pub struct EnvoyConfParser {
    path: PathBuf,
    mode: TranslationMode,
}

impl EnvoyConfParser {
    pub fn new(path: impl Into<PathBuf>, mode: TranslationMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and unmarshal the raw document.
    pub fn read(&self) -> Result<EnvoyConf, BridgeError> {
        read_yaml(&self.path, "envoy config")
    }
}

impl ConfigSource for EnvoyConfParser {
    fn model(&self) -> Result<MeshModel, BridgeError> {
        let conf = self.read()?;
        let model = MeshModel::from_conf(&conf, self.mode)?;
        tracing::debug!(
            path = %self.path.display(),
            clusters = model.clusters.len(),
            listeners = model.bindings.len(),
            "Parsed envoy config"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_read_error() {
        let parser = EnvoyConfParser::new("not-a-real-file", TranslationMode::Multi);
        let err = parser.model().unwrap_err();
        assert!(matches!(err, BridgeError::Read { .. }));
        assert!(err.to_string().starts_with("read envoy config (not-a-real-file): "));
    }

    #[test]
    fn test_invalid_yaml_is_unmarshal_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envoy.yaml");
        std::fs::write(&path, "%%%").unwrap();

        let err = EnvoyConfParser::new(&path, TranslationMode::Multi)
            .model()
            .unwrap_err();
        assert!(matches!(err, BridgeError::Unmarshal { .. }));
    }

    #[test]
    fn test_wrong_shape_is_unmarshal_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envoy.yaml");
        std::fs::write(&path, "static_resources:\n  clusters: 42\n").unwrap();

        let err = EnvoyConfParser::new(&path, TranslationMode::Multi)
            .model()
            .unwrap_err();
        assert!(matches!(err, BridgeError::Unmarshal { .. }));
    }
}
