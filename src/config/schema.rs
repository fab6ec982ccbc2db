//! Bridge configuration schema.
//!
//! One explicit struct replaces process-wide default paths: it is built once
//! (defaults, then an optional TOML file, then CLI flags) and handed to the
//! supervisor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::envoy::TranslationMode;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Envoy static configuration to translate.
    pub envoy_config: PathBuf,

    /// SDS document with the identity certificate and key.
    pub id_creds: PathBuf,

    /// SDS document with the container-to-container certificate and key.
    pub c2c_creds: Option<PathBuf>,

    /// SDS document with the trusted CA for client verification.
    pub id_validation: Option<PathBuf>,

    /// Per-run working directory. A fresh one under the temp dir when unset.
    pub work_dir: Option<PathBuf>,

    pub nginx: NginxSettings,

    pub translation: TranslationSettings,

    pub rotation: RotationSettings,

    pub logging: LoggingSettings,

    pub metrics: MetricsSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let assets = default_assets_dir();
        Self {
            envoy_config: assets.join("envoy.yaml"),
            id_creds: assets.join("sds-id-cert-and-key.yaml"),
            c2c_creds: Some(assets.join("sds-c2c-cert-and-key.yaml")),
            id_validation: Some(assets.join("sds-id-validation-context.yaml")),
            work_dir: None,
            nginx: NginxSettings::default(),
            translation: TranslationSettings::default(),
            rotation: RotationSettings::default(),
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Working directory for this run.
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("nginx-conf-{}", std::process::id()))
        })
    }

    /// The nginx binary: configured, or `nginx[.exe]` beside this executable.
    pub fn nginx_binary(&self) -> PathBuf {
        if let Some(binary) = &self.nginx.binary {
            return binary.clone();
        }
        let name = if cfg!(windows) { "nginx.exe" } else { "nginx" };
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

fn default_assets_dir() -> PathBuf {
    if cfg!(windows) {
        Path::new(r"C:\etc\cf-assets\envoy_config").to_path_buf()
    } else {
        Path::new("/etc/cf-assets/envoy_config").to_path_buf()
    }
}

/// Settings rendered into the global section of nginx.conf.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NginxSettings {
    pub binary: Option<PathBuf>,

    pub worker_processes: u32,

    pub worker_connections: u32,

    /// Let nginx fork into the background after launch.
    pub daemon: bool,
}

impl Default for NginxSettings {
    fn default() -> Self {
        Self {
            binary: None,
            worker_processes: 1,
            worker_connections: 1024,
            daemon: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub mode: TranslationMode,
}

/// Rotation watcher tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Window after a change event during which further events are folded in.
    pub settle_ms: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self { settle_ms: 250 }
    }
}

impl RotationSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Prometheus listener address, e.g. "127.0.0.1:9102". Disabled when unset.
    pub bind_address: Option<String>,
}
