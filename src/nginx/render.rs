//! nginx configuration rendering.
//!
//! # Responsibilities
//! - Render global directives (workers, daemon, error log, pid)
//! - Render one `upstream` block per cluster and one `server` block per
//!   listener binding inside a `stream {}` context
//! - Write the result to the layout's fixed config path
//!
//! # Design Decisions
//! - Output order follows document order (snapshot-testable)
//! - The listener's mTLS flag alone decides client verification
//! - All embedded paths go through `normalize_path`

use std::fmt;
use std::path::PathBuf;

use crate::config::NginxSettings;
use crate::envoy::{ClusterSpec, ConfigSource, ListenerBinding, MeshModel};
use crate::error::BridgeError;
use crate::nginx::layout::{normalize_path, write_file, WorkingLayout};

/// Translates a mesh model into nginx.conf.
#[derive(Debug, Clone)]
pub struct NginxConfig {
    layout: WorkingLayout,
    settings: NginxSettings,
}

impl NginxConfig {
    pub fn new(layout: WorkingLayout, settings: NginxSettings) -> Self {
        Self { layout, settings }
    }

    pub fn layout(&self) -> &WorkingLayout {
        &self.layout
    }

    pub fn settings(&self) -> &NginxSettings {
        &self.settings
    }

    /// Parse the source, render it and write `conf/nginx.conf`.
    pub fn generate(&self, source: &dyn ConfigSource) -> Result<PathBuf, BridgeError> {
        let model = source.model()?;
        let text = self.render(&model);
        let conf_file = self.layout.conf_file();
        write_file(&conf_file, text.as_bytes(), "nginx config")?;

        tracing::info!(
            path = %conf_file.display(),
            clusters = model.clusters.len(),
            servers = model.bindings.len(),
            "Generated nginx config"
        );
        Ok(conf_file)
    }

    /// Render the complete config text.
    pub fn render(&self, model: &MeshModel) -> String {
        Rendered { config: self, model }.to_string()
    }
}

/// A model paired with the layout and settings it renders against.
struct Rendered<'a> {
    config: &'a NginxConfig,
    model: &'a MeshModel,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = &self.config.settings;
        let layout = &self.config.layout;

        writeln!(f, "worker_processes  {};", settings.worker_processes)?;
        writeln!(f, "daemon {};", if settings.daemon { "on" } else { "off" })?;
        writeln!(f)?;
        writeln!(f, "error_log {};", normalize_path(&layout.error_log()))?;
        writeln!(f, "pid {};", normalize_path(&layout.pid_file()))?;
        writeln!(f)?;
        writeln!(f, "events {{")?;
        writeln!(f, "    worker_connections  {};", settings.worker_connections)?;
        writeln!(f, "}}\n")?;

        writeln!(f, "stream {{")?;
        for cluster in &self.model.clusters {
            self.upstream(f, cluster)?;
            for binding in self.model.bindings_for(&cluster.name) {
                self.server(f, binding)?;
            }
        }
        writeln!(f, "}}")
    }
}

impl Rendered<'_> {
    fn upstream(&self, f: &mut fmt::Formatter<'_>, cluster: &ClusterSpec) -> fmt::Result {
        writeln!(f, "    upstream {} {{", cluster.name)?;
        for endpoint in &cluster.endpoints {
            writeln!(f, "        server {}:{};", endpoint.address, endpoint.port)?;
        }
        writeln!(f, "    }}\n")
    }

    fn server(&self, f: &mut fmt::Formatter<'_>, binding: &ListenerBinding) -> fmt::Result {
        let layout = &self.config.layout;

        writeln!(f, "    server {{")?;
        if binding.tls {
            writeln!(f, "        listen {} ssl;", binding.port)?;
            writeln!(
                f,
                "        ssl_certificate        {};",
                normalize_path(&layout.cert_file(binding.bundle))
            )?;
            writeln!(
                f,
                "        ssl_certificate_key    {};",
                normalize_path(&layout.key_file(binding.bundle))
            )?;
            if binding.require_client_cert {
                writeln!(f, "        ssl_client_certificate {};", normalize_path(&layout.ca_file()))?;
                writeln!(f, "        ssl_verify_client on;")?;
            }
            if !binding.cipher_suites.is_empty() {
                writeln!(f, "        ssl_ciphers {};", binding.cipher_list())?;
            }
        } else {
            writeln!(f, "        listen {};", binding.port)?;
        }
        writeln!(f, "        proxy_pass {};", binding.cluster)?;
        writeln!(f, "    }}\n")
    }
}
