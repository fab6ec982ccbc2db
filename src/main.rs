//! envoy-nginx
//!
//! Stands in for envoy on hosts where nginx terminates the sidecar's TLS.
//!
//! # Architecture Overview
//!
//! ```text
//!   envoy.yaml ──→ envoy::parser ──→ MeshModel ──→ nginx::render ──→ conf/nginx.conf
//!
//!   sds-id-cert-and-key.yaml  ──┐
//!   sds-c2c-cert-and-key.yaml ──┼─→ sds ──→ nginx::tls ──→ cert/key/ca .pem
//!   sds-id-validation.yaml    ──┘
//!
//!   ┌──────────────────────── lifecycle::Supervisor ────────────────────────┐
//!   │  rotation watcher (per file) ──ready──┐                                │
//!   │                                       ▼                                │
//!   │                               launcher: nginx -c conf -p dir/          │
//!   │  rotation event ──→ rewrite bundle ──→ nginx -c conf -p dir/ -s reload │
//!   │  tailer: logs/error.log ──→ tracing target "nginx"                     │
//!   │  first task result wins, the rest are aborted                          │
//!   └────────────────────────────────────────────────────────────────────────┘
//! ```

use envoy_nginx::cli::Cli;
use envoy_nginx::lifecycle::{shutdown_signal, Supervisor};
use envoy_nginx::observability::{logging, metrics};
use envoy_nginx::BridgeError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_envoy_args(std::env::args_os());

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("envoy-nginx: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "envoy-nginx starting");
    tracing::info!(
        envoy_config = %config.envoy_config.display(),
        id_creds = %config.id_creds.display(),
        work_dir = %config.work_dir().display(),
        "Configuration loaded"
    );

    if let Some(addr) = &config.metrics.bind_address {
        // Validation guarantees the address parses.
        let started = addr
            .parse()
            .map_err(|e| BridgeError::Config(format!("metrics.bind_address: {e}")))
            .and_then(metrics::init_metrics);
        if let Err(e) = started {
            tracing::error!(error = %e, "Failed to start metrics exporter");
            std::process::exit(1);
        }
    }

    let supervisor = Supervisor::from_config(&config);
    tokio::select! {
        result = supervisor.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "envoy-nginx exiting");
                std::process::exit(1);
            }
            tracing::info!("nginx exited cleanly");
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown complete");
        }
    }
}
