//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_rotations_total` (counter): change events handled, by file
//! - `bridge_false_alarms_total` (counter): events dropped for an empty file
//! - `bridge_reloads_total` (counter): nginx reloads, by result
//! - `bridge_tls_writes_total` (counter): credential files written, by bundle
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter is optional (metrics.bind_address)

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::BridgeError;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BridgeError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| BridgeError::Config(format!("install metrics exporter: {e}")))?;

    describe_counter!("bridge_rotations_total", "Credential file change events handled");
    describe_counter!("bridge_false_alarms_total", "Change events ignored because the file was empty");
    describe_counter!("bridge_reloads_total", "nginx reload invocations");
    describe_counter!("bridge_tls_writes_total", "Credential files written");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_rotation(file: &str) {
    counter!("bridge_rotations_total", "file" => file.to_string()).increment(1);
}

pub fn record_false_alarm(file: &str) {
    counter!("bridge_false_alarms_total", "file" => file.to_string()).increment(1);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("bridge_reloads_total", "result" => result).increment(1);
}

pub fn record_tls_write(bundle: &'static str) {
    counter!("bridge_tls_writes_total", "bundle" => bundle).increment(1);
}
