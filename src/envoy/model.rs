//! Cluster and listener model derived from an Envoy document.
//!
//! # Responsibilities
//! - Flatten the nested Envoy schema into clusters and listener bindings
//! - Check referential integrity (bindings name existing clusters)
//! - Enforce the legacy one-listener-per-cluster rule when asked to
//!
//! # Design Decisions
//! - Document order is preserved everywhere so rendering is deterministic
//! - The model is immutable once built

use serde::{Deserialize, Serialize};

use crate::envoy::schema::{Cluster, EnvoyConf, Listener, SocketAddress};
use crate::error::BridgeError;
use crate::sds::BundleKind;

/// How listeners may map onto clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// Zero or more listeners per cluster.
    #[default]
    Multi,
    /// Exactly one listener per cluster.
    Legacy,
}

/// A single upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub address: String,
    pub port: u16,
}

/// A named group of upstream endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    pub name: String,
    pub endpoints: Vec<Upstream>,
}

/// A downstream port routed to a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerBinding {
    pub port: u16,
    pub cluster: String,
    /// Terminate TLS on this port. False when the listener has no transport socket.
    pub tls: bool,
    pub cipher_suites: Vec<String>,
    pub require_client_cert: bool,
    pub bundle: BundleKind,
}

impl ListenerBinding {
    /// Cipher suites in OpenSSL list form (`A:B`).
    pub fn cipher_list(&self) -> String {
        self.cipher_suites.join(":")
    }
}

/// Clusters and their listener bindings, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshModel {
    pub clusters: Vec<ClusterSpec>,
    pub bindings: Vec<ListenerBinding>,
}

impl MeshModel {
    /// Build and validate the model from a parsed document.
    pub fn from_conf(conf: &EnvoyConf, mode: TranslationMode) -> Result<Self, BridgeError> {
        let clusters = conf
            .clusters()
            .iter()
            .map(cluster_spec)
            .collect::<Result<Vec<_>, _>>()?;

        let mut bindings = Vec::new();
        for listener in conf.listeners() {
            match listener_binding(listener)? {
                Some(binding) => bindings.push(binding),
                None => tracing::warn!(
                    listener = %listener.name,
                    "Listener routes to no cluster, skipping"
                ),
            }
        }

        let model = Self { clusters, bindings };
        model.validate(mode)?;
        Ok(model)
    }

    /// Bindings that route to `cluster`, in document order.
    pub fn bindings_for<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a ListenerBinding> + 'a {
        self.bindings.iter().filter(move |b| b.cluster == cluster)
    }

    /// Check referential integrity and the per-mode listener rule.
    pub fn validate(&self, mode: TranslationMode) -> Result<(), BridgeError> {
        for binding in &self.bindings {
            if !self.clusters.iter().any(|c| c.name == binding.cluster) {
                return Err(BridgeError::UnknownCluster {
                    cluster: binding.cluster.clone(),
                    port: binding.port,
                });
            }
        }

        if mode == TranslationMode::Legacy {
            for cluster in &self.clusters {
                match self.bindings_for(&cluster.name).count() {
                    0 => {
                        return Err(BridgeError::MissingListener {
                            cluster: cluster.name.clone(),
                        })
                    }
                    1 => {}
                    count => {
                        return Err(BridgeError::AmbiguousListener {
                            cluster: cluster.name.clone(),
                            count,
                        })
                    }
                }
            }
        }

        Ok(())
    }
}

fn cluster_spec(cluster: &Cluster) -> Result<ClusterSpec, BridgeError> {
    let endpoints = cluster
        .socket_addresses()
        .into_iter()
        .map(|sa| -> Result<Upstream, BridgeError> {
            Ok(Upstream {
                address: sa.address.clone(),
                port: port_of(sa, || format!("cluster {}", cluster.name))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if endpoints.is_empty() {
        return Err(BridgeError::MissingEndpoint {
            cluster: cluster.name.clone(),
        });
    }

    Ok(ClusterSpec {
        name: cluster.name.clone(),
        endpoints,
    })
}

fn listener_binding(listener: &Listener) -> Result<Option<ListenerBinding>, BridgeError> {
    let Some((chain, cluster)) = listener
        .filter_chains
        .iter()
        .find_map(|chain| chain.cluster().map(|name| (chain, name)))
    else {
        return Ok(None);
    };

    let port = port_of(&listener.address.socket_address, || {
        format!("listener for cluster {}", cluster)
    })?;

    let binding = match chain.tls() {
        Some(tls) => {
            let common = &tls.common_tls_context;
            let bundle = common
                .tls_certificate_sds_secret_configs
                .first()
                .map(|secret| BundleKind::from_secret_name(&secret.name))
                .unwrap_or_default();
            ListenerBinding {
                port,
                cluster: cluster.to_string(),
                tls: true,
                cipher_suites: common.tls_params.cipher_suites.clone(),
                require_client_cert: tls.require_client_certificate,
                bundle,
            }
        }
        None => ListenerBinding {
            port,
            cluster: cluster.to_string(),
            tls: false,
            cipher_suites: Vec::new(),
            require_client_cert: false,
            bundle: BundleKind::default(),
        },
    };

    Ok(Some(binding))
}

fn port_of(sa: &SocketAddress, location: impl FnOnce() -> String) -> Result<u16, BridgeError> {
    sa.port_value
        .as_ref()
        .and_then(|p| p.to_port())
        .ok_or_else(|| BridgeError::InvalidPort {
            value: sa.port_value.as_ref().map(|p| p.raw()).unwrap_or_default(),
            location: location(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf(yaml: &str) -> EnvoyConf {
        serde_yaml::from_str(yaml).unwrap()
    }

    const TWO_CLUSTERS: &str = r#"
static_resources:
  clusters:
  - name: app
    load_assignment:
      endpoints:
      - lb_endpoints:
        - endpoint: { address: { socket_address: { address: 10.0.0.1, port_value: 8080 } } }
  - name: sshd
    load_assignment:
      endpoints:
      - lb_endpoints:
        - endpoint: { address: { socket_address: { address: 10.0.0.1, port_value: 2222 } } }
  listeners:
  - address: { socket_address: { address: 0.0.0.0, port_value: 61001 } }
    filter_chains:
    - filters:
      - typed_config: { cluster: app }
      transport_socket:
        typed_config:
          common_tls_context:
            tls_params: { cipher_suites: [A, B] }
            tls_certificate_sds_secret_configs: [ { name: id-cert-and-key } ]
          require_client_certificate: true
  - address: { socket_address: { address: 0.0.0.0, port_value: 61443 } }
    filter_chains:
    - filters:
      - typed_config: { cluster: app }
      transport_socket:
        typed_config:
          common_tls_context:
            tls_certificate_sds_secret_configs: [ { name: c2c-cert-and-key } ]
"#;

    #[test]
    fn test_bindings_follow_document_order() {
        let model = MeshModel::from_conf(&conf(TWO_CLUSTERS), TranslationMode::Multi).unwrap();

        assert_eq!(model.clusters.len(), 2);
        assert_eq!(model.clusters[0].name, "app");
        assert_eq!(model.clusters[1].endpoints[0].port, 2222);

        let app: Vec<_> = model.bindings_for("app").collect();
        assert_eq!(app.len(), 2);
        assert_eq!(app[0].port, 61001);
        assert_eq!(app[0].cipher_list(), "A:B");
        assert!(app[0].require_client_cert);
        assert_eq!(app[0].bundle, BundleKind::Identity);
        assert_eq!(app[1].bundle, BundleKind::C2c);
        assert!(!app[1].require_client_cert);

        assert_eq!(model.bindings_for("sshd").count(), 0);
    }

    #[test]
    fn test_legacy_mode_requires_one_listener() {
        let err = MeshModel::from_conf(&conf(TWO_CLUSTERS), TranslationMode::Legacy).unwrap_err();
        assert!(matches!(err, BridgeError::AmbiguousListener { ref cluster, count: 2 } if cluster == "app"));

        let yaml = r#"
clusters:
- name: banana
  hosts: [ { socket_address: { address: 127.0.0.1, port_value: 1 } } ]
"#;
        let err = MeshModel::from_conf(&conf(yaml), TranslationMode::Legacy).unwrap_err();
        assert_eq!(err.to_string(), "port is missing for cluster name banana");
    }

    #[test]
    fn test_unknown_cluster_rejected() {
        let yaml = r#"
clusters:
- name: app
  hosts: [ { socket_address: { address: 127.0.0.1, port_value: 8080 } } ]
listeners:
- address: { socket_address: { port_value: 61001 } }
  filter_chains:
  - filters: [ { typed_config: { cluster: ghost } } ]
"#;
        let err = MeshModel::from_conf(&conf(yaml), TranslationMode::Multi).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownCluster { ref cluster, port: 61001 } if cluster == "ghost"));
    }

    #[test]
    fn test_plain_listener_without_transport_socket() {
        let yaml = r#"
clusters:
- name: app
  hosts: [ { socket_address: { address: 127.0.0.1, port_value: 8080 } } ]
listeners:
- address: { socket_address: { port_value: 61001 } }
  filter_chains:
  - filters: [ { typed_config: { cluster: app } } ]
"#;
        let model = MeshModel::from_conf(&conf(yaml), TranslationMode::Multi).unwrap();
        assert!(!model.bindings[0].tls);
    }

    #[test]
    fn test_cluster_without_endpoint_rejected() {
        let err = MeshModel::from_conf(&conf("clusters: [ { name: empty } ]"), TranslationMode::Multi)
            .unwrap_err();
        assert!(matches!(err, BridgeError::MissingEndpoint { .. }));
    }
}
