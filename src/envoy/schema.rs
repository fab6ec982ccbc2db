//! Envoy static configuration schema.
//!
//! Only the subset the bridge translates is modelled; unknown keys are
//! ignored. Envoy accepts both `snake_case` and `camelCase` field names in
//! YAML, so every multi-word field carries a camelCase alias.

use serde::Deserialize;

/// Root of an Envoy bootstrap document.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EnvoyConf {
    #[serde(alias = "staticResources")]
    pub static_resources: StaticResources,

    /// Clusters given at the top level instead of under `static_resources`.
    pub clusters: Vec<Cluster>,

    /// Listeners given at the top level instead of under `static_resources`.
    pub listeners: Vec<Listener>,
}

impl EnvoyConf {
    /// Clusters in document order, preferring the `static_resources` block.
    pub fn clusters(&self) -> &[Cluster] {
        if self.static_resources.clusters.is_empty() {
            &self.clusters
        } else {
            &self.static_resources.clusters
        }
    }

    /// Listeners in document order, preferring the `static_resources` block.
    pub fn listeners(&self) -> &[Listener] {
        if self.static_resources.listeners.is_empty() {
            &self.listeners
        } else {
            &self.static_resources.listeners
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StaticResources {
    pub clusters: Vec<Cluster>,
    pub listeners: Vec<Listener>,
}

/// An upstream cluster definition.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Cluster {
    pub name: String,

    #[serde(alias = "loadAssignment")]
    pub load_assignment: Option<ClusterLoadAssignment>,

    /// Pre-v3 endpoint list.
    pub hosts: Vec<Address>,
}

impl Cluster {
    /// Socket addresses of every endpoint, `load_assignment` taking priority
    /// over the legacy `hosts` list.
    pub fn socket_addresses(&self) -> Vec<&SocketAddress> {
        match &self.load_assignment {
            Some(assignment) if !assignment.endpoints.is_empty() => assignment
                .endpoints
                .iter()
                .flat_map(|locality| locality.lb_endpoints.iter())
                .map(|lb| &lb.endpoint.address.socket_address)
                .collect(),
            _ => self.hosts.iter().map(|h| &h.socket_address).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ClusterLoadAssignment {
    pub endpoints: Vec<LocalityLbEndpoints>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LocalityLbEndpoints {
    #[serde(alias = "lbEndpoints")]
    pub lb_endpoints: Vec<LbEndpoint>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LbEndpoint {
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Endpoint {
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Address {
    #[serde(alias = "socketAddress")]
    pub socket_address: SocketAddress,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SocketAddress {
    pub address: String,

    #[serde(alias = "portValue")]
    pub port_value: Option<PortValue>,
}

/// Envoy serializes ports as integers, older generators emit strings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Text(String),
}

impl PortValue {
    /// The port as `u16`, `None` when out of range or not numeric.
    pub fn to_port(&self) -> Option<u16> {
        match self {
            PortValue::Number(n) => u16::try_from(*n).ok(),
            PortValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn raw(&self) -> String {
        match self {
            PortValue::Number(n) => n.to_string(),
            PortValue::Text(s) => s.clone(),
        }
    }
}

/// A downstream listener.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Listener {
    pub name: String,

    pub address: Address,

    #[serde(alias = "filterChains")]
    pub filter_chains: Vec<FilterChain>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FilterChain {
    pub filters: Vec<Filter>,

    #[serde(alias = "transportSocket")]
    pub transport_socket: Option<TransportSocket>,

    /// Pre-v3 TLS settings, equivalent to `transport_socket.typed_config`.
    #[serde(alias = "tlsContext")]
    pub tls_context: Option<DownstreamTlsContext>,
}

impl FilterChain {
    /// Downstream TLS settings from whichever form the document uses.
    pub fn tls(&self) -> Option<&DownstreamTlsContext> {
        self.transport_socket
            .as_ref()
            .and_then(|socket| socket.typed_config.as_ref())
            .or(self.tls_context.as_ref())
    }

    /// Cluster named by the first filter that routes to one.
    pub fn cluster(&self) -> Option<&str> {
        self.filters
            .iter()
            .filter_map(|f| f.typed_config.as_ref().or(f.config.as_ref()))
            .map(|c| c.cluster.as_str())
            .find(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Filter {
    pub name: String,

    #[serde(alias = "typedConfig")]
    pub typed_config: Option<TcpProxy>,

    /// Pre-v3 filter settings.
    pub config: Option<TcpProxy>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TcpProxy {
    pub cluster: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TransportSocket {
    pub name: String,

    #[serde(alias = "typedConfig")]
    pub typed_config: Option<DownstreamTlsContext>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DownstreamTlsContext {
    #[serde(alias = "commonTlsContext")]
    pub common_tls_context: CommonTlsContext,

    #[serde(alias = "requireClientCertificate")]
    pub require_client_certificate: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CommonTlsContext {
    #[serde(alias = "tlsParams")]
    pub tls_params: TlsParams,

    #[serde(alias = "tlsCertificateSdsSecretConfigs")]
    pub tls_certificate_sds_secret_configs: Vec<SdsSecretConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsParams {
    #[serde(alias = "cipherSuites")]
    pub cipher_suites: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SdsSecretConfig {
    pub name: String,
}
