//! Installation snapshot types as they arrive from the control loop.
//!
//! These mirror the custom resource wire format (camelCase). The composer
//! only ever reads them; defaulting produces new values.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use serde::{Deserialize, Serialize};

/// Label and annotation maps. Ordered so rendering never depends on hash order.
pub type Labels = BTreeMap<String, String>;

/// Top-level installation resource: one monitoring stack in one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub spec: InstallationSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationSpec {
    /// Broadcast discovery: find the query layer of every sibling installation.
    #[serde(default)]
    pub query_discovery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QuerySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive: Option<ReceiveSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_gateway: Option<StoreGatewaySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleSpec>,
}

/// Query layer block. Receive only consults its presence on sibling installations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreGatewaySpec {
    /// Each time range is served by its own gateway service.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_ranges: Vec<TimeRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,
}

impl ImageSpec {
    /// `repository:tag`
    pub fn reference(&self) -> String {
        format!(
            "{}:{}",
            self.repository.as_deref().unwrap_or_default(),
            self.tag.as_deref().unwrap_or_default()
        )
    }
}

/// Externally reachable route into one of the component's service ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    /// Secret holding the ingress TLS certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

/// Receive (remote-write ingestion) block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveSpec {
    #[serde(default)]
    pub image: ImageSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Labels>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_grace_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_grace_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_write_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsdb_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsdb_retention: Option<String>,
    /// `None` is unset; an explicit `false` is kept through defaulting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsdb_wal_compression: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<u32>,
    /// External labels stamped on every ingested series.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub external_labels: Labels,

    /// Secret with the remote-write server certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_write_server_certificate: Option<String>,
    /// Secret with the remote-write client certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_write_client_certificate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_ingress: Option<IngressSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_ingress: Option<IngressSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_monitor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_interval: Option<String>,
}

impl ReceiveSpec {
    pub fn server_certificate(&self) -> Option<&str> {
        non_empty(self.remote_write_server_certificate.as_deref())
    }

    pub fn client_certificate(&self) -> Option<&str> {
        non_empty(self.remote_write_client_certificate.as_deref())
    }
}

/// Externally operated store API (typically a sidecar) with a known address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEndpoint {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub spec: StoreEndpointSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEndpointSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<IngressSpec>,
}

impl StoreEndpoint {
    /// Concrete address of the store API, if one is configured.
    pub fn service_url(&self) -> Option<&str> {
        non_empty(self.spec.url.as_deref().map(str::trim))
    }
}

/// Read-only snapshot of everything outside the installation that discovery may consult.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peers {
    /// Other installations in the cluster, in the order the control loop listed them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub siblings: Vec<Installation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub store_endpoints: Vec<StoreEndpoint>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}
