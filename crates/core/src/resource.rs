//! Desired-state descriptors handed to the apply layer.

use std::fmt;

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service, networking::v1::Ingress};
use kube::core::DynamicObject;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Deployment,
    Service,
    Ingress,
    ServiceMonitor,
}

impl ResourceKind {
    pub fn api_version(&self) -> &'static str {
        use k8s_openapi::Resource;
        match self {
            ResourceKind::Deployment => Deployment::API_VERSION,
            ResourceKind::Service => Service::API_VERSION,
            ResourceKind::Ingress => Ingress::API_VERSION,
            ResourceKind::ServiceMonitor => "monitoring.coreos.com/v1",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
            ResourceKind::Ingress => "Ingress",
            ResourceKind::ServiceMonitor => "ServiceMonitor",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully populated body of a resource that should exist.
#[derive(Debug, Clone)]
pub enum ResourceBody {
    Deployment(Deployment),
    Service(Service),
    Ingress(Ingress),
    ServiceMonitor(DynamicObject),
}

impl ResourceBody {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceBody::Deployment(_) => ResourceKind::Deployment,
            ResourceBody::Service(_) => ResourceKind::Service,
            ResourceBody::Ingress(_) => ResourceKind::Ingress,
            ResourceBody::ServiceMonitor(_) => ResourceKind::ServiceMonitor,
        }
    }

    /// Manifest JSON including `apiVersion` and `kind`.
    pub fn to_json(&self) -> serde_json::Result<Json> {
        match self {
            ResourceBody::Deployment(o) => serde_json::to_value(o),
            ResourceBody::Service(o) => serde_json::to_value(o),
            ResourceBody::Ingress(o) => serde_json::to_value(o),
            ResourceBody::ServiceMonitor(o) => serde_json::to_value(o),
        }
    }
}

/// Present carries the body; Absent carries nothing, so a merge-based apply
/// can never resurrect stale fields from it.
#[derive(Debug, Clone)]
pub enum DesiredState {
    Present(Box<ResourceBody>),
    Absent,
}

/// One cluster resource and whether it should exist.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
    pub state: DesiredState,
}

impl ResourceDescriptor {
    pub fn present(name: impl Into<String>, namespace: impl Into<String>, body: ResourceBody) -> Self {
        Self { kind: body.kind(), name: name.into(), namespace: namespace.into(), state: DesiredState::Present(Box::new(body)) }
    }

    pub fn absent(kind: ResourceKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { kind, name: name.into(), namespace: namespace.into(), state: DesiredState::Absent }
    }

    pub fn is_present(&self) -> bool {
        matches!(self.state, DesiredState::Present(_))
    }

    pub fn body(&self) -> Option<&ResourceBody> {
        match &self.state {
            DesiredState::Present(b) => Some(b.as_ref()),
            DesiredState::Absent => None,
        }
    }

    /// `Kind namespace/name`
    pub fn key(&self) -> String {
        format!("{} {}/{}", self.kind, self.namespace, self.name)
    }

    /// Manifest for Present, identity-only stub (apiVersion, kind, name, namespace) for Absent.
    pub fn to_manifest(&self) -> serde_json::Result<Json> {
        match &self.state {
            DesiredState::Present(body) => body.to_json(),
            DesiredState::Absent => Ok(serde_json::json!({
                "apiVersion": self.kind.api_version(),
                "kind": self.kind.as_str(),
                "metadata": { "name": self.name, "namespace": self.namespace },
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn absent_manifest_is_identity_only() {
        let d = ResourceDescriptor::absent(ResourceKind::Ingress, "prod-receive-http", "monitoring");
        assert!(!d.is_present());
        assert!(d.body().is_none());
        let m = d.to_manifest().unwrap();
        assert_eq!(
            m,
            serde_json::json!({
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": { "name": "prod-receive-http", "namespace": "monitoring" }
            })
        );
    }

    #[test]
    fn present_manifest_carries_type_meta() {
        let svc = Service {
            metadata: ObjectMeta { name: Some("prod-receive".into()), namespace: Some("monitoring".into()), ..Default::default() },
            ..Default::default()
        };
        let d = ResourceDescriptor::present("prod-receive", "monitoring", ResourceBody::Service(svc));
        assert_eq!(d.kind, ResourceKind::Service);
        assert_eq!(d.key(), "Service monitoring/prod-receive");
        let m = d.to_manifest().unwrap();
        assert_eq!(m["apiVersion"], "v1");
        assert_eq!(m["kind"], "Service");
        assert_eq!(m["metadata"]["name"], "prod-receive");
    }

    #[test]
    fn kinds_map_to_api_versions() {
        assert_eq!(ResourceKind::Deployment.api_version(), "apps/v1");
        assert_eq!(ResourceKind::ServiceMonitor.api_version(), "monitoring.coreos.com/v1");
    }
}
