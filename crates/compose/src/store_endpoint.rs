//! Store endpoint exposure: a gRPC ingress in front of an externally operated store API.

use vigil_core::{IngressSpec, ResourceBody, ResourceDescriptor, ResourceKind, Result, StoreEndpoint};

use crate::config::ComposerConfig;
use crate::ingress::ingress_body;
use crate::naming::{common_labels, component_labels, MetaFactory, Naming, STORE};
use crate::reconciler::Builder;

pub const STORE_ENDPOINT: &str = "store-endpoint";

#[derive(Debug, Clone)]
pub struct StoreEndpointView {
    pub naming: Naming,
    pub meta: MetaFactory,
    pub ingress: Option<IngressSpec>,
}

impl StoreEndpointView {
    pub fn new(endpoint: &StoreEndpoint, config: &ComposerConfig) -> Self {
        let common = common_labels(&config.operator_name, &endpoint.name, &config.common_labels);
        Self {
            naming: Naming::new(&endpoint.name, &endpoint.namespace, &config.cluster_domain),
            meta: MetaFactory {
                namespace: endpoint.namespace.clone(),
                labels: component_labels(STORE_ENDPOINT, &common, &endpoint.spec.labels),
                annotations: None,
            },
            ingress: endpoint.spec.ingress.clone(),
        }
    }

    /// The endpoint's service and its ingress share this name.
    pub fn name(&self) -> String {
        self.naming.qualified_name(STORE, None)
    }
}

pub fn store_endpoint_builders() -> [Builder<StoreEndpointView>; 1] {
    [ingress_grpc]
}

pub fn ingress_grpc(view: &StoreEndpointView) -> Result<ResourceDescriptor> {
    let name = view.name();
    Ok(match view.ingress.as_ref() {
        Some(route) => {
            let body = ingress_body(view.meta.object_meta(&name), route, &name, "grpc");
            ResourceDescriptor::present(name, &view.naming.namespace, ResourceBody::Ingress(body))
        }
        None => ResourceDescriptor::absent(ResourceKind::Ingress, name, &view.naming.namespace),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::StoreEndpointSpec;

    fn endpoint(ingress: Option<IngressSpec>) -> StoreEndpoint {
        StoreEndpoint {
            name: "sidecar-eu".into(),
            namespace: "monitoring".into(),
            spec: StoreEndpointSpec { url: Some("prom-eu:10901".into()), ingress, ..Default::default() },
        }
    }

    #[test]
    fn no_ingress_block_is_absent() {
        let view = StoreEndpointView::new(&endpoint(None), &ComposerConfig::default());
        let d = ingress_grpc(&view).unwrap();
        assert!(!d.is_present());
        assert_eq!((d.kind, d.name.as_str(), d.namespace.as_str()), (ResourceKind::Ingress, "sidecar-eu-store", "monitoring"));
    }

    #[test]
    fn ingress_routes_to_grpc_port() {
        let route = IngressSpec { host: "store.example.com".into(), path: "/".into(), certificate: Some("store-tls".into()) };
        let view = StoreEndpointView::new(&endpoint(Some(route)), &ComposerConfig::default());
        let m = ingress_grpc(&view).unwrap().to_manifest().unwrap();
        let backend = &m["spec"]["rules"][0]["http"]["paths"][0]["backend"]["service"];
        assert_eq!(backend["name"], "sidecar-eu-store");
        assert_eq!(backend["port"]["name"], "grpc");
        assert_eq!(m["spec"]["tls"][0]["secretName"], "store-tls");
        assert_eq!(m["metadata"]["labels"]["app.kubernetes.io/name"], STORE_ENDPOINT);
    }
}
