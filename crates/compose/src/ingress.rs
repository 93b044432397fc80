//! Shared ingress body: a single host/path rule routed to a named service port.

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule, IngressServiceBackend,
    IngressSpec as K8sIngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use vigil_core::IngressSpec;

pub const PATH_TYPE: &str = "ImplementationSpecific";

/// TLS is attached only when a certificate secret is named.
pub fn ingress_body(meta: ObjectMeta, route: &IngressSpec, service: &str, port_name: &str) -> Ingress {
    let path = HTTPIngressPath {
        path: Some(route.path.clone()).filter(|p| !p.is_empty()),
        path_type: PATH_TYPE.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: service.to_string(),
                port: Some(ServiceBackendPort { name: Some(port_name.to_string()), number: None }),
            }),
            resource: None,
        },
    };
    let tls = route
        .certificate
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|secret| vec![IngressTLS { hosts: Some(vec![route.host.clone()]), secret_name: Some(secret.to_string()) }]);
    Ingress {
        metadata: meta,
        spec: Some(K8sIngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(route.host.clone()).filter(|h| !h.is_empty()),
                http: Some(HTTPIngressRuleValue { paths: vec![path] }),
            }]),
            tls,
            ..Default::default()
        }),
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(cert: Option<&str>) -> IngressSpec {
        IngressSpec { host: "receive.example.com".into(), path: "/api".into(), certificate: cert.map(str::to_string) }
    }

    #[test]
    fn routes_host_and_path_to_named_port() {
        let ing = ingress_body(ObjectMeta::default(), &route(None), "prod-receive", "http");
        let v = serde_json::to_value(&ing).unwrap();
        assert_eq!(
            v["spec"]["rules"],
            serde_json::json!([{
                "host": "receive.example.com",
                "http": { "paths": [{
                    "path": "/api",
                    "pathType": "ImplementationSpecific",
                    "backend": { "service": { "name": "prod-receive", "port": { "name": "http" } } }
                }]}
            }])
        );
        assert!(v["spec"].get("tls").is_none());
    }

    #[test]
    fn certificate_adds_tls_block() {
        let ing = ingress_body(ObjectMeta::default(), &route(Some("receive-tls")), "prod-receive", "grpc");
        let tls = ing.spec.unwrap().tls.unwrap();
        assert_eq!(tls.len(), 1);
        assert_eq!(tls[0].hosts.as_deref(), Some(&["receive.example.com".to_string()][..]));
        assert_eq!(tls[0].secret_name.as_deref(), Some("receive-tls"));
    }

    #[test]
    fn empty_certificate_means_no_tls() {
        let ing = ingress_body(ObjectMeta::default(), &route(Some("")), "prod-receive", "grpc");
        assert!(ing.spec.unwrap().tls.is_none());
    }
}
