use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use vigil_core::address::port_of;
use vigil_core::{ResourceBody, ResourceDescriptor, ResourceKind, Result};

use super::{ReceiveView, GRPC_PORT, HTTP_PORT};

pub fn service(view: &ReceiveView<'_>) -> Result<ResourceDescriptor> {
    let name = view.name(None);
    let Some(receive) = view.receive.as_ref() else {
        return Ok(view.absent(ResourceKind::Service, name));
    };
    let grpc_port = port_of("grpcAddress", receive.grpc_address.as_deref().unwrap_or_default())?;
    let http_port = port_of("httpAddress", receive.http_address.as_deref().unwrap_or_default())?;

    let svc = Service {
        metadata: view.meta.object_meta(&name),
        spec: Some(ServiceSpec {
            ports: Some(vec![service_port(GRPC_PORT, grpc_port), service_port(HTTP_PORT, http_port)]),
            selector: Some(view.meta.labels.clone()),
            type_: Some("ClusterIP".to_string()),
            ..Default::default()
        }),
        status: None,
    };
    Ok(ResourceDescriptor::present(name, &view.naming.namespace, ResourceBody::Service(svc)))
}

fn service_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        protocol: Some("TCP".to_string()),
        port,
        target_port: Some(IntOrString::String(name.to_string())),
        ..Default::default()
    }
}
