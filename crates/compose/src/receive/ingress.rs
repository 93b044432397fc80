use vigil_core::{IngressSpec, ReceiveSpec, ResourceBody, ResourceDescriptor, ResourceKind, Result};

use super::{ReceiveView, GRPC_PORT, HTTP_PORT};
use crate::ingress::ingress_body;

pub fn ingress_http(view: &ReceiveView<'_>) -> Result<ResourceDescriptor> {
    Ok(build(view, HTTP_PORT, |r| r.http_ingress.as_ref()))
}

pub fn ingress_grpc(view: &ReceiveView<'_>) -> Result<ResourceDescriptor> {
    Ok(build(view, GRPC_PORT, |r| r.grpc_ingress.as_ref()))
}

/// Named `{receive}-{port}`, routed to the receive service's port of the same name.
fn build(view: &ReceiveView<'_>, port: &str, route: fn(&ReceiveSpec) -> Option<&IngressSpec>) -> ResourceDescriptor {
    let name = view.name(Some(port));
    match view.receive.as_ref().and_then(route) {
        Some(route) => {
            let body = ingress_body(view.meta.object_meta(&name), route, &view.name(None), port);
            ResourceDescriptor::present(name, &view.naming.namespace, ResourceBody::Ingress(body))
        }
        None => view.absent(ResourceKind::Ingress, name),
    }
}
