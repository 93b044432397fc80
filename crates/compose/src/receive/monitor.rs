use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use serde_json::{json, Map, Value as Json};
use vigil_core::{ResourceBody, ResourceDescriptor, ResourceKind, Result};

use super::{ReceiveView, HTTP_PORT};

pub const METRICS_PATH: &str = "/metrics";

/// Prometheus-operator scrape config for the receive service. Present only when requested.
pub fn service_monitor(view: &ReceiveView<'_>) -> Result<ResourceDescriptor> {
    let name = view.name(None);
    let Some(receive) = view.receive.as_ref().filter(|r| r.service_monitor == Some(true)) else {
        return Ok(view.absent(ResourceKind::ServiceMonitor, name));
    };

    let mut endpoint = Map::new();
    endpoint.insert("port".into(), Json::from(HTTP_PORT));
    endpoint.insert("path".into(), Json::from(METRICS_PATH));
    if let Some(interval) = receive.metrics_interval.as_deref().filter(|i| !i.is_empty()) {
        endpoint.insert("interval".into(), Json::from(interval));
    }

    let gvk = GroupVersionKind::gvk("monitoring.coreos.com", "v1", "ServiceMonitor");
    let mut obj = DynamicObject::new(&name, &ApiResource::from_gvk(&gvk)).data(json!({
        "spec": {
            "selector": { "matchLabels": view.meta.labels },
            "namespaceSelector": { "matchNames": [view.naming.namespace] },
            "endpoints": [endpoint],
        }
    }));
    obj.metadata = view.meta.object_meta(&name);
    Ok(ResourceDescriptor::present(name, &view.naming.namespace, ResourceBody::ServiceMonitor(obj)))
}
