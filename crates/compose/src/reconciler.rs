//! Composition root: defaulting plus ordered, all-or-nothing builder invocation.

use metrics::counter;
use tracing::{debug, warn};
use vigil_core::{Installation, Peers, ReceiveSpec, ResourceDescriptor, Result, StoreEndpoint};

use crate::args::ArgumentList;
use crate::config::ComposerConfig;
use crate::defaults::merge_defaults;
use crate::naming::RECEIVE;
use crate::receive::{container_args, receive_builders, ReceiveView};
use crate::store_endpoint::{store_endpoint_builders, StoreEndpointView, STORE_ENDPOINT};

/// Decides presence and body of exactly one resource.
pub type Builder<V> = fn(&V) -> Result<ResourceDescriptor>;

/// Run `builders` in order. The first error discards everything built so far.
pub fn reconcile_resources<V>(view: &V, builders: &[Builder<V>]) -> Result<Vec<ResourceDescriptor>> {
    builders.iter().map(|build| build(view)).collect()
}

/// Desired state of every resource owned by the installation's receive component.
pub fn reconcile_receive(installation: &Installation, peers: &Peers, config: &ComposerConfig) -> Result<Vec<ResourceDescriptor>> {
    counter!("compose_passes", 1u64, "component" => RECEIVE);
    let view = ReceiveView::new(installation, peers, config, defaulted_receive(installation, config)?);
    finish(RECEIVE, &installation.name, reconcile_resources(&view, &receive_builders()))
}

/// Arguments the receive container would run with; `None` when receive is not configured.
pub fn receive_args(installation: &Installation, peers: &Peers, config: &ComposerConfig) -> Result<Option<ArgumentList>> {
    let view = ReceiveView::new(installation, peers, config, defaulted_receive(installation, config)?);
    Ok(view.receive.as_ref().map(|r| container_args(&view, r)))
}

fn defaulted_receive(installation: &Installation, config: &ComposerConfig) -> Result<Option<ReceiveSpec>> {
    let Some(r) = installation.spec.receive.as_ref() else { return Ok(None) };
    let merged = merge_defaults(RECEIVE, r, &config.defaults.receive).inspect_err(|e| {
        counter!("compose_errors", 1u64, "component" => RECEIVE);
        warn!(installation = %installation.name, error = %e, "defaulting failed");
    })?;
    Ok(Some(merged))
}

/// Desired state of the ingress exposing one store endpoint.
pub fn reconcile_store_endpoint(endpoint: &StoreEndpoint, config: &ComposerConfig) -> Result<Vec<ResourceDescriptor>> {
    counter!("compose_passes", 1u64, "component" => STORE_ENDPOINT);
    let view = StoreEndpointView::new(endpoint, config);
    finish(STORE_ENDPOINT, &endpoint.name, reconcile_resources(&view, &store_endpoint_builders()))
}

fn finish(component: &'static str, owner: &str, res: Result<Vec<ResourceDescriptor>>) -> Result<Vec<ResourceDescriptor>> {
    match &res {
        Ok(descriptors) => {
            let present = descriptors.iter().filter(|d| d.is_present()).count();
            counter!("compose_resources", descriptors.len() as u64, "component" => component);
            debug!(component, owner, total = descriptors.len(), present, "composed desired state");
        }
        Err(e) => {
            counter!("compose_errors", 1u64, "component" => component);
            warn!(component, owner, error = %e, "composition aborted");
        }
    }
    res
}
