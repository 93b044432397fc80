//! Receive component: the remote-write ingestion workload and everything exposing it.

mod ingress;
mod monitor;
mod service;
mod workload;

pub use ingress::{ingress_grpc, ingress_http};
pub use monitor::service_monitor;
pub use service::service;
pub use workload::{container_args, deployment};

use vigil_core::{Installation, Peers, ReceiveSpec, ResourceDescriptor, ResourceKind};

use crate::config::ComposerConfig;
use crate::discovery::PeerSnapshot;
use crate::naming::{common_labels, component_labels, MetaFactory, Naming, RECEIVE};
use crate::reconciler::Builder;

pub const HTTP_PORT: &str = "http";
pub const GRPC_PORT: &str = "grpc";

/// Builder order for one pass.
pub fn receive_builders<'a>() -> [Builder<ReceiveView<'a>>; 5] {
    [
        deployment as Builder<ReceiveView<'a>>,
        service as Builder<ReceiveView<'a>>,
        service_monitor as Builder<ReceiveView<'a>>,
        ingress_http as Builder<ReceiveView<'a>>,
        ingress_grpc as Builder<ReceiveView<'a>>,
    ]
}

/// Read-only inputs of the receive builders.
#[derive(Debug, Clone)]
pub struct ReceiveView<'a> {
    pub naming: Naming,
    pub meta: MetaFactory,
    /// Defaulted copy of the receive block; `None` when receive is not configured.
    pub receive: Option<ReceiveSpec>,
    pub peers: PeerSnapshot<'a>,
}

impl<'a> ReceiveView<'a> {
    pub fn new(installation: &'a Installation, peers: &'a Peers, config: &ComposerConfig, receive: Option<ReceiveSpec>) -> Self {
        let naming = Naming::new(&installation.name, &installation.namespace, &config.cluster_domain);
        let common = common_labels(&config.operator_name, &installation.name, &config.common_labels);
        let no_labels = Default::default();
        let user = receive.as_ref().map(|r| &r.labels).unwrap_or(&no_labels);
        let meta = MetaFactory {
            namespace: installation.namespace.clone(),
            labels: component_labels(RECEIVE, &common, user),
            annotations: receive.as_ref().and_then(|r| r.annotations.clone()),
        };
        Self { naming, meta, receive, peers: PeerSnapshot::new(installation, peers) }
    }

    pub fn name(&self, suffix: Option<&str>) -> String {
        self.naming.qualified_name(RECEIVE, suffix)
    }

    fn absent(&self, kind: ResourceKind, name: String) -> ResourceDescriptor {
        ResourceDescriptor::absent(kind, name, &self.naming.namespace)
    }
}
