//! Peer endpoint discovery.
//!
//! Sources are consulted in a fixed order and each keeps its natural
//! enumeration order, so the emitted list is stable for a given snapshot:
//! sibling query layers, then the local store gateway, then the local rule
//! evaluator, then explicit sidecar endpoints.

use tracing::debug;
use vigil_core::{Installation, Peers, RuleSpec, StoreEndpoint, StoreGatewaySpec};

use crate::naming::{Naming, QUERY, RULE, STORE};

pub const STORE_FLAG: &str = "--store=";
/// Resolve SRV records without A/AAAA lookups on the returned targets.
pub const DNS_SRV_NOA: &str = "dnssrvnoa+";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiscoverySource {
    QueryBroadcast,
    StoreGateway,
    Rule,
    Sidecar,
}

/// A peer address already formatted as a complete `--store=` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub source: DiscoverySource,
    pub flag: String,
}

impl Endpoint {
    fn srv(source: DiscoverySource, dns: &str) -> Self {
        Self { source, flag: format!("{STORE_FLAG}{DNS_SRV_NOA}{dns}") }
    }

    fn raw(url: &str) -> Self {
        Self { source: DiscoverySource::Sidecar, flag: format!("{STORE_FLAG}{url}") }
    }
}

/// The parts of an installation and its surroundings that discovery reads.
#[derive(Debug, Clone, Copy)]
pub struct PeerSnapshot<'a> {
    pub query_discovery: bool,
    pub store_gateway: Option<&'a StoreGatewaySpec>,
    pub rule: Option<&'a RuleSpec>,
    pub siblings: &'a [Installation],
    pub store_endpoints: &'a [StoreEndpoint],
}

impl<'a> PeerSnapshot<'a> {
    pub fn new(installation: &'a Installation, peers: &'a Peers) -> Self {
        Self {
            query_discovery: installation.spec.query_discovery,
            store_gateway: installation.spec.store_gateway.as_ref(),
            rule: installation.spec.rule.as_ref(),
            siblings: &peers.siblings,
            store_endpoints: &peers.store_endpoints,
        }
    }
}

/// One service per time-range shard, or a single service when unsharded.
pub fn store_gateway_service_urls(naming: &Naming, gateway: &StoreGatewaySpec) -> Vec<String> {
    if gateway.time_ranges.is_empty() {
        return vec![naming.service_dns(&naming.qualified_name(STORE, None))];
    }
    (0..gateway.time_ranges.len())
        .map(|i| naming.service_dns(&naming.qualified_name(STORE, Some(&i.to_string()))))
        .collect()
}

pub fn rule_service_urls(naming: &Naming, _rule: &RuleSpec) -> Vec<String> {
    vec![naming.service_dns(&naming.qualified_name(RULE, None))]
}

pub fn discover_peers(naming: &Naming, snapshot: &PeerSnapshot<'_>) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();

    if snapshot.query_discovery {
        for sibling in snapshot.siblings.iter().filter(|s| s.spec.query.is_some()) {
            let theirs = Naming::new(&sibling.name, &sibling.namespace, &naming.cluster_domain);
            let dns = theirs.service_dns(&theirs.qualified_name(QUERY, None));
            endpoints.push(Endpoint::srv(DiscoverySource::QueryBroadcast, &dns));
        }
    }

    if let Some(gateway) = snapshot.store_gateway {
        for url in store_gateway_service_urls(naming, gateway) {
            endpoints.push(Endpoint::srv(DiscoverySource::StoreGateway, &url));
        }
    }

    if let Some(rule) = snapshot.rule {
        for url in rule_service_urls(naming, rule) {
            endpoints.push(Endpoint::srv(DiscoverySource::Rule, &url));
        }
    }

    for ep in snapshot.store_endpoints {
        match ep.service_url() {
            Some(url) => endpoints.push(Endpoint::raw(url)),
            None => debug!(endpoint = %ep.name, ns = %ep.namespace, "store endpoint has no url; skipping"),
        }
    }

    endpoints
}
