//! Resource naming, label merging and object metadata.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use vigil_core::Labels;

pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Canonical component base names.
pub const QUERY: &str = "query";
pub const RECEIVE: &str = "receive";
pub const STORE: &str = "store";
pub const RULE: &str = "rule";

/// Names resources of one owner (an installation or a store endpoint).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    pub owner: String,
    pub namespace: String,
    pub cluster_domain: String,
}

impl Naming {
    pub fn new(owner: impl Into<String>, namespace: impl Into<String>, cluster_domain: impl Into<String>) -> Self {
        Self { owner: owner.into(), namespace: namespace.into(), cluster_domain: cluster_domain.into() }
    }

    /// `{owner}-{base}` or `{owner}-{base}-{suffix}`. An empty suffix is no suffix.
    pub fn qualified_name(&self, base: &str, suffix: Option<&str>) -> String {
        match suffix.filter(|s| !s.is_empty()) {
            Some(s) => format!("{}-{}-{}", self.owner, base, s),
            None => format!("{}-{}", self.owner, base),
        }
    }

    /// DNS SRV name of the `grpc` port of a service in this namespace.
    pub fn service_dns(&self, service: &str) -> String {
        format!("_grpc._tcp.{}.{}.svc.{}", service, self.namespace, self.cluster_domain)
    }
}

/// Merge label layers in order; later layers override earlier ones.
pub fn merge_labels<'a>(layers: impl IntoIterator<Item = &'a Labels>) -> Labels {
    let mut out = Labels::new();
    for layer in layers {
        out.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    out
}

/// identity < common < user
pub fn component_labels(component: &str, common: &Labels, user: &Labels) -> Labels {
    let identity = Labels::from([(NAME_LABEL.to_string(), component.to_string())]);
    merge_labels([&identity, common, user])
}

/// Labels every object of an owner carries: managed-by and instance, then configured cluster-wide labels.
pub fn common_labels(operator_name: &str, owner: &str, cluster_wide: &Labels) -> Labels {
    let base = Labels::from([
        (MANAGED_BY_LABEL.to_string(), operator_name.to_string()),
        (INSTANCE_LABEL.to_string(), owner.to_string()),
    ]);
    merge_labels([&base, cluster_wide])
}

/// Produces object metadata with precomputed labels and the user's annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaFactory {
    pub namespace: String,
    pub labels: Labels,
    pub annotations: Option<Labels>,
}

impl MetaFactory {
    pub fn object_meta(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(self.namespace.clone()),
            labels: Some(self.labels.clone()),
            annotations: self.annotations.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> Naming {
        Naming::new("prod", "monitoring", "cluster.local")
    }

    #[test]
    fn qualified_names_are_distinct_per_suffix() {
        let n = naming();
        let names = [
            n.qualified_name(RECEIVE, None),
            n.qualified_name(RECEIVE, Some("http")),
            n.qualified_name(RECEIVE, Some("grpc")),
        ];
        assert_eq!(names, ["prod-receive", "prod-receive-http", "prod-receive-grpc"]);
        assert_eq!(n.qualified_name(RECEIVE, Some("")), "prod-receive");
    }

    #[test]
    fn service_dns_uses_namespace_and_domain() {
        let n = Naming::new("prod", "monitoring", "corp.internal");
        assert_eq!(n.service_dns("prod-query"), "_grpc._tcp.prod-query.monitoring.svc.corp.internal");
    }

    #[test]
    fn later_label_layers_win() {
        let common = Labels::from([
            ("team".to_string(), "obs".to_string()),
            (NAME_LABEL.to_string(), "overridden-by-common".to_string()),
        ]);
        let user = Labels::from([("team".to_string(), "payments".to_string())]);
        let l = component_labels(RECEIVE, &common, &user);
        assert_eq!(l[NAME_LABEL], "overridden-by-common");
        assert_eq!(l["team"], "payments");
    }

    #[test]
    fn common_labels_let_cluster_wide_override_builtins() {
        let cluster = Labels::from([(MANAGED_BY_LABEL.to_string(), "gitops".to_string())]);
        let l = common_labels("vigil-operator", "prod", &cluster);
        assert_eq!(l[MANAGED_BY_LABEL], "gitops");
        assert_eq!(l[INSTANCE_LABEL], "prod");
    }

    #[test]
    fn object_meta_copies_annotations_verbatim() {
        let f = MetaFactory {
            namespace: "monitoring".into(),
            labels: Labels::from([(NAME_LABEL.to_string(), RECEIVE.to_string())]),
            annotations: Some(Labels::from([("a".to_string(), "1".to_string())])),
        };
        let m = f.object_meta("prod-receive");
        assert_eq!(m.name.as_deref(), Some("prod-receive"));
        assert_eq!(m.namespace.as_deref(), Some("monitoring"));
        assert_eq!(m.annotations, f.annotations);
        assert_eq!(m.labels.unwrap()[NAME_LABEL], RECEIVE);

        let bare = MetaFactory { annotations: None, ..f };
        assert!(bare.object_meta("x").annotations.is_none());
    }
}
