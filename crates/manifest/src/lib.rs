//! Vigil manifest: render desired state as manifests and diff it against a
//! previously rendered stream. Nothing here talks to a cluster.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::warn;
use vigil_core::{DesiredState, ResourceDescriptor};

fn max_yaml_bytes() -> usize {
    std::env::var("VIGIL_MAX_YAML_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(4_000_000)
}

/// Identity of one object: apiVersion, kind, namespace, name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn of(d: &ResourceDescriptor) -> Self {
        Self {
            api_version: d.kind.api_version().to_string(),
            kind: d.kind.as_str().to_string(),
            namespace: d.namespace.clone(),
            name: d.name.clone(),
        }
    }

    fn from_manifest(v: &Json) -> Option<Self> {
        let s = |v: Option<&Json>| v.and_then(|x| x.as_str()).map(str::to_string);
        let meta = v.get("metadata");
        Some(Self {
            api_version: s(v.get("apiVersion"))?,
            kind: s(v.get("kind"))?,
            namespace: s(meta.and_then(|m| m.get("namespace"))).unwrap_or_default(),
            name: s(meta.and_then(|m| m.get("name")))?,
        })
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Manifests to apply and identities to delete, in composer order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderedPlan {
    pub present: Vec<Json>,
    pub absent: Vec<ObjectRef>,
}

pub fn plan(descriptors: &[ResourceDescriptor]) -> Result<RenderedPlan> {
    let mut out = RenderedPlan::default();
    for d in descriptors {
        match &d.state {
            DesiredState::Present(body) => {
                out.present.push(body.to_json().with_context(|| format!("serializing {}", d.key()))?)
            }
            DesiredState::Absent => out.absent.push(ObjectRef::of(d)),
        }
    }
    Ok(out)
}

/// Multi-document YAML of the present manifests; absent objects become trailing comments.
pub fn to_yaml_stream(plan: &RenderedPlan) -> Result<String> {
    let mut out = String::new();
    for m in &plan.present {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(m).context("rendering manifest YAML")?);
    }
    for r in &plan.absent {
        out.push_str(&format!("# absent: {} {}\n", r.api_version, r));
    }
    Ok(out)
}

/// Parse a multi-document YAML stream into JSON values, skipping empty documents.
pub fn parse_yaml_stream(yaml: &str) -> Result<Vec<Json>> {
    if yaml.len() > max_yaml_bytes() {
        return Err(anyhow!("YAML payload too large (>{} bytes)", max_yaml_bytes()));
    }
    let mut docs = Vec::new();
    for (i, doc) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        let val = serde_yaml::Value::deserialize(doc).with_context(|| format!("parsing YAML document {}", i))?;
        if val.is_null() {
            continue;
        }
        docs.push(serde_json::to_value(val).context("converting YAML to JSON")?);
    }
    Ok(docs)
}

/// Drop server-populated fields that would show up as noise in a diff.
pub fn strip_noisy(mut v: Json) -> Json {
    if let Some(meta) = v.get_mut("metadata").and_then(Json::as_object_mut) {
        for k in ["managedFields", "resourceVersion", "generation", "creationTimestamp", "uid"] {
            meta.remove(k);
        }
    }
    if let Some(obj) = v.as_object_mut() {
        obj.remove("status");
    }
    v
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub adds: usize,
    pub updates: usize,
    pub removes: usize,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.adds == 0 && self.updates == 0 && self.removes == 0
    }

    fn walk(&mut self, target: &Json, base: &Json) {
        match (target, base) {
            (Json::Object(t), Json::Object(b)) => {
                for (k, tv) in t {
                    match b.get(k) {
                        Some(bv) if bv == tv => {}
                        Some(bv) => self.walk(tv, bv),
                        None => self.adds += 1,
                    }
                }
                self.removes += b.keys().filter(|k| !t.contains_key(*k)).count();
            }
            (Json::Array(t), Json::Array(b)) => {
                for (tv, bv) in t.iter().zip(b) {
                    if tv != bv {
                        self.walk(tv, bv);
                    }
                }
                self.adds += t.len().saturating_sub(b.len());
                self.removes += b.len().saturating_sub(t.len());
            }
            (t, b) if t != b => self.updates += 1,
            _ => {}
        }
    }
}

/// Field-level add/update/remove counts turning `base` into `target`.
pub fn diff_summary(target: &Json, base: &Json) -> DiffSummary {
    let mut s = DiffSummary::default();
    s.walk(target, base);
    s
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Unchanged,
    Delete,
    /// Absent now and absent before.
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDiff {
    pub object: ObjectRef,
    pub action: Action,
    pub summary: DiffSummary,
}

/// Compare freshly composed descriptors with a previously rendered YAML stream.
/// Previous objects no descriptor mentions are reported as deletions after
/// the descriptors, in identity order.
pub fn diff_against(descriptors: &[ResourceDescriptor], previous_yaml: &str) -> Result<Vec<ObjectDiff>> {
    let mut previous: BTreeMap<ObjectRef, Json> = BTreeMap::new();
    for doc in parse_yaml_stream(previous_yaml)? {
        match ObjectRef::from_manifest(&doc) {
            Some(r) => { previous.insert(r, strip_noisy(doc)); }
            None => warn!("previous manifest without apiVersion/kind/metadata.name; ignoring"),
        }
    }

    let mut out = Vec::with_capacity(descriptors.len());
    for d in descriptors {
        let object = ObjectRef::of(d);
        let before = previous.remove(&object);
        let before = before.as_ref();
        let (action, summary) = match (&d.state, before) {
            (DesiredState::Present(body), Some(base)) => {
                let target = strip_noisy(body.to_json().with_context(|| format!("serializing {}", d.key()))?);
                let s = diff_summary(&target, base);
                (if s.is_empty() { Action::Unchanged } else { Action::Update }, s)
            }
            (DesiredState::Present(body), None) => {
                let target = body.to_json().with_context(|| format!("serializing {}", d.key()))?;
                (Action::Create, diff_summary(&target, &Json::Object(Default::default())))
            }
            (DesiredState::Absent, Some(base)) => (Action::Delete, diff_summary(&Json::Object(Default::default()), base)),
            (DesiredState::Absent, None) => (Action::Noop, DiffSummary::default()),
        };
        counter!("manifest_diff_objects", 1u64, "action" => action_label(action));
        out.push(ObjectDiff { object, action, summary });
    }
    for (object, base) in previous {
        counter!("manifest_diff_objects", 1u64, "action" => action_label(Action::Delete));
        let summary = diff_summary(&Json::Object(Default::default()), &base);
        out.push(ObjectDiff { object, action: Action::Delete, summary });
    }
    Ok(out)
}

fn action_label(a: Action) -> &'static str {
    match a {
        Action::Create => "create",
        Action::Update => "update",
        Action::Unchanged => "unchanged",
        Action::Delete => "delete",
        Action::Noop => "noop",
    }
}
