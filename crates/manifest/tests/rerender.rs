#![forbid(unsafe_code)]

use vigil_compose::{reconcile_receive, ComposerConfig};
use vigil_core::{ImageSpec, Installation, Peers, ReceiveSpec};
use vigil_manifest::{diff_against, plan, to_yaml_stream, Action};

fn installation(tag: &str, with_receive: bool) -> Installation {
    let mut i = Installation { name: "prod".into(), namespace: "monitoring".into(), ..Default::default() };
    if with_receive {
        i.spec.receive = Some(ReceiveSpec {
            image: ImageSpec { tag: Some(tag.into()), ..Default::default() },
            remote_write_server_certificate: Some("srv".into()),
            ..Default::default()
        });
    }
    i
}

fn rendered(inst: &Installation) -> String {
    let descs = reconcile_receive(inst, &Peers::default(), &ComposerConfig::default()).unwrap();
    to_yaml_stream(&plan(&descs).unwrap()).unwrap()
}

#[test]
fn rerendering_unchanged_input_is_a_no_op() {
    let inst = installation("v0.13.0", true);
    let previous = rendered(&inst);
    let descs = reconcile_receive(&inst, &Peers::default(), &ComposerConfig::default()).unwrap();
    let diffs = diff_against(&descs, &previous).unwrap();
    let actions: Vec<_> = diffs.iter().map(|d| d.action).collect();
    assert_eq!(actions, [Action::Unchanged, Action::Unchanged, Action::Noop, Action::Noop, Action::Noop]);
}

#[test]
fn image_bump_only_updates_the_workload() {
    let previous = rendered(&installation("v0.13.0", true));
    let descs = reconcile_receive(&installation("v0.14.0", true), &Peers::default(), &ComposerConfig::default()).unwrap();
    let diffs = diff_against(&descs, &previous).unwrap();
    assert_eq!(diffs[0].action, Action::Update);
    assert_eq!(diffs[0].summary.updates, 1);
    assert_eq!(diffs[1].action, Action::Unchanged);
}

#[test]
fn removing_the_block_deletes_what_was_rendered() {
    let previous = rendered(&installation("v0.13.0", true));
    let descs = reconcile_receive(&installation("v0.13.0", false), &Peers::default(), &ComposerConfig::default()).unwrap();
    let diffs = diff_against(&descs, &previous).unwrap();
    let actions: Vec<_> = diffs.iter().map(|d| d.action).collect();
    assert_eq!(actions, [Action::Delete, Action::Delete, Action::Noop, Action::Noop, Action::Noop]);
}

#[test]
fn objects_missing_from_the_new_rendering_are_deleted() {
    let previous = "\
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: archive-store
  namespace: monitoring
spec:
  rules:
    - host: archive.example.com
---
apiVersion: v1
kind: Service
metadata:
  name: archive-store
  namespace: monitoring
";
    let diffs = diff_against(&[], previous).unwrap();
    let objects: Vec<_> = diffs.iter().map(|d| (d.action, d.object.to_string())).collect();
    assert_eq!(
        objects,
        [
            (Action::Delete, "Ingress monitoring/archive-store".to_string()),
            (Action::Delete, "Service monitoring/archive-store".to_string()),
        ]
    );
    assert!(diffs.iter().all(|d| d.summary.removes > 0));
}

#[test]
fn leftovers_follow_the_composed_objects() {
    let inst = installation("v0.13.0", true);
    let mut previous = rendered(&inst);
    previous.push_str("---\napiVersion: networking.k8s.io/v1\nkind: Ingress\nmetadata:\n  name: archive-store\n  namespace: monitoring\n");
    let descs = reconcile_receive(&inst, &Peers::default(), &ComposerConfig::default()).unwrap();
    let diffs = diff_against(&descs, &previous).unwrap();
    assert_eq!(diffs.len(), descs.len() + 1);
    let last = diffs.last().unwrap();
    assert_eq!(last.action, Action::Delete);
    assert_eq!(last.object.name, "archive-store");
}
