use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, HTTPGetAction, PodSpec, PodTemplateSpec, Probe, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use vigil_core::address::port_of;
use vigil_core::{ReceiveSpec, ResourceBody, ResourceDescriptor, ResourceKind, Result};

use super::{ReceiveView, GRPC_PORT, HTTP_PORT};
use crate::args::{assemble_args, ArgumentList, CLIENT_CERT_MOUNT_PATH, SERVER_CERT_MOUNT_PATH};
use crate::discovery::discover_peers;
use crate::naming::RECEIVE;

pub const HEALTH_CHECK_PATH: &str = "/-/healthy";
pub const READY_CHECK_PATH: &str = "/-/ready";
pub const CLIENT_CERT_VOLUME: &str = "client-certificate";
pub const SERVER_CERT_VOLUME: &str = "server-certificate";

pub fn deployment(view: &ReceiveView<'_>) -> Result<ResourceDescriptor> {
    let name = view.name(None);
    let Some(receive) = view.receive.as_ref() else {
        return Ok(view.absent(ResourceKind::Deployment, name));
    };

    let http_port = port_of("httpAddress", receive.http_address.as_deref().unwrap_or_default())?;
    let grpc_port = port_of("grpcAddress", receive.grpc_address.as_deref().unwrap_or_default())?;
    let args = container_args(view, receive).into_vec();
    let (volumes, mounts) = tls_volumes(receive);

    let container = Container {
        name: RECEIVE.to_string(),
        image: Some(receive.image.reference()),
        image_pull_policy: receive.image.pull_policy.clone(),
        args: Some(args),
        ports: Some(vec![container_port(HTTP_PORT, http_port), container_port(GRPC_PORT, grpc_port)]),
        resources: receive.resources.clone(),
        liveness_probe: Some(http_probe(http_port, HEALTH_CHECK_PATH)),
        readiness_probe: Some(http_probe(http_port, READY_CHECK_PATH)),
        volume_mounts: non_empty(mounts),
        ..Default::default()
    };

    let deployment = Deployment {
        metadata: view.meta.object_meta(&name),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector { match_labels: Some(view.meta.labels.clone()), match_expressions: None },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(view.meta.labels.clone()),
                    annotations: view.meta.annotations.clone(),
                    ..Default::default()
                }),
                spec: Some(PodSpec { containers: vec![container], volumes: non_empty(volumes), ..Default::default() }),
            },
            ..Default::default()
        }),
        status: None,
    };
    Ok(ResourceDescriptor::present(name, &view.naming.namespace, ResourceBody::Deployment(deployment)))
}

/// The receive container's argument list: subcommand, then sorted flags.
pub fn container_args(view: &ReceiveView<'_>, receive: &ReceiveSpec) -> ArgumentList {
    let endpoints = discover_peers(&view.naming, &view.peers);
    assemble_args(receive, &[RECEIVE], &endpoints)
}

fn container_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort { name: Some(name.to_string()), container_port: port, protocol: Some("TCP".to_string()), ..Default::default() }
}

fn http_probe(port: i32, path: &str) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            host: None,
            http_headers: None,
            path: Some(path.to_string()),
            port: IntOrString::Int(port),
            scheme: Some("HTTP".to_string()),
        }),
        initial_delay_seconds: Some(5),
        timeout_seconds: Some(5),
        period_seconds: Some(30),
        success_threshold: Some(1),
        failure_threshold: Some(3),
        ..Default::default()
    }
}

/// Client certificate first, then server; each only when its secret is named.
fn tls_volumes(receive: &ReceiveSpec) -> (Vec<Volume>, Vec<VolumeMount>) {
    let mut volumes = Vec::new();
    let mut mounts = Vec::new();
    let certs = [
        (CLIENT_CERT_VOLUME, CLIENT_CERT_MOUNT_PATH, receive.client_certificate()),
        (SERVER_CERT_VOLUME, SERVER_CERT_MOUNT_PATH, receive.server_certificate()),
    ];
    for (volume, path, secret) in certs {
        let Some(secret) = secret else { continue };
        mounts.push(VolumeMount {
            name: volume.to_string(),
            mount_path: path.to_string(),
            read_only: Some(true),
            ..Default::default()
        });
        volumes.push(Volume {
            name: volume.to_string(),
            secret: Some(SecretVolumeSource { secret_name: Some(secret.to_string()), ..Default::default() }),
            ..Default::default()
        });
    }
    (volumes, mounts)
}

fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    if v.is_empty() { None } else { Some(v) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volumes_follow_configured_certificates() {
        let none = ReceiveSpec::default();
        assert_eq!(tls_volumes(&none), (vec![], vec![]));

        let both = ReceiveSpec {
            remote_write_server_certificate: Some("srv-cert".into()),
            remote_write_client_certificate: Some("cli-cert".into()),
            ..Default::default()
        };
        let (volumes, mounts) = tls_volumes(&both);
        let names: Vec<_> = volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, [CLIENT_CERT_VOLUME, SERVER_CERT_VOLUME]);
        assert_eq!(volumes[1].secret.as_ref().unwrap().secret_name.as_deref(), Some("srv-cert"));
        assert_eq!(mounts[0].mount_path, "/etc/tls/client");
        assert_eq!(mounts[1].mount_path, "/etc/tls/server");
        assert!(mounts.iter().all(|m| m.read_only == Some(true)));
    }

    #[test]
    fn probes_target_the_http_port() {
        let p = http_probe(10902, READY_CHECK_PATH);
        let get = p.http_get.unwrap();
        assert_eq!(get.port, IntOrString::Int(10902));
        assert_eq!(get.path.as_deref(), Some("/-/ready"));
    }
}
