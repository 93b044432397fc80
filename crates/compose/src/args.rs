//! Process argument assembly for the receive workload.
//!
//! The suffix (everything this crate derives) is sorted as plain strings so
//! unchanged input always renders byte-identical arguments. The fixed prefix
//! (the subcommand) is never reordered.

use vigil_core::ReceiveSpec;

use crate::defaults::{RECEIVE_GRPC_ADDRESS, RECEIVE_HTTP_ADDRESS};
use crate::discovery::Endpoint;

pub const SERVER_CERT_MOUNT_PATH: &str = "/etc/tls/server";
pub const CLIENT_CERT_MOUNT_PATH: &str = "/etc/tls/client";

/// Bump when an entry of [`RECEIVE_FLAGS`] changes meaning.
pub const RECEIVE_FLAGS_VERSION: &str = "v1";

/// How one configuration field renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Unset,
    /// Bare `--flag`.
    Switch,
    Value(String),
    /// One `--flag=value` per element.
    Repeated(Vec<String>),
}

impl FlagValue {
    fn text(v: Option<&String>) -> Self {
        match v {
            Some(s) if !s.is_empty() => FlagValue::Value(s.clone()),
            _ => FlagValue::Unset,
        }
    }

    /// Omitted when it matches what the process would bind anyway.
    fn unless_default(v: Option<&String>, process_default: &str) -> Self {
        match v {
            Some(s) if s == process_default => FlagValue::Unset,
            other => Self::text(other),
        }
    }

    fn switch(on: bool) -> Self {
        if on { FlagValue::Switch } else { FlagValue::Unset }
    }
}

pub struct FlagRule {
    pub flag: &'static str,
    pub field: &'static str,
    pub render: fn(&ReceiveSpec) -> FlagValue,
}

pub static RECEIVE_FLAGS: &[FlagRule] = &[
    FlagRule { flag: "--log.level", field: "logLevel", render: |s| FlagValue::text(s.log_level.as_ref()) },
    FlagRule { flag: "--log.format", field: "logFormat", render: |s| FlagValue::text(s.log_format.as_ref()) },
    FlagRule {
        flag: "--http-address",
        field: "httpAddress",
        render: |s| FlagValue::unless_default(s.http_address.as_ref(), RECEIVE_HTTP_ADDRESS),
    },
    FlagRule { flag: "--http-grace-period", field: "httpGracePeriod", render: |s| FlagValue::text(s.http_grace_period.as_ref()) },
    FlagRule {
        flag: "--grpc-address",
        field: "grpcAddress",
        render: |s| FlagValue::unless_default(s.grpc_address.as_ref(), RECEIVE_GRPC_ADDRESS),
    },
    FlagRule { flag: "--grpc-grace-period", field: "grpcGracePeriod", render: |s| FlagValue::text(s.grpc_grace_period.as_ref()) },
    FlagRule { flag: "--remote-write.address", field: "remoteWriteAddress", render: |s| FlagValue::text(s.remote_write_address.as_ref()) },
    FlagRule { flag: "--tsdb.path", field: "tsdbPath", render: |s| FlagValue::text(s.tsdb_path.as_ref()) },
    FlagRule { flag: "--tsdb.retention", field: "tsdbRetention", render: |s| FlagValue::text(s.tsdb_retention.as_ref()) },
    FlagRule { flag: "--tsdb.wal-compression", field: "tsdbWalCompression", render: |s| FlagValue::switch(s.tsdb_wal_compression == Some(true)) },
    FlagRule { flag: "--receive.local-endpoint", field: "localEndpoint", render: |s| FlagValue::text(s.local_endpoint.as_ref()) },
    FlagRule { flag: "--receive.tenant-header", field: "tenantHeader", render: |s| FlagValue::text(s.tenant_header.as_ref()) },
    FlagRule { flag: "--receive.default-tenant-id", field: "defaultTenantId", render: |s| FlagValue::text(s.default_tenant_id.as_ref()) },
    FlagRule {
        flag: "--receive.replication-factor",
        field: "replicationFactor",
        render: |s| match s.replication_factor {
            Some(n) if n > 0 => FlagValue::Value(n.to_string()),
            _ => FlagValue::Unset,
        },
    },
    FlagRule {
        flag: "--label",
        field: "externalLabels",
        render: |s| {
            if s.external_labels.is_empty() {
                return FlagValue::Unset;
            }
            FlagValue::Repeated(s.external_labels.iter().map(|(k, v)| format!("{k}={}", quote_label_value(v))).collect())
        },
    },
];

/// Double-quoted with `\` and `"` escaped, as the receive process unquotes `--label` values.
fn quote_label_value(v: &str) -> String {
    let mut out = String::with_capacity(v.len() + 2);
    out.push('"');
    for c in v.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Flags derived from the recognised configuration fields, in table order.
pub fn static_flags(spec: &ReceiveSpec) -> Vec<String> {
    let mut out = Vec::new();
    for rule in RECEIVE_FLAGS {
        match (rule.render)(spec) {
            FlagValue::Unset => {}
            FlagValue::Switch => out.push(rule.flag.to_string()),
            FlagValue::Value(v) => out.push(format!("{}={}", rule.flag, v)),
            FlagValue::Repeated(vs) => out.extend(vs.into_iter().map(|v| format!("{}={}", rule.flag, v))),
        }
    }
    out
}

/// Remote-write TLS flags for whichever certificates are configured.
pub fn tls_flags(spec: &ReceiveSpec) -> Vec<String> {
    let mut out = Vec::new();
    if spec.server_certificate().is_some() {
        out.push(format!("--remote-write.server-tls-cert={SERVER_CERT_MOUNT_PATH}/tls.crt"));
        out.push(format!("--remote-write.server-tls-key={SERVER_CERT_MOUNT_PATH}/tls.key"));
        out.push(format!("--remote-write.server-tls-ca={SERVER_CERT_MOUNT_PATH}/ca.crt"));
    }
    if spec.client_certificate().is_some() {
        out.push(format!("--remote-write.client-tls-cert={CLIENT_CERT_MOUNT_PATH}/tls.crt"));
        out.push(format!("--remote-write.client-tls-key={CLIENT_CERT_MOUNT_PATH}/tls.key"));
        out.push(format!("--remote-write.client-tls-ca={CLIENT_CERT_MOUNT_PATH}/ca.crt"));
        // Placeholder: the expected server name is not derived from the certificate subject yet.
        out.push("--remote-write.client-server-name".to_string());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList {
    pub prefix: Vec<String>,
    pub suffix: Vec<String>,
}

impl ArgumentList {
    pub fn to_vec(&self) -> Vec<String> {
        self.prefix.iter().chain(&self.suffix).cloned().collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        let mut v = self.prefix;
        v.extend(self.suffix);
        v
    }
}

pub fn assemble_args(spec: &ReceiveSpec, fixed_prefix: &[&str], endpoints: &[Endpoint]) -> ArgumentList {
    let mut suffix = static_flags(spec);
    suffix.extend(tls_flags(spec));
    suffix.extend(endpoints.iter().map(|e| e.flag.clone()));
    suffix.sort();
    ArgumentList { prefix: fixed_prefix.iter().map(|s| s.to_string()).collect(), suffix }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoverySource;

    fn defaulted() -> ReceiveSpec {
        ReceiveSpec {
            http_address: Some(RECEIVE_HTTP_ADDRESS.into()),
            grpc_address: Some(RECEIVE_GRPC_ADDRESS.into()),
            ..Default::default()
        }
    }

    #[test]
    fn process_default_addresses_render_nothing() {
        let args = assemble_args(&defaulted(), &["receive"], &[]);
        assert_eq!(args.prefix, ["receive"]);
        assert!(args.suffix.is_empty(), "suffix={:?}", args.suffix);
    }

    #[test]
    fn non_default_addresses_render_flags() {
        let spec = ReceiveSpec { http_address: Some("0.0.0.0:8080".into()), ..defaulted() };
        assert_eq!(static_flags(&spec), ["--http-address=0.0.0.0:8080"]);
    }

    #[test]
    fn zero_values_contribute_nothing() {
        let spec = ReceiveSpec {
            log_level: Some(String::new()),
            replication_factor: Some(0),
            tsdb_wal_compression: Some(false),
            ..defaulted()
        };
        assert!(static_flags(&spec).is_empty());
    }

    #[test]
    fn table_fields_render_in_flag_syntax() {
        let mut spec = ReceiveSpec {
            log_level: Some("debug".into()),
            tsdb_retention: Some("15d".into()),
            tsdb_wal_compression: Some(true),
            replication_factor: Some(3),
            ..defaulted()
        };
        spec.external_labels.insert("replica".into(), "r0".into());
        spec.external_labels.insert("cluster".into(), "eu-1".into());
        assert_eq!(
            static_flags(&spec),
            [
                "--log.level=debug",
                "--tsdb.retention=15d",
                "--tsdb.wal-compression",
                "--receive.replication-factor=3",
                "--label=cluster=\"eu-1\"",
                "--label=replica=\"r0\"",
            ]
        );
    }

    #[test]
    fn label_values_are_escaped() {
        let mut spec = defaulted();
        spec.external_labels.insert("note".into(), r#"say "hi" \ bye"#.into());
        assert_eq!(static_flags(&spec), [r#"--label=note="say \"hi\" \\ bye""#]);
    }

    #[test]
    fn client_tls_adds_four_sorted_flags() {
        let spec = ReceiveSpec { remote_write_client_certificate: Some("my-client-cert".into()), ..defaulted() };
        let args = assemble_args(&spec, &["receive"], &[]);
        assert_eq!(
            args.suffix,
            [
                "--remote-write.client-server-name",
                "--remote-write.client-tls-ca=/etc/tls/client/ca.crt",
                "--remote-write.client-tls-cert=/etc/tls/client/tls.crt",
                "--remote-write.client-tls-key=/etc/tls/client/tls.key",
            ]
        );
    }

    #[test]
    fn server_and_client_flag_names_never_overlap() {
        let spec = ReceiveSpec {
            remote_write_server_certificate: Some("srv".into()),
            remote_write_client_certificate: Some("cli".into()),
            ..defaulted()
        };
        let flags = tls_flags(&spec);
        assert_eq!(flags.len(), 7);
        let names: std::collections::BTreeSet<_> = flags.iter().map(|f| f.split('=').next().unwrap_or_default()).collect();
        assert_eq!(names.len(), flags.len());
        assert_eq!(names.iter().filter(|n| n.contains("server-tls")).count(), 3);
    }

    #[test]
    fn suffix_is_sorted_and_prefix_untouched() {
        let spec = ReceiveSpec {
            remote_write_server_certificate: Some("srv".into()),
            log_level: Some("info".into()),
            ..defaulted()
        };
        let eps = [
            Endpoint { source: DiscoverySource::QueryBroadcast, flag: "--store=dnssrvnoa+_grpc._tcp.z".into() },
            Endpoint { source: DiscoverySource::Sidecar, flag: "--store=a:1".into() },
        ];
        let args = assemble_args(&spec, &["receive", "--zz-first"], &eps);
        let mut sorted = args.suffix.clone();
        sorted.sort();
        assert_eq!(args.suffix, sorted);
        assert_eq!(args.to_vec()[..2], ["receive".to_string(), "--zz-first".to_string()]);
        assert_eq!(args.clone().into_vec(), args.to_vec());
    }
}
