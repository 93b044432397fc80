//! `host:port` parsing for listener addresses.

use crate::error::{ComposeError, Result};

/// Split `host:port`, accepting an empty host (`:10902`) and bracketed IPv6
/// hosts (`[::]:10902`).
pub fn split_host_port(addr: &str) -> std::result::Result<(&str, &str), &'static str> {
    let (host, port) = addr.rsplit_once(':').ok_or("missing port in address")?;
    if let Some(inner) = host.strip_prefix('[') {
        if inner.strip_suffix(']').is_none() {
            return Err("unbalanced brackets in host");
        }
    } else if host.contains(':') {
        return Err("too many colons in address");
    } else if host.contains(']') {
        return Err("unexpected ']' in host");
    }
    if port.is_empty() {
        return Err("missing port in address");
    }
    Ok((host, port))
}

/// Extract the port of a `host:port` listener address as a container port.
pub fn port_of(field: &'static str, addr: &str) -> Result<i32> {
    let malformed = |reason| ComposeError::MalformedAddress { field, value: addr.to_string(), reason };
    let (_, port) = split_host_port(addr).map_err(malformed)?;
    match port.parse::<u16>() {
        Ok(0) => Err(malformed("port must be in 1-65535")),
        Ok(p) => Ok(i32::from(p)),
        Err(_) => Err(malformed("port must be in 1-65535")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ports() {
        assert_eq!(port_of("httpAddress", "0.0.0.0:10902").unwrap(), 10902);
        assert_eq!(port_of("grpcAddress", ":10901").unwrap(), 10901);
        assert_eq!(port_of("grpcAddress", "[::]:19291").unwrap(), 19291);
        assert_eq!(port_of("grpcAddress", "receive.svc:1").unwrap(), 1);
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["0.0.0.0", "0.0.0.0:", "::1", "[::1:80", "host:http", "host:70000", "host:0", ""] {
            let err = port_of("httpAddress", bad).unwrap_err();
            match err {
                ComposeError::MalformedAddress { field, value, .. } => {
                    assert_eq!(field, "httpAddress");
                    assert_eq!(value, bad);
                }
                other => panic!("unexpected error for {bad:?}: {other}"),
            }
        }
    }

    #[test]
    fn error_message_names_the_field() {
        let msg = port_of("grpcAddress", "nope").unwrap_err().to_string();
        assert!(msg.contains("grpcAddress"), "msg={}", msg);
        assert!(msg.contains("\"nope\""), "msg={}", msg);
    }
}
