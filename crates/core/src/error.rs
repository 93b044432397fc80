use thiserror::Error;

/// Errors that abort a composition pass. Peer lookups never fail; a missing
/// peer simply contributes no endpoint.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("malformed address in {field}: {value:?} ({reason})")]
    MalformedAddress {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("merging system defaults into {block} failed: {source}")]
    Defaults {
        block: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = ComposeError> = std::result::Result<T, E>;
