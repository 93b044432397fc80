//! System-wide defaults merged into configured component blocks.
//!
//! Merging fills only fields the block leaves unset (absent or null once
//! serialized); explicitly set fields always win.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as Json;
use vigil_core::{ComposeError, ImageSpec, ReceiveSpec, Result};

/// Listener addresses the receive process binds when no flag says otherwise.
pub const RECEIVE_HTTP_ADDRESS: &str = "0.0.0.0:10902";
pub const RECEIVE_GRPC_ADDRESS: &str = "0.0.0.0:10901";

pub const DEFAULT_IMAGE_REPOSITORY: &str = "quay.io/thanos/thanos";
pub const DEFAULT_IMAGE_TAG: &str = "v0.13.0";
pub const DEFAULT_PULL_POLICY: &str = "IfNotPresent";

/// Defaults as loose documents so operators can override any subset of
/// fields from configuration. Shape errors surface when a block is merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemDefaults {
    pub receive: Json,
}

impl Default for SystemDefaults {
    fn default() -> Self {
        Self { receive: serde_json::to_value(default_receive()).unwrap_or(Json::Null) }
    }
}

impl SystemDefaults {
    /// Fill fields the configured overrides leave unset from the built-in defaults.
    pub fn layered_over_builtin(mut self) -> Self {
        let builtin = Self::default();
        if self.receive.is_null() {
            self.receive = builtin.receive;
        } else {
            fill_unset(&mut self.receive, &builtin.receive);
        }
        self
    }
}

pub fn default_receive() -> ReceiveSpec {
    ReceiveSpec {
        image: ImageSpec {
            repository: Some(DEFAULT_IMAGE_REPOSITORY.to_string()),
            tag: Some(DEFAULT_IMAGE_TAG.to_string()),
            pull_policy: Some(DEFAULT_PULL_POLICY.to_string()),
        },
        http_address: Some(RECEIVE_HTTP_ADDRESS.to_string()),
        grpc_address: Some(RECEIVE_GRPC_ADDRESS.to_string()),
        ..Default::default()
    }
}

/// Return a copy of `value` with every unset field taken from `defaults`.
pub fn merge_defaults<T>(block: &'static str, value: &T, defaults: &Json) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let wrap = |source| ComposeError::Defaults { block, source };
    let mut merged = serde_json::to_value(value).map_err(wrap)?;
    fill_unset(&mut merged, defaults);
    serde_json::from_value(merged).map_err(wrap)
}

pub(crate) fn fill_unset(target: &mut Json, defaults: &Json) {
    let (Json::Object(t), Json::Object(d)) = (target, defaults) else { return };
    for (k, dv) in d {
        match t.get_mut(k) {
            None | Some(Json::Null) => { t.insert(k.clone(), dv.clone()); }
            Some(tv) => fill_unset(tv, dv),
        }
    }
}
