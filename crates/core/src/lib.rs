//! Vigil core types: installation snapshots, desired-state descriptors and errors.

#![forbid(unsafe_code)]

pub mod address;
pub mod error;
pub mod resource;
pub mod spec;

pub use error::{ComposeError, Result};
pub use resource::{DesiredState, ResourceBody, ResourceDescriptor, ResourceKind};
pub use spec::{
    ImageSpec, IngressSpec, Installation, InstallationSpec, Labels, Peers, QuerySpec, ReceiveSpec,
    RuleSpec, StoreEndpoint, StoreEndpointSpec, StoreGatewaySpec, TimeRange,
};

pub mod prelude {
    pub use super::{
        ComposeError, DesiredState, Installation, Labels, Peers, ReceiveSpec, ResourceBody,
        ResourceDescriptor, ResourceKind, Result,
    };
}
