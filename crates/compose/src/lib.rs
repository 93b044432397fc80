//! Vigil compose: turns an installation snapshot into the desired state of the
//! resources its receive component owns.
//!
//! Everything here is a pure function of its inputs. There is no I/O, no
//! clock and no iteration over unordered containers, so identical input
//! renders identical output.

#![forbid(unsafe_code)]

pub mod args;
pub mod config;
pub mod defaults;
pub mod discovery;
pub mod ingress;
pub mod naming;
pub mod receive;
pub mod reconciler;
pub mod store_endpoint;

pub use args::{assemble_args, ArgumentList};
pub use config::ComposerConfig;
pub use discovery::{discover_peers, DiscoverySource, Endpoint, PeerSnapshot};
pub use reconciler::{receive_args, reconcile_receive, reconcile_resources, reconcile_store_endpoint, Builder};
