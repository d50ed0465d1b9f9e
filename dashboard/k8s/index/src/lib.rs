//! Application index
//!
//! Relates the workloads of a namespace to the network entry points that route to them:
//!
//! - Each `Deployment` is related to the `Service`s whose selector equals the deployment's
//!   `matchLabels`.
//! - Each `Service` is related to the `Ingress`es with at least one HTTP path that uses the
//!   service as its backend.
//!
//! ```text
//! [ Deployment ] <- [ Service ] <- [ Ingress ]
//! ```
//!
//! Every join reads the namespace's watched stores and builds a fresh view; nothing is cached
//! between requests. Only namespaces that passed an access probe at startup are indexed.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod decode;
pub mod endpoints;
pub mod grpc;
mod namespace;
pub mod registry;
pub mod relation;

#[cfg(test)]
mod tests;

pub use self::{
    namespace::NamespaceHandle,
    registry::{Cluster, Registry, SharedRegistry},
};
