#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod endpoint;
mod error;

pub use self::{
    endpoint::{ApplicationEndpoint, ApplicationIngress, DeploymentStatus},
    error::{JoinError, LookupError, TypeMismatch},
};

/// Resolves the application view of the namespaces known to the process.
///
/// Implementations read already-materialized state and must not block on the
/// network.
pub trait DiscoverEndpoints {
    /// Names of the namespaces that may be queried.
    fn namespaces(&self) -> Vec<String>;

    /// Joins the namespace's deployments, services and ingresses into
    /// application endpoints.
    fn endpoints(&self, namespace: &str) -> Result<Vec<ApplicationEndpoint>, LookupError>;
}

impl<D: DiscoverEndpoints + ?Sized> DiscoverEndpoints for std::sync::Arc<D> {
    fn namespaces(&self) -> Vec<String> {
        (**self).namespaces()
    }

    fn endpoints(&self, namespace: &str) -> Result<Vec<ApplicationEndpoint>, LookupError> {
        (**self).endpoints(namespace)
    }
}
