use crate::endpoints;
use appdash_core::{ApplicationEndpoint, JoinError};
use appdash_k8s_api::{Deployment, Ingress, Service, SharedStore, Store};
use parking_lot::RwLock;
use std::sync::Arc;

/// The watched stores of a single accessible namespace.
#[derive(Clone, Debug)]
pub struct NamespaceHandle {
    pub name: String,
    pub deployments: SharedStore,
    pub services: SharedStore,
    pub ingresses: SharedStore,
}

// === impl NamespaceHandle ===

impl NamespaceHandle {
    /// Creates a handle with empty stores for each watched kind.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deployments: Arc::new(RwLock::new(Store::of::<Deployment>())),
            services: Arc::new(RwLock::new(Store::of::<Service>())),
            ingresses: Arc::new(RwLock::new(Store::of::<Ingress>())),
        }
    }

    pub fn endpoints(&self) -> Result<Vec<ApplicationEndpoint>, JoinError> {
        endpoints::join(self)
    }
}
