use crate::NamespaceHandle;
use anyhow::{Context, Result};
use appdash_core::{ApplicationEndpoint, DiscoverEndpoints, LookupError};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};

pub type SharedRegistry = Arc<Registry>;

/// Access to the cluster needed to build a [`Registry`].
#[async_trait::async_trait]
pub trait Cluster {
    /// Lists the names of all namespaces visible to the active credentials.
    async fn namespaces(&self) -> Result<Vec<String>, kube::Error>;

    /// Checks whether the active credentials can read workloads in `ns`.
    async fn probe(&self, ns: &str) -> Result<(), kube::Error>;

    /// Starts watching the namespace's deployments, services and ingresses.
    fn watch(&self, ns: &str) -> NamespaceHandle;
}

/// The namespaces that may be queried, fixed at startup.
///
/// Namespaces created after startup are not picked up; namespaces deleted after startup keep
/// their (eventually empty) stores.
#[derive(Debug, Default)]
pub struct Registry {
    namespaces: BTreeMap<String, NamespaceHandle>,
}

// === impl Registry ===

impl Registry {
    /// Probes every namespace and watches those the credentials can access.
    ///
    /// Namespaces whose probe is forbidden are skipped. Any other failure aborts discovery, as a
    /// partially built registry would silently hide namespaces.
    pub async fn discover<C>(cluster: &C) -> Result<Self>
    where
        C: Cluster + Sync + ?Sized,
    {
        let names = cluster
            .namespaces()
            .await
            .context("List namespaces failed")?;

        let mut namespaces = BTreeMap::new();
        for ns in names {
            match cluster.probe(&ns).await {
                Ok(()) => {}
                Err(error) if is_forbidden(&error) => {
                    warn!(%ns, %error, "Namespace not accessible");
                    continue;
                }
                Err(error) => {
                    return Err(error).with_context(|| format!("List pods in namespace {ns} failed"))
                }
            }

            let handle = cluster.watch(&ns);
            info!(%ns, "Watching namespace");
            namespaces.insert(ns, handle);
        }

        Ok(Self { namespaces })
    }

    pub fn shared(self) -> SharedRegistry {
        Arc::new(self)
    }

    pub fn list_namespaces(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }

    pub fn get(&self, ns: &str) -> Result<&NamespaceHandle, LookupError> {
        self.namespaces
            .get(ns)
            .ok_or_else(|| LookupError::NotAvailable(ns.to_string()))
    }
}

impl FromIterator<NamespaceHandle> for Registry {
    fn from_iter<T: IntoIterator<Item = NamespaceHandle>>(iter: T) -> Self {
        Self {
            namespaces: iter.into_iter().map(|h| (h.name.clone(), h)).collect(),
        }
    }
}

impl DiscoverEndpoints for Registry {
    fn namespaces(&self) -> Vec<String> {
        self.list_namespaces()
    }

    fn endpoints(&self, ns: &str) -> Result<Vec<ApplicationEndpoint>, LookupError> {
        self.get(ns)?
            .endpoints()
            .map_err(|source| LookupError::Join {
                namespace: ns.to_string(),
                source,
            })
    }
}

/// Returns true if the API server rejected the request for lack of permission.
pub fn is_forbidden(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(rsp) if rsp.code == 403)
}
