use crate::{
    index::{Cluster, NamespaceHandle},
    k8s::{self, watch, Api, Client, ListParams, Namespace, Pod, ResourceExt, SharedStore},
};
use tracing::{info_span, Instrument};

/// Cluster access through the Kubernetes API.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

// === impl KubeCluster ===

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Spawns a task that keeps `store` in sync with the namespace's objects. The task runs for
    /// the lifetime of the process.
    fn spawn_watch(&self, ns: &str, store: &SharedStore) {
        let resource = store.read().resource().clone();
        let events = watch::namespaced(self.client.clone(), ns, &resource);
        tokio::spawn(
            watch::run(store.clone(), events)
                .instrument(info_span!("watch", resource = %resource.plural, %ns)),
        );
    }
}

#[async_trait::async_trait]
impl Cluster for KubeCluster {
    async fn namespaces(&self) -> Result<Vec<String>, k8s::Error> {
        let namespaces = Api::<Namespace>::all(self.client.clone())
            .list(&ListParams::default())
            .await?;
        Ok(namespaces.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn probe(&self, ns: &str) -> Result<(), k8s::Error> {
        Api::<Pod>::namespaced(self.client.clone(), ns)
            .list(&ListParams::default().limit(1))
            .await
            .map(|_| ())
    }

    fn watch(&self, ns: &str) -> NamespaceHandle {
        let handle = NamespaceHandle::new(ns);
        self.spawn_watch(ns, &handle.deployments);
        self.spawn_watch(ns, &handle.services);
        self.spawn_watch(ns, &handle.ingresses);
        handle
    }
}
