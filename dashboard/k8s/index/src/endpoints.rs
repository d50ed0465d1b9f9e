use crate::{decode::decode, grpc::looks_like_grpc, relation, NamespaceHandle};
use appdash_core::{
    ApplicationEndpoint, ApplicationIngress, DeploymentStatus, JoinError, TypeMismatch,
};
use appdash_k8s_api::{Deployment, DynamicObject, Ingress, ResourceExt, Service};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Joins a namespace's deployments, services and ingresses into application endpoints.
///
/// Each deployment yields one endpoint per related service, carrying the host/path pairs of every
/// ingress routing to that service. A deployment without related services, and a related service
/// without ingresses, each yield one endpoint with no ingresses.
///
/// Output follows the stores' name order, so joining an unchanged namespace twice produces the
/// same result. Any object that is not of its store's kind fails the whole join.
pub fn join(ns: &NamespaceHandle) -> Result<Vec<ApplicationEndpoint>, JoinError> {
    let deployments = ns.deployments.read().list();
    let mut services = Snapshot::<Service>::new(ns.services.read().list());
    let mut ingresses = Snapshot::<Ingress>::new(ns.ingresses.read().list());

    let mut endpoints = Vec::new();
    for obj in deployments {
        let deployment = decode::<Deployment>(obj)?;
        let name = deployment.name_any();

        let selecting = services
            .get()
            .map_err(|e| JoinError::relation("services", format!("deployment {name}"), e))?
            .iter()
            .filter(|svc| relation::selects(svc, &deployment))
            .collect::<Vec<_>>();
        if selecting.is_empty() {
            debug!(ns = %ns.name, deployment = %name, "Deployment doesn't have service");
            endpoints.push(endpoint(&deployment, Vec::new()));
            continue;
        }

        for service in selecting {
            let svc = service.name_any();
            let related = ingresses
                .get()
                .map_err(|e| JoinError::relation("ingresses", format!("service {svc}"), e))?
                .iter()
                .filter(|ing| relation::routes_to(ing, &svc))
                .collect::<Vec<_>>();
            if related.is_empty() {
                debug!(
                    ns = %ns.name,
                    deployment = %name,
                    service = %svc,
                    "Service doesn't have ingress"
                );
                endpoints.push(endpoint(&deployment, Vec::new()));
                continue;
            }

            let mut routes = Vec::new();
            for ingress in related {
                let looks_like_grpc = looks_like_grpc(ingress);
                routes.extend(
                    relation::paths(ingress).map(|(rule, path)| ApplicationIngress {
                        host: rule.host.clone().unwrap_or_default(),
                        path: path.path.clone().unwrap_or_default(),
                        looks_like_grpc,
                    }),
                );
            }
            endpoints.push(endpoint(&deployment, routes));
        }
    }

    Ok(endpoints)
}

/// A listed store, decoded the first time it is needed.
///
/// A store is only decoded once per join; objects of a store that no relation consults never
/// produce a type mismatch.
struct Snapshot<K> {
    objects: Vec<DynamicObject>,
    decoded: Option<Vec<K>>,
}

impl<K> Snapshot<K>
where
    K: k8s_openapi::Resource + DeserializeOwned,
{
    fn new(objects: Vec<DynamicObject>) -> Self {
        Self {
            objects,
            decoded: None,
        }
    }

    fn get(&mut self) -> Result<&[K], TypeMismatch> {
        self.get_with(decode::<K>)
    }

    fn get_with(
        &mut self,
        decode: impl FnMut(DynamicObject) -> Result<K, TypeMismatch>,
    ) -> Result<&[K], TypeMismatch> {
        if self.decoded.is_none() {
            let decoded = self
                .objects
                .iter()
                .cloned()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()?;
            self.decoded = Some(decoded);
        }
        Ok(self.decoded.as_deref().unwrap_or_default())
    }
}

/// Builds an endpoint from the deployment-level fields, which are identical for every endpoint
/// of a deployment.
fn endpoint(deployment: &Deployment, ingresses: Vec<ApplicationIngress>) -> ApplicationEndpoint {
    let template = deployment.spec.as_ref().map(|spec| &spec.template);
    let deployment_annotations = template
        .and_then(|t| t.metadata.as_ref())
        .and_then(|m| m.annotations.clone())
        .unwrap_or_default();
    let images = template
        .and_then(|t| t.spec.as_ref())
        .map(|spec| {
            spec.containers
                .iter()
                .map(|c| c.image.clone().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let deployment_status = deployment
        .status
        .as_ref()
        .map(|status| DeploymentStatus {
            available_replicas: status.available_replicas.unwrap_or_default(),
            replicas: status.replicas.unwrap_or_default(),
        })
        .unwrap_or_default();

    ApplicationEndpoint {
        name: deployment.name_any(),
        ingresses,
        deployment_annotations,
        deployment_status,
        images,
    }
}
