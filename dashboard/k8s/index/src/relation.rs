use appdash_k8s_api::{
    api::networking::v1::{HTTPIngressPath, IngressRule},
    Deployment, Ingress, Service,
};
use std::collections::BTreeMap;

/// Returns true when the service's selector is exactly the deployment's `matchLabels`.
///
/// Both sides must assert the same label set; a service selecting a subset of the deployment's
/// labels is not related to it. A missing selector is treated as empty.
pub fn selects(service: &Service, deployment: &Deployment) -> bool {
    let empty = BTreeMap::new();
    let svc = service
        .spec
        .as_ref()
        .and_then(|spec| spec.selector.as_ref())
        .unwrap_or(&empty);
    let deploy = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.selector.match_labels.as_ref())
        .unwrap_or(&empty);
    svc == deploy
}

/// Returns true if any HTTP path of the ingress uses `service` as its backend.
///
/// Scanning stops at the first matching path.
pub fn routes_to(ingress: &Ingress, service: &str) -> bool {
    paths(ingress).any(|(_, path)| backend_service(path) == Some(service))
}

/// Iterates over every (rule, path) pair of an ingress in declaration order.
///
/// Rules without an `http` block contribute nothing.
pub fn paths(ingress: &Ingress) -> impl Iterator<Item = (&IngressRule, &HTTPIngressPath)> {
    ingress
        .spec
        .iter()
        .flat_map(|spec| spec.rules.iter().flatten())
        .flat_map(|rule| {
            rule.http
                .iter()
                .flat_map(|http| http.paths.iter())
                .map(move |path| (rule, path))
        })
}

fn backend_service(path: &HTTPIngressPath) -> Option<&str> {
    path.backend.service.as_ref().map(|svc| svc.name.as_str())
}
