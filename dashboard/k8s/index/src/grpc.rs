use appdash_k8s_api::{Ingress, ResourceExt};

/// Annotation suffix used by ingress controllers to mark gRPC backends, e.g.
/// `nginx.ingress.kubernetes.io/grpc-backend`.
pub const GRPC_BACKEND_SUFFIX: &str = "grpc-backend";

/// Returns true if the ingress is annotated as routing to a gRPC backend.
///
/// Only the first annotation (in key order) ending with [`GRPC_BACKEND_SUFFIX`] is consulted,
/// and its value must be exactly `"true"`.
pub fn looks_like_grpc(ingress: &Ingress) -> bool {
    ingress
        .annotations()
        .iter()
        .find(|(k, _)| k.ends_with(GRPC_BACKEND_SUFFIX))
        .is_some_and(|(_, v)| v == "true")
}
