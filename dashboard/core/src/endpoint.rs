use serde::Serialize;
use std::collections::BTreeMap;

/// An application as seen through one deployment and, optionally, one of the
/// services selecting it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationEndpoint {
    pub name: String,
    pub ingresses: Vec<ApplicationIngress>,
    pub deployment_annotations: BTreeMap<String, String>,
    pub deployment_status: DeploymentStatus,
    pub images: Vec<String>,
}

/// A single host/path entry point routed to an application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationIngress {
    pub host: String,
    pub path: String,
    pub looks_like_grpc: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentStatus {
    pub available_replicas: i32,
    pub replicas: i32,
}
