#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod store;
pub mod watch;

pub use self::store::{SharedStore, Store};
pub use k8s_openapi::api::{
    self,
    apps::v1::Deployment,
    core::v1::{Namespace, Pod, Service},
    networking::v1::Ingress,
};
pub use kube::{
    api::{Api, ListParams, ObjectMeta, ResourceExt},
    core::{ApiResource, DynamicObject, TypeMeta},
    runtime::watcher,
    Client, Error, Resource,
};
