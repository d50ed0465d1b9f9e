#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use appdash_core as core;
pub use appdash_k8s_api as k8s;
pub use appdash_k8s_index as index;

mod args;
mod assets;
mod cluster;
pub mod http;
mod metrics;

pub use self::{
    args::Args,
    assets::Assets,
    cluster::KubeCluster,
    http::Api,
    metrics::HttpMetrics,
};
