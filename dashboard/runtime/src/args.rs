use crate::{http, index, metrics, Assets, KubeCluster};
use anyhow::{bail, Context, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use tokio::net::TcpListener;
use tracing::{info_span, Instrument};

const DEFAULT_LOG: &str = "appdash=info,warn";
const DEVEL_LOG: &str = "appdash=debug,info";

#[derive(Debug, Parser)]
#[clap(
    name = "appdash",
    about = "Serves an application-centric view of a cluster's namespaces"
)]
pub struct Args {
    /// Log filter. Defaults to `appdash=info,warn`, or `appdash=debug,info` in development mode.
    #[clap(long, env = "APPDASH_LOG")]
    log_level: Option<kubert::LogFilter>,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    /// Address of the admin server, which serves `/live` and `/ready`.
    #[clap(long, default_value = "0.0.0.0:9990")]
    admin_addr: SocketAddr,

    /// Development mode: debug logging and `Access-Control-Allow-Origin: *`.
    #[clap(long)]
    devel: bool,

    /// Port of the HTTP API server.
    #[clap(long, default_value = "8080")]
    port: u16,

    /// Directory holding the UI's static assets.
    #[clap(long, default_value = "static")]
    static_dir: PathBuf,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin_addr,
            devel,
            port,
            static_dir,
        } = self;

        let log_level = match log_level {
            Some(level) => level,
            None if devel => DEVEL_LOG.parse::<kubert::LogFilter>()?,
            None => DEFAULT_LOG.parse::<kubert::LogFilter>()?,
        };

        let mut prom = <Registry>::default();
        let (metrics, rt_metrics) = metrics::register(&mut prom);

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(kubert::admin::Builder::new(admin_addr))
            .with_client(client)
            .build()
            .await?;

        // Probe every namespace and start watching the accessible ones before serving anything.
        let cluster = KubeCluster::new(runtime.client());
        let registry = index::Registry::discover(&cluster).await?.shared();
        metrics.set_namespaces(registry.list_namespaces().len());

        let api = http::Api::new(
            registry,
            Assets::new(static_dir),
            metrics,
            Arc::new(prom),
            devel,
        );
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP API server to {addr}"))?;
        tokio::spawn(
            http::serve(listener, api, runtime.shutdown_handle()).instrument(info_span!("api")),
        );

        // Block the main thread on the shutdown signal. Watches are not drained; they end with
        // the process.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
