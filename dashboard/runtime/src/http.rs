use crate::{core::DiscoverEndpoints, core::LookupError, Assets, HttpMetrics};
use bytes::Bytes;
use futures::future;
use hyper::{http, Request, Response};
use hyper_util::{rt::TokioIo, service::TowerToHyperService};
use prometheus_client::registry::Registry;
use serde::Serialize;
use std::{sync::Arc, task};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn};

type Body = http_body_util::Full<Bytes>;

const NAMESPACE_PREFIX: &str = "/api/namespace/";

/// The dashboard's HTTP API, metrics, and UI assets.
#[derive(Clone)]
pub struct Api<D> {
    discover: D,
    assets: Assets,
    metrics: HttpMetrics,
    prom: Arc<Registry>,
    cors: bool,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to encode json response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] std::fmt::Error),
}

// === impl Api ===

impl<D> Api<D>
where
    D: DiscoverEndpoints,
{
    pub fn new(
        discover: D,
        assets: Assets,
        metrics: HttpMetrics,
        prom: Arc<Registry>,
        cors: bool,
    ) -> Self {
        Self {
            discover,
            assets,
            metrics,
            prom,
            cors,
        }
    }

    /// Dispatches a request, returning the route label used for metrics with the response.
    async fn route(
        &self,
        method: &http::Method,
        path: &str,
    ) -> Result<(&'static str, Response<Body>), Error> {
        if self.cors && method == http::Method::OPTIONS {
            return Ok(("preflight", status(http::StatusCode::NO_CONTENT)));
        }

        if path == "/metrics" {
            return Ok(("metrics", self.metrics_text()?));
        }

        if path == "/api/namespaces" {
            if !is_read(method) {
                return Ok(("namespaces", status(http::StatusCode::METHOD_NOT_ALLOWED)));
            }
            return Ok(("namespaces", json(&self.discover.namespaces())?));
        }

        if let Some(ns) = path.strip_prefix(NAMESPACE_PREFIX) {
            if ns.is_empty() || ns.contains('/') {
                return Ok(("namespace", status(http::StatusCode::NOT_FOUND)));
            }
            if !is_read(method) {
                return Ok(("namespace", status(http::StatusCode::METHOD_NOT_ALLOWED)));
            }
            return Ok(("namespace", self.namespace(ns)?));
        }

        if path.starts_with("/api/") {
            return Ok(("api", status(http::StatusCode::NOT_FOUND)));
        }

        if !is_read(method) {
            return Ok(("assets", status(http::StatusCode::METHOD_NOT_ALLOWED)));
        }
        Ok(("assets", self.assets.serve(path).await))
    }

    fn namespace(&self, ns: &str) -> Result<Response<Body>, Error> {
        match self.discover.endpoints(ns) {
            Ok(endpoints) => json(&endpoints),
            Err(e @ LookupError::NotAvailable(_)) => {
                debug!(%ns, "Namespace not available");
                Ok(text(http::StatusCode::NOT_FOUND, e.to_string()))
            }
            Err(LookupError::Join { source, .. }) => {
                self.metrics.join_failed();
                error!(
                    %ns,
                    error = %source,
                    cause = %source.type_mismatch(),
                    "Failed to join namespace"
                );
                Ok(text(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                ))
            }
        }
    }

    fn metrics_text(&self) -> Result<Response<Body>, Error> {
        let mut buf = String::new();
        prometheus_client::encoding::text::encode(&mut buf, &self.prom)?;
        Ok(Response::builder()
            .status(http::StatusCode::OK)
            .header(
                http::header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )
            .body(Body::from(buf))
            .expect("metrics response must be valid"))
    }

    fn finish(&self, mut rsp: Response<Body>) -> Response<Body> {
        if self.cors {
            let headers = rsp.headers_mut();
            headers.insert(
                http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
                http::HeaderValue::from_static("*"),
            );
            headers.insert(
                http::header::ACCESS_CONTROL_ALLOW_HEADERS,
                http::HeaderValue::from_static("Origin, Content-Type, Accept"),
            );
            headers.insert(
                http::header::ACCESS_CONTROL_ALLOW_METHODS,
                http::HeaderValue::from_static("GET, HEAD, OPTIONS"),
            );
        }
        rsp
    }
}

impl<D, B> tower::Service<Request<B>> for Api<D>
where
    D: DiscoverEndpoints + Clone + Send + Sync + 'static,
{
    type Response = Response<Body>;
    type Error = Error;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Error>>;

    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> task::Poll<Result<(), Error>> {
        task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let api = self.clone();
        Box::pin(async move {
            let (route, rsp) = api.route(&method, &path).await?;
            debug!(%method, %path, status = %rsp.status(), "Served");
            api.metrics.request(route, rsp.status().as_u16());
            Ok(api.finish(rsp))
        })
    }
}

/// Serves the API on `listener` until the drain signal fires.
#[instrument(skip_all)]
pub async fn serve<D>(listener: TcpListener, api: Api<D>, drain: drain::Watch)
where
    D: DiscoverEndpoints + Clone + Send + Sync + 'static,
{
    match listener.local_addr() {
        Ok(addr) => info!(%addr, "HTTP API server listening"),
        Err(error) => warn!(%error, "HTTP API server listening on an unknown address"),
    }

    loop {
        tokio::select! {
            res = listener.accept() => {
                let (io, peer) = match res {
                    Ok(conn) => conn,
                    Err(error) => {
                        warn!(%error, "Failed to accept connection");
                        continue;
                    }
                };
                let svc = TowerToHyperService::new(api.clone());
                tokio::spawn(async move {
                    if let Err(error) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(io), svc)
                        .await
                    {
                        debug!(%peer, %error, "Connection closed with error");
                    }
                });
            }
            _ = drain.clone().signaled() => {
                info!("HTTP API server shutting down");
                return;
            }
        }
    }
}

fn is_read(method: &http::Method) -> bool {
    method == http::Method::GET || method == http::Method::HEAD
}

fn json<T: Serialize>(value: &T) -> Result<Response<Body>, Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("json response must be valid"))
}

fn text(status: http::StatusCode, msg: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(msg))
        .expect("text response must be valid")
}

fn status(status: http::StatusCode) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::default())
        .expect("status response must be valid")
}
