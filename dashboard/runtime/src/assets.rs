use bytes::Bytes;
use http_body_util::Full;
use hyper::{http, Response};
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Serves the UI's static files from a directory.
#[derive(Clone, Debug)]
pub struct Assets {
    root: PathBuf,
}

// === impl Assets ===

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn serve(&self, path: &str) -> Response<Full<Bytes>> {
        let Some(mut file) = self.resolve(path) else {
            return status(http::StatusCode::NOT_FOUND);
        };
        if tokio::fs::metadata(&file)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            file.push("index.html");
        }

        match tokio::fs::read(&file).await {
            Ok(bytes) => Response::builder()
                .status(http::StatusCode::OK)
                .header(http::header::CONTENT_TYPE, content_type(&file))
                .body(Full::from(bytes))
                .expect("asset response must be valid"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                status(http::StatusCode::NOT_FOUND)
            }
            Err(error) => {
                warn!(%error, file = %file.display(), "Failed to read asset");
                status(http::StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Maps a request path onto the asset directory. Paths that try to leave the directory are
    /// rejected.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut file = self.root.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => return None,
                s if s.contains('\\') => return None,
                s => file.push(s),
            }
        }
        Some(file)
    }
}

fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn status(status: http::StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::default())
        .expect("status response must be valid")
}
