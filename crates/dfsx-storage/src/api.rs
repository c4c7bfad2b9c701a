//! HTTP surface for the Storage Node.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::error::StorageError;
use crate::node::StorageNode;

/// Shared application state for the storage node's router.
#[derive(Clone)]
pub struct StorageApi {
    node: Arc<StorageNode>,
}

impl StorageApi {
    /// Wraps a [`StorageNode`] for serving over HTTP.
    pub fn new(node: Arc<StorageNode>) -> Self {
        Self { node }
    }

    /// Builds the axum router implementing the storage node's GET/HEAD/PUT/DELETE surface.
    pub fn router(self) -> Router {
        Router::new()
            .route(
                "/{*path}",
                get(get_handler)
                    .head(head_handler)
                    .put(put_handler)
                    .delete(delete_handler),
            )
            .route("/health", get(health_handler))
            .with_state(self)
    }

    /// Binds `addr` and serves the storage node until the process exits.
    pub async fn serve(self, addr: std::net::SocketAddr) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "storage node listening");
        axum::serve(listener, router.into_make_service()).await?;
        Ok(())
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let code = match self.status() {
            dfsx_core::DfsStatus::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            dfsx_core::DfsStatus::NoContent => StatusCode::NO_CONTENT,
            dfsx_core::DfsStatus::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (code, self.to_string()).into_response()
    }
}

fn with_leading_slash(path: &str) -> String {
    format!("/{path}")
}

#[derive(Debug, Deserialize)]
struct LockIdQuery {
    lock_id: Option<u64>,
}

async fn get_handler(
    State(api): State<StorageApi>,
    Path(path): Path<String>,
    Query(q): Query<LockIdQuery>,
) -> Result<Response, StorageError> {
    let file_path = with_leading_slash(&path);
    let (bytes, last_modified) = api.node.get(&file_path, q.lock_id).await?;
    let mut resp = bytes.into_response();
    resp.headers_mut().insert(
        axum::http::header::LAST_MODIFIED,
        HeaderValue::from_str(last_modified.as_str()).unwrap(),
    );
    Ok(resp)
}

async fn head_handler(
    State(api): State<StorageApi>,
    Path(path): Path<String>,
    Query(q): Query<LockIdQuery>,
) -> Result<Response, StorageError> {
    let file_path = with_leading_slash(&path);
    let last_modified = api.node.head(&file_path, q.lock_id).await?;
    let mut resp = StatusCode::OK.into_response();
    resp.headers_mut().insert(
        axum::http::header::LAST_MODIFIED,
        HeaderValue::from_str(last_modified.as_str()).unwrap(),
    );
    Ok(resp)
}

async fn put_handler(
    State(api): State<StorageApi>,
    Path(path): Path<String>,
    Query(q): Query<LockIdQuery>,
    body: Bytes,
) -> Result<Response, StorageError> {
    let file_path = with_leading_slash(&path);
    let last_modified = api.node.put(&file_path, &body, q.lock_id).await?;
    let mut resp = StatusCode::OK.into_response();
    resp.headers_mut().insert(
        axum::http::header::LAST_MODIFIED,
        HeaderValue::from_str(last_modified.as_str()).unwrap(),
    );
    Ok(resp)
}

async fn delete_handler(
    State(api): State<StorageApi>,
    Path(path): Path<String>,
    Query(q): Query<LockIdQuery>,
) -> Result<&'static str, StorageError> {
    let file_path = with_leading_slash(&path);
    api.node.delete(&file_path, q.lock_id).await?;
    Ok("OK")
}

async fn health_handler() -> &'static str {
    "OK"
}
