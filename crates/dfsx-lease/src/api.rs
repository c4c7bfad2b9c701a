//! HTTP surface for the Lease Manager.

use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::error::LeaseError;
use crate::lease::LeaseManager;

/// Shared application state for the lease manager's router.
#[derive(Clone)]
pub struct LeaseApi {
    manager: Arc<LeaseManager>,
}

impl LeaseApi {
    /// Wraps a [`LeaseManager`] for serving over HTTP.
    pub fn new(manager: Arc<LeaseManager>) -> Self {
        Self { manager }
    }

    /// Builds the axum router implementing the lease manager's check/grant/revoke surface.
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(dump_handler).post(grant_root).delete(revoke_root))
            .route(
                "/{*path}",
                get(check_handler).post(grant_handler).delete(revoke_handler),
            )
            .route("/health", get(health_handler))
            .with_state(self)
    }

    /// Binds `addr` and serves the lease manager until the process exits.
    pub async fn serve(self, addr: std::net::SocketAddr) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "lease manager listening");
        axum::serve(listener, router.into_make_service()).await?;
        Ok(())
    }
}

impl IntoResponse for LeaseError {
    fn into_response(self) -> Response {
        let code = match self.status() {
            dfsx_core::DfsStatus::Conflict => StatusCode::CONFLICT,
            dfsx_core::DfsStatus::Unauthorized => StatusCode::UNAUTHORIZED,
            dfsx_core::DfsStatus::BadRequest => StatusCode::BAD_REQUEST,
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

async fn check_handler(
    State(api): State<LeaseApi>,
    Path(path): Path<String>,
    Query(q): Query<LockIdQuery>,
) -> Result<&'static str, LeaseError> {
    let file_path = with_leading_slash(&path);
    api.manager.check(&file_path, q.lock_id)?;
    Ok("OK")
}

async fn dump_handler(State(api): State<LeaseApi>) -> Result<String, LeaseError> {
    let entries = api.manager.dump()?;
    Ok(entries
        .into_iter()
        .map(|(path, granted, last_used)| format!("{path}=({granted}, {last_used})"))
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn grant_handler(
    State(api): State<LeaseApi>,
    Path(path): Path<String>,
) -> Result<String, LeaseError> {
    let file_path = with_leading_slash(&path);
    let lease_id = api.manager.grant(&file_path)?;
    Ok(lease_id.to_string())
}

async fn grant_root(
    State(api): State<LeaseApi>,
    body: String,
) -> Result<String, LeaseError> {
    let paths: Vec<String> = body
        .split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let granted = api.manager.grant_batch(&paths)?;
    Ok(paths
        .into_iter()
        .map(|p| {
            let id = granted[&p];
            format!("{p}={id}")
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn revoke_handler(
    State(api): State<LeaseApi>,
    Path(path): Path<String>,
    Query(q): Query<LockIdQuery>,
) -> Result<&'static str, LeaseError> {
    let file_path = with_leading_slash(&path);
    let lease_id = q
        .lock_id
        .ok_or_else(|| LeaseError::BadRequest("missing lock_id".to_string()))?;
    api.manager.revoke(&file_path, lease_id)?;
    Ok("OK")
}

#[derive(Debug, Deserialize)]
struct RevokeBatchForm {
    filepaths: Option<String>,
    lock_ids: Option<String>,
}

async fn revoke_root(
    State(api): State<LeaseApi>,
    Form(form): Form<RevokeBatchForm>,
) -> Result<&'static str, LeaseError> {
    let filepaths = form
        .filepaths
        .ok_or_else(|| LeaseError::BadRequest("missing filepaths".to_string()))?;
    let lock_ids = form
        .lock_ids
        .ok_or_else(|| LeaseError::BadRequest("missing lock_ids".to_string()))?;

    let paths: Vec<String> = filepaths.split('\n').map(str::to_string).collect();
    let ids: Result<Vec<u64>, _> = lock_ids.split('\n').map(|s| s.parse::<u64>()).collect();
    let ids = ids.map_err(|e| LeaseError::BadRequest(format!("invalid lock_id: {e}")))?;

    api.manager.revoke_batch(&paths, &ids)?;
    Ok("OK")
}

async fn health_handler() -> &'static str {
    "OK"
}
