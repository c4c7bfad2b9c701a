//! HTTP surface for the Directory Registry.

use std::sync::Arc;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use dfsx_core::Endpoint;
use serde::Deserialize;

use crate::directory::DirectoryRegistry;
use crate::error::RegistryError;

/// Shared application state for the registry's router.
#[derive(Clone)]
pub struct RegistryApi {
    registry: Arc<DirectoryRegistry>,
}

impl RegistryApi {
    /// Wraps a [`DirectoryRegistry`] for serving over HTTP.
    pub fn new(registry: Arc<DirectoryRegistry>) -> Self {
        Self { registry }
    }

    /// Builds the axum router implementing the registry's lookup/register/deregister surface.
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(list_root).post(register_root))
            .route(
                "/{*path}",
                get(lookup_handler)
                    .post(register_handler)
                    .delete(deregister_handler),
            )
            .route("/health", get(health_handler))
            .with_state(self)
    }

    /// Binds `addr` and serves the registry until the process exits.
    pub async fn serve(self, addr: std::net::SocketAddr) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "directory registry listening");
        axum::serve(listener, router.into_make_service()).await?;
        Ok(())
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let code = match self.status() {
            dfsx_core::DfsStatus::NotFound => StatusCode::NOT_FOUND,
            dfsx_core::DfsStatus::BadRequest => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (code, self.to_string()).into_response()
    }
}

fn with_leading_slash(path: &str) -> String {
    format!("/{path}")
}

async fn lookup_handler(
    State(api): State<RegistryApi>,
    Path(path): Path<String>,
) -> Result<String, RegistryError> {
    let file_path = with_leading_slash(&path);
    let endpoint = api.registry.lookup(&file_path)?;
    Ok(endpoint.to_string())
}

async fn list_root(State(api): State<RegistryApi>) -> Result<String, RegistryError> {
    let entries = api.registry.list()?;
    Ok(entries
        .into_iter()
        .map(|(dir, ep)| format!("{dir}={ep}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

#[derive(Debug, Deserialize)]
struct RegisterForm {
    srv: Option<String>,
}

async fn register_handler(
    State(api): State<RegistryApi>,
    Path(path): Path<String>,
    Form(form): Form<RegisterForm>,
) -> Result<&'static str, RegistryError> {
    let dir = with_leading_slash(&path);
    let srv = form
        .srv
        .ok_or_else(|| RegistryError::BadRequest("missing srv".to_string()))?;
    let endpoint = Endpoint::parse(&srv)?;
    api.registry.register(&dir, &endpoint)?;
    Ok("OK")
}

#[derive(Debug, Deserialize)]
struct RegisterRootForm {
    srv: Option<String>,
    dirs: Option<String>,
}

async fn register_root(
    State(api): State<RegistryApi>,
    Form(form): Form<RegisterRootForm>,
) -> Result<&'static str, RegistryError> {
    let srv = form
        .srv
        .ok_or_else(|| RegistryError::BadRequest("missing srv".to_string()))?;
    let dirs_raw = form
        .dirs
        .ok_or_else(|| RegistryError::BadRequest("missing dirs".to_string()))?;
    let endpoint = Endpoint::parse(&srv)?;
    let dirs: Vec<String> = dirs_raw
        .split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    api.registry.register_batch(&dirs, &endpoint)?;
    Ok("OK")
}

#[derive(Debug, Deserialize)]
struct DeregisterForm {
    srv: Option<String>,
}

async fn deregister_handler(
    State(api): State<RegistryApi>,
    Path(path): Path<String>,
    Form(form): Form<DeregisterForm>,
) -> Result<&'static str, RegistryError> {
    let dir = with_leading_slash(&path);
    let srv = form
        .srv
        .ok_or_else(|| RegistryError::BadRequest("missing srv".to_string()))?;
    let endpoint = Endpoint::parse(&srv)?;
    api.registry.deregister(&dir, &endpoint)?;
    Ok("OK")
}

async fn health_handler() -> &'static str {
    "OK"
}
