// src/portal.rs - Limits provisioning HTTP server
use crate::{
    error::{ConfigError, HabitatError, Result},
    io::ProvisioningPortal,
    limits::{Limits, SharedLimits},
};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const LIMITS_ROUTE: &str = "/config/limits";

pub fn router(limits: SharedLimits) -> Router {
    Router::new()
        .route(LIMITS_ROUTE, get(get_limits).post(submit_limits))
        .layer(TraceLayer::new_for_http())
        .with_state(limits)
}

async fn get_limits(State(limits): State<SharedLimits>) -> std::result::Result<Json<Limits>, HabitatError> {
    let store = limits.read().await;
    let current = store.limits().ok_or(HabitatError::NotConfigured)?;
    Ok(Json(*current))
}

/// Accepts the four-array record, persists it and makes it active.
async fn submit_limits(
    State(limits): State<SharedLimits>,
    body: Bytes,
) -> std::result::Result<&'static str, HabitatError> {
    let submitted = Limits::from_json(&body).map_err(|e| {
        warn!("Rejected limits submission: {}", e);
        e
    })?;

    let mut store = limits.write().await;
    store.save(&submitted)?;
    store.apply(submitted);
    info!("Limits provisioned through portal");
    Ok("Limits saved successfully")
}

impl IntoResponse for HabitatError {
    fn into_response(self) -> Response {
        let status = match &self {
            HabitatError::Limits(ConfigError::Malformed(_)) | HabitatError::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            HabitatError::Limits(ConfigError::Missing) | HabitatError::NotConfigured => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Serves [`router`] while the device waits for limits.
pub struct Portal {
    bind: SocketAddr,
    limits: SharedLimits,
    local_addr: Option<SocketAddr>,
    server: Option<JoinHandle<()>>,
}

impl Portal {
    pub fn new(bind: SocketAddr, limits: SharedLimits) -> Self {
        Self {
            bind,
            limits,
            local_addr: None,
            server: None,
        }
    }

    /// Address actually bound, once open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl ProvisioningPortal for Portal {
    /// Must be called from within a tokio runtime.
    fn open(&mut self) -> Result<()> {
        if self.server.is_some() {
            return Ok(());
        }

        let listener = std::net::TcpListener::bind(self.bind)?;
        listener.set_nonblocking(true)?;
        let listener = tokio::net::TcpListener::from_std(listener)?;
        let local_addr = listener.local_addr()?;

        let app = router(self.limits.clone());
        self.server = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Provisioning portal stopped: {}", e);
            }
        }));
        self.local_addr = Some(local_addr);
        info!("Provisioning portal listening on {}", local_addr);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(server) = self.server.take() {
            server.abort();
            self.local_addr = None;
            info!("Provisioning portal closed");
        }
    }

    fn is_open(&self) -> bool {
        self.server.is_some()
    }
}

impl Drop for Portal {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}
