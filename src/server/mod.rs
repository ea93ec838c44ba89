//! HTTP server
//!
//! Assembles the gated route set, the index route and the admin API into a
//! single axum router. Admitted requests to a registered route get a JSON
//! echo of the matched pattern, so a policy can be exercised before it is
//! put in front of a real API.

use crate::admin::{AdminState, admin_router};
use crate::auth::{SharedAuthenticator, create_authenticator};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::gate::{GateState, MatchedRoute, policy_gate};
use crate::registry::{RouteRegistry, StaticRegistry};
use crate::store::{CachedStore, SharedPolicyStore, create_store};
use crate::util::{SecretString, bind_available};
use axum::{
    Json, Router,
    extract::{Request, State},
    middleware,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared server components
#[derive(Clone)]
pub struct AppState {
    pub name: Arc<str>,
    pub registry: Arc<dyn RouteRegistry>,
    pub store: Arc<CachedStore>,
    pub store_key: Arc<str>,
    pub auth: SharedAuthenticator,
    pub admin_token: Option<SecretString>,
}

impl AppState {
    /// Wire up the configured registry, store and authenticator
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let store = create_store(&config.store)?;
        info!(backend = store.backend(), key = %config.store.key, "Policy store ready");

        Ok(Self::new(
            config,
            Arc::new(StaticRegistry::from_config(&config.routes)),
            store,
            create_authenticator(&config.auth),
        ))
    }

    pub fn new(
        config: &AppConfig,
        registry: Arc<dyn RouteRegistry>,
        store: SharedPolicyStore,
        auth: SharedAuthenticator,
    ) -> Self {
        Self {
            name: config.server.name.as_str().into(),
            registry,
            store: Arc::new(CachedStore::new(store)),
            store_key: config.store.key.as_str().into(),
            auth,
            admin_token: config.auth.admin_token.clone(),
        }
    }

    fn gate(&self) -> GateState {
        GateState::new(
            self.registry.route_table(),
            Arc::clone(&self.store),
            Arc::clone(&self.store_key),
            Arc::clone(&self.auth),
        )
    }
}

#[derive(Serialize)]
struct IndexInfo {
    name: String,
    version: &'static str,
}

#[derive(Serialize)]
struct PreviewInfo {
    method: String,
    path: String,
    route: Option<String>,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/", get(index))
        .fallback(preview)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state.gate(), policy_gate));

    let mut app = Router::new();
    match &state.admin_token {
        Some(token) => {
            app = app.nest(
                "/admin",
                admin_router(AdminState {
                    registry: Arc::clone(&state.registry),
                    store: Arc::clone(&state.store),
                    store_key: Arc::clone(&state.store_key),
                    admin_token: token.clone(),
                }),
            );
        }
        None => info!("No admin token configured, admin API disabled"),
    }

    app.merge(gated).layer(TraceLayer::new_for_http())
}

async fn index(State(state): State<AppState>) -> Json<IndexInfo> {
    Json(IndexInfo {
        name: state.name.to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn preview(req: Request) -> Json<PreviewInfo> {
    Json(PreviewInfo {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        route: req.extensions().get::<MatchedRoute>().map(|m| m.0.clone()),
    })
}

/// Run the server until Ctrl+C
///
/// Port discovery is used to find an available port if the configured port is taken.
pub async fn run_server(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let listener = bind_available(&config.server.host, config.server.port).await?;
    let addr = listener.local_addr()?;

    info!(
        routes = state.registry.routes().len(),
        "Route gate listening on http://{}", addr
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegisteredRoute;
    use crate::store::MemoryStore;

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::from_config(&AppConfig::default()).unwrap();
        assert_eq!(&*state.store_key, "routeguard");
        assert!(state.admin_token.is_none());
        assert!(state.registry.routes().is_empty());
    }

    #[test]
    fn test_gate_compiles_registry() {
        let config = AppConfig::default();
        let registry = StaticRegistry::new(vec![RegisteredRoute::new("/a")]);
        let state = AppState::new(
            &config,
            Arc::new(registry),
            Arc::new(MemoryStore::new()),
            create_authenticator(&config.auth),
        );
        assert_eq!(state.gate().routes.len(), 1);
    }
}
