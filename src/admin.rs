//! Admin API
//!
//! Operator endpoints for reading the policy tree and submitting settings.
//! A submission is a complete snapshot of the checked boxes: it is merged
//! onto an empty tree and replaces what was stored, so unchecking a box
//! takes effect. Concurrent submissions are not coordinated; the last one
//! wins.

use crate::auth::bearer_token;
use crate::gate::ErrorBody;
use crate::policy::{ListingEntry, OverrideTree, PolicyTree, build_tree, merge_overrides};
use crate::registry::{RegisteredRoute, RouteRegistry};
use crate::store::{CachedStore, PolicyStore};
use crate::util::SecretString;
use axum::{
    Form, Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state for admin handlers
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<dyn RouteRegistry>,
    pub store: Arc<CachedStore>,
    pub store_key: Arc<str>,
    pub admin_token: SecretString,
}

/// Settings submission: the two sparse override trees
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub enabled: OverrideTree,
    pub public: OverrideTree,
}

impl Submission {
    /// Split bracketed form fields (`enabled[..]`, `public[..]`).
    pub fn from_form_pairs(pairs: &[(String, String)]) -> Self {
        let pairs = || pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        Self {
            enabled: OverrideTree::from_form_pairs("enabled", pairs()),
            public: OverrideTree::from_form_pairs("public", pairs()),
        }
    }

    /// The tree to persist for this submission.
    pub fn into_tree(self) -> PolicyTree {
        merge_overrides(PolicyTree::new(), &self.enabled, &self.public)
    }
}

/// Admin routes, to be nested under `/admin`
pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/policy", get(get_policy).post(submit_json))
        .route("/policy/form", axum::routing::post(submit_form))
        .route("/routes", get(list_routes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}

/// Reject requests without the admin bearer token
async fn require_admin(State(state): State<AdminState>, req: Request, next: Next) -> Response {
    match bearer_token(req.headers()) {
        Some(token) if token == state.admin_token.expose_secret() => next.run(req).await,
        _ => ErrorBody::new(
            "admin_unauthorized",
            "A valid admin token is required.",
            StatusCode::UNAUTHORIZED,
        )
        .into_response(),
    }
}

/// Current policy: the saved tree completed with the live route set
async fn get_policy(State(state): State<AdminState>) -> Result<Json<Vec<ListingEntry>>, Response> {
    let saved = state
        .store
        .get(&state.store_key)
        .await
        .map_err(store_failure)?;
    let tree = build_tree(state.registry.patterns(), saved);
    Ok(Json(tree.listing()))
}

async fn list_routes(State(state): State<AdminState>) -> Json<Vec<RegisteredRoute>> {
    Json(state.registry.routes())
}

async fn submit_json(
    State(state): State<AdminState>,
    Json(submission): Json<Submission>,
) -> Result<StatusCode, Response> {
    save(&state, submission).await
}

async fn submit_form(
    State(state): State<AdminState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<StatusCode, Response> {
    save(&state, Submission::from_form_pairs(&pairs)).await
}

async fn save(state: &AdminState, submission: Submission) -> Result<StatusCode, Response> {
    let tree = submission.into_tree();
    state
        .store
        .put(&state.store_key, &tree)
        .await
        .map_err(store_failure)?;

    info!(nodes = tree.len(), "Policy settings saved");
    Ok(StatusCode::NO_CONTENT)
}

fn store_failure(e: crate::error::StoreError) -> Response {
    warn!(error = %e, "Policy store request failed");
    ErrorBody::new(
        "store_unavailable",
        "The policy store could not be reached.",
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::segment_key;

    #[test]
    fn test_submission_from_form_pairs() {
        let a = segment_key("a").to_string();
        let b = segment_key("b").to_string();
        let pairs = vec![
            (format!("enabled[{a}][{b}]"), "on".to_string()),
            (format!("public[{a}][{b}]"), "on".to_string()),
            ("option_page".to_string(), "routeguard".to_string()),
        ];

        let tree = Submission::from_form_pairs(&pairs).into_tree();
        let leaf = tree.node(&[segment_key("a"), segment_key("b")]).unwrap();
        assert!(leaf.enabled && leaf.public);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_empty_submission_disables_everything() {
        let submission: Submission = serde_json::from_str("{}").unwrap();
        assert!(submission.into_tree().is_empty());
    }
}
