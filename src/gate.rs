//! Request gate
//!
//! axum middleware that decides admission for every request before it
//! reaches its handler. Rejections use the REST error envelope:
//!
//! ```json
//! { "code": "rest_no_route", "message": "...", "data": { "status": 404 } }
//! ```

use crate::auth::SharedAuthenticator;
use crate::policy::{PolicyTree, RouteTable, Verdict};
use crate::store::CachedStore;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Everything the gate needs per request
#[derive(Clone)]
pub struct GateState {
    pub routes: Arc<RouteTable>,
    pub store: Arc<CachedStore>,
    pub store_key: Arc<str>,
    pub auth: SharedAuthenticator,
}

impl GateState {
    pub fn new(
        routes: RouteTable,
        store: Arc<CachedStore>,
        store_key: impl Into<Arc<str>>,
        auth: SharedAuthenticator,
    ) -> Self {
        Self {
            routes: Arc::new(routes),
            store,
            store_key: store_key.into(),
            auth,
        }
    }

    /// Verdict for a request and the pattern it resolved to; store
    /// failures leave no route enabled.
    pub async fn decide<F>(
        &self,
        method: &str,
        path: &str,
        is_authenticated: F,
    ) -> (Verdict, Option<&str>)
    where
        F: FnOnce() -> bool,
    {
        let tree = match self.store.load(&self.store_key).await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "Policy unavailable, refusing request");
                Arc::new(PolicyTree::new())
            }
        };
        self.routes
            .evaluate_match(method, path, &tree, is_authenticated)
    }
}

/// Pattern the gate matched, attached to admitted requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

/// Gate middleware for `axum::middleware::from_fn_with_state`
pub async fn policy_gate(
    State(gate): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();

    let headers = req.headers();
    let (verdict, pattern) = gate
        .decide(&method, &path, || gate.auth.is_authenticated(headers))
        .await;

    match verdict {
        Verdict::Allow => {
            if let Some(pattern) = pattern {
                req.extensions_mut().insert(MatchedRoute(pattern.to_string()));
            }
            next.run(req).await
        }
        Verdict::NotFound => GateRejection::NoRoute.into_response(),
        Verdict::Unauthorized => GateRejection::Forbidden.into_response(),
    }
}

/// Response for a refused request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// 404 `rest_no_route`
    NoRoute,
    /// 401 `rest_forbidden`
    Forbidden,
}

impl GateRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            GateRejection::NoRoute => StatusCode::NOT_FOUND,
            GateRejection::Forbidden => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            GateRejection::NoRoute => ErrorBody::new(
                "rest_no_route",
                "No route was found matching the URL and request method",
                self.status(),
            ),
            GateRejection::Forbidden => ErrorBody::new(
                "rest_forbidden",
                "Sorry, you are not allowed to do that.",
                self.status(),
            ),
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// REST error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub data: ErrorData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorData {
    pub status: u16,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: ErrorData {
                status: status.as_u16(),
            },
        }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.data.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
