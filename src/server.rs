//! HTTP surface: the settings page and the range-change endpoint.
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::access::{AccessPolicy, Caller};
use crate::render::{render_page, PageParts};
use crate::selection::{RangeSelection, SelectionError};

pub const PAGE_PATH: &str = "/admin/author-articles";
pub const RANGE_PATH: &str = "/admin/author-articles/range";

pub struct AppState {
    pub selection: RangeSelection,
    pub policy: AccessPolicy,
}

impl AppState {
    fn caller(&self, headers: &HeaderMap) -> Option<Caller> {
        let user = headers
            .get(self.policy.user_header())
            .and_then(|v| v.to_str().ok());
        self.policy.authorize(user)
    }
}

/// Body of a range change. Both fields may be missing; a missing token fails
/// verification and a missing label falls back to the default range.
#[derive(Debug, Default, Deserialize)]
pub struct RangeForm {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub security: String,
}

impl IntoResponse for SelectionError {
    fn into_response(self) -> Response {
        match self {
            SelectionError::Unauthorized => StatusCode::FORBIDDEN.into_response(),
            SelectionError::DataAccess(e) => {
                tracing::error!(error = %e, "Author report query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not load the author report.\n",
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(PAGE_PATH, get(page_handler))
        .route(RANGE_PATH, post(range_handler))
        .with_state(state)
}

async fn page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Html<String>, SelectionError> {
    let caller = state.caller(&headers);
    let initial = state
        .selection
        .initial_render(caller.as_ref(), Utc::now())
        .await?;

    Ok(Html(render_page(&PageParts {
        selector: &initial.selector,
        fragment: &initial.fragment,
        token: &initial.token,
        endpoint: RANGE_PATH,
    })))
}

async fn range_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<RangeForm>,
) -> Result<Html<String>, SelectionError> {
    let caller = state.caller(&headers);
    let fragment = state
        .selection
        .handle_selection_change(caller.as_ref(), &form.range, &form.security, Utc::now())
        .await?;
    Ok(Html(fragment))
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, page = PAGE_PATH, "Serving author report");
    }
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
