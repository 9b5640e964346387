//! HTTP route handlers for the settlement dashboard.
//!
//! Page handlers return HTML; everything under `/api` returns JSON, or a
//! plain-text message with an error status.

use crate::audit::audit_case;
use crate::citations::resolve;
use crate::error::Error;
use crate::models::{
    CaseSummary, Citation, CitationQuery, DocRole, DocumentRef, KeyRequest, NavAction,
    NavigateRequest, OpenViewerRequest, ResolvedCitations, SessionCreated,
};
use crate::templates::{render_case_page, render_index};
use crate::viewer::{ViewerController, ViewerKey, ViewerTarget};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

fn error_response(e: Error) -> Response {
    let status = e.status_code();
    if status.is_server_error() {
        warn!("request failed: {}", e);
    }
    (status, e.to_string()).into_response()
}

// ============================================================================
// Pages
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(state.store.cases()))
}

pub async fn case_page(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Response {
    match state.store.get(id) {
        Ok(case) => Html(render_case_page(case)).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Case API
// ============================================================================

pub async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

pub async fn list_cases(State(state): State<Arc<AppState>>) -> Json<Vec<CaseSummary>> {
    Json(state.store.cases().iter().map(|c| c.summary()).collect())
}

pub async fn get_case(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Response {
    match state.store.get(id) {
        Ok(case) => Json(case.detail()).into_response(),
        Err(e) => error_response(e),
    }
}

/// Document fetch endpoint: raw PDF bytes for one role of a case.
pub async fn case_pdf(
    State(state): State<Arc<AppState>>,
    Path((id, doc)): Path<(u64, String)>,
) -> Response {
    let role: DocRole = match doc.parse() {
        Ok(role) => role,
        Err(e) => return error_response(e),
    };
    let doc_ref = DocumentRef::new(id, role);

    let path = match state.store.document_path(&doc_ref) {
        Ok(path) => path,
        Err(e) => return error_response(e),
    };
    let filename = state
        .store
        .get(id)
        .ok()
        .and_then(|c| c.filename(role))
        .unwrap_or(role.file_name())
        .replace('"', "");

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(Error::Fetch(format!("{}: {}", doc_ref, e))),
    }
}

pub async fn case_citations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<CitationQuery>,
) -> Response {
    let case = match state.store.get(id) {
        Ok(case) => case,
        Err(e) => return error_response(e),
    };

    let citations: Vec<Citation> = case
        .analysis
        .as_ref()
        .and_then(|a| resolve(&a.citations, &query.path))
        .map(|c| c.to_vec())
        .unwrap_or_default();
    if citations.is_empty() {
        debug!(case_id = id, path = %query.path, "no citations for field");
    }

    Json(ResolvedCitations {
        path: query.path,
        citations,
    })
    .into_response()
}

pub async fn case_audit(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Response {
    let case = match state.store.get(id) {
        Ok(case) => case,
        Err(e) => return error_response(e),
    };
    let Some(analysis) = case.analysis.as_ref() else {
        return (StatusCode::NOT_FOUND, "Case has no analysis").into_response();
    };

    let audit = audit_case(
        &analysis.citations,
        state.source.as_ref(),
        state.backend.as_ref(),
        id,
    )
    .await;
    Json(audit).into_response()
}

// ============================================================================
// Viewer Sessions
// ============================================================================

fn session_or_404(state: &AppState, session: &str) -> Result<Arc<ViewerController>, Response> {
    state
        .session(session)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Viewer session not found").into_response())
}

pub async fn create_viewer(State(state): State<Arc<AppState>>) -> Response {
    let session = state.create_session();
    (StatusCode::CREATED, Json(SessionCreated { session })).into_response()
}

pub async fn viewer_snapshot(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Response {
    match session_or_404(&state, &session) {
        Ok(viewer) => Json(viewer.snapshot()).into_response(),
        Err(resp) => resp,
    }
}

pub async fn viewer_open(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(req): Json<OpenViewerRequest>,
) -> Response {
    let viewer = match session_or_404(&state, &session) {
        Ok(viewer) => viewer,
        Err(resp) => return resp,
    };
    let filename = match state.store.get(req.case_id) {
        Ok(case) => case.filename(req.doc).map(str::to_string),
        Err(e) => return error_response(e),
    };

    let citation = Citation {
        doc: req.doc,
        page: req.page,
        quote: req.quote,
    };
    viewer
        .open(ViewerTarget::new(req.case_id, citation, filename))
        .await;
    Json(viewer.snapshot()).into_response()
}

pub async fn viewer_navigate(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(req): Json<NavigateRequest>,
) -> Response {
    let viewer = match session_or_404(&state, &session) {
        Ok(viewer) => viewer,
        Err(resp) => return resp,
    };

    match (req.action, req.page) {
        (NavAction::Prev, _) => viewer.prev().await,
        (NavAction::Next, _) => viewer.next().await,
        (NavAction::Jump, Some(page)) => viewer.jump(page).await,
        (NavAction::Jump, None) => {
            return (StatusCode::BAD_REQUEST, "Jump requires a page").into_response()
        }
    }
    Json(viewer.snapshot()).into_response()
}

pub async fn viewer_key(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(req): Json<KeyRequest>,
) -> Response {
    let viewer = match session_or_404(&state, &session) {
        Ok(viewer) => viewer,
        Err(resp) => return resp,
    };
    viewer.handle_key(ViewerKey::from_name(&req.key)).await;
    Json(viewer.snapshot()).into_response()
}

pub async fn viewer_close(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Response {
    let viewer = match session_or_404(&state, &session) {
        Ok(viewer) => viewer,
        Err(resp) => return resp,
    };
    viewer.close();
    Json(viewer.snapshot()).into_response()
}

pub async fn delete_viewer(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Response {
    if state.drop_session(&session) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, "Viewer session not found").into_response()
    }
}
