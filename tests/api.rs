//! End-to-end HTTP tests over a real listener.

mod common;

use serde_json::{json, Value};
use settlement_ops::{router, AppState, Config};
use std::sync::Arc;

struct TestServer {
    base: String,
    client: reqwest::Client,
    _tmp: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let cases_dir = tmp.path().join("cases");
        common::write_case(&cases_dir, 1, &common::sample_analysis(), false);
        common::write_case(&cases_dir, 2, &common::sample_analysis(), true);

        let config = Config {
            cases_dir,
            cache_path: tmp.path().join("cache"),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            _tmp: tmp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn new_session(&self) -> String {
        let (status, body) = self.post_json("/api/viewer", json!({})).await;
        assert_eq!(status, 201);
        body["session"].as_str().unwrap().to_string()
    }
}

// ============================================================================
// Cases
// ============================================================================

#[tokio::test]
async fn test_health_and_case_listing() {
    let server = TestServer::start().await;

    let (status, body) = server.get_json("/api/health").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = server.get_json("/api/cases").await;
    assert_eq!(status, 200);
    let cases = body.as_array().unwrap();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0]["case_name"], "Doe v. Acme Corp.");
    assert!(cases[0].get("analysis_json").is_none());

    let (status, body) = server.get_json("/api/cases/2").await;
    assert_eq!(status, 200);
    assert_eq!(body["has_bid"], true);
    assert_eq!(body["analysis_json"]["timeline"]["claims_deadline"], "March 1, 2026");

    let (status, _) = server.get_json("/api/cases/99").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_document_fetch_endpoint() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .get(server.url("/api/cases/1/pdf/settlement"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("inline"));
    assert!(disposition.contains("Doe_Settlement.pdf"));
    assert!(resp.bytes().await.unwrap().starts_with(b"%PDF"));

    let status = |path: &'static str| {
        let client = server.client.clone();
        let url = server.url(path);
        async move { client.get(url).send().await.unwrap().status().as_u16() }
    };
    assert_eq!(status("/api/cases/1/pdf/exhibit").await, 400);
    assert_eq!(status("/api/cases/1/pdf/bid").await, 404);
    assert_eq!(status("/api/cases/2/pdf/bid").await, 200);
    assert_eq!(status("/api/cases/7/pdf/settlement").await, 404);
}

#[tokio::test]
async fn test_citation_lookup() {
    let server = TestServer::start().await;

    let (status, body) = server
        .get_json("/api/cases/1/citations?path=claims_deadline")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["citations"][0]["page"], 4);
    assert_eq!(body["citations"][0]["doc"], "settlement");

    let (_, body) = server
        .get_json("/api/cases/1/citations?path=timeline.notice_deadline")
        .await;
    assert_eq!(body["citations"][0]["doc"], "bid");

    let (status, body) = server
        .get_json("/api/cases/1/citations?path=claims_logic.type")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["citations"], json!([]));
}

#[tokio::test]
async fn test_case_page_renders_badges() {
    let server = TestServer::start().await;
    let html = server
        .client
        .get(server.url("/case/1"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("cite-badge cite-settlement"));
    assert!(html.contains("cite-badge cite-bid"));
    assert!(html.contains("event.stopPropagation()"));
    assert!(html.contains("viewer-overlay"));
}

#[tokio::test]
async fn test_audit_endpoint() {
    let server = TestServer::start().await;

    let (status, body) = server.get_json("/api/cases/2/audit").await;
    assert_eq!(status, 200);
    assert_eq!(body["totals"]["total"], 4);
    assert_eq!(body["totals"]["exact"], 3);
    assert_eq!(body["totals"]["page_out_of_range"], 1);

    let (_, body) = server.get_json("/api/cases/1/audit").await;
    assert_eq!(body["totals"]["document_unavailable"], 1);
}

// ============================================================================
// Viewer Sessions
// ============================================================================

#[tokio::test]
async fn test_viewer_session_flow() {
    let server = TestServer::start().await;
    let session = server.new_session().await;
    let base = format!("/api/viewer/{}", session);

    let (status, snap) = server.get_json(&base).await;
    assert_eq!(status, 200);
    assert_eq!(snap["phase"], "closed");

    let (status, snap) = server
        .post_json(
            &format!("{}/open", base),
            json!({
                "case_id": 1,
                "doc": "settlement",
                "page": 4,
                "quote": "submit claims by the Claims Deadline of March 1, 2026"
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(snap["phase"], "ready");
    assert_eq!(snap["filename"], "Doe_Settlement.pdf");
    assert_eq!(snap["current_page"], 4);
    assert_eq!(snap["total_pages"], 6);
    assert_eq!(snap["page"]["page_number"], 4);
    assert_eq!(snap["page"]["surface"]["width"], 800);
    assert_eq!(snap["page"]["highlight"]["matched"], true);
    assert_eq!(snap["page"]["highlight"]["mode"], "exact");
    assert_eq!(snap["page"]["highlight"]["owners"], json!([1, 2]));
    let generation = snap["generation"].as_u64().unwrap();

    let (_, snap) = server
        .post_json(&format!("{}/navigate", base), json!({"action": "next"}))
        .await;
    assert_eq!(snap["current_page"], 5);
    assert!(snap["page"]["highlight"].is_null());
    assert!(snap["generation"].as_u64().unwrap() > generation);

    let (_, snap) = server
        .post_json(&format!("{}/navigate", base), json!({"action": "jump", "page": 50}))
        .await;
    assert_eq!(snap["current_page"], 6);

    let (status, _) = server
        .post_json(&format!("{}/navigate", base), json!({"action": "jump"}))
        .await;
    assert_eq!(status, 400);

    let (_, snap) = server
        .post_json(&format!("{}/key", base), json!({"key": "ArrowLeft"}))
        .await;
    assert_eq!(snap["current_page"], 5);

    let (_, snap) = server
        .post_json(&format!("{}/key", base), json!({"key": "Escape"}))
        .await;
    assert_eq!(snap["phase"], "closed");

    let resp = server.client.delete(server.url(&base)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 204);
    let (status, _) = server.get_json(&base).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_viewer_missing_bid_is_error_phase() {
    let server = TestServer::start().await;
    let session = server.new_session().await;

    let (status, snap) = server
        .post_json(
            &format!("/api/viewer/{}/open", session),
            json!({"case_id": 1, "doc": "bid", "page": 2, "quote": "mailed"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(snap["phase"], "error");
    assert!(snap["error"].as_str().unwrap().starts_with("Failed to load document"));

    let (_, snap) = server
        .post_json(&format!("/api/viewer/{}/close", session), json!({}))
        .await;
    assert_eq!(snap["phase"], "closed");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let server = TestServer::start().await;
    let (status, _) = server
        .post_json("/api/viewer/nope/navigate", json!({"action": "next"}))
        .await;
    assert_eq!(status, 404);
}
