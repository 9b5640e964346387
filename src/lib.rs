//! Settlement ops library - citation verification for the settlement dashboard.
//!
//! Every extracted field of a case analysis can carry citations pointing at a
//! page and quote in the source documents. This crate resolves those
//! citations, renders the cited page with a positioned text layer, finds the
//! quote on it, and serves all of it to the dashboard over HTTP.

use axum::{
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub mod analysis;
pub mod audit;
pub mod badges;
pub mod cases;
pub mod citations;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod pdf;
pub mod render;
pub mod templates;
pub mod viewer;

use cases::{CaseStore, DocumentSource, HttpDocumentSource, LocalDocumentSource};
use error::Result;
use pdf::{LopdfBackend, PdfBackend, TextCache};
use viewer::ViewerController;

// ============================================================================
// Configuration
// ============================================================================

pub const CASES_DIR: &str = "cases";
pub const CACHE_PATH: &str = ".settlement_ops_cache";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const SESSION_IDLE_SECS: u64 = 30 * 60;
pub const MAX_SESSIONS: usize = 256;
pub use render::TARGET_WIDTH;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub cases_dir: PathBuf,
    pub cache_path: PathBuf,
    pub bind: String,
    /// When set, viewers fetch documents from this server instead of disk.
    pub document_url: Option<Url>,
    /// Viewer sessions untouched for this long are dropped.
    pub session_idle: Duration,
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cases_dir: PathBuf::from(CASES_DIR),
            cache_path: PathBuf::from(CACHE_PATH),
            bind: DEFAULT_BIND.to_string(),
            document_url: None,
            session_idle: Duration::from_secs(SESSION_IDLE_SECS),
            max_sessions: MAX_SESSIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let document_url = env::var("SETTLEMENT_OPS_DOCUMENT_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| match Url::parse(&s) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("ignoring SETTLEMENT_OPS_DOCUMENT_URL {:?}: {}", s, e);
                    None
                }
            });

        Self {
            cases_dir: env::var("SETTLEMENT_OPS_CASES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cases_dir),
            cache_path: env::var("SETTLEMENT_OPS_CACHE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            bind: env::var("SETTLEMENT_OPS_BIND").unwrap_or(defaults.bind),
            document_url,
            session_idle: env::var("SETTLEMENT_OPS_SESSION_IDLE_SECS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle),
            max_sessions: env::var("SETTLEMENT_OPS_MAX_SESSIONS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.max_sessions),
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

pub struct AppState {
    pub config: Config,
    pub store: Arc<CaseStore>,
    pub cache_db: sled::Db,
    pub source: Arc<dyn DocumentSource>,
    pub backend: Arc<dyn PdfBackend>,
    sessions: Mutex<HashMap<String, Session>>,
    session_clock: AtomicU64,
}

struct Session {
    viewer: Arc<ViewerController>,
    touched: Instant,
    /// Tick of the last use, for least-recently-used eviction.
    last_used: u64,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.cases_dir)?;
        let store = Arc::new(CaseStore::load(&config.cases_dir));
        let cache_db = sled::open(&config.cache_path)?;
        let backend = Arc::new(LopdfBackend::with_cache(TextCache::open(&cache_db)?));

        let source: Arc<dyn DocumentSource> = match &config.document_url {
            Some(base) => {
                info!("viewer documents served from {}", base);
                Arc::new(HttpDocumentSource::new(base.clone())?)
            }
            None => Arc::new(LocalDocumentSource::new(store.clone())),
        };

        Ok(Self {
            config,
            store,
            cache_db,
            source,
            backend,
            sessions: Mutex::new(HashMap::new()),
            session_clock: AtomicU64::new(0),
        })
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) -> u64 {
        self.session_clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Start a new viewer session and return its id.
    ///
    /// Idle sessions are swept first, and the least recently used ones are
    /// evicted while the map is at capacity.
    pub fn create_session(&self) -> String {
        use rand::Rng;

        let id: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        let viewer = Arc::new(ViewerController::new(self.source.clone(), self.backend.clone()));

        let mut sessions = self.sessions();
        self.evict(&mut sessions);
        sessions.insert(
            id.clone(),
            Session {
                viewer,
                touched: Instant::now(),
                last_used: self.tick(),
            },
        );
        id
    }

    fn evict(&self, sessions: &mut HashMap<String, Session>) {
        let now = Instant::now();
        let idle = self.config.session_idle;
        sessions.retain(|id, session| {
            let live = now.duration_since(session.touched) < idle;
            if !live {
                debug!(session = %id, "expiring idle viewer session");
                session.viewer.close();
            }
            live
        });

        while !sessions.is_empty() && sessions.len() >= self.config.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            if let Some(session) = sessions.remove(&oldest) {
                debug!(session = %oldest, "evicting viewer session at capacity");
                session.viewer.close();
            }
        }
    }

    pub fn session(&self, id: &str) -> Option<Arc<ViewerController>> {
        let tick = self.tick();
        let mut sessions = self.sessions();
        let session = sessions.get_mut(id)?;
        session.touched = Instant::now();
        session.last_used = tick;
        Some(session.viewer.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    pub fn drop_session(&self, id: &str) -> bool {
        match self.sessions().remove(id) {
            Some(session) => {
                session.viewer.close();
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(handlers::index))
        .route("/case/{id}", get(handlers::case_page))
        // Case API
        .route("/api/health", get(handlers::health))
        .route("/api/cases", get(handlers::list_cases))
        .route("/api/cases/{id}", get(handlers::get_case))
        .route("/api/cases/{id}/pdf/{doc}", get(handlers::case_pdf))
        .route("/api/cases/{id}/citations", get(handlers::case_citations))
        .route("/api/cases/{id}/audit", get(handlers::case_audit))
        // Viewer sessions
        .route("/api/viewer", post(handlers::create_viewer))
        .route(
            "/api/viewer/{session}",
            get(handlers::viewer_snapshot).delete(handlers::delete_viewer),
        )
        .route("/api/viewer/{session}/open", post(handlers::viewer_open))
        .route("/api/viewer/{session}/navigate", post(handlers::viewer_navigate))
        .route("/api/viewer/{session}/key", post(handlers::viewer_key))
        .route("/api/viewer/{session}/close", post(handlers::viewer_close))
        .with_state(state)
}

// ============================================================================
// Helpers
// ============================================================================

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// Re-export commonly used types
pub use analysis::{extract_json_object, field_entries, AnalysisResult};
pub use audit::{audit_case, AuditStatus, CitationAudit};
pub use badges::{badges_for, render_badges_html, Badge};
pub use citations::{resolve, CitationIndex};
pub use error::Error;
pub use matcher::{locate, normalize, Haystack, MatchMode, MatchResult};
pub use models::{Citation, DocRole, DocumentRef};
pub use render::{PageRenderer, RenderOutcome, RenderedPage, TextLayerItem, Viewport};
pub use viewer::{ViewerKey, ViewerPhase, ViewerSnapshot, ViewerTarget};
