//! Viewer controller: one document viewer session.
//!
//! ```text
//!            open              load ok
//!  Closed ---------> Loading ----------> Ready <--+ prev / next / jump
//!    ^                  |                  |  ----+
//!    |                  | load failed      |
//!    |                  v                  |
//!    +------------- Error <----------------+ (close / Escape from any phase)
//! ```
//!
//! Every transition that starts a render advances the render generation
//! inside the same critical section that changes the page. Async work holds a
//! token for the generation it started under and re-checks it, under the state
//! lock, before committing anything. A render that lost the race is dropped.
//!
//! The state lock is a plain `std::sync::Mutex` and is never held across an
//! await.

use crate::cases::DocumentSource;
use crate::error::Result;
use crate::generation::{GenerationToken, RenderGeneration};
use crate::matcher::{MatchMode, MatchResult};
use crate::models::{Citation, DocumentRef};
use crate::pdf::{PdfBackend, PdfDocument};
use crate::render::{PageRenderer, RenderOutcome, RenderedPage};

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "viewer_test.rs"]
mod viewer_test;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerPhase {
    Closed,
    Loading,
    Ready,
    Error,
}

/// What a badge click asks the viewer to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerTarget {
    pub document: DocumentRef,
    pub citation: Citation,
    pub filename: Option<String>,
}

impl ViewerTarget {
    pub fn new(case_id: u64, citation: Citation, filename: Option<String>) -> Self {
        Self {
            document: DocumentRef::new(case_id, citation.doc),
            citation,
            filename,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl ViewerKey {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => ViewerKey::Escape,
            "ArrowLeft" | "Left" => ViewerKey::ArrowLeft,
            "ArrowRight" | "Right" => ViewerKey::ArrowRight,
            _ => ViewerKey::Other,
        }
    }
}

/// Outcome of matching the cited quote on the cited page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightView {
    pub matched: bool,
    pub mode: Option<MatchMode>,
    /// Text layer items to mark.
    pub owners: Vec<usize>,
    /// Item to scroll into view.
    pub scroll_to: Option<usize>,
}

impl From<MatchResult<usize>> for HighlightView {
    fn from(result: MatchResult<usize>) -> Self {
        Self {
            matched: result.is_found(),
            mode: result.mode(),
            owners: result.owners().to_vec(),
            scroll_to: result.owners().first().copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    #[serde(flatten)]
    pub rendered: RenderedPage,
    pub highlight: Option<HighlightView>,
}

/// Serializable picture of a session, as the dashboard script consumes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub phase: ViewerPhase,
    pub error: Option<String>,
    pub document: Option<DocumentRef>,
    pub filename: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub cited_page: Option<u32>,
    pub quote: Option<String>,
    pub generation: u64,
    pub loading: bool,
    pub page: Option<PageView>,
    pub page_error: Option<String>,
}

struct ViewerState {
    phase: ViewerPhase,
    error: Option<String>,
    target: Option<ViewerTarget>,
    doc: Option<Arc<dyn PdfDocument>>,
    current_page: u32,
    total_pages: u32,
    loading: bool,
    page: Option<PageView>,
    page_error: Option<String>,
}

impl ViewerState {
    fn closed() -> Self {
        Self {
            phase: ViewerPhase::Closed,
            error: None,
            target: None,
            doc: None,
            current_page: 1,
            total_pages: 0,
            loading: false,
            page: None,
            page_error: None,
        }
    }

    fn loading(target: ViewerTarget) -> Self {
        Self {
            phase: ViewerPhase::Loading,
            current_page: target.citation.page.max(1),
            target: Some(target),
            loading: true,
            ..Self::closed()
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct ViewerController {
    source: Arc<dyn DocumentSource>,
    backend: Arc<dyn PdfBackend>,
    renderer: PageRenderer,
    generation: RenderGeneration,
    state: Mutex<ViewerState>,
    /// Last decoded document. Survives close so reopening skips the fetch.
    loaded: Mutex<Option<(DocumentRef, Arc<dyn PdfDocument>)>>,
}

impl ViewerController {
    pub fn new(source: Arc<dyn DocumentSource>, backend: Arc<dyn PdfBackend>) -> Self {
        Self::with_renderer(source, backend, PageRenderer::default())
    }

    pub fn with_renderer(
        source: Arc<dyn DocumentSource>,
        backend: Arc<dyn PdfBackend>,
        renderer: PageRenderer,
    ) -> Self {
        Self {
            source,
            backend,
            renderer,
            generation: RenderGeneration::new(),
            state: Mutex::new(ViewerState::closed()),
            loaded: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, doc: &DocumentRef) -> Option<Arc<dyn PdfDocument>> {
        let loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        match loaded.as_ref() {
            Some((key, handle)) if key == doc => Some(handle.clone()),
            _ => None,
        }
    }

    /// Fetch and decode `doc`, or reuse the cached handle. The cache slot is
    /// only replaced while `token` is still current.
    async fn load(&self, doc: &DocumentRef, token: &GenerationToken) -> Result<Arc<dyn PdfDocument>> {
        if let Some(handle) = self.cached(doc) {
            debug!("reusing loaded document {}", doc);
            return Ok(handle);
        }

        let bytes = self.source.fetch(doc).await?;
        let handle = self.backend.open(bytes).await?;
        info!("loaded {} ({} pages)", doc, handle.page_count());

        let _state = self.lock();
        if token.is_current() {
            *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((*doc, handle.clone()));
        }
        Ok(handle)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Show `target`, starting on the cited page.
    pub async fn open(&self, target: ViewerTarget) {
        let document = target.document;
        let token = {
            let mut state = self.lock();
            *state = ViewerState::loading(target);
            self.generation.advance()
        };

        let doc = match self.load(&document, &token).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("failed to load {}: {}", document, e);
                let mut state = self.lock();
                if token.is_current() {
                    state.phase = ViewerPhase::Error;
                    state.error = Some(format!("Failed to load document: {}", e));
                    state.loading = false;
                }
                return;
            }
        };

        let page_number = {
            let mut state = self.lock();
            if !token.is_current() {
                debug!("open of {} superseded before ready", document);
                return;
            }
            let total = doc.page_count();
            state.total_pages = total;
            state.current_page = state.current_page.clamp(1, total.max(1));
            state.phase = ViewerPhase::Ready;
            state.doc = Some(doc.clone());
            state.current_page
        };

        self.render(doc, page_number, token).await;
    }

    pub async fn next(&self) {
        self.navigate(|current| current.saturating_add(1)).await;
    }

    pub async fn prev(&self) {
        self.navigate(|current| current.saturating_sub(1)).await;
    }

    /// Go to `page`, clamped to the document.
    pub async fn jump(&self, page: u32) {
        self.navigate(move |_| page).await;
    }

    async fn navigate(&self, step: impl FnOnce(u32) -> u32) {
        let (doc, page_number, token) = {
            let mut state = self.lock();
            if state.phase != ViewerPhase::Ready {
                return;
            }
            let Some(doc) = state.doc.clone() else {
                return;
            };
            let target = step(state.current_page).clamp(1, state.total_pages.max(1));
            if target == state.current_page {
                return;
            }
            state.current_page = target;
            state.page = None;
            state.page_error = None;
            state.loading = true;
            (doc, target, self.generation.advance())
        };

        self.render(doc, page_number, token).await;
    }

    /// Close from any phase. In-flight work becomes stale.
    pub fn close(&self) {
        let mut state = self.lock();
        self.generation.advance();
        *state = ViewerState::closed();
    }

    pub async fn handle_key(&self, key: ViewerKey) {
        if self.lock().phase == ViewerPhase::Closed {
            return;
        }
        match key {
            ViewerKey::Escape => self.close(),
            ViewerKey::ArrowLeft => self.prev().await,
            ViewerKey::ArrowRight => self.next().await,
            ViewerKey::Other => {}
        }
    }

    async fn render(&self, doc: Arc<dyn PdfDocument>, page_number: u32, token: GenerationToken) {
        let outcome = self
            .renderer
            .render_page(doc.as_ref(), page_number, &token)
            .await;

        // Matching only runs on the cited page. An empty quote never matches.
        let quote = {
            let state = self.lock();
            state
                .target
                .as_ref()
                .filter(|t| t.citation.page == page_number)
                .map(|t| t.citation.quote.clone())
        };

        let outcome = outcome.map(|o| match o {
            RenderOutcome::Rendered(rendered) => {
                let highlight = quote.map(|q| HighlightView::from(rendered.locate(&q)));
                Some(PageView {
                    rendered,
                    highlight,
                })
            }
            RenderOutcome::Superseded => None,
        });

        let mut state = self.lock();
        if !token.is_current() {
            debug!(page = page_number, "dropping stale render");
            return;
        }
        state.loading = false;
        match outcome {
            Ok(Some(view)) => {
                state.page = Some(view);
                state.page_error = None;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(page = page_number, "page render failed: {}", e);
                state.page = None;
                state.page_error = Some(format!("Failed to render page {}: {}", page_number, e));
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn phase(&self) -> ViewerPhase {
        self.lock().phase
    }

    pub fn current_page(&self) -> u32 {
        self.lock().current_page
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        let state = self.lock();
        let target = state.target.as_ref();
        ViewerSnapshot {
            phase: state.phase,
            error: state.error.clone(),
            document: target.map(|t| t.document),
            filename: target.and_then(|t| t.filename.clone()),
            current_page: state.current_page,
            total_pages: state.total_pages,
            cited_page: target.map(|t| t.citation.page),
            quote: target.map(|t| t.citation.quote.clone()),
            generation: self.generation.current(),
            loading: state.loading,
            page: state.page.clone(),
            page_error: state.page_error.clone(),
        }
    }
}
