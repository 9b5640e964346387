//! Page rendering.
//!
//! A page is scaled so its width matches the viewer's target width, painted,
//! and overlaid with one positioned item per text run. The positioning math
//! follows the browser-side text layer exactly, so a highlight computed here
//! lands on the same spans the client draws.
//!
//! Rendering is interruptible: the caller's generation token is checked after
//! every await, and a stale token turns the result into `Superseded`.

use crate::error::Result;
use crate::generation::GenerationToken;
use crate::matcher::{Haystack, MatchResult};
use crate::pdf::{concat, Matrix, PdfDocument, TextRun, ViewBox};

use serde::Serialize;
use tracing::debug;

/// Width, in CSS pixels, every page is scaled to.
pub const TARGET_WIDTH: f64 = 800.0;

// ============================================================================
// Viewport
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    /// Maps user space (y up) to device space (y down).
    pub transform: Matrix,
}

impl Viewport {
    pub fn new(view_box: ViewBox, scale: f64) -> Self {
        Self {
            scale,
            width: view_box.width() * scale,
            height: view_box.height() * scale,
            transform: [
                scale,
                0.0,
                0.0,
                -scale,
                -view_box.x0 * scale,
                view_box.y1 * scale,
            ],
        }
    }

    /// Scale so the page is exactly `target_width` wide.
    pub fn fit_width(view_box: ViewBox, target_width: f64) -> Self {
        let width = view_box.width();
        let scale = if width > 0.0 { target_width / width } else { 1.0 };
        Self::new(view_box, scale)
    }
}

/// Pixel surface a page was painted on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RasterSurface {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl RasterSurface {
    pub fn for_viewport(viewport: &Viewport) -> Self {
        Self {
            width: viewport.width.floor().max(0.0) as u32,
            height: viewport.height.floor().max(0.0) as u32,
            scale: viewport.scale,
        }
    }
}

// ============================================================================
// Text Layer
// ============================================================================

/// Top-left corner of a text item in device pixels, plus its rendered size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayerItem {
    pub text: String,
    pub bbox: BoundingBox,
    /// Index of this item in the page's text layer.
    pub owner: usize,
}

/// Place one run on the page.
pub fn position_text_run(viewport: &Viewport, run: &TextRun, owner: usize) -> TextLayerItem {
    let tx = concat(&viewport.transform, &run.transform);
    let font_size = tx[2].hypot(tx[3]);
    TextLayerItem {
        text: run.text.clone(),
        bbox: BoundingBox {
            x: tx[4],
            y: tx[5] - font_size,
            font_size,
        },
        owner,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPage {
    pub page_number: u32,
    pub surface: RasterSurface,
    pub items: Vec<TextLayerItem>,
}

impl RenderedPage {
    pub fn haystack(&self) -> Haystack<usize> {
        Haystack::build(self.items.iter().map(|item| (item.text.as_str(), item.owner)))
    }

    /// Find `quote` in this page's text layer.
    pub fn locate(&self, quote: &str) -> MatchResult<usize> {
        self.haystack().locate(quote)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderedPage),
    /// A newer request took over while this one was in flight.
    Superseded,
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct PageRenderer {
    pub target_width: f64,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self {
            target_width: TARGET_WIDTH,
        }
    }
}

impl PageRenderer {
    pub fn new(target_width: f64) -> Self {
        Self { target_width }
    }

    pub async fn render_page(
        &self,
        doc: &dyn PdfDocument,
        page_number: u32,
        guard: &GenerationToken,
    ) -> Result<RenderOutcome> {
        let page = doc.page(page_number).await?;
        if !guard.is_current() {
            debug!(page = page_number, "render superseded after page load");
            return Ok(RenderOutcome::Superseded);
        }

        let viewport = Viewport::fit_width(page.view_box(), self.target_width);
        let surface = page.draw(&viewport).await?;
        if !guard.is_current() {
            debug!(page = page_number, "render superseded after draw");
            return Ok(RenderOutcome::Superseded);
        }

        let runs = page.text_content().await?;
        if !guard.is_current() {
            debug!(page = page_number, "render superseded after text extraction");
            return Ok(RenderOutcome::Superseded);
        }

        let items = runs
            .iter()
            .filter(|run| !run.text.is_empty())
            .enumerate()
            .map(|(owner, run)| position_text_run(&viewport, run, owner))
            .collect();

        Ok(RenderOutcome::Rendered(RenderedPage {
            page_number,
            surface,
            items,
        }))
    }
}
