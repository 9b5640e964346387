//! PDF decoding seam.
//!
//! The page renderer and the viewer only talk to these traits. The production
//! implementation lives in `lopdf_backend`; tests substitute their own.
//!
//! ## Module Structure
//!
//! - `lopdf_backend` - decoder built on `lopdf` content-stream parsing
//! - `text_cache` - sled cache of extracted text runs

mod lopdf_backend;
mod text_cache;

pub use lopdf_backend::{LopdfBackend, LopdfDocument};
pub use text_cache::TextCache;

use crate::error::Result;
use crate::render::{RasterSurface, Viewport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Geometry
// ============================================================================

/// Affine transform `[a b c d e f]`, laid out the way PDF writes it.
pub type Matrix = [f64; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Compose two transforms: the result applies `inner` first, then `outer`.
pub fn concat(outer: &Matrix, inner: &Matrix) -> Matrix {
    [
        outer[0] * inner[0] + outer[2] * inner[1],
        outer[1] * inner[0] + outer[3] * inner[1],
        outer[0] * inner[2] + outer[2] * inner[3],
        outer[1] * inner[2] + outer[3] * inner[3],
        outer[0] * inner[4] + outer[2] * inner[5] + outer[4],
        outer[1] * inner[4] + outer[3] * inner[5] + outer[5],
    ]
}

pub fn translate(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Page bounds in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl ViewBox {
    /// US Letter, used when a page declares no usable MediaBox.
    pub const LETTER: ViewBox = ViewBox {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    /// Build from two corners given in any order.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// One run of text as the content stream shows it. `transform` maps the
/// run's unit glyph box into user space, with the font size folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub transform: Matrix,
}

// ============================================================================
// Decoder Traits
// ============================================================================

#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Decode a document from its raw bytes.
    async fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn PdfDocument>>;
}

#[async_trait]
pub trait PdfDocument: Send + Sync {
    fn page_count(&self) -> u32;

    /// Load a 1-indexed page.
    async fn page(&self, number: u32) -> Result<Box<dyn PdfPage>>;
}

#[async_trait]
pub trait PdfPage: Send + Sync {
    fn number(&self) -> u32;

    fn view_box(&self) -> ViewBox;

    /// Paint the page for `viewport` and describe the resulting surface.
    async fn draw(&self, viewport: &Viewport) -> Result<RasterSurface>;

    async fn text_content(&self) -> Result<Vec<TextRun>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_applies_inner_first() {
        let scale = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let shift = translate(10.0, 5.0);
        // shift then scale: (0,0) -> (10,5) -> (20,10)
        assert_eq!(concat(&scale, &shift), [2.0, 0.0, 0.0, 2.0, 20.0, 10.0]);
        // scale then shift: (0,0) -> (0,0) -> (10,5)
        assert_eq!(concat(&shift, &scale), [2.0, 0.0, 0.0, 2.0, 10.0, 5.0]);
        assert_eq!(concat(&IDENTITY, &shift), shift);
    }

    #[test]
    fn test_view_box_from_corners() {
        let vb = ViewBox::from_corners(612.0, 792.0, 0.0, 0.0);
        assert_eq!(vb, ViewBox::LETTER);
        assert_eq!(vb.width(), 612.0);
        assert_eq!(vb.height(), 792.0);
    }
}
