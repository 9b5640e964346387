//! Document decoding with `lopdf`.
//!
//! Rust decodes page geometry and positioned text; pixels are painted by the
//! browser at the size `draw` reports. Text positions come from walking the
//! page content stream's text operators. Glyph widths are not read from font
//! programs: a run's advance is estimated at half an em per character, which
//! only affects where a second `Tj` on the same line starts when no
//! positioning operator precedes it.
//!
//! Strings are decoded as UTF-16BE when they carry a byte-order mark and as
//! Latin-1 otherwise. Composite (two-byte CID) fonts therefore come out
//! garbled; such pages render fine but their quotes will not match.

use super::{concat, translate, Matrix, PdfBackend, PdfDocument, PdfPage, TextCache, TextRun, ViewBox, IDENTITY};
use crate::error::{Error, Result};
use crate::render::{RasterSurface, Viewport};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

/// Estimated glyph advance, in ems.
const GLYPH_ADVANCE_EM: f64 = 0.5;

/// TJ adjustments more negative than this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f64 = -200.0;

/// Guard against malformed page trees with parent cycles.
const MAX_TREE_DEPTH: usize = 32;

// ============================================================================
// Backend
// ============================================================================

#[derive(Clone, Default)]
pub struct LopdfBackend {
    cache: Option<TextCache>,
}

impl LopdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: TextCache) -> Self {
        Self { cache: Some(cache) }
    }
}

#[async_trait]
impl PdfBackend for LopdfBackend {
    async fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn PdfDocument>> {
        let cache = self.cache.clone();
        let doc = tokio::task::spawn_blocking(move || LopdfDocument::parse(&bytes, cache))
            .await
            .map_err(|e| Error::Decode(format!("decoder task failed: {}", e)))??;
        Ok(Arc::new(doc))
    }
}

// ============================================================================
// Document
// ============================================================================

pub struct LopdfDocument {
    inner: Arc<Document>,
    pages: Vec<ObjectId>,
    fingerprint: String,
    cache: Option<TextCache>,
}

impl LopdfDocument {
    pub fn parse(bytes: &[u8], cache: Option<TextCache>) -> Result<Self> {
        let fingerprint = format!("{:x}", Sha256::digest(bytes));
        let inner = Document::load_mem(bytes).map_err(|e| Error::Decode(e.to_string()))?;

        // get_pages is keyed by page number, so values come out in page order
        let pages: Vec<ObjectId> = inner.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(Error::Decode("document has no pages".to_string()));
        }

        Ok(Self {
            inner: Arc::new(inner),
            pages,
            fingerprint,
            cache,
        })
    }

    /// SHA-256 of the source bytes, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[async_trait]
impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page(&self, number: u32) -> Result<Box<dyn PdfPage>> {
        let id = number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .copied()
            .ok_or(Error::PageOutOfRange {
                page: number,
                total: self.page_count(),
            })?;

        Ok(Box::new(LopdfPage {
            doc: self.inner.clone(),
            id,
            number,
            view_box: media_box(&self.inner, id),
            fingerprint: self.fingerprint.clone(),
            cache: self.cache.clone(),
        }))
    }
}

// ============================================================================
// Page
// ============================================================================

struct LopdfPage {
    doc: Arc<Document>,
    id: ObjectId,
    number: u32,
    view_box: ViewBox,
    fingerprint: String,
    cache: Option<TextCache>,
}

fn page_operations(doc: &Document, id: ObjectId) -> Result<Vec<Operation>> {
    let data = doc.get_page_content(id)?;
    Ok(Content::decode(&data)?.operations)
}

#[async_trait]
impl PdfPage for LopdfPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn view_box(&self) -> ViewBox {
        self.view_box
    }

    async fn draw(&self, viewport: &Viewport) -> Result<RasterSurface> {
        // A page whose content stream does not decode cannot be painted either
        let doc = self.doc.clone();
        let id = self.id;
        tokio::task::spawn_blocking(move || page_operations(&doc, id))
            .await
            .map_err(|e| Error::Decode(format!("decoder task failed: {}", e)))??;
        Ok(RasterSurface::for_viewport(viewport))
    }

    async fn text_content(&self) -> Result<Vec<TextRun>> {
        if let Some(cache) = &self.cache {
            if let Some(runs) = cache.get(&self.fingerprint, self.number) {
                debug!(page = self.number, "text layer cache hit");
                return Ok(runs);
            }
        }

        let doc = self.doc.clone();
        let id = self.id;
        let runs = tokio::task::spawn_blocking(move || {
            page_operations(&doc, id).map(|ops| extract_runs(&ops))
        })
        .await
        .map_err(|e| Error::Decode(format!("decoder task failed: {}", e)))??;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&self.fingerprint, self.number, &runs) {
                warn!(page = self.number, "failed to cache text layer: {}", e);
            }
        }
        Ok(runs)
    }
}

// ============================================================================
// MediaBox
// ============================================================================

/// MediaBox of a page, inherited through the page tree, US Letter if absent.
fn media_box(doc: &Document, page_id: ObjectId) -> ViewBox {
    let mut current = doc.get_dictionary(page_id).ok();
    let mut depth = 0;

    while let Some(dict) = current {
        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Some(vb) = parse_rect(doc, obj) {
                return vb;
            }
        }
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            break;
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .ok()
            .and_then(|id| doc.get_dictionary(id).ok());
    }

    ViewBox::LETTER
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn parse_rect(doc: &Document, obj: &Object) -> Option<ViewBox> {
    let arr = resolve(doc, obj)?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let v: Vec<f64> = arr
        .iter()
        .filter_map(|o| resolve(doc, o).and_then(number))
        .collect();
    if v.len() != 4 {
        return None;
    }
    let vb = ViewBox::from_corners(v[0], v[1], v[2], v[3]);
    if vb.width() <= 0.0 || vb.height() <= 0.0 {
        return None;
    }
    Some(vb)
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

// ============================================================================
// Text Runs
// ============================================================================

/// Text state parameters saved and restored by `q`/`Q` along with the CTM.
#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Default)]
struct TextWalker {
    gs: GraphicsState,
    saved: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    runs: Vec<TextRun>,
}

/// Positioned text runs of a decoded content stream, in stream order.
pub(crate) fn extract_runs(ops: &[Operation]) -> Vec<TextRun> {
    let mut walker = TextWalker {
        tm: IDENTITY,
        tlm: IDENTITY,
        ..Default::default()
    };
    for op in ops {
        walker.apply(op);
    }
    walker.runs
}

impl TextWalker {
    fn apply(&mut self, op: &Operation) {
        let nums: Vec<f64> = op.operands.iter().filter_map(number).collect();
        let num = |i: usize| nums.get(i).copied().unwrap_or(0.0);

        match op.operator.as_str() {
            "q" => self.saved.push(self.gs),
            "Q" => {
                if let Some(gs) = self.saved.pop() {
                    self.gs = gs;
                }
            }
            "cm" if nums.len() == 6 => {
                let m = [num(0), num(1), num(2), num(3), num(4), num(5)];
                self.gs.ctm = concat(&self.gs.ctm, &m);
            }
            "BT" => {
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "Tf" => self.gs.font_size = num(0),
            "Tc" => self.gs.char_spacing = num(0),
            "Tw" => self.gs.word_spacing = num(0),
            "Tz" => self.gs.h_scale = num(0) / 100.0,
            "TL" => self.gs.leading = num(0),
            "Ts" => self.gs.rise = num(0),
            "Td" => self.move_line(num(0), num(1)),
            "TD" => {
                self.gs.leading = -num(1);
                self.move_line(num(0), num(1));
            }
            "Tm" if nums.len() == 6 => {
                self.tlm = [num(0), num(1), num(2), num(3), num(4), num(5)];
                self.tm = self.tlm;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(string_operand) {
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(text) = op.operands.first().and_then(string_operand) {
                    self.show(text);
                }
            }
            "\"" => {
                self.gs.word_spacing = num(0);
                self.gs.char_spacing = num(1);
                self.next_line();
                if let Some(text) = op.operands.get(2).and_then(string_operand) {
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = op.operands.first() {
                    self.show_array(parts);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = concat(&self.tlm, &translate(tx, ty));
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.gs.leading;
        self.move_line(0.0, -leading);
    }

    /// Transform of a run starting at the current text position.
    fn run_transform(&self) -> Matrix {
        let gs = &self.gs;
        let font = [gs.font_size * gs.h_scale, 0.0, 0.0, gs.font_size, 0.0, gs.rise];
        concat(&gs.ctm, &concat(&self.tm, &font))
    }

    fn advance_for(&self, text: &str) -> f64 {
        let gs = &self.gs;
        let chars = text.chars().count() as f64;
        let spaces = text.chars().filter(|c| *c == ' ').count() as f64;
        (chars * (GLYPH_ADVANCE_EM * gs.font_size + gs.char_spacing) + spaces * gs.word_spacing)
            * gs.h_scale
    }

    fn advance(&mut self, tx: f64) {
        self.tm = concat(&self.tm, &translate(tx, 0.0));
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let transform = self.run_transform();
        let tx = self.advance_for(&text);
        self.runs.push(TextRun { text, transform });
        self.advance(tx);
    }

    fn show_array(&mut self, parts: &[Object]) {
        let transform = self.run_transform();
        let mut text = String::new();

        for part in parts {
            if let Some(s) = string_operand(part) {
                let tx = self.advance_for(&s);
                text.push_str(&s);
                self.advance(tx);
            } else if let Some(adjust) = number(part) {
                let tx = -adjust / 1000.0 * self.gs.font_size * self.gs.h_scale;
                self.advance(tx);
                if adjust < TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }

        if !text.is_empty() {
            self.runs.push(TextRun { text, transform });
        }
    }
}

fn string_operand(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn s(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    #[test]
    fn test_td_and_tj_position_run() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
            op("Td", vec![Object::Integer(72), Object::Integer(700)]),
            op("Tj", vec![s("Claims Deadline")]),
            op("ET", vec![]),
        ];
        let runs = extract_runs(&ops);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Claims Deadline");
        assert_eq!(runs[0].transform, [12.0, 0.0, 0.0, 12.0, 72.0, 700.0]);
    }

    #[test]
    fn test_leading_moves_next_line_down() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("TL", vec![Object::Integer(14)]),
            op("Td", vec![Object::Integer(50), Object::Integer(600)]),
            op("Tj", vec![s("first")]),
            op("T*", vec![]),
            op("Tj", vec![s("second")]),
            op("ET", vec![]),
        ];
        let runs = extract_runs(&ops);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].transform[4], 50.0);
        assert_eq!(runs[1].transform[5], 586.0);
    }

    #[test]
    fn test_cm_and_q_restore() {
        let ops = vec![
            op("q", vec![]),
            op("cm", vec![Object::Integer(2), Object::Integer(0), Object::Integer(0), Object::Integer(2), Object::Integer(0), Object::Integer(0)]),
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("Td", vec![Object::Integer(10), Object::Integer(10)]),
            op("Tj", vec![s("scaled")]),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Td", vec![Object::Integer(10), Object::Integer(10)]),
            op("Tj", vec![s("plain")]),
            op("ET", vec![]),
        ];
        let runs = extract_runs(&ops);
        assert_eq!(runs[0].transform, [20.0, 0.0, 0.0, 20.0, 20.0, 20.0]);
        // Font size is part of the saved state and restored by Q
        assert_eq!(runs[1].transform, [0.0, 0.0, 0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_tj_array_inserts_word_gaps() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
            op(
                "TJ",
                vec![Object::Array(vec![s("March"), Object::Integer(-250), s("1,"), Object::Integer(-20), s(" 2026")])],
            ),
            op("ET", vec![]),
        ];
        let runs = extract_runs(&ops);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "March 1, 2026");
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, 0x24, 0x00, 0x35];
        assert_eq!(decode_pdf_string(&bytes), "$5");
        assert_eq!(decode_pdf_string(b"caf\xe9"), "caf\u{e9}");
    }
}
