//! Shared fixtures: in-memory PDFs and on-disk case directories.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream};
use std::fs;
use std::path::Path;

fn escape_pdf_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Content stream showing one line per entry, top to bottom from (72, 700).
fn page_content(lines: &[&str]) -> String {
    let mut content = String::from("BT /F1 12 Tf 14 TL 72 700 Td");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            content.push_str(" T*");
        }
        content.push_str(&format!(" ({}) Tj", escape_pdf_text(line)));
    }
    content.push_str(" ET");
    content
}

fn media_box(width: i64, height: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ])
}

fn build(pages: &[Vec<&str>], page_box: Option<(i64, i64)>, tree_box: Option<(i64, i64)>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let catalog_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for lines in pages {
        let page_id = doc.new_object_id();
        let content_id = doc.new_object_id();
        doc.objects.insert(
            content_id,
            Object::Stream(Stream::new(Dictionary::new(), page_content(lines).into_bytes())),
        );

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set("Contents", Object::Reference(content_id));
        if let Some((w, h)) = page_box {
            page_dict.set("MediaBox", media_box(w, h));
        }
        doc.objects.insert(page_id, Object::Dictionary(page_dict));
        page_ids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(pages.len() as i64));
    pages_dict.set("Kids", Object::Array(page_ids));
    if let Some((w, h)) = tree_box {
        pages_dict.set("MediaBox", media_box(w, h));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Letter-sized PDF, one inner vec of text lines per page.
pub fn letter_pdf(pages: &[Vec<&str>]) -> Vec<u8> {
    build(pages, Some((612, 792)), None)
}

/// PDF whose pages inherit their MediaBox from the page tree root.
pub fn inherited_box_pdf(pages: &[Vec<&str>], width: i64, height: i64) -> Vec<u8> {
    build(pages, None, Some((width, height)))
}

/// Six-page settlement agreement with the claims deadline on page 4.
pub fn settlement_pdf() -> Vec<u8> {
    letter_pdf(&[
        vec!["SETTLEMENT AGREEMENT", "Doe v. Acme Corp."],
        vec!["1. Definitions"],
        vec!["2. Settlement Fund", "The Gross Settlement Amount is $4,500,000."],
        vec![
            "3. Claims",
            "Class Members must submit claims by the",
            "Claims   Deadline of March 1, 2026.",
        ],
        vec!["4. Release"],
        vec!["5. Miscellaneous"],
    ])
}

pub fn bid_pdf() -> Vec<u8> {
    letter_pdf(&[
        vec!["ADMINISTRATION BID"],
        vec!["Notice will be mailed within 30 days of preliminary approval."],
    ])
}

/// Write case `id` under `root` with the given analysis payload.
pub fn write_case(root: &Path, id: u64, analysis: &serde_json::Value, with_bid: bool) {
    let dir = root.join(id.to_string());
    fs::create_dir_all(&dir).unwrap();
    let bid_filename = if with_bid { Some("Admin_Bid.pdf") } else { None };
    let meta = serde_json::json!({
        "id": id,
        "created_at": "2026-02-01T10:00:00Z",
        "settlement_filename": "Doe_Settlement.pdf",
        "bid_filename": bid_filename,
        "analysis_status": "completed"
    });
    fs::write(dir.join("case.json"), meta.to_string()).unwrap();
    fs::write(dir.join("analysis.json"), analysis.to_string()).unwrap();
    fs::write(dir.join("settlement.pdf"), settlement_pdf()).unwrap();
    if with_bid {
        fs::write(dir.join("bid.pdf"), bid_pdf()).unwrap();
    }
}

pub fn sample_analysis() -> serde_json::Value {
    serde_json::json!({
        "case_header": {"case_name": "Doe v. Acme Corp.", "case_number": "2:24-cv-01234"},
        "timeline": {
            "claims_deadline": "March 1, 2026",
            "notice_deadline": "30 days after preliminary approval"
        },
        "fund_logistics": {"gross_settlement": "$4,500,000"},
        "citations": {
            "timeline.claims_deadline": [
                {"doc": "settlement", "page": 4, "quote": "submit claims by the Claims Deadline of March 1, 2026"}
            ],
            "notice_deadline": [
                {"doc": "bid", "page": 2, "quote": "mailed within 30 days"}
            ],
            "fund_logistics.gross_settlement": [
                {"doc": "settlement", "page": 3, "quote": "Gross Settlement Amount is $4,500,000"},
                {"doc": "settlement", "page": 40, "quote": "appendix"}
            ]
        }
    })
}
