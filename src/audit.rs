//! Citation audit: check every citation of a case against its source page.
//!
//! Runs the same matcher the viewer uses, without rendering, so a case can be
//! reviewed for broken citations before anyone clicks a badge.

use crate::cases::DocumentSource;
use crate::citations::CitationIndex;
use crate::matcher::{Haystack, MatchMode, MatchResult};
use crate::models::{Citation, DocRole, DocumentRef};
use crate::pdf::{PdfBackend, PdfDocument, TextRun};

use futures_util::future::join;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Exact,
    Fuzzy,
    Unmatched,
    PageOutOfRange,
    DocumentUnavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub path: String,
    pub citation: Citation,
    pub status: AuditStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditTotals {
    pub total: usize,
    pub exact: usize,
    pub fuzzy: usize,
    pub unmatched: usize,
    pub page_out_of_range: usize,
    pub document_unavailable: usize,
}

impl AuditTotals {
    fn count(&mut self, status: AuditStatus) {
        self.total += 1;
        match status {
            AuditStatus::Exact => self.exact += 1,
            AuditStatus::Fuzzy => self.fuzzy += 1,
            AuditStatus::Unmatched => self.unmatched += 1,
            AuditStatus::PageOutOfRange => self.page_out_of_range += 1,
            AuditStatus::DocumentUnavailable => self.document_unavailable += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CitationAudit {
    pub case_id: u64,
    pub entries: Vec<AuditEntry>,
    pub totals: AuditTotals,
}

type Opened = Option<std::result::Result<Arc<dyn PdfDocument>, String>>;

async fn open_document(
    wanted: bool,
    source: &dyn DocumentSource,
    backend: &dyn PdfBackend,
    doc: DocumentRef,
) -> Opened {
    if !wanted {
        return None;
    }
    let result = match source.fetch(&doc).await {
        Ok(bytes) => backend.open(bytes).await,
        Err(e) => Err(e),
    };
    Some(result.map_err(|e| {
        warn!("audit could not open {}: {}", doc, e);
        e.to_string()
    }))
}

/// Audit every `(path, citation)` pair of `index`, in index order.
pub async fn audit_case(
    index: &CitationIndex,
    source: &dyn DocumentSource,
    backend: &dyn PdfBackend,
    case_id: u64,
) -> CitationAudit {
    let wants = |role: DocRole| index.iter().any(|(_, c)| c.doc == role);

    let (primary, secondary) = join(
        open_document(
            wants(DocRole::Primary),
            source,
            backend,
            DocumentRef::new(case_id, DocRole::Primary),
        ),
        open_document(
            wants(DocRole::Secondary),
            source,
            backend,
            DocumentRef::new(case_id, DocRole::Secondary),
        ),
    )
    .await;

    let mut page_text: HashMap<(DocRole, u32), std::result::Result<Vec<TextRun>, String>> =
        HashMap::new();
    let mut entries = Vec::new();
    let mut totals = AuditTotals::default();

    for (path, citation) in index.iter() {
        let opened = match citation.doc {
            DocRole::Primary => &primary,
            DocRole::Secondary => &secondary,
        };

        let (status, detail) = match opened {
            None => (AuditStatus::DocumentUnavailable, None),
            Some(Err(msg)) => (AuditStatus::DocumentUnavailable, Some(msg.clone())),
            Some(Ok(doc)) if citation.page > doc.page_count() => (
                AuditStatus::PageOutOfRange,
                Some(format!("document has {} pages", doc.page_count())),
            ),
            Some(Ok(doc)) => {
                let key = (citation.doc, citation.page);
                if !page_text.contains_key(&key) {
                    let runs = match doc.page(citation.page).await {
                        Ok(page) => page.text_content().await.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    page_text.insert(key, runs);
                }
                match page_text.get(&key) {
                    Some(Ok(runs)) => match_status(runs, &citation.quote),
                    Some(Err(msg)) => (AuditStatus::Unmatched, Some(msg.clone())),
                    None => (AuditStatus::Unmatched, None),
                }
            }
        };

        totals.count(status);
        entries.push(AuditEntry {
            path: path.to_string(),
            citation: citation.clone(),
            status,
            detail,
        });
    }

    info!(
        case_id,
        total = totals.total,
        exact = totals.exact,
        fuzzy = totals.fuzzy,
        "citation audit finished"
    );

    CitationAudit {
        case_id,
        entries,
        totals,
    }
}

fn match_status(runs: &[TextRun], quote: &str) -> (AuditStatus, Option<String>) {
    let haystack = Haystack::build(runs.iter().enumerate().map(|(i, r)| (r.text.as_str(), i)));
    match haystack.locate(quote) {
        MatchResult::Found {
            mode: MatchMode::Exact,
            ..
        } => (AuditStatus::Exact, None),
        MatchResult::Found {
            mode: MatchMode::Fuzzy,
            ..
        } => (AuditStatus::Fuzzy, None),
        MatchResult::NotFound => (AuditStatus::Unmatched, None),
    }
}
