//! Case store and document sources.
//!
//! A case is a directory under the cases root:
//!
//! ```text
//! cases/<id>/case.json       metadata (CaseMeta)
//! cases/<id>/analysis.json   structured analysis, or the raw model response
//! cases/<id>/settlement.pdf  primary document
//! cases/<id>/bid.pdf         secondary document, optional
//! ```

use crate::analysis::AnalysisResult;
use crate::error::{Error, Result};
use crate::models::{CaseDetail, CaseMeta, CaseSummary, DocRole, DocumentRef};

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use walkdir::WalkDir;

pub const CASE_FILE: &str = "case.json";
pub const ANALYSIS_FILE: &str = "analysis.json";

/// Request timeout for remote document fetches.
const FETCH_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Cases
// ============================================================================

#[derive(Debug, Clone)]
pub struct Case {
    pub meta: CaseMeta,
    pub dir: PathBuf,
    pub analysis: Option<AnalysisResult>,
}

impl Case {
    pub fn id(&self) -> u64 {
        self.meta.id
    }

    pub fn summary(&self) -> CaseSummary {
        let a = self.analysis.as_ref();
        CaseSummary {
            id: self.meta.id,
            created_at: self.meta.created_at,
            settlement_filename: self.meta.settlement_filename.clone(),
            bid_filename: self.meta.bid_filename.clone(),
            has_bid: self.meta.bid_filename.is_some(),
            analysis_status: self.meta.analysis_status,
            case_name: a.and_then(|a| a.case_name()),
            case_number: a.and_then(|a| a.case_number()),
            jurisdiction: a.and_then(|a| a.jurisdiction()),
            settlement_type: a.and_then(|a| a.settlement_type()),
        }
    }

    pub fn detail(&self) -> CaseDetail {
        CaseDetail {
            summary: self.summary(),
            analysis_json: self.analysis.as_ref().map(|a| a.payload.clone()),
            analysis_error: self.meta.analysis_error.clone(),
        }
    }

    /// Uploaded filename for a role, shown in the viewer header.
    pub fn filename(&self, role: DocRole) -> Option<&str> {
        match role {
            DocRole::Primary => Some(self.meta.settlement_filename.as_str()),
            DocRole::Secondary => self.meta.bid_filename.as_deref(),
        }
    }

    pub fn document_path(&self, role: DocRole) -> Option<PathBuf> {
        if role == DocRole::Secondary && self.meta.bid_filename.is_none() {
            return None;
        }
        let path = self.dir.join(role.file_name());
        path.is_file().then_some(path)
    }
}

fn load_case(case_file: &Path) -> Result<Case> {
    let dir = case_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let meta: CaseMeta = serde_json::from_str(&fs::read_to_string(case_file)?)?;

    let analysis_path = dir.join(ANALYSIS_FILE);
    let analysis = if analysis_path.is_file() {
        let raw = fs::read_to_string(&analysis_path)?;
        // Stored either as clean JSON or as the raw model response
        let analysis = match serde_json::from_str(&raw) {
            Ok(value) => AnalysisResult::from_value(value),
            Err(_) => AnalysisResult::from_response(&raw)?,
        };
        Some(analysis)
    } else {
        None
    };

    Ok(Case {
        meta,
        dir,
        analysis,
    })
}

// ============================================================================
// Case Store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CaseStore {
    root: PathBuf,
    cases: Vec<Case>,
}

impl CaseStore {
    /// Load every case under `root`, newest first. Unreadable cases are skipped.
    pub fn load(root: &Path) -> Self {
        use rayon::prelude::*;

        let paths: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() == CASE_FILE)
            .map(|e| e.path().to_path_buf())
            .collect();

        let mut cases: Vec<Case> = paths
            .par_iter()
            .filter_map(|path| match load_case(path) {
                Ok(case) => Some(case),
                Err(e) => {
                    warn!("skipping case {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        cases.sort_by(|a, b| {
            b.meta
                .created_at
                .cmp(&a.meta.created_at)
                .then(b.meta.id.cmp(&a.meta.id))
        });
        info!("loaded {} cases from {}", cases.len(), root.display());

        Self {
            root: root.to_path_buf(),
            cases,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn get(&self, id: u64) -> Result<&Case> {
        self.cases
            .iter()
            .find(|c| c.meta.id == id)
            .ok_or(Error::CaseNotFound(id))
    }

    /// On-disk location of a case document.
    pub fn document_path(&self, doc: &DocumentRef) -> Result<PathBuf> {
        self.get(doc.case_id)?
            .document_path(doc.role)
            .ok_or_else(|| Error::Fetch(format!("no {} document for case {}", doc.role, doc.case_id)))
    }
}

// ============================================================================
// Document Sources
// ============================================================================

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, doc: &DocumentRef) -> Result<Vec<u8>>;
}

/// Reads documents straight from the case directories.
pub struct LocalDocumentSource {
    store: Arc<CaseStore>,
}

impl LocalDocumentSource {
    pub fn new(store: Arc<CaseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentSource for LocalDocumentSource {
    async fn fetch(&self, doc: &DocumentRef) -> Result<Vec<u8>> {
        let path = self.store.document_path(doc)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", path.display(), e)))
    }
}

/// Fetches documents from a remote document fetch endpoint.
pub struct HttpDocumentSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpDocumentSource {
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, base })
    }

    pub fn url_for(&self, doc: &DocumentRef) -> Result<Url> {
        self.base
            .join(&doc.fetch_path())
            .map_err(|e| Error::Fetch(format!("bad document url: {}", e)))
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch(&self, doc: &DocumentRef) -> Result<Vec<u8>> {
        let url = self.url_for(doc)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!("{}: HTTP {}", url, response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisStatus;

    fn write_case(root: &Path, id: u64, created: &str, bid: bool) -> PathBuf {
        let dir = root.join(id.to_string());
        fs::create_dir_all(&dir).unwrap();
        let bid_filename = if bid { Some("bid.pdf") } else { None };
        let meta = serde_json::json!({
            "id": id,
            "created_at": created,
            "settlement_filename": format!("settlement-{}.pdf", id),
            "bid_filename": bid_filename,
            "analysis_status": "completed"
        });
        fs::write(dir.join(CASE_FILE), meta.to_string()).unwrap();
        fs::write(dir.join("settlement.pdf"), b"%PDF-1.4").unwrap();
        dir
    }

    #[test]
    fn test_load_sorts_newest_first_and_skips_broken() {
        let tmp = tempfile::tempdir().unwrap();
        write_case(tmp.path(), 1, "2026-01-01T00:00:00Z", false);
        write_case(tmp.path(), 2, "2026-03-01T00:00:00Z", true);
        let broken = tmp.path().join("3");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(CASE_FILE), "{").unwrap();

        let store = CaseStore::load(tmp.path());
        let ids: Vec<u64> = store.cases().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(store.get(1).unwrap().meta.analysis_status, AnalysisStatus::Completed);
        assert!(matches!(store.get(3), Err(Error::CaseNotFound(3))));
    }

    #[test]
    fn test_analysis_from_raw_response() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_case(tmp.path(), 7, "2026-01-01T00:00:00Z", false);
        fs::write(
            dir.join(ANALYSIS_FILE),
            "Sure! ```json\n{\"case_header\": {\"case_name\": \"Doe v. Acme\"}}\n```",
        )
        .unwrap();

        let store = CaseStore::load(tmp.path());
        let summary = store.get(7).unwrap().summary();
        assert_eq!(summary.case_name.as_deref(), Some("Doe v. Acme"));
        assert!(!summary.has_bid);
    }

    #[test]
    fn test_document_path_for_missing_bid() {
        let tmp = tempfile::tempdir().unwrap();
        write_case(tmp.path(), 4, "2026-01-01T00:00:00Z", false);
        let store = CaseStore::load(tmp.path());

        assert!(store.document_path(&DocumentRef::new(4, DocRole::Primary)).is_ok());
        assert!(matches!(
            store.document_path(&DocumentRef::new(4, DocRole::Secondary)),
            Err(Error::Fetch(_))
        ));
        assert!(matches!(
            store.document_path(&DocumentRef::new(9, DocRole::Primary)),
            Err(Error::CaseNotFound(9))
        ));
    }

    #[tokio::test]
    async fn test_local_source_reads_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        write_case(tmp.path(), 5, "2026-01-01T00:00:00Z", false);
        let source = LocalDocumentSource::new(Arc::new(CaseStore::load(tmp.path())));
        let bytes = source.fetch(&DocumentRef::new(5, DocRole::Primary)).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[test]
    fn test_http_source_url() {
        let base = Url::parse("http://docs.internal:8080/").unwrap();
        let source = HttpDocumentSource::new(base).unwrap();
        let url = source.url_for(&DocumentRef::new(12, DocRole::Secondary)).unwrap();
        assert_eq!(url.as_str(), "http://docs.internal:8080/api/cases/12/pdf/bid");
    }
}
