//! Data models for the settlement dashboard.
//!
//! This module contains the core data structures shared across the crate:
//! citations and document references, case metadata as stored on disk, and
//! the request/response bodies of the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ============================================================================
// Citations
// ============================================================================

/// Which of a case's two source documents a citation points into.
///
/// The upstream analysis names them `settlement` and `bid`; `primary` and
/// `secondary` are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocRole {
    #[serde(rename = "settlement", alias = "primary")]
    Primary,
    #[serde(rename = "bid", alias = "secondary")]
    Secondary,
}

impl DocRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocRole::Primary => "settlement",
            DocRole::Secondary => "bid",
        }
    }

    /// Human label used in the viewer header and badge tooltips.
    pub fn label(&self) -> &'static str {
        match self {
            DocRole::Primary => "Settlement",
            DocRole::Secondary => "Bid",
        }
    }

    /// File name of this role's PDF inside a case directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            DocRole::Primary => "settlement.pdf",
            DocRole::Secondary => "bid.pdf",
        }
    }
}

impl fmt::Display for DocRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "settlement" | "primary" => Ok(DocRole::Primary),
            "bid" | "secondary" => Ok(DocRole::Secondary),
            _ => Err(Error::UnknownRole(s.to_string())),
        }
    }
}

/// A pointer from a derived fact to a (document, page, quote) source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub doc: DocRole,
    /// 1-indexed page number
    pub page: u32,
    pub quote: String,
}

/// A case plus one of its document roles. Also the key of the viewer's
/// loaded-document cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub case_id: u64,
    pub role: DocRole,
}

impl DocumentRef {
    pub fn new(case_id: u64, role: DocRole) -> Self {
        Self { case_id, role }
    }

    /// Path of the document fetch endpoint for this reference.
    pub fn fetch_path(&self) -> String {
        format!("/api/cases/{}/pdf/{}", self.case_id, self.role)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {}/{}", self.case_id, self.role)
    }
}

// ============================================================================
// Cases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Contents of `cases/<id>/case.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseMeta {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub settlement_filename: String,
    #[serde(default)]
    pub bid_filename: Option<String>,
    #[serde(default)]
    pub analysis_status: AnalysisStatus,
    #[serde(default)]
    pub analysis_error: Option<String>,
}

/// Lightweight listing row (no analysis payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub settlement_filename: String,
    pub bid_filename: Option<String>,
    pub has_bid: bool,
    pub analysis_status: AnalysisStatus,
    pub case_name: Option<String>,
    pub case_number: Option<String>,
    pub jurisdiction: Option<String>,
    pub settlement_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub summary: CaseSummary,
    pub analysis_json: Option<serde_json::Value>,
    pub analysis_error: Option<String>,
}

// ============================================================================
// API Bodies
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CitationQuery {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedCitations {
    pub path: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenViewerRequest {
    pub case_id: u64,
    pub doc: DocRole,
    pub page: u32,
    #[serde(default)]
    pub quote: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavAction {
    Prev,
    Next,
    Jump,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub action: NavAction,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_role_wire_names() {
        let c: Citation =
            serde_json::from_str(r#"{"doc":"bid","page":3,"quote":"x"}"#).unwrap();
        assert_eq!(c.doc, DocRole::Secondary);
        let c: Citation =
            serde_json::from_str(r#"{"doc":"primary","page":1,"quote":"x"}"#).unwrap();
        assert_eq!(c.doc, DocRole::Primary);
        assert_eq!(serde_json::to_string(&DocRole::Primary).unwrap(), "\"settlement\"");
    }

    #[test]
    fn test_doc_role_from_str() {
        assert_eq!("Settlement".parse::<DocRole>().unwrap(), DocRole::Primary);
        assert_eq!("bid".parse::<DocRole>().unwrap(), DocRole::Secondary);
        assert!(matches!("exhibit".parse::<DocRole>(), Err(Error::UnknownRole(_))));
    }

    #[test]
    fn test_fetch_path() {
        let r = DocumentRef::new(7, DocRole::Primary);
        assert_eq!(r.fetch_path(), "/api/cases/7/pdf/settlement");
        assert_eq!(r.to_string(), "case 7/settlement");
    }
}
