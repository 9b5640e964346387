//! Structured analysis results.
//!
//! The analysis payload is opaque business data; the only part this crate
//! interprets is the `citations` index and a handful of header fields shown in
//! listings. Raw AI responses usually wrap the JSON in prose or code fences,
//! so `extract_json_object` digs the object out first.

use crate::citations::{CitationIndex, CITATIONS_FIELD};
use crate::error::{Error, Result};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Parse the outermost `{ ... }` span of a raw model response.
pub fn extract_json_object(text: &str) -> Result<Value> {
    let re = Regex::new(r"\{[\s\S]*\}").map_err(|e| Error::Analysis(e.to_string()))?;
    let span = re
        .find(text)
        .ok_or_else(|| Error::Analysis("no JSON object in response".to_string()))?;
    serde_json::from_str(span.as_str())
        .map_err(|e| Error::Analysis(format!("invalid JSON object: {}", e)))
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub payload: Value,
    #[serde(skip)]
    pub citations: CitationIndex,
}

impl AnalysisResult {
    pub fn from_value(payload: Value) -> Self {
        let citations = payload
            .get(CITATIONS_FIELD)
            .map(CitationIndex::from_value)
            .unwrap_or_default();
        Self { payload, citations }
    }

    /// Parse a raw AI response.
    pub fn from_response(text: &str) -> Result<Self> {
        Ok(Self::from_value(extract_json_object(text)?))
    }

    fn header(&self, key: &str) -> Option<String> {
        match self.payload.get("case_header")?.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn case_name(&self) -> Option<String> {
        self.header("case_name")
    }

    pub fn case_number(&self) -> Option<String> {
        self.header("case_number")
    }

    pub fn jurisdiction(&self) -> Option<String> {
        self.header("jurisdiction")
    }

    pub fn settlement_type(&self) -> Option<String> {
        self.header("settlement_type")
    }

    pub fn fields(&self) -> Vec<(String, String)> {
        field_entries(&self.payload)
    }
}

// ============================================================================
// Field Walk
// ============================================================================

/// Every displayable leaf of the payload as `(path, text)`, depth first in
/// document order.
///
/// Paths use the same grammar as the citation index: `a.b` for object keys,
/// `a[3]` for array elements.
pub fn field_entries(payload: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    walk(payload, String::new(), &mut out);
    out
}

fn walk(value: &Value, path: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.starts_with('_') || (path.is_empty() && key == CITATIONS_FIELD) {
                    continue;
                }
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk(child, child_path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{}[{}]", path, i), out);
            }
        }
        Value::String(s) => out.push((path, s.clone())),
        Value::Number(n) => out.push((path, n.to_string())),
        Value::Bool(b) => out.push((path, b.to_string())),
        Value::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocRole;
    use serde_json::json;

    #[test]
    fn test_extract_from_chatty_response() {
        let text = "Here is the analysis:\n```json\n{\"case_header\": {\"case_name\": \"Doe v. Acme\"}}\n```\nLet me know!";
        let v = extract_json_object(text).unwrap();
        assert_eq!(v["case_header"]["case_name"], "Doe v. Acme");
    }

    #[test]
    fn test_extract_failures() {
        assert!(matches!(extract_json_object("no json here"), Err(Error::Analysis(_))));
        assert!(matches!(extract_json_object("{not: valid}"), Err(Error::Analysis(_))));
    }

    #[test]
    fn test_from_value_reads_header_and_citations() {
        let result = AnalysisResult::from_value(json!({
            "case_header": {"case_name": "Doe v. Acme", "case_number": 2024, "jurisdiction": " "},
            "citations": {
                "case_header.case_name": [{"doc": "settlement", "page": 1, "quote": "Doe v. Acme"}]
            }
        }));
        assert_eq!(result.case_name().as_deref(), Some("Doe v. Acme"));
        assert_eq!(result.case_number().as_deref(), Some("2024"));
        assert_eq!(result.jurisdiction(), None);
        assert_eq!(result.settlement_type(), None);
        let c = result.citations.get("case_header.case_name").unwrap();
        assert_eq!(c[0].doc, DocRole::Primary);
    }

    #[test]
    fn test_missing_citations_is_empty_index() {
        let result = AnalysisResult::from_value(json!({"timeline": {}}));
        assert!(result.citations.is_empty());
    }

    #[test]
    fn test_field_entries_paths() {
        let payload = json!({
            "timeline": {"claims_deadline": "March 1, 2026", "opt_out": null},
            "fund_logistics": {"gross": 4500000, "reversionary": false},
            "conflict_audit": [{"bid_says": "60 days"}, {"bid_says": "90 days"}],
            "_meta": {"model": "x"},
            "citations": {"timeline.claims_deadline": []}
        });
        let fields = field_entries(&payload);
        let paths: Vec<&str> = fields.iter().map(|(p, _)| p.as_str()).collect();
        assert!(paths.contains(&"timeline.claims_deadline"));
        assert!(paths.contains(&"fund_logistics.gross"));
        assert!(paths.contains(&"fund_logistics.reversionary"));
        assert!(paths.contains(&"conflict_audit[1].bid_says"));
        assert!(!paths.iter().any(|p| p.starts_with("_meta") || p.starts_with("citations")));
        assert!(!paths.contains(&"timeline.opt_out"));

        let gross = fields.iter().find(|(p, _)| p == "fund_logistics.gross").unwrap();
        assert_eq!(gross.1, "4500000");
    }

    #[test]
    fn test_fields_follow_document_order() {
        let result = AnalysisResult::from_response(
            r#"Sure: {"timeline": {"zeta": "1", "alpha": "2"}, "case_header": {"case_name": "x"}}"#,
        )
        .unwrap();
        assert_eq!(
            result.fields(),
            vec![
                ("timeline.zeta".to_string(), "1".to_string()),
                ("timeline.alpha".to_string(), "2".to_string()),
                ("case_header.case_name".to_string(), "x".to_string()),
            ]
        );
    }
}
