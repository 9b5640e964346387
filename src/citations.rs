//! Citation index: mapping from structured-data field paths to the source
//! locations that back them, and the lenient lookup the dashboard uses.
//!
//! The analysis step and the dashboard were never guaranteed to agree on path
//! conventions (`timeline.notice_deadline` vs `notice_deadline`), so lookups
//! go through [`resolve`], which tries a fixed sequence of spellings.

use crate::models::{Citation, DocRole};

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

#[cfg(test)]
#[path = "citations_test.rs"]
mod citations_test;

/// Name of the analysis payload field that carries the index.
pub const CITATIONS_FIELD: &str = "citations";

/// Prefix tried for bare keys that the index stores under the timeline.
const TIMELINE_PREFIX: &str = "timeline.";

// ============================================================================
// Index
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationIndex {
    entries: IndexMap<String, Vec<Citation>>,
}

impl CitationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, citations: Vec<Citation>) {
        self.entries.insert(path.into(), citations);
    }

    pub fn get(&self, path: &str) -> Option<&[Citation]> {
        self.entries.get(path).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All `(path, citation)` pairs in the order the paths were added.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Citation)> {
        self.entries
            .iter()
            .flat_map(|(path, cites)| cites.iter().map(move |c| (path.as_str(), c)))
    }

    /// Build an index from the `citations` value of an analysis payload.
    ///
    /// Malformed entries are dropped one at a time; a bad citation never
    /// takes the rest of the index down with it.
    pub fn from_value(value: &Value) -> Self {
        let mut index = Self::new();
        let Some(map) = value.as_object() else {
            if !value.is_null() {
                debug!("citations field is not an object, ignoring");
            }
            return index;
        };

        for (path, raw) in map {
            let list: Vec<Citation> = match raw {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| {
                        let parsed = parse_citation(item);
                        if parsed.is_none() {
                            debug!(path = %path, "dropping malformed citation");
                        }
                        parsed
                    })
                    .collect(),
                // A single object where a list was expected
                Value::Object(_) => parse_citation(raw).into_iter().collect(),
                _ => Vec::new(),
            };
            if !list.is_empty() {
                index.insert(path.clone(), list);
            }
        }
        index
    }
}

impl Serialize for CitationIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

fn parse_citation(value: &Value) -> Option<Citation> {
    let obj = value.as_object()?;
    let doc: DocRole = obj.get("doc")?.as_str()?.parse().ok()?;
    let page = match obj.get("page")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    if page == 0 || page > u32::MAX as u64 {
        return None;
    }
    let quote = obj
        .get("quote")
        .and_then(|q| q.as_str())
        .unwrap_or_default()
        .to_string();

    Some(Citation {
        doc,
        page: page as u32,
        quote,
    })
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the citations for a data path.
///
/// Tries, stopping at the first non-empty hit:
/// 1. the path as given,
/// 2. the path without its first segment (`timeline.foo` -> `foo`),
/// 3. for a bare key, the key under `timeline.`.
pub fn resolve<'a>(index: &'a CitationIndex, path: &str) -> Option<&'a [Citation]> {
    candidate_paths(path)
        .into_iter()
        .find_map(|candidate| index.get(&candidate).filter(|c| !c.is_empty()))
}

fn candidate_paths(path: &str) -> Vec<String> {
    let mut candidates = vec![path.to_string()];
    match path.split_once('.') {
        Some((_, rest)) => candidates.push(rest.to_string()),
        None => candidates.push(format!("{}{}", TIMELINE_PREFIX, path)),
    }
    candidates
}
