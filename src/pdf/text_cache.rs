//! Sled cache of extracted text runs, keyed by document fingerprint and page.
//!
//! Extraction is deterministic for a given file, so entries never go stale;
//! a changed upload simply hashes to a new fingerprint.

use super::TextRun;
use crate::error::Result;

const TEXT_LAYER_TREE: &str = "text_layers";

#[derive(Clone)]
pub struct TextCache {
    tree: sled::Tree,
}

impl TextCache {
    pub fn open(db: &sled::Db) -> Result<Self> {
        Ok(Self {
            tree: db.open_tree(TEXT_LAYER_TREE)?,
        })
    }

    fn key(fingerprint: &str, page: u32) -> String {
        format!("{}:{}", fingerprint, page)
    }

    pub fn get(&self, fingerprint: &str, page: u32) -> Option<Vec<TextRun>> {
        let data = self.tree.get(Self::key(fingerprint, page).as_bytes()).ok()??;
        serde_json::from_slice(&data).ok()
    }

    pub fn put(&self, fingerprint: &str, page: u32, runs: &[TextRun]) -> Result<()> {
        let json = serde_json::to_vec(runs)?;
        self.tree.insert(Self::key(fingerprint, page).as_bytes(), json)?;
        Ok(())
    }
}
