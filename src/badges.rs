//! Citation badges: the clickable page markers next to each field.

use crate::citations::{resolve, CitationIndex};
use crate::html_escape;
use crate::models::{Citation, DocRole};
use crate::viewer::{ViewerController, ViewerTarget};

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub path: String,
    pub citation: Citation,
}

impl Badge {
    pub fn kind_class(&self) -> &'static str {
        match self.citation.doc {
            DocRole::Primary => "cite-settlement",
            DocRole::Secondary => "cite-bid",
        }
    }

    pub fn label(&self) -> String {
        format!("p.{}", self.citation.page)
    }

    pub fn title(&self) -> String {
        format!("{} p.{}", self.citation.doc.label(), self.citation.page)
    }

    /// Open the viewer on this badge's citation.
    pub async fn activate(&self, viewer: &ViewerController, case_id: u64, filename: Option<String>) {
        viewer
            .open(ViewerTarget::new(case_id, self.citation.clone(), filename))
            .await;
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<button type="button" class="cite-badge {}" title="{}" data-doc="{}" data-page="{}" data-quote="{}" onclick="event.stopPropagation(); openCitation(this)">{}</button>"#,
            self.kind_class(),
            html_escape(&self.title()),
            self.citation.doc,
            self.citation.page,
            html_escape(&self.citation.quote),
            html_escape(&self.label()),
        )
    }
}

/// One badge per citation backing `path`; none on a resolution miss.
pub fn badges_for(index: &CitationIndex, path: &str) -> Vec<Badge> {
    resolve(index, path)
        .unwrap_or_default()
        .iter()
        .map(|citation| Badge {
            path: path.to_string(),
            citation: citation.clone(),
        })
        .collect()
}

/// Badge markup for a field, or an empty string when it has no citations.
pub fn render_badges_html(index: &CitationIndex, path: &str) -> String {
    let badges = badges_for(index, path);
    if badges.is_empty() {
        return String::new();
    }
    let inner: String = badges.iter().map(Badge::to_html).collect();
    format!(r#"<span class="cite-badges">{}</span>"#, inner)
}
