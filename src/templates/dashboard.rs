//! Case list and case dashboard pages.

use super::components::base_html;
use super::viewer::{viewer_modal_html, viewer_script};
use crate::badges::render_badges_html;
use crate::cases::Case;
use crate::html_escape;
use crate::models::AnalysisStatus;

fn status_class(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::Pending => "pending",
        AnalysisStatus::Processing => "processing",
        AnalysisStatus::Completed => "completed",
        AnalysisStatus::Failed => "failed",
    }
}

// ============================================================================
// Case List
// ============================================================================

pub fn render_index(cases: &[Case]) -> String {
    let mut list_html = String::from("<ul class=\"case-list\">");

    for case in cases {
        let summary = case.summary();
        let title = summary
            .case_name
            .clone()
            .unwrap_or_else(|| summary.settlement_filename.clone());
        let number = summary
            .case_number
            .as_deref()
            .map(|n| format!(" <span class=\"meta\">{}</span>", html_escape(n)))
            .unwrap_or_default();
        let status = status_class(summary.analysis_status);

        list_html.push_str(&format!(
            r#"<li class="case-item">
                <span>
                    <span class="status-badge {status}">{status}</span>
                    <a href="/case/{id}">{title}</a>{number}
                </span>
                <span class="meta">{created}</span>
            </li>"#,
            status = status,
            id = summary.id,
            title = html_escape(&title),
            number = number,
            created = summary.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    list_html.push_str("</ul>");

    if cases.is_empty() {
        list_html = "<p class=\"viewer-status\">No cases found.</p>".to_string();
    }

    base_html(
        "Settlement Cases",
        &format!("<h1>Settlement Cases</h1>{}", list_html),
        "",
    )
}

// ============================================================================
// Case Dashboard
// ============================================================================

pub fn render_case_page(case: &Case) -> String {
    let summary = case.summary();
    let title = summary
        .case_name
        .clone()
        .unwrap_or_else(|| format!("Case {}", summary.id));

    let docs = match &summary.bid_filename {
        Some(bid) => format!(
            "Settlement: {} &middot; Bid: {}",
            html_escape(&summary.settlement_filename),
            html_escape(bid)
        ),
        None => format!("Settlement: {}", html_escape(&summary.settlement_filename)),
    };

    let mut content = format!(
        r#"<div class="case-header">
            <h1>{title}</h1>
            <div class="docs">{docs}</div>
        </div>"#,
        title = html_escape(&title),
        docs = docs,
    );

    if let Some(err) = &case.meta.analysis_error {
        content.push_str(&format!(
            "<div class=\"analysis-error\">Analysis failed: {}</div>",
            html_escape(err)
        ));
    }

    match &case.analysis {
        Some(analysis) => {
            content.push_str("<ul class=\"field-list\">");
            for (path, value) in analysis.fields() {
                content.push_str(&format!(
                    r#"<li class="field"><span class="field-path">{path}</span><span class="field-value">{value}{badges}</span></li>"#,
                    path = html_escape(&path),
                    value = html_escape(&value),
                    badges = render_badges_html(&analysis.citations, &path),
                ));
            }
            content.push_str("</ul>");
        }
        None => content.push_str("<p class=\"viewer-status\">No analysis yet.</p>"),
    }

    content.push_str(viewer_modal_html());
    base_html(&title, &content, &viewer_script(summary.id))
}
