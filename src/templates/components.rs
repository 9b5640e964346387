//! Shared HTML components: navigation bar and base page template.

use super::styles::STYLE;

// ============================================================================
// Navigation Bar
// ============================================================================

pub fn nav_bar() -> &'static str {
    r#"<nav class="nav-bar">
            <a href="/">Cases</a>
            <span class="spacer"></span>
            <a href="/api/health">Health</a>
        </nav>"#
}

// ============================================================================
// Base Template
// ============================================================================

pub fn base_html(title: &str, content: &str, scripts: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    {nav}
    <div class="container">
        {content}
    </div>
    {scripts}
</body>
</html>"#,
        title = crate::html_escape(title),
        nav = nav_bar(),
        content = content,
        scripts = scripts,
    )
}
