//! CSS styles for the settlement dashboard.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
/* Solarized Light Theme */
:root {
    --base01: #586e75;
    --base00: #657b83;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --yellow: #b58900;
    --orange: #cb4b16;
    --red: #dc322f;
    --violet: #6c71c4;
    --blue: #268bd2;
    --cyan: #2aa198;
    --green: #859900;

    --bg: var(--base3);
    --fg: var(--base00);
    --muted: var(--base1);
    --border: var(--base2);
    --link: var(--blue);
    --link-hover: var(--cyan);
    --accent: var(--base2);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

.container {
    max-width: 960px;
    margin: 0 auto;
    padding: 1rem;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

h1, h2, h3 { font-weight: 600; margin-top: 1.5em; margin-bottom: 0.5em; }
h1 { font-size: 1.5rem; }
h2 { font-size: 1.15rem; }

.nav-bar {
    position: sticky;
    top: 0;
    background: var(--bg);
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
    display: flex;
    gap: 1rem;
    align-items: center;
    z-index: 100;
}
.nav-bar a { font-size: 0.9rem; }
.nav-bar .spacer { flex: 1; }

/* Case list */
.case-list { list-style: none; }
.case-item {
    padding: 0.75rem 0;
    border-bottom: 1px solid var(--border);
    display: flex;
    justify-content: space-between;
    align-items: baseline;
    gap: 1rem;
}
.case-item:last-child { border-bottom: none; }
.case-item .meta { font-size: 0.8rem; color: var(--muted); white-space: nowrap; }
.status-badge {
    font-size: 0.65rem;
    padding: 0.1rem 0.4rem;
    background: var(--accent);
    border-radius: 3px;
    text-transform: uppercase;
    letter-spacing: 0.05em;
    margin-right: 0.5rem;
}
.status-badge.failed { color: var(--red); }
.status-badge.completed { color: var(--green); }

/* Case header and fields */
.case-header { margin-bottom: 1rem; }
.case-header .docs { font-size: 0.85rem; color: var(--muted); }
.analysis-error { color: var(--red); margin: 1rem 0; }

.field-list { list-style: none; }
.field {
    display: grid;
    grid-template-columns: 18rem 1fr;
    gap: 1rem;
    padding: 0.4rem 0;
    border-bottom: 1px solid var(--border);
    cursor: default;
}
.field-path {
    font-family: "SF Mono", "Consolas", "Liberation Mono", monospace;
    font-size: 0.75rem;
    color: var(--muted);
    overflow-wrap: anywhere;
}
.field-value { overflow-wrap: anywhere; }

/* Citation badges */
.cite-badges { margin-left: 0.5rem; white-space: nowrap; }
.cite-badge {
    font-size: 0.7rem;
    font-family: inherit;
    padding: 0 0.35rem;
    margin-left: 0.25rem;
    border-radius: 3px;
    border: 1px solid;
    background: none;
    cursor: pointer;
    vertical-align: middle;
}
.cite-settlement { color: var(--blue); border-color: var(--blue); }
.cite-bid { color: var(--violet); border-color: var(--violet); border-style: dashed; }
.cite-badge:hover { background: var(--accent); }

/* Viewer modal */
.viewer-overlay {
    display: none;
    position: fixed;
    inset: 0;
    background: rgba(0, 43, 54, 0.55);
    z-index: 1000;
    align-items: flex-start;
    justify-content: center;
    padding: 2rem 1rem;
}
.viewer-overlay.active { display: flex; }
.viewer-modal {
    background: var(--bg);
    border-radius: 6px;
    width: 860px;
    max-width: 100%;
    max-height: calc(100vh - 4rem);
    display: flex;
    flex-direction: column;
    overflow: hidden;
}
.viewer-header {
    display: flex;
    align-items: center;
    gap: 0.75rem;
    padding: 0.5rem 1rem;
    border-bottom: 1px solid var(--border);
    font-size: 0.9rem;
}
.viewer-header .title { flex: 1; font-weight: 600; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.viewer-header button {
    padding: 0.2rem 0.6rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    background: var(--accent);
    color: var(--fg);
    cursor: pointer;
    font-family: inherit;
}
.viewer-header button:disabled { opacity: 0.4; cursor: default; }
.viewer-banner {
    display: none;
    padding: 0.4rem 1rem;
    background: #fbeec8;
    color: var(--orange);
    font-size: 0.85rem;
}
.viewer-banner.active { display: block; }
.viewer-body { overflow: auto; padding: 1rem; position: relative; }
.viewer-status { padding: 2rem; text-align: center; color: var(--muted); }
.viewer-status.error { color: var(--red); }

.page-wrap { position: relative; margin: 0 auto; box-shadow: 0 1px 4px rgba(0,0,0,0.15); }
.page-wrap canvas { display: block; }
.text-layer { position: absolute; inset: 0; overflow: hidden; line-height: 1; }
.text-layer span {
    position: absolute;
    white-space: pre;
    color: transparent;
    transform-origin: 0% 0%;
}
.text-layer span.highlight {
    background: rgba(181, 137, 0, 0.35);
    border-radius: 2px;
}
"#;
