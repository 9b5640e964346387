//! Citation viewer modal.
//!
//! The server owns the viewer state machine; this script only forwards clicks
//! and keys and draws whatever snapshot comes back. Pixels are painted by
//! pdf.js at the scale the server chose, and the text layer spans are placed
//! at the server-computed boxes so highlights line up with the match.

// ============================================================================
// Modal Markup
// ============================================================================

pub fn viewer_modal_html() -> &'static str {
    r##"
    <div class="viewer-overlay" id="viewer-overlay" onclick="if(event.target===this)closeViewer()">
        <div class="viewer-modal" role="dialog" aria-modal="true">
            <div class="viewer-header">
                <span class="title" id="viewer-title">Document</span>
                <button id="viewer-prev" onclick="viewerNavigate('prev')" title="Previous page (Left arrow)">&larr;</button>
                <span id="viewer-page-info"></span>
                <button id="viewer-next" onclick="viewerNavigate('next')" title="Next page (Right arrow)">&rarr;</button>
                <button onclick="closeViewer()" title="Close (Escape)">&times;</button>
            </div>
            <div class="viewer-banner" id="viewer-banner">Quote not exactly matched on this page. Read the page to confirm the citation.</div>
            <div class="viewer-body" id="viewer-body">
                <div class="viewer-status" id="viewer-status">Loading...</div>
            </div>
        </div>
    </div>"##
}

// ============================================================================
// Viewer Script
// ============================================================================

pub fn viewer_script(case_id: u64) -> String {
    format!(
        r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js"></script>
    <script>
        pdfjsLib.GlobalWorkerOptions.workerSrc = 'https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.worker.min.js';
        const CASE_ID = {case_id};
    </script>
    <script>{VIEWER_JS}</script>"#
    )
}

const VIEWER_JS: &str = r#"
let viewerSession = null;
let appliedGeneration = -1;
const pdfDocs = new Map();

async function ensureSession() {
    if (viewerSession) return viewerSession;
    const resp = await fetch('/api/viewer', { method: 'POST' });
    const body = await resp.json();
    viewerSession = body.session;
    return viewerSession;
}

function endSession() {
    if (!viewerSession) return;
    fetch('/api/viewer/' + viewerSession, { method: 'DELETE', keepalive: true });
    viewerSession = null;
}

window.addEventListener('pagehide', endSession);

async function viewerPost(action, payload, retried) {
    const session = await ensureSession();
    const resp = await fetch('/api/viewer/' + session + '/' + action, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload || {})
    });
    // Idle sessions expire server side; start a fresh one once
    if (resp.status === 404 && !retried) {
        viewerSession = null;
        return viewerPost(action, payload, true);
    }
    if (!resp.ok) {
        console.error('Viewer request failed:', action, resp.status);
        return;
    }
    await applySnapshot(await resp.json());
}

function openCitation(btn) {
    document.getElementById('viewer-overlay').classList.add('active');
    showStatus('Loading...', false);
    document.getElementById('viewer-banner').classList.remove('active');
    viewerPost('open', {
        case_id: CASE_ID,
        doc: btn.dataset.doc,
        page: parseInt(btn.dataset.page, 10),
        quote: btn.dataset.quote || ''
    });
}

function viewerNavigate(action) {
    viewerPost('navigate', { action: action });
}

function closeViewer() {
    document.getElementById('viewer-overlay').classList.remove('active');
    viewerPost('close');
}

document.addEventListener('keydown', (event) => {
    if (!document.getElementById('viewer-overlay').classList.contains('active')) return;
    if (['Escape', 'ArrowLeft', 'ArrowRight'].includes(event.key)) {
        event.preventDefault();
        if (event.key === 'Escape') {
            document.getElementById('viewer-overlay').classList.remove('active');
        }
        viewerPost('key', { key: event.key });
    }
});

function showStatus(message, isError) {
    const body = document.getElementById('viewer-body');
    body.innerHTML = '';
    const status = document.createElement('div');
    status.className = 'viewer-status' + (isError ? ' error' : '');
    status.textContent = message;
    body.appendChild(status);
}

async function loadPdf(documentRef) {
    const url = '/api/cases/' + documentRef.case_id + '/pdf/' + documentRef.role;
    if (!pdfDocs.has(url)) {
        pdfDocs.set(url, pdfjsLib.getDocument(url).promise);
    }
    return pdfDocs.get(url);
}

async function applySnapshot(snap) {
    // Responses can arrive out of order; only the newest generation counts
    if (snap.generation < appliedGeneration) return;
    appliedGeneration = snap.generation;

    const overlay = document.getElementById('viewer-overlay');
    if (snap.phase === 'closed') {
        overlay.classList.remove('active');
        return;
    }

    document.getElementById('viewer-title').textContent = snap.filename || 'Document';
    document.getElementById('viewer-page-info').textContent =
        snap.total_pages ? ('Page ' + snap.current_page + ' of ' + snap.total_pages) : '';
    document.getElementById('viewer-prev').disabled = snap.phase !== 'ready' || snap.current_page <= 1;
    document.getElementById('viewer-next').disabled = snap.phase !== 'ready' || snap.current_page >= snap.total_pages;

    const banner = document.getElementById('viewer-banner');
    const highlight = snap.page ? snap.page.highlight : null;
    banner.classList.toggle('active', !!highlight && !highlight.matched);

    if (snap.phase === 'error') {
        showStatus(snap.error || 'Failed to load document', true);
        return;
    }
    if (snap.page_error) {
        showStatus(snap.page_error, true);
        return;
    }
    if (!snap.page) {
        showStatus('Loading...', false);
        return;
    }

    await drawPage(snap);
}

async function drawPage(snap) {
    const generation = snap.generation;
    const view = snap.page;
    const pdf = await loadPdf(snap.document);
    const page = await pdf.getPage(view.page_number);
    if (generation !== appliedGeneration) return;

    const viewport = page.getViewport({ scale: view.surface.scale });
    const dpr = window.devicePixelRatio || 1;

    const wrap = document.createElement('div');
    wrap.className = 'page-wrap';
    wrap.style.width = view.surface.width + 'px';
    wrap.style.height = view.surface.height + 'px';

    const canvas = document.createElement('canvas');
    canvas.width = Math.floor(view.surface.width * dpr);
    canvas.height = Math.floor(view.surface.height * dpr);
    canvas.style.width = view.surface.width + 'px';
    canvas.style.height = view.surface.height + 'px';
    const ctx = canvas.getContext('2d');
    ctx.scale(dpr, dpr);
    wrap.appendChild(canvas);

    await page.render({ canvasContext: ctx, viewport: viewport }).promise;
    if (generation !== appliedGeneration) return;

    const marked = new Set(view.highlight ? view.highlight.owners : []);
    const layer = document.createElement('div');
    layer.className = 'text-layer';
    let scrollTarget = null;
    for (const item of view.items) {
        const span = document.createElement('span');
        span.textContent = item.text;
        span.style.left = item.bbox.x + 'px';
        span.style.top = item.bbox.y + 'px';
        span.style.fontSize = item.bbox.font_size + 'px';
        if (marked.has(item.owner)) span.classList.add('highlight');
        if (view.highlight && view.highlight.scroll_to === item.owner) scrollTarget = span;
        layer.appendChild(span);
    }
    wrap.appendChild(layer);

    const body = document.getElementById('viewer-body');
    body.innerHTML = '';
    body.appendChild(wrap);
    if (scrollTarget) {
        scrollTarget.scrollIntoView({ behavior: 'smooth', block: 'center' });
    } else {
        body.scrollTop = 0;
    }
}
"#;
