//! HTML templates and styling for the settlement dashboard.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants and theme definitions
//! - `components` - Shared HTML components (nav bar, base template)
//! - `dashboard` - Case list and case dashboard with citation badges
//! - `viewer` - Citation viewer modal and its pdf.js script

mod styles;
mod components;
mod dashboard;
mod viewer;

pub use styles::STYLE;
pub use components::{base_html, nav_bar};
pub use dashboard::{render_case_page, render_index};
pub use viewer::{viewer_modal_html, viewer_script};
