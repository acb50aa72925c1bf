//! # hdoc
//!
//! An HTML-based document builder with a page-based architecture.
//!
//! ## Features
//!
//! - Numbered page files (`pages/01.html`, `pages/02.html`, ...) combined in
//!   numeric order
//! - `{{> name }}` component includes, expanded recursively with cycle
//!   detection
//! - CSS custom properties generated from `.doc-config.json`, globally and
//!   per page
//! - PDF export through headless Chromium
//!
//! ## Usage
//!
//! ```bash
//! hdoc build
//! hdoc config global.page.size Letter
//! hdoc export document.pdf
//! ```

mod config;
mod css;
mod document;
mod error;
mod export;
mod includes;
mod pages;
mod project;

pub use config::{get_path, read_json, save_json, set_path, ConfigMap, ConfigTree, ConfigValue, Scalar};
pub use css::{flatten, generate_css, kebab_case, Declaration};
pub use document::compose;
pub use error::{BuildError, ConfigError, Result};
pub use export::{export_project, ExportError, ExportOptions, Orientation, PageSize, PdfExporter};
pub use includes::{scan, Ancestors, Expansion, IncludeIssue, IncludeResolver, Placeholder};
pub use pages::{assemble, discover, Assembly, PageFile};
pub use project::{BuildReport, Project, ProjectLayout, Rendered};
