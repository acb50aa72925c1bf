use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig};
use colored::*;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, error, info};

use crate::config::{get_path, read_json};
use crate::project::ProjectLayout;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{0} not found. Run \"hdoc build\" first.")]
    MissingDocument(PathBuf),

    #[error("Unknown page size \"{0}\" (expected A0-A6, Letter, Legal, Tabloid or Ledger)")]
    UnknownPageSize(String),

    #[error("Invalid global.page settings: {0}")]
    InvalidPageSettings(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
    Letter,
    Legal,
    Tabloid,
    Ledger,
}

impl PageSize {
    /// Width and height in inches, portrait.
    pub fn inches(self) -> (f64, f64) {
        match self {
            Self::A0 => (33.1, 46.8),
            Self::A1 => (23.4, 33.1),
            Self::A2 => (16.54, 23.4),
            Self::A3 => (11.69, 16.54),
            Self::A4 => (8.27, 11.69),
            Self::A5 => (5.83, 8.27),
            Self::A6 => (4.13, 5.83),
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::Ledger => (17.0, 11.0),
        }
    }
}

impl FromStr for PageSize {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a0" => Ok(Self::A0),
            "a1" => Ok(Self::A1),
            "a2" => Ok(Self::A2),
            "a3" => Ok(Self::A3),
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "a6" => Ok(Self::A6),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            "ledger" => Ok(Self::Ledger),
            _ => Err(ExportError::UnknownPageSize(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Paper settings handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    pub size: PageSize,
    pub orientation: Orientation,
}

#[derive(Debug, Default, Deserialize)]
struct PageSettings {
    size: Option<String>,
    orientation: Option<String>,
}

impl ExportOptions {
    /// Reads `global.page.size` and `global.page.orientation` from the raw
    /// config. Missing values fall back to A4 portrait.
    pub fn from_config(raw: &Value) -> Result<Self, ExportError> {
        let settings = match get_path(raw, "global.page") {
            Some(page) => PageSettings::deserialize(page).map_err(ExportError::InvalidPageSettings)?,
            None => PageSettings::default(),
        };

        let size = match settings.size.as_deref() {
            Some(size) => size.parse()?,
            None => PageSize::default(),
        };
        let orientation = match settings.orientation.as_deref() {
            Some("landscape") => Orientation::Landscape,
            _ => Orientation::Portrait,
        };

        Ok(Self { size, orientation })
    }

    fn print_params(&self) -> PrintToPdfParams {
        let (width, height) = self.size.inches();
        PrintToPdfParams {
            landscape: Some(self.orientation == Orientation::Landscape),
            print_background: Some(true),
            paper_width: Some(width),
            paper_height: Some(height),
            margin_top: Some(0.0),
            margin_right: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            prefer_css_page_size: Some(true),
            ..Default::default()
        }
    }
}

/// Prints HTML to PDF with a headless Chromium.
pub struct PdfExporter {
    options: ExportOptions,
    settle: Duration,
}

impl PdfExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            settle: Duration::from_millis(500),
        }
    }

    pub async fn export(&self, html: &str, output: &Path) -> Result<()> {
        info!("Exporting to PDF...");

        let config = BrowserConfig::builder()
            .no_sandbox()
            .build()
            .map_err(|e| anyhow!("Failed to create browser config: {}", e))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(err) = h {
                    let err_str = err.to_string();
                    if !err_str.contains("data did not match any variant")
                        && !err_str.contains("untagged enum Message")
                    {
                        error!("Browser handler error: {}", err);
                    } else {
                        debug!("Chrome protocol message ignored: {}", err);
                    }
                }
            }
        });

        let result = self.print(&browser, html, output).await;

        browser.close().await.ok();
        handle.abort();

        result
    }

    async fn print(&self, browser: &Browser, html: &str, output: &Path) -> Result<()> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow!("Failed to create new page: {}", e))?;

        page.set_content(html)
            .await
            .map_err(|e| anyhow!("Failed to set page content: {}", e))?;

        // Give web fonts and images a moment to load.
        tokio::time::sleep(self.settle).await;

        let pdf_data = page
            .pdf(self.options.print_params())
            .await
            .map_err(|e| anyhow!("Failed to generate PDF: {}", e))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow!("Failed to create directory: {}", e))?;
        }

        fs::write(output, pdf_data)
            .await
            .map_err(|e| anyhow!("Failed to write PDF to {}: {}", output.display(), e))?;

        Ok(())
    }
}

/// Prints the built document of the project at `layout` to `output`.
pub async fn export_project(layout: &ProjectLayout, output: &Path) -> Result<()> {
    let document = layout.output_path();
    if !fs::try_exists(&document).await? {
        return Err(ExportError::MissingDocument(document).into());
    }

    let config_path = layout.config_path();
    let raw = if fs::try_exists(&config_path).await? {
        read_json(&config_path).await?
    } else {
        Value::Object(Default::default())
    };
    let options = ExportOptions::from_config(&raw)?;
    debug!("Export options: {:?}", options);

    let html = fs::read_to_string(&document)
        .await
        .map_err(|e| anyhow!("Failed to read {}: {}", document.display(), e))?;

    PdfExporter::new(options).export(&html, output).await?;

    info!("PDF exported successfully: {}", output.display().to_string().green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_a4_portrait() {
        let options = ExportOptions::from_config(&json!({})).unwrap();
        assert_eq!(options, ExportOptions::default());
        assert_eq!(options.size, PageSize::A4);
        assert_eq!(options.orientation, Orientation::Portrait);
    }

    #[test]
    fn reads_global_page_settings() {
        let raw = json!({"global": {"page": {"size": "letter", "orientation": "landscape", "margins": {"top": "1cm"}}}});
        let options = ExportOptions::from_config(&raw).unwrap();
        assert_eq!(options.size, PageSize::Letter);
        assert_eq!(options.orientation, Orientation::Landscape);
    }

    #[test]
    fn unknown_orientation_is_portrait() {
        let raw = json!({"global": {"page": {"orientation": "sideways"}}});
        assert_eq!(
            ExportOptions::from_config(&raw).unwrap().orientation,
            Orientation::Portrait
        );
    }

    #[test]
    fn accepts_the_full_a_series() {
        for (name, size) in [("A0", PageSize::A0), ("a2", PageSize::A2), ("A6", PageSize::A6)] {
            let raw = json!({"global": {"page": {"size": name}}});
            assert_eq!(ExportOptions::from_config(&raw).unwrap().size, size);
        }
        assert_eq!(PageSize::A6.inches(), (4.13, 5.83));
    }

    #[test]
    fn rejects_unknown_sizes() {
        let raw = json!({"global": {"page": {"size": "Custom"}}});
        assert!(matches!(
            ExportOptions::from_config(&raw),
            Err(ExportError::UnknownPageSize(s)) if s == "Custom"
        ));
    }

    #[test]
    fn print_params_carry_paper_and_orientation() {
        let options = ExportOptions {
            size: PageSize::A3,
            orientation: Orientation::Landscape,
        };
        let params = options.print_params();
        assert_eq!(params.paper_width, Some(11.69));
        assert_eq!(params.paper_height, Some(16.54));
        assert_eq!(params.landscape, Some(true));
        assert_eq!(params.prefer_css_page_size, Some(true));
        assert_eq!(params.print_background, Some(true));
    }
}
