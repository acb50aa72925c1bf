use std::path::{Path, PathBuf};

use colored::*;
use tokio::fs;
use tracing::{debug, info};

use crate::config::ConfigTree;
use crate::css::generate_css;
use crate::document::compose;
use crate::error::{BuildError, Result};
use crate::includes::{IncludeIssue, IncludeResolver};
use crate::pages::{assemble, PageFile};

/// Where things live inside a project, relative to `root`.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub config: PathBuf,
    pub pages: PathBuf,
    pub components: PathBuf,
    pub stylesheet: PathBuf,
    pub output: PathBuf,
    /// Extension of page files, without the dot.
    pub page_extension: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            config: PathBuf::from(".doc-config.json"),
            pages: PathBuf::from("pages"),
            components: PathBuf::from("components"),
            stylesheet: PathBuf::from("assets/styles/main.css"),
            output: PathBuf::from("dist/document.html"),
            page_extension: "html".to_string(),
        }
    }
}

impl ProjectLayout {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(&self.pages)
    }

    pub fn components_dir(&self) -> PathBuf {
        self.root.join(&self.components)
    }

    pub fn stylesheet_path(&self) -> PathBuf {
        self.root.join(&self.stylesheet)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output)
    }
}

/// The composed document before it is written.
#[derive(Debug)]
pub struct Rendered {
    pub html: String,
    pub pages: Vec<PageFile>,
    pub issues: Vec<IncludeIssue>,
}

/// Outcome of a successful build.
#[derive(Debug)]
pub struct BuildReport {
    pub pages: Vec<PageFile>,
    pub output: PathBuf,
    pub issues: Vec<IncludeIssue>,
}

pub struct Project {
    layout: ProjectLayout,
}

impl Project {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// Renders the whole document without writing it.
    pub async fn render(&self) -> Result<Rendered> {
        let config_path = self.layout.config_path();
        if !exists(&config_path).await? {
            return Err(BuildError::MissingConfig(config_path));
        }
        let config = ConfigTree::load(&config_path).await?;

        let components_dir = self.layout.components_dir();
        let resolver = if exists(&components_dir).await? {
            Some(IncludeResolver::new(components_dir))
        } else {
            debug!("No components directory, includes are left as written");
            None
        };

        let assembly = assemble(
            &self.layout.pages_dir(),
            &self.layout.page_extension,
            resolver.as_ref(),
        )
        .await?;

        let css_variables = generate_css(&config);

        let stylesheet_path = self.layout.stylesheet_path();
        let stylesheet = if exists(&stylesheet_path).await? {
            Some(
                fs::read_to_string(&stylesheet_path)
                    .await
                    .map_err(|e| BuildError::io("read stylesheet", &stylesheet_path, e))?,
            )
        } else {
            None
        };

        let html = compose(&css_variables, stylesheet.as_deref(), &assembly.body);
        Ok(Rendered {
            html,
            pages: assembly.pages,
            issues: assembly.issues,
        })
    }

    /// Renders the document and writes it to the output path. Nothing is
    /// written unless every step before it succeeded.
    pub async fn build(&self) -> Result<BuildReport> {
        info!("Building hdoc project...");

        let Rendered { html, pages, issues } = self.render().await?;

        let output = self.layout.output_path();
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::io("create directory", parent, e))?;
        }
        fs::write(&output, html)
            .await
            .map_err(|e| BuildError::io("write document", &output, e))?;

        info!("Document built successfully: {}", output.display().to_string().green());

        Ok(BuildReport {
            pages,
            output,
            issues,
        })
    }
}

async fn exists(path: &Path) -> Result<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| BuildError::io("inspect", path, e))
}
