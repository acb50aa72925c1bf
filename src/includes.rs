//! Expansion of `{{> name }}` component includes.
//!
//! Resolution runs in three steps: [`scan`] finds every directive, each
//! distinct directive is resolved concurrently, then the results are spliced
//! back at the original positions.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use colored::*;
use futures_util::future::{self, BoxFuture, FutureExt};
use regex::Regex;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{BuildError, Result};

static INCLUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{>\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("valid include pattern"));

/// One occurrence of an include directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The directive exactly as written, braces included.
    pub directive: String,
    pub name: String,
    pub span: Range<usize>,
}

/// Finds every include directive in `content`, in document order.
pub fn scan(content: &str) -> Vec<Placeholder> {
    INCLUDE_PATTERN
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(Placeholder {
                directive: whole.as_str().to_string(),
                name: name.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// The chain of identifiers currently being expanded.
///
/// Extending the chain never touches the original, so sibling includes each
/// get their own branch and only true ancestors are seen as cycles.
#[derive(Clone, Default)]
pub struct Ancestors {
    head: Option<Arc<Link>>,
}

struct Link {
    name: String,
    parent: Option<Arc<Link>>,
}

impl Ancestors {
    pub fn root(name: impl Into<String>) -> Self {
        Self::default().with(name)
    }

    pub fn with(&self, name: impl Into<String>) -> Self {
        Self {
            head: Some(Arc::new(Link {
                name: name.into(),
                parent: self.head.clone(),
            })),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|n| n == name)
    }

    /// Innermost first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(self.head.as_deref(), |link| link.parent.as_deref())
            .map(|link| link.name.as_str())
    }
}

impl fmt::Debug for Ancestors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// A non-fatal problem found while expanding includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeIssue {
    /// The component is already being expanded further up the chain.
    Circular { name: String },
    /// No component file with that name exists.
    Missing { name: String, path: PathBuf },
}

impl fmt::Display for IncludeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circular { name } => write!(
                f,
                "Circular include detected: {} was already included. Skipping.",
                name
            ),
            Self::Missing { name, .. } => {
                write!(f, "Component not found: {}. Leaving placeholder.", name)
            }
        }
    }
}

/// Content with all includes expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub content: String,
    pub issues: Vec<IncludeIssue>,
}

pub struct IncludeResolver {
    components_dir: PathBuf,
}

impl IncludeResolver {
    pub fn new(components_dir: impl Into<PathBuf>) -> Self {
        Self {
            components_dir: components_dir.into(),
        }
    }

    /// Expands every include in `content`. `ancestors` must already hold the
    /// identity of whatever `content` came from.
    pub async fn resolve(&self, content: &str, ancestors: &Ancestors) -> Result<Expansion> {
        self.resolve_boxed(content.to_string(), ancestors.clone()).await
    }

    fn resolve_boxed(&self, content: String, ancestors: Ancestors) -> BoxFuture<'_, Result<Expansion>> {
        async move {
            let placeholders = scan(&content);
            if placeholders.is_empty() {
                return Ok(Expansion {
                    content,
                    issues: Vec::new(),
                });
            }

            // First occurrence of each directive, in document order.
            let mut unique: Vec<&Placeholder> = Vec::new();
            for placeholder in &placeholders {
                if !unique.iter().any(|p| p.directive == placeholder.directive) {
                    unique.push(placeholder);
                }
            }

            let resolved = future::try_join_all(
                unique
                    .iter()
                    .map(|placeholder| self.resolve_one(placeholder, &ancestors)),
            )
            .await?;

            let mut issues = Vec::new();
            let mut replacements: HashMap<&str, String> = HashMap::with_capacity(unique.len());
            for (placeholder, expansion) in unique.iter().zip(resolved) {
                issues.extend(expansion.issues);
                replacements.insert(placeholder.directive.as_str(), expansion.content);
            }

            Ok(Expansion {
                content: splice(&content, &placeholders, &replacements),
                issues,
            })
        }
        .boxed()
    }

    async fn resolve_one(&self, placeholder: &Placeholder, ancestors: &Ancestors) -> Result<Expansion> {
        let name = &placeholder.name;

        if ancestors.contains(name) {
            let issue = IncludeIssue::Circular { name: name.clone() };
            warn!("{}", issue.to_string().yellow());
            return Ok(Expansion {
                content: String::new(),
                issues: vec![issue],
            });
        }

        let path = self.components_dir.join(name);
        let source = match fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let issue = IncludeIssue::Missing {
                    name: name.clone(),
                    path,
                };
                warn!("{}", issue.to_string().yellow());
                return Ok(Expansion {
                    content: placeholder.directive.clone(),
                    issues: vec![issue],
                });
            }
            Err(e) => return Err(BuildError::io("read component", path, e)),
        };

        debug!("Including {} from {}", name, path.display());
        self.resolve_boxed(source, ancestors.with(name.as_str())).await
    }
}

/// Replaces each placeholder span with the expansion of its directive.
fn splice(content: &str, placeholders: &[Placeholder], replacements: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for placeholder in placeholders {
        out.push_str(&content[cursor..placeholder.span.start]);
        match replacements.get(placeholder.directive.as_str()) {
            Some(replacement) => out.push_str(replacement),
            None => out.push_str(&placeholder.directive),
        }
        cursor = placeholder.span.end;
    }
    out.push_str(&content[cursor..]);
    out
}
