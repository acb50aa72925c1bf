//! Discovery and assembly of numbered page files.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use colored::*;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{BuildError, Result};
use crate::includes::{Ancestors, IncludeIssue, IncludeResolver};

/// A page file such as `07.html`, ordered by the value of its stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub name: String,
    digits: String,
}

impl PageFile {
    /// Returns `None` unless `name` is exactly `<digits>.<ext>`.
    pub fn parse(name: &str, ext: &str) -> Option<Self> {
        let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = stem.trim_start_matches('0');
        Some(Self {
            name: name.to_string(),
            digits: if trimmed.is_empty() { "0" } else { trimmed }.to_string(),
        })
    }
}

impl Ord for PageFile {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare by magnitude first so stems of any length never overflow.
        self.digits
            .len()
            .cmp(&other.digits.len())
            .then_with(|| self.digits.cmp(&other.digits))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for PageFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lists the page files in `dir`, in numeric order.
pub async fn discover(dir: &Path, ext: &str) -> Result<Vec<PageFile>> {
    if !fs::try_exists(dir)
        .await
        .map_err(|e| BuildError::io("inspect", dir, e))?
    {
        return Err(BuildError::MissingPagesDir(dir.to_path_buf()));
    }

    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| BuildError::io("read pages directory", dir, e))?;
    let mut pages = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BuildError::io("read pages directory", dir, e))?
    {
        // Follows symlinks, so a linked page counts as a page.
        let metadata = fs::metadata(entry.path())
            .await
            .map_err(|e| BuildError::io("inspect", entry.path(), e))?;
        if metadata.is_dir() {
            continue;
        }
        let name = entry.file_name();
        match name.to_str().and_then(|n| PageFile::parse(n, ext)) {
            Some(page) => pages.push(page),
            None => debug!("Skipping {}", entry.path().display()),
        }
    }

    if pages.is_empty() {
        return Err(BuildError::NoPages(dir.to_path_buf()));
    }

    pages.sort();
    Ok(pages)
}

/// Every page, include-expanded and joined.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub pages: Vec<PageFile>,
    pub body: String,
    pub issues: Vec<IncludeIssue>,
}

/// Reads the pages of `dir` in order and concatenates them, each followed by
/// a newline. Without a resolver, page content is used as is.
pub async fn assemble(dir: &Path, ext: &str, resolver: Option<&IncludeResolver>) -> Result<Assembly> {
    let pages = discover(dir, ext).await?;

    info!(
        "Found {} pages: {}",
        pages.len(),
        pages
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
            .blue()
    );

    let mut body = String::new();
    let mut issues = Vec::new();

    for page in &pages {
        let path: PathBuf = dir.join(&page.name);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| BuildError::io("read page", &path, e))?;

        let content = match resolver {
            Some(resolver) => {
                let expansion = resolver
                    .resolve(&content, &Ancestors::root(page.name.as_str()))
                    .await?;
                issues.extend(expansion.issues);
                expansion.content
            }
            None => content,
        };

        body.push_str(&content);
        body.push('\n');
    }

    Ok(Assembly {
        pages,
        body,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::tempdir;

    #[test]
    fn parses_only_numeric_stems() {
        assert!(PageFile::parse("01.html", "html").is_some());
        assert!(PageFile::parse("10.html", "html").is_some());
        assert!(PageFile::parse("a1.html", "html").is_none());
        assert!(PageFile::parse("1.html.bak", "html").is_none());
        assert!(PageFile::parse("1.htm", "html").is_none());
        assert!(PageFile::parse("1xhtml", "html").is_none());
        assert!(PageFile::parse(".html", "html").is_none());
        assert!(PageFile::parse("3.md", "md").is_some());
    }

    #[test]
    fn orders_numerically() {
        let mut pages: Vec<_> = ["10.html", "9.html", "2.html", "002.html", "100000000000000000000000.html"]
            .iter()
            .filter_map(|n| PageFile::parse(n, "html"))
            .collect();
        pages.sort();
        let names: Vec<_> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["002.html", "2.html", "9.html", "10.html", "100000000000000000000000.html"]
        );
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let err = discover(&dir.path().join("pages"), "html").await.unwrap_err();
        assert!(matches!(err, BuildError::MissingPagesDir(_)));
    }

    #[tokio::test]
    async fn no_matching_files_is_an_error() {
        let dir = tempdir().unwrap();
        stdfs::write(dir.path().join("intro.html"), "x").unwrap();
        stdfs::create_dir(dir.path().join("12.html")).unwrap();
        let err = discover(dir.path(), "html").await.unwrap_err();
        assert!(matches!(err, BuildError::NoPages(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_pages_are_included() {
        let dir = tempdir().unwrap();
        let pages = dir.path().join("pages");
        let shared = dir.path().join("shared");
        stdfs::create_dir_all(&pages).unwrap();
        stdfs::create_dir_all(&shared).unwrap();
        stdfs::write(shared.join("intro.html"), "intro").unwrap();
        stdfs::write(pages.join("02.html"), "second").unwrap();
        std::os::unix::fs::symlink(shared.join("intro.html"), pages.join("01.html")).unwrap();

        let assembly = assemble(&pages, "html", None).await.unwrap();
        let names: Vec<_> = assembly.pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["01.html", "02.html"]);
        assert_eq!(assembly.body, "intro\nsecond\n");
    }

    #[tokio::test]
    async fn assembles_in_numeric_order() {
        let dir = tempdir().unwrap();
        stdfs::write(dir.path().join("9.html"), "nine").unwrap();
        stdfs::write(dir.path().join("10.html"), "ten").unwrap();
        stdfs::write(dir.path().join("2.html"), "two").unwrap();
        stdfs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let assembly = assemble(dir.path(), "html", None).await.unwrap();
        assert_eq!(assembly.body, "two\nnine\nten\n");
        assert_eq!(assembly.pages.len(), 3);
    }

    #[tokio::test]
    async fn shared_component_resolves_on_every_page() {
        let dir = tempdir().unwrap();
        let pages = dir.path().join("pages");
        let components = dir.path().join("components");
        stdfs::create_dir_all(&pages).unwrap();
        stdfs::create_dir_all(&components).unwrap();
        stdfs::write(components.join("footer.html"), "<footer/>").unwrap();
        stdfs::write(pages.join("1.html"), "a{{> footer.html }}").unwrap();
        stdfs::write(pages.join("2.html"), "b{{> footer.html }}").unwrap();

        let resolver = IncludeResolver::new(&components);
        let assembly = assemble(&pages, "html", Some(&resolver)).await.unwrap();
        assert_eq!(assembly.body, "a<footer/>\nb<footer/>\n");
        assert!(assembly.issues.is_empty());
    }
}
