use std::path::PathBuf;

/// Errors raised while reading or shaping `.doc-config.json`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config value at '{path}' is a list; only strings, numbers and booleans are allowed")]
    SequenceLeaf { path: String },

    #[error("Config value at '{path}' must be an object")]
    NotAMapping { path: String },

    #[error("Config key path must not be empty")]
    EmptyKey,
}

/// Errors that abort a build. Missing or circular includes are not errors,
/// they are reported as [`IncludeIssue`](crate::IncludeIssue)s instead.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No .doc-config.json found at {0}. Are you in an hdoc project directory?")]
    MissingConfig(PathBuf),

    #[error("Pages directory not found: {0}")]
    MissingPagesDir(PathBuf),

    #[error("No page files found in {0} (format: 01.html, 02.html, etc.)")]
    NoPages(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
