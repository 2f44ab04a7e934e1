use thiserror::Error;

/// Failures while loading the manifest or a chapter document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("manifest lists {0} more than once")]
    DuplicateChapter(String),

    #[error("no markdown renderer is available")]
    RendererMissing,
}
