//! Error types for book assembly.

use thiserror::Error;

/// Everything that can abort a book assembly.
///
/// The assembler never recovers partially: the first error raised by any
/// stage is returned to the caller and no PDF bytes are produced.
#[derive(Debug, Error)]
pub enum BindError {
    /// A request value could not be interpreted (e.g. a non-integer
    /// `chapter_count`).
    #[error("invalid value for `{field}`: {value:?}")]
    InvalidConfig { field: String, value: String },

    /// An uploaded chapter is not a loadable PDF.
    #[error("chapter {index} is not a readable PDF: {source}")]
    MalformedUpload {
        index: usize,
        #[source]
        source: lopdf::Error,
    },

    /// The front/back matter could not be rendered or rasterized.
    #[error("render error: {0}")]
    Render(String),

    /// Structural failure while merging page trees.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BindError {
    pub(crate) fn invalid(field: &str, value: impl Into<String>) -> Self {
        BindError::InvalidConfig {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BindError>;
