use thiserror::Error;

/// Convenience result type used across the crate.
pub type StatsResult<T> = Result<T, StatsError>;

/// Coarse classification of a [`StatsError`].
///
/// Callers that only care about *why* an operation failed (e.g. to decide whether to keep going
/// with the next dataset) can match on this instead of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A lookup missed (year, language, measure, area, mapping role, dataset code).
    NotFound,
    /// The input was readable but its content is not what the parser expects.
    MalformedInput,
    /// The source-format tag is not one the dispatcher knows.
    UnsupportedFormat,
    /// The stream could not be opened or read, or had no content.
    StreamState,
}

/// Error type shared by the data model, the parsers and the loader.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A keyed lookup failed. `what` names the kind of key (e.g. `"measure"`).
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    /// Structurally invalid input (too few columns, wrong JSON shape, missing field).
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// A token could not be parsed as the number/year it should be.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// The dispatcher was given a source-format tag it does not recognise.
    #[error("unsupported source format: {tag}")]
    UnsupportedFormat { tag: String },

    /// The stream was not usable before any parsing started.
    #[error("stream error: {message}")]
    StreamState { message: String },

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV framing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON syntax or I/O error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatsError {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn parse(
        row: usize,
        column: impl Into<String>,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ParseError {
            row,
            column: column.into(),
            raw: raw.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_format(tag: impl Into<String>) -> Self {
        Self::UnsupportedFormat { tag: tag.into() }
    }

    pub fn stream_state(message: impl Into<String>) -> Self {
        Self::StreamState {
            message: message.into(),
        }
    }

    /// Map this error onto the crate's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MalformedInput { .. } | Self::ParseError { .. } => ErrorKind::MalformedInput,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::StreamState { .. } | Self::Io(_) => ErrorKind::StreamState,
            Self::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => ErrorKind::StreamState,
                _ => ErrorKind::MalformedInput,
            },
            Self::Json(err) if err.is_io() => ErrorKind::StreamState,
            Self::Json(_) => ErrorKind::MalformedInput,
        }
    }
}
