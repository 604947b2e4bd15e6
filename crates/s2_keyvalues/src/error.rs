use thiserror::Error;

/// Convenience alias for decoder results.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// What went wrong while tokenizing or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedEof,
    UnexpectedToken(String),
    UnterminatedString,
    TrailingData,
    /// Blocks nested deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
    TooDeep,
}

/// A syntax error, with the 1-based position where it was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("KeyValues syntax error at {line}:{column}: {kind:?}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

/// Errors from the typed decoders.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The document parsed, but its root key is not the one the decoder expects.
    #[error("expected root key '{expected}', found '{found}'")]
    UnexpectedRoot { expected: &'static str, found: String },

    /// A required key is missing or has the wrong shape (object vs. string).
    #[error("missing or invalid key '{0}'")]
    MissingKey(String),
}
