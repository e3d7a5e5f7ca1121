//! Contains the Error and Result types used throughout the codec.

use crate::Tag;

/// An error from parsing, tree access or writing. Wire-level errors carry
/// the byte offset they occurred at.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    offset: Option<u64>,
    msg: String,
}

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The underlying byte source failed. Unrecoverable for the operation.
    Io,

    /// The stream ended part way through a tag.
    UnexpectedEnd,

    /// A kind byte outside 0..=12.
    InvalidKind,

    /// Malformed modified UTF-8 in a string or name.
    InvalidUtf8,

    /// An array, list or string claimed a negative length.
    NegativeLength,

    /// A writer or builder was driven into an invalid state, eg a named
    /// element pushed into a list. These are programmer errors.
    Structural,

    /// A typed accessor was applied to a node of a different kind.
    WrongKind,

    /// The document root is not a compound, or the input is empty.
    InvalidRoot,
}

/// Convenience type for Result.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get the kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset the error occurred at, where known.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub(crate) fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            offset: None,
            msg: msg.into(),
        }
    }

    pub(crate) fn at(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn unexpected_end() -> Self {
        Self::new(ErrorKind::UnexpectedEnd, "unexpected end of stream")
    }

    pub(crate) fn invalid_kind(kind: u8) -> Self {
        Self::new(ErrorKind::InvalidKind, format!("invalid tag kind: {kind}"))
    }

    pub(crate) fn invalid_utf8(data: &[u8]) -> Self {
        Self::new(
            ErrorKind::InvalidUtf8,
            format!(
                "invalid modified utf-8 string: {}",
                String::from_utf8_lossy(data)
            ),
        )
    }

    pub(crate) fn negative_length(len: i32) -> Self {
        Self::new(ErrorKind::NegativeLength, format!("negative length: {len}"))
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, msg)
    }

    pub(crate) fn wrong_kind(expected: Tag, actual: Tag) -> Self {
        Self::new(
            ErrorKind::WrongKind,
            format!("expected {expected:?}, found {actual:?}"),
        )
    }

    pub(crate) fn invalid_root(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRoot, msg)
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} (at byte {})", self.msg, offset),
            None => f.write_str(&self.msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::unexpected_end(),
            _ => Self::new(ErrorKind::Io, format!("io error: {e}")),
        }
    }
}
