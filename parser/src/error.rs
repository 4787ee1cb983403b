//! Errors reported while reading a YAML stream.

use std::{io, sync::Arc};

use thiserror::Error;

use crate::scanner::{Marker, ScanError, ScanErrorKind};

/// The category of a [`ParseError`].
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub enum ParseErrorKind {
    /// A token appeared where the grammar does not allow it.
    UnexpectedToken,
    /// An anchor name was defined twice in the same document.
    DuplicateAnchor,
    /// An alias refers to an anchor that is not (yet) defined in the document.
    UndefinedAlias,
    /// A mapping key is neither a scalar nor a flow collection where only those are allowed.
    MappingKeyNotScalarOrFlow,
}

/// A structural error in an otherwise well-formed token stream.
#[derive(Clone, PartialEq, Debug, Eq, Error)]
#[error("{info} at {mark}")]
pub struct ParseError {
    kind: ParseErrorKind,
    mark: Marker,
    info: String,
}

impl ParseError {
    /// Create a new error from a kind, a location and an error string.
    #[must_use]
    pub fn new(kind: ParseErrorKind, mark: Marker, info: impl Into<String>) -> ParseError {
        ParseError {
            kind,
            mark,
            info: info.into(),
        }
    }

    /// Return the category of the error.
    #[must_use]
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Return the marker pointing to the error in the source.
    #[must_use]
    pub fn marker(&self) -> &Marker {
        &self.mark
    }

    /// Return the information string describing the error that happened.
    #[must_use]
    pub fn info(&self) -> &str {
        &self.info
    }
}

/// Any error that stops the reading of a YAML stream.
///
/// The error is cheap to clone so that a parser can hand the same error out every time it is
/// polled after failing.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The characters do not form valid YAML tokens.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// The tokens do not form a valid YAML document.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The input source failed.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl Error {
    /// Return the location of the error in the source, if it has one.
    #[must_use]
    pub fn marker(&self) -> Option<&Marker> {
        match self {
            Error::Scan(e) => Some(e.marker()),
            Error::Parse(e) => Some(e.marker()),
            Error::Io(_) => None,
        }
    }

    /// Return the information string describing the error.
    #[must_use]
    pub fn info(&self) -> String {
        match self {
            Error::Scan(e) => e.info().to_owned(),
            Error::Parse(e) => e.info().to_owned(),
            Error::Io(e) => e.to_string(),
        }
    }

    /// Promote key-placement scanner errors to structural errors.
    ///
    /// The scanner is the one noticing a `:` or `?` that cannot introduce a key where it stands,
    /// but for a reader of the document this is a malformed mapping.
    pub(crate) fn promote_key_errors(self) -> Error {
        match self {
            Error::Scan(e) if e.kind() == ScanErrorKind::InvalidKey => Error::Parse(ParseError::new(
                ParseErrorKind::MappingKeyNotScalarOrFlow,
                *e.marker(),
                e.info(),
            )),
            e => e,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Scan(a), Error::Scan(b)) => a == b,
            (Error::Parse(a), Error::Parse(b)) => a == b,
            (Error::Io(a), Error::Io(b)) => Arc::ptr_eq(a, b) || a.kind() == b.kind(),
            _ => false,
        }
    }
}
