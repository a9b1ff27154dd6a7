//! Error taxonomy for the parser, per the error model in the format
//! specification: every fatal condition is reported with the source line
//! number of the statement that triggered it.

use thiserror::Error;

/// The kind of failure, independent of where it happened.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    #[error("unrecognized statement: {0}")]
    Lexical(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("bad operation: {0}")]
    BadOperation(String),

    #[error("undefined aperture: {0}")]
    UndefinedAperture(String),

    #[error("duplicate aperture: {0}")]
    DuplicateAperture(String),

    #[error("unknown aperture template: {0}")]
    UnknownTemplate(String),

    #[error("macro error: {0}")]
    Macro(String),

    #[error("region error: {0}")]
    Region(String),

    #[error("input exhausted without M02*")]
    EofMissing,
}

/// A fatal parse error, tagged with the one-based line number of the first
/// line of the offending statement.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {kind}")]
pub struct Error {
    pub line: usize,
    pub kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(line: usize, kind: ErrorKind) -> Self {
        Error { line, kind }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
