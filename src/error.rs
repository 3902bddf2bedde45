//! The error taxonomy for the whole crate.
//!
//! Every fallible L0-L7 operation returns [`Result`]; the CLI binary is the only place
//! that converts an `Err` into a process exit code (the "global recovery point" from
//! the design notes).

use core::fmt;
use core::result;

pub type Result<T> = result::Result<T, Error>;

/// A recoverable condition: the file keeps parsing, but the caller should know
/// something was off. Carried alongside successful output rather than returned as
/// an `Err`, per the spec's distinction between terminal errors and warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A script or function table entry pointed outside the file; its body was
    /// skipped but the entry itself is still reported.
    OutOfBoundsEntry { kind: &'static str, offset: i64 },
    /// A chunk tag wasn't recognized while dumping full contents.
    UnsupportedChunk { name: String },
    /// An `ATAG` chunk declared a version other than 0.
    UnsupportedChunkVersion { version: u8 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OutOfBoundsEntry { kind, offset } => {
                write!(f, "{kind} offset {offset:#x} lies outside the file; body skipped")
            }
            Diagnostic::UnsupportedChunk { name } => {
                write!(f, "chunk '{name}' not supported")
            }
            Diagnostic::UnsupportedChunkVersion { version } => {
                write!(f, "ATAG version {version} not supported")
            }
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Scroll(scroll::Error),
    /// The file size exceeds the implementation's addressable offset range.
    TooLarge { size: usize },
    /// Magic bytes matched none of the known containers.
    UnsupportedFormat,
    /// `-l`/`-c` requested against an ACS0 file, which has no chunk region.
    UnsupportedOperation(&'static str),
    /// Any bounds violation: short read, offset outside file/chunk, unterminated
    /// string, bad indirection geometry.
    IllFormed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Scroll(err) => write!(f, "binary read error: {err}"),
            Error::TooLarge { size } => {
                write!(f, "file is {size} bytes, exceeding the addressable offset range")
            }
            Error::UnsupportedFormat => write!(f, "unrecognized object file format"),
            Error::UnsupportedOperation(what) => write!(f, "unsupported operation: {what}"),
            Error::IllFormed(reason) => write!(f, "ill-formed object file: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Scroll(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Self {
        Error::Scroll(err)
    }
}

/// Shorthand used throughout L0-L5 to fail with `Error::IllFormed`.
pub fn ill_formed<T>(reason: impl Into<String>) -> Result<T> {
    Err(Error::IllFormed(reason.into()))
}
