//! Centralized error handling for parmat.
//!
//! This module provides a robust error handling system that strictly avoids panics,
//! ensuring that all failure conditions are properly propagated through the `Result` type.
//!
//! ## Design Philosophy
//!
//! parmat's error handling is designed with the following principles:
//!
//! 1. **No Panics:** All error conditions are represented as `Result` values. The library
//!    enforces this through `#![deny(clippy::panic)]` and `#![deny(clippy::unwrap_used)]`.
//!
//! 2. **Line-Accurate Diagnostics:** Errors raised while parsing the body of a file carry
//!    the 1-based line number in the *original* file, even when the failing record was
//!    parsed by a worker thread deep inside a chunk. The engine computes each chunk's
//!    starting line number before the chunk is handed to the pool, so workers only add
//!    their intra-chunk offset.
//!
//! 3. **Cloneable Errors:** The [`ParmatError`] type is `Clone`, allowing the first error
//!    observed by any worker to be captured once and surfaced to the caller after the
//!    pipeline drains. I/O errors are wrapped in `Arc` to make cloning cheap.
//!
//! ## Error Categories
//!
//! - **Header errors** ([`ParmatError::InvalidHeader`], [`ParmatError::InvalidDimensions`]):
//!   the banner, comment block, or dimension line is malformed
//! - **Body errors** ([`ParmatError::InvalidValue`], [`ParmatError::OutOfRange`]): a numeric
//!   token is malformed, overflows, or references an index beyond the declared dimensions
//! - **Cardinality errors** ([`ParmatError::FileTooShort`], [`ParmatError::FileTooLong`]):
//!   the body holds fewer or more records than the header declares
//! - **API misuse** ([`ParmatError::InvalidArgument`]): mismatched slice lengths and similar
//! - **I/O errors** ([`ParmatError::Io`]): failures of the underlying stream
//!
//! ## Usage Patterns
//!
//! ```rust
//! use parmat::{read_header, ParmatError};
//!
//! let mut bad = &b"not a matrix market file\n"[..];
//! match read_header(&mut bad) {
//!     Err(ParmatError::InvalidHeader(msg)) => assert!(msg.contains("banner")),
//!     other => panic!("expected InvalidHeader, got {:?}", other),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for parmat operations.
///
/// This type alias is used throughout the library to simplify error handling.
/// It is equivalent to `std::result::Result<T, ParmatError>`.
pub type Result<T> = std::result::Result<T, ParmatError>;

/// The master error enum covering all failure domains in parmat.
///
/// Body errors (`InvalidValue`, `OutOfRange`) carry the 1-based line number in the
/// original file where the offending token appeared. Cardinality errors carry the
/// declared and observed record counts.
///
/// ## Cloneability
///
/// This type is `Clone` so that the parallel engine can capture the first error raised
/// by any worker and return it after the pipeline has drained. The I/O variant wraps
/// its `io::Error` in an `Arc` to keep cloning cheap.
#[derive(Debug, Clone)]
pub enum ParmatError {
    /// Low-level I/O failure of the underlying stream.
    ///
    /// The `io::Error` is wrapped in an `Arc` to make the error `Clone`.
    Io(Arc<io::Error>),

    /// The banner line is missing, garbled, or names an unknown enum token.
    InvalidHeader(String),

    /// The dimension line is non-numeric, negative, or has the wrong arity
    /// for the declared format.
    InvalidDimensions {
        /// 1-based line number of the dimension line.
        line: u64,
        /// Description of the violation.
        msg: String,
    },

    /// A numeric token in the body is malformed, or a narrowing conversion
    /// (e.g. a `complex` file read into a real-valued handler) was rejected.
    InvalidValue {
        /// 1-based line number in the original file.
        line: u64,
        /// Description of the violation.
        msg: String,
    },

    /// An integer overflowed, or a coordinate referenced an index beyond the
    /// declared dimensions.
    OutOfRange {
        /// 1-based line number in the original file.
        line: u64,
        /// Description of the violation.
        msg: String,
    },

    /// The body holds fewer records than the header declares.
    FileTooShort {
        /// Declared record count (`nnz` for coordinate, `nrows * ncols` for array).
        expected: u64,
        /// Records actually present.
        found: u64,
    },

    /// The body holds more records than the header declares.
    FileTooLong {
        /// Declared record count.
        expected: u64,
        /// Lower bound on the records actually present.
        found: u64,
    },

    /// API misuse: mismatched output array sizes, inconsistent slice lengths,
    /// a formatter constructed over inconsistent inputs.
    InvalidArgument(String),
}

impl fmt::Display for ParmatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidHeader(msg) => write!(f, "invalid header: {msg}"),
            Self::InvalidDimensions { line, msg } => {
                write!(f, "invalid dimension line at line {line}: {msg}")
            }
            Self::InvalidValue { line, msg } => write!(f, "invalid value at line {line}: {msg}"),
            Self::OutOfRange { line, msg } => write!(f, "out of range at line {line}: {msg}"),
            Self::FileTooShort { expected, found } => {
                write!(
                    f,
                    "file too short: header declares {expected} records, found {found}"
                )
            }
            Self::FileTooLong { expected, found } => {
                write!(
                    f,
                    "file too long: header declares {expected} records, found at least {found}"
                )
            }
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for ParmatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ParmatError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl ParmatError {
    /// The 1-based line number this error is anchored to, if any.
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::InvalidDimensions { line, .. }
            | Self::InvalidValue { line, .. }
            | Self::OutOfRange { line, .. } => Some(*line),
            _ => None,
        }
    }
}
