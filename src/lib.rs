//! # parmat
//!
//! A high-throughput, parallel reader and writer for the Matrix Market sparse and
//! dense matrix text format.
//!
//! ## Overview
//!
//! Matrix Market is a line-oriented text format, which makes naive loaders built
//! on formatted stream I/O painfully slow on multi-gigabyte files. parmat treats
//! the body as a sequence of independently parseable byte chunks and pipelines
//! stream I/O, line counting, and parsing/formatting across a worker pool, with
//! the goal of saturating memory bandwidth while preserving every format feature:
//! symmetries, pattern fields, vectors, comments, integer/real/complex fields.
//!
//! ### Key Features
//!
//! *   **Parallel Reads:** the stream is chunked on record boundaries and chunks
//!     are parsed concurrently, while line numbers and record offsets are assigned
//!     deterministically in stream order.
//! *   **Parallel Writes:** formatters carve cheap work units off the source;
//!     workers render text concurrently and an ordered buffer restores emission
//!     order before bytes reach the output stream.
//! *   **Full Feature Coverage:** coordinate and array formats, matrix and vector
//!     objects, all four symmetries with optional generalization, pattern files,
//!     and complex values.
//! *   **Line-Accurate Errors:** every malformed token is reported with its
//!     1-based line number in the original file, even when parsed by a worker
//!     deep inside the pipeline.
//! *   **Bounded Memory:** backpressure caps in-flight chunks at ten per worker,
//!     so arbitrarily large files stream through a fixed-size window.
//!
//! ## Architecture
//!
//! The read path:
//!
//! ```text
//! stream -> chunker -> line count -> chunk parser -> (generalizer) -> handler
//!            (main)     (pool)         (pool)                        (caller)
//! ```
//!
//! The write path is the mirror image:
//!
//! ```text
//! source -> formatter -> render -> ordered buffer -> stream
//!  (caller)   (main)      (pool)       (main)        (main)
//! ```
//!
//! All stream I/O happens on the calling thread; workers are purely CPU-bound.
//! See the [`engine`] module for the scheduling details.
//!
//! ## Usage
//!
//! ```rust
//! use parmat::{read_matrix_market_triplet, ReadOptions};
//!
//! let file = "%%MatrixMarket matrix coordinate real general\n\
//!             % 3x3 identity\n\
//!             3 3 3\n\
//!             1 1 1.0\n\
//!             2 2 1.0\n\
//!             3 3 1.0\n";
//!
//! let mut stream = file.as_bytes();
//! let (header, rows, cols, values) =
//!     read_matrix_market_triplet::<_, f64>(&mut stream, &ReadOptions::default())?;
//!
//! assert_eq!((header.nrows, header.ncols), (3, 3));
//! assert_eq!(rows, vec![0, 1, 2]);
//! assert_eq!(cols, vec![0, 1, 2]);
//! assert_eq!(values, vec![1.0, 1.0, 1.0]);
//! # Ok::<(), parmat::ParmatError>(())
//! ```
//!
//! Custom containers plug in at two seams: implement [`Handler`] to consume
//! records on read, or [`Formatter`] to produce records on write. The built-in
//! [`containers`] show the intended shapes.
//!
//! ## Safety and Error Handling
//!
//! * **No Panics:** no `unwrap()` or `panic!()` in the library (enforced by
//!   clippy lints). All failures surface as a [`ParmatError`].
//! * **No Unsafe:** the crate denies `unsafe_code`; the single exception is the
//!   optional `mmap` file helpers, where the mapping call is unsafe by nature.
//! * **First-Error Semantics:** when any worker fails, the engine stops issuing
//!   work, drains the pool, and returns the first captured error. A failed call
//!   never partially succeeds; caller containers are left valid but unspecified.
//!
//! ## Feature Flags
//!
//! * `parallel` (default): the rayon worker-pool engine. Without it the same
//!   pipeline runs inline.
//! * `mmap`: memory-mapped whole-file convenience readers.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod api;
pub mod chunk;
pub mod containers;
pub mod engine;
pub mod error;
pub mod format;
pub mod handler;
pub mod header;
pub mod options;
pub mod parse;
pub mod symmetry;
pub mod value;

pub use api::{
    read_matrix_market_array, read_matrix_market_doublet, read_matrix_market_triplet,
    write_matrix_market_array, write_matrix_market_csc, write_matrix_market_doublet,
    write_matrix_market_triplet,
};
#[cfg(feature = "mmap")]
pub use api::file::{read_matrix_market_array_file, read_matrix_market_triplet_file};
pub use engine::{read_body, write_body};
pub use error::{ParmatError, Result};
pub use format::{CscFormatter, DenseFormatter, FormatChunk, Formatter, StorageOrder, TripletFormatter};
pub use handler::{ChunkHandler, Handler};
pub use header::{read_header, write_header, Field, Format, Header, Object, Symmetry};
pub use options::{ReadOptions, WriteOptions};
pub use symmetry::GeneralizingHandler;
pub use value::ValueType;
