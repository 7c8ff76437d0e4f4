//! The record-consumer contract between parsers and caller containers.
//!
//! A [`Handler`] is the caller-side sink for parsed records. The engine never feeds
//! records to the handler directly: for every chunk it requests a [`ChunkHandler`]
//! positioned at the chunk's starting record offset, and the per-chunk parser feeds
//! that. This is what lets chunks parse concurrently into pre-sized containers:
//! each chunk handler owns a disjoint output range keyed by its offset.
//!
//! `PARALLEL_OK` declares whether chunk handlers tolerate concurrent invocation.
//! Handlers that need a total record order should either report `false` (forcing
//! the engine inline) or key their writes by the offset they were created with.

use crate::error::Result;
use crate::value::ValueType;

/// A record consumer, borrowed by the engine for the duration of a parse call.
pub trait Handler: Sync {
    /// Element type records are converted to.
    type Value: ValueType;

    /// The per-chunk sink type.
    type Chunk: ChunkHandler<Value = Self::Value>;

    /// Whether chunk handlers may be driven from multiple workers at once.
    const PARALLEL_OK: bool;

    /// Returns a sink positioned to consume records starting at body record
    /// ordinal `offset`.
    fn chunk_handler(&self, offset: u64) -> Self::Chunk;
}

/// The per-chunk record sink.
///
/// Implementations that buffer must flush when dropped; the engine drops each
/// chunk handler as soon as its chunk is parsed.
pub trait ChunkHandler: Send {
    /// Element type records are converted to.
    type Value: ValueType;

    /// Consumes one matrix record. Indices are 0-based.
    fn handle(&mut self, row: u64, col: u64, value: Self::Value) -> Result<()>;

    /// Consumes one vector record. Indices are 0-based.
    fn handle_vector(&mut self, index: u64, value: Self::Value) -> Result<()> {
        self.handle(index, 0, value)
    }
}

impl<H: Handler> Handler for &H {
    type Value = H::Value;
    type Chunk = H::Chunk;
    const PARALLEL_OK: bool = H::PARALLEL_OK;

    fn chunk_handler(&self, offset: u64) -> Self::Chunk {
        (**self).chunk_handler(offset)
    }
}
