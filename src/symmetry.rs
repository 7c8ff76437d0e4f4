//! Symmetry generalization.
//!
//! Files with a non-`general` symmetry store only the lower triangle. When
//! [`ReadOptions::generalize_symmetry`](crate::ReadOptions) is set, the engine
//! wraps the caller's handler in a [`GeneralizingHandler`] so the caller observes
//! the full matrix: every off-diagonal record `(r, c, v)` is forwarded together
//! with its mirror `(c, r, v')`, where `v'` is `v` for `symmetric`, `-v` for
//! `skew-symmetric`, and `conj(v)` for `hermitian`.
//!
//! Mirroring at most doubles the record stream, and the exact count depends on how
//! many diagonal entries the file carries, so the inner handler must not assume a
//! fixed per-chunk record count. Appending sinks such as
//! [`TripletAppender`](crate::containers::TripletAppender) and position-keyed sinks
//! such as [`DenseCollector`](crate::containers::DenseCollector) both qualify;
//! offset-sliced sinks such as
//! [`TripletCollector`](crate::containers::TripletCollector) do not.
//!
//! Skew-symmetric files are required to carry a zero diagonal; this adapter does
//! not verify that, it only refrains from mirroring diagonal records.

use crate::error::Result;
use crate::handler::{ChunkHandler, Handler};
use crate::header::Symmetry;
use crate::value::ValueType;

/// Handler adapter that synthesizes mirrored entries for non-`general` symmetries.
pub struct GeneralizingHandler<H> {
    inner: H,
    symmetry: Symmetry,
}

impl<H: Handler> GeneralizingHandler<H> {
    /// Wraps `inner`, mirroring records according to `symmetry`.
    pub fn new(inner: H, symmetry: Symmetry) -> Self {
        Self { inner, symmetry }
    }

    /// Returns the wrapped handler.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: Handler> Handler for GeneralizingHandler<H> {
    type Value = H::Value;
    type Chunk = GeneralizingChunk<H::Chunk>;
    const PARALLEL_OK: bool = H::PARALLEL_OK;

    fn chunk_handler(&self, offset: u64) -> Self::Chunk {
        GeneralizingChunk {
            inner: self.inner.chunk_handler(offset),
            symmetry: self.symmetry,
        }
    }
}

/// Per-chunk sink produced by [`GeneralizingHandler`].
pub struct GeneralizingChunk<C> {
    inner: C,
    symmetry: Symmetry,
}

impl<C: ChunkHandler> ChunkHandler for GeneralizingChunk<C> {
    type Value = C::Value;

    fn handle(&mut self, row: u64, col: u64, value: Self::Value) -> Result<()> {
        self.inner.handle(row, col, value)?;
        if row == col {
            return Ok(());
        }
        match self.symmetry {
            Symmetry::General => Ok(()),
            Symmetry::Symmetric => self.inner.handle(col, row, value),
            Symmetry::SkewSymmetric => self.inner.handle(col, row, value.negate()),
            Symmetry::Hermitian => self.inner.handle(col, row, value.conjugate()),
        }
    }

    // Vectors carry no symmetry; records pass through untouched.
    fn handle_vector(&mut self, index: u64, value: Self::Value) -> Result<()> {
        self.inner.handle_vector(index, value)
    }
}
