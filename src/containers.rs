//! Built-in handler implementations backed by plain vectors.
//!
//! Four sinks cover the common read targets:
//!
//! - [`TripletCollector`]: pre-sized row/column/value vectors for coordinate
//!   matrices. Chunk handlers write disjoint slices keyed by their record offset,
//!   so chunks can land in any order and the result is still in file order.
//! - [`TripletAppender`]: growable row/column/value vectors for record streams
//!   whose length is not known up front, such as generalized symmetric reads.
//!   Record order across chunks is not deterministic under parallelism.
//! - [`DoubletCollector`]: the vector analogue of [`TripletCollector`], storing
//!   `(index, value)` pairs.
//! - [`DenseCollector`]: a zero-filled column-major array written through
//!   position-keyed stores, for array files and coordinate-to-dense reads.
//!
//! All chunk handlers buffer records locally and merge into the shared storage
//! under a single lock when dropped, so the lock is taken once per chunk rather
//! than once per record.

use std::sync::{Arc, Mutex};

use crate::error::{ParmatError, Result};
use crate::handler::{ChunkHandler, Handler};
use crate::value::ValueType;

fn unlock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

fn still_borrowed<T>(_: T) -> ParmatError {
    ParmatError::InvalidArgument(
        "collector is still borrowed by outstanding chunk handlers".to_string(),
    )
}

struct TripletSlots<V> {
    cells: Mutex<(Vec<u64>, Vec<u64>, Vec<V>)>,
    len: usize,
}

/// Pre-sized triplet sink: record `i` of the file lands at position `i` of the
/// row/column/value vectors.
pub struct TripletCollector<V> {
    shared: Arc<TripletSlots<V>>,
}

impl<V: ValueType> TripletCollector<V> {
    /// Allocates storage for exactly `nnz` records.
    pub fn with_capacity(nnz: usize) -> Self {
        Self {
            shared: Arc::new(TripletSlots {
                cells: Mutex::new((vec![0; nnz], vec![0; nnz], vec![V::zero(); nnz])),
                len: nnz,
            }),
        }
    }

    /// Unwraps into `(rows, cols, values)`. Fails if chunk handlers are still
    /// outstanding.
    pub fn into_parts(self) -> Result<(Vec<u64>, Vec<u64>, Vec<V>)> {
        let slots = Arc::try_unwrap(self.shared).map_err(still_borrowed)?;
        Ok(slots.cells.into_inner().unwrap_or_else(|p| p.into_inner()))
    }
}

impl<V: ValueType> Handler for TripletCollector<V> {
    type Value = V;
    type Chunk = TripletCollectorSink<V>;
    const PARALLEL_OK: bool = true;

    fn chunk_handler(&self, offset: u64) -> Self::Chunk {
        TripletCollectorSink {
            shared: Arc::clone(&self.shared),
            base: offset as usize,
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
        }
    }
}

/// Chunk sink of [`TripletCollector`]; flushes its buffered records into the
/// shared vectors when dropped.
pub struct TripletCollectorSink<V: ValueType> {
    shared: Arc<TripletSlots<V>>,
    base: usize,
    rows: Vec<u64>,
    cols: Vec<u64>,
    values: Vec<V>,
}

impl<V: ValueType> ChunkHandler for TripletCollectorSink<V> {
    type Value = V;

    fn handle(&mut self, row: u64, col: u64, value: V) -> Result<()> {
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
        Ok(())
    }
}

impl<V: ValueType> Drop for TripletCollectorSink<V> {
    fn drop(&mut self) {
        if self.base >= self.shared.len || self.rows.is_empty() {
            return;
        }
        // Clamp: overlong bodies are reported by the engine's record-count
        // check, the excess records are simply not stored.
        let n = self.rows.len().min(self.shared.len - self.base);
        let mut cells = unlock(&self.shared.cells);
        let end = self.base + n;
        cells.0[self.base..end].copy_from_slice(&self.rows[..n]);
        cells.1[self.base..end].copy_from_slice(&self.cols[..n]);
        cells.2[self.base..end].copy_from_slice(&self.values[..n]);
    }
}

/// Growable triplet sink for record streams of unknown length.
pub struct TripletAppender<V> {
    shared: Arc<Mutex<(Vec<u64>, Vec<u64>, Vec<V>)>>,
}

impl<V: ValueType> TripletAppender<V> {
    /// Reserves room for roughly `hint` records.
    pub fn with_size_hint(hint: usize) -> Self {
        Self {
            shared: Arc::new(Mutex::new((
                Vec::with_capacity(hint),
                Vec::with_capacity(hint),
                Vec::with_capacity(hint),
            ))),
        }
    }

    /// Unwraps into `(rows, cols, values)`. Fails if chunk handlers are still
    /// outstanding.
    pub fn into_parts(self) -> Result<(Vec<u64>, Vec<u64>, Vec<V>)> {
        let cells = Arc::try_unwrap(self.shared).map_err(still_borrowed)?;
        Ok(cells.into_inner().unwrap_or_else(|p| p.into_inner()))
    }
}

impl<V: ValueType> Handler for TripletAppender<V> {
    type Value = V;
    type Chunk = TripletAppenderSink<V>;
    const PARALLEL_OK: bool = true;

    fn chunk_handler(&self, _offset: u64) -> Self::Chunk {
        TripletAppenderSink {
            shared: Arc::clone(&self.shared),
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
        }
    }
}

/// Chunk sink of [`TripletAppender`].
pub struct TripletAppenderSink<V: ValueType> {
    shared: Arc<Mutex<(Vec<u64>, Vec<u64>, Vec<V>)>>,
    rows: Vec<u64>,
    cols: Vec<u64>,
    values: Vec<V>,
}

impl<V: ValueType> ChunkHandler for TripletAppenderSink<V> {
    type Value = V;

    fn handle(&mut self, row: u64, col: u64, value: V) -> Result<()> {
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
        Ok(())
    }
}

impl<V: ValueType> Drop for TripletAppenderSink<V> {
    fn drop(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let mut cells = unlock(&self.shared);
        cells.0.append(&mut self.rows);
        cells.1.append(&mut self.cols);
        cells.2.append(&mut self.values);
    }
}

struct DoubletSlots<V> {
    cells: Mutex<(Vec<u64>, Vec<V>)>,
    len: usize,
}

/// Pre-sized sparse-vector sink: record `i` of the file lands at position `i`
/// of the index/value vectors.
pub struct DoubletCollector<V> {
    shared: Arc<DoubletSlots<V>>,
}

impl<V: ValueType> DoubletCollector<V> {
    /// Allocates storage for exactly `nnz` records.
    pub fn with_capacity(nnz: usize) -> Self {
        Self {
            shared: Arc::new(DoubletSlots {
                cells: Mutex::new((vec![0; nnz], vec![V::zero(); nnz])),
                len: nnz,
            }),
        }
    }

    /// Unwraps into `(indices, values)`. Fails if chunk handlers are still
    /// outstanding.
    pub fn into_parts(self) -> Result<(Vec<u64>, Vec<V>)> {
        let slots = Arc::try_unwrap(self.shared).map_err(still_borrowed)?;
        Ok(slots.cells.into_inner().unwrap_or_else(|p| p.into_inner()))
    }
}

impl<V: ValueType> Handler for DoubletCollector<V> {
    type Value = V;
    type Chunk = DoubletCollectorSink<V>;
    const PARALLEL_OK: bool = true;

    fn chunk_handler(&self, offset: u64) -> Self::Chunk {
        DoubletCollectorSink {
            shared: Arc::clone(&self.shared),
            base: offset as usize,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }
}

/// Chunk sink of [`DoubletCollector`].
pub struct DoubletCollectorSink<V: ValueType> {
    shared: Arc<DoubletSlots<V>>,
    base: usize,
    indices: Vec<u64>,
    values: Vec<V>,
}

impl<V: ValueType> ChunkHandler for DoubletCollectorSink<V> {
    type Value = V;

    fn handle(&mut self, row: u64, _col: u64, value: V) -> Result<()> {
        self.handle_vector(row, value)
    }

    fn handle_vector(&mut self, index: u64, value: V) -> Result<()> {
        self.indices.push(index);
        self.values.push(value);
        Ok(())
    }
}

impl<V: ValueType> Drop for DoubletCollectorSink<V> {
    fn drop(&mut self) {
        if self.base >= self.shared.len || self.indices.is_empty() {
            return;
        }
        let n = self.indices.len().min(self.shared.len - self.base);
        let mut cells = unlock(&self.shared.cells);
        let end = self.base + n;
        cells.0[self.base..end].copy_from_slice(&self.indices[..n]);
        cells.1[self.base..end].copy_from_slice(&self.values[..n]);
    }
}

struct DenseSlots<V> {
    cells: Mutex<Vec<V>>,
    nrows: u64,
}

/// Zero-filled column-major dense sink. Records land at `col * nrows + row`,
/// which makes it order-insensitive and safe under the symmetry generalizer.
pub struct DenseCollector<V> {
    shared: Arc<DenseSlots<V>>,
}

impl<V: ValueType> DenseCollector<V> {
    /// Allocates an `nrows x ncols` column-major array filled with zeros.
    pub fn new(nrows: u64, ncols: u64) -> Self {
        let len = (nrows as usize).saturating_mul(ncols as usize);
        Self {
            shared: Arc::new(DenseSlots {
                cells: Mutex::new(vec![V::zero(); len]),
                nrows,
            }),
        }
    }

    /// Unwraps into the column-major value vector. Fails if chunk handlers are
    /// still outstanding.
    pub fn into_values(self) -> Result<Vec<V>> {
        let slots = Arc::try_unwrap(self.shared).map_err(still_borrowed)?;
        Ok(slots.cells.into_inner().unwrap_or_else(|p| p.into_inner()))
    }
}

impl<V: ValueType> Handler for DenseCollector<V> {
    type Value = V;
    type Chunk = DenseCollectorSink<V>;
    const PARALLEL_OK: bool = true;

    fn chunk_handler(&self, _offset: u64) -> Self::Chunk {
        DenseCollectorSink {
            shared: Arc::clone(&self.shared),
            entries: Vec::new(),
        }
    }
}

/// Chunk sink of [`DenseCollector`].
pub struct DenseCollectorSink<V: ValueType> {
    shared: Arc<DenseSlots<V>>,
    entries: Vec<(usize, V)>,
}

impl<V: ValueType> ChunkHandler for DenseCollectorSink<V> {
    type Value = V;

    fn handle(&mut self, row: u64, col: u64, value: V) -> Result<()> {
        let position = (col * self.shared.nrows + row) as usize;
        self.entries.push((position, value));
        Ok(())
    }
}

impl<V: ValueType> Drop for DenseCollectorSink<V> {
    fn drop(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let mut cells = unlock(&self.shared.cells);
        for (position, value) in self.entries.drain(..) {
            if let Some(cell) = cells.get_mut(position) {
                *cell = value;
            }
        }
    }
}
