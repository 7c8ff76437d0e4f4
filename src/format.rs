//! Body formatters for the write pipeline.
//!
//! A [`Formatter`] partitions its source into work units of roughly
//! `options.chunk_size_values` records each. [`Formatter::next_chunk`] runs on the
//! producer thread and is cheap: it only slices the source and captures the
//! emission parameters. The returned [`FormatChunk`] is a pure function of its
//! captured inputs; [`FormatChunk::render`] does the expensive text generation and
//! is what the engine ships to the worker pool.
//!
//! Every formatter guarantees that concatenating its chunks' text in emission
//! order reproduces the body exactly, and that each chunk ends with a newline.
//!
//! Three formatters cover the built-in sources:
//!
//! - [`TripletFormatter`]: parallel row/column/value slices, one record per line.
//!   The value slice may be empty to write `pattern` bodies, and a doublet variant
//!   treats the second column as data rather than an index.
//! - [`CscFormatter`]: compressed-column arrays, with a transpose flag that turns
//!   CSR input into the same column-major record stream.
//! - [`DenseFormatter`]: a dense slice in either storage order, emitted one value
//!   per line in column-major order.

use crate::error::{ParmatError, Result};
use crate::options::WriteOptions;
use crate::value::{emit_int, ValueType};

/// A partitioned source of body text.
///
/// `next_chunk` must only be called while `has_next()` is true.
pub trait Formatter: Send {
    /// The work unit type shipped to the pool.
    type Chunk: FormatChunk;

    /// True while the source has unemitted records.
    fn has_next(&self) -> bool;

    /// Carves the next work unit off the source.
    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk;
}

/// A deferred text-producing work unit.
pub trait FormatChunk: Send {
    /// Renders this work unit's records as text. Infallible: all validation
    /// happened when the formatter was constructed.
    fn render(self) -> String;
}

// Rough per-record text length used to pre-size chunk buffers.
const RECORD_RESERVE: usize = 25;

fn emit_index(out: &mut String, index: u64) {
    emit_int(out, index.wrapping_add(1) as i64);
}

/// Second column of a [`TripletFormatter`]: either column indices or, for doublet
/// vectors, the data itself.
#[derive(Clone, Copy)]
enum SecondColumn<'a, V> {
    Indices(&'a [u64]),
    Values(&'a [V]),
}

/// Formats parallel row/column/value slices, one `row+1 col+1 value` record per
/// line. Partitioned by record count.
pub struct TripletFormatter<'a, V: ValueType> {
    rows: &'a [u64],
    second: SecondColumn<'a, V>,
    values: &'a [V],
    pos: usize,
}

impl<'a, V: ValueType> TripletFormatter<'a, V> {
    /// Builds a formatter over a triplet source. Pass an empty `values` slice to
    /// omit the value column (pattern matrices).
    pub fn new(rows: &'a [u64], cols: &'a [u64], values: &'a [V]) -> Result<Self> {
        if rows.len() != cols.len() || (!values.is_empty() && values.len() != rows.len()) {
            return Err(ParmatError::InvalidArgument(
                "row, column, and value slices must have equal length".to_string(),
            ));
        }
        Ok(Self {
            rows,
            second: SecondColumn::Indices(cols),
            values,
            pos: 0,
        })
    }

    /// Builds a doublet formatter: `index+1 value` records for sparse vectors.
    /// Pass an empty `values` slice to omit the value column (pattern vectors).
    pub fn doublet(indices: &'a [u64], values: &'a [V]) -> Result<Self> {
        if !values.is_empty() && indices.len() != values.len() {
            return Err(ParmatError::InvalidArgument(
                "index and value slices must have equal length".to_string(),
            ));
        }
        Ok(Self {
            rows: indices,
            second: SecondColumn::Values(values),
            values: &[],
            pos: 0,
        })
    }
}

impl<'a, V: ValueType> Formatter for TripletFormatter<'a, V> {
    type Chunk = TripletChunk<'a, V>;

    fn has_next(&self) -> bool {
        self.pos < self.rows.len()
    }

    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk {
        let take = options
            .chunk_size_values
            .max(1)
            .min(self.rows.len() - self.pos);
        let range = self.pos..self.pos + take;
        self.pos += take;

        TripletChunk {
            rows: &self.rows[range.clone()],
            second: match self.second {
                SecondColumn::Indices(cols) => SecondColumn::Indices(&cols[range.clone()]),
                SecondColumn::Values(vals) if vals.is_empty() => SecondColumn::Values(&[]),
                SecondColumn::Values(vals) => SecondColumn::Values(&vals[range.clone()]),
            },
            values: if self.values.is_empty() {
                &[]
            } else {
                &self.values[range]
            },
            precision: options.precision,
        }
    }
}

/// Work unit of [`TripletFormatter`].
pub struct TripletChunk<'a, V: ValueType> {
    rows: &'a [u64],
    second: SecondColumn<'a, V>,
    values: &'a [V],
    precision: Option<usize>,
}

impl<V: ValueType> FormatChunk for TripletChunk<'_, V> {
    fn render(self) -> String {
        let mut out = String::with_capacity(self.rows.len() * RECORD_RESERVE);
        for (i, &row) in self.rows.iter().enumerate() {
            emit_index(&mut out, row);
            match self.second {
                SecondColumn::Indices(cols) => {
                    out.push(' ');
                    emit_index(&mut out, cols[i]);
                }
                // An empty value slice omits the column (pattern vectors).
                SecondColumn::Values(vals) if !vals.is_empty() => {
                    out.push(' ');
                    vals[i].emit(&mut out, self.precision);
                }
                SecondColumn::Values(_) => {}
            }
            if !self.values.is_empty() {
                out.push(' ');
                self.values[i].emit(&mut out, self.precision);
            }
            out.push('\n');
        }
        out
    }
}

/// Formats a compressed-column matrix, emitting records column by column.
///
/// With `transpose` set the row and column of each record are swapped, which turns
/// CSR input into the equivalent coordinate stream. Partitioned by columns, scaled
/// so each work unit holds roughly `chunk_size_values` records.
pub struct CscFormatter<'a, V: ValueType> {
    ptrs: &'a [u64],
    indices: &'a [u64],
    values: &'a [V],
    col: usize,
    transpose: bool,
    nnz_per_column: f64,
}

impl<'a, V: ValueType> CscFormatter<'a, V> {
    /// Builds a formatter over CSC arrays: `ptrs` has one entry per column plus a
    /// final total, `indices[ptrs[c]..ptrs[c+1]]` are the rows of column `c`. Pass
    /// an empty `values` slice to omit the value column.
    pub fn new(
        ptrs: &'a [u64],
        indices: &'a [u64],
        values: &'a [V],
        transpose: bool,
    ) -> Result<Self> {
        if ptrs.is_empty() {
            return Err(ParmatError::InvalidArgument(
                "pointer slice must hold at least the terminating total".to_string(),
            ));
        }
        if !values.is_empty() && values.len() != indices.len() {
            return Err(ParmatError::InvalidArgument(
                "index and value slices must have equal length".to_string(),
            ));
        }
        if *ptrs.last().unwrap_or(&0) != indices.len() as u64 {
            return Err(ParmatError::InvalidArgument(
                "last pointer must equal the index count".to_string(),
            ));
        }
        let num_columns = ptrs.len() - 1;
        let nnz_per_column = if num_columns == 0 {
            1.0
        } else {
            (indices.len() as f64 / num_columns as f64).max(f64::MIN_POSITIVE)
        };
        Ok(Self {
            ptrs,
            indices,
            values,
            col: 0,
            transpose,
            nnz_per_column,
        })
    }
}

impl<'a, V: ValueType> Formatter for CscFormatter<'a, V> {
    type Chunk = CscChunk<'a, V>;

    fn has_next(&self) -> bool {
        self.col + 1 < self.ptrs.len()
    }

    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk {
        let per_unit = (options.chunk_size_values.max(1) as f64 / self.nnz_per_column).ceil();
        let take = (per_unit as usize)
            .max(1)
            .min(self.ptrs.len() - 1 - self.col);
        let first_col = self.col;
        self.col += take;

        CscChunk {
            ptrs: &self.ptrs[first_col..=first_col + take],
            indices: self.indices,
            values: self.values,
            first_col: first_col as u64,
            transpose: self.transpose,
            precision: options.precision,
        }
    }
}

/// Work unit of [`CscFormatter`]: a run of whole columns.
pub struct CscChunk<'a, V: ValueType> {
    // Pointer window for the assigned columns, including the terminating entry.
    ptrs: &'a [u64],
    indices: &'a [u64],
    values: &'a [V],
    first_col: u64,
    transpose: bool,
    precision: Option<usize>,
}

impl<V: ValueType> FormatChunk for CscChunk<'_, V> {
    fn render(self) -> String {
        let span = self
            .ptrs
            .last()
            .copied()
            .unwrap_or(0)
            .saturating_sub(self.ptrs.first().copied().unwrap_or(0)) as usize;
        let mut out = String::with_capacity(span * RECORD_RESERVE);

        for (c, window) in self.ptrs.windows(2).enumerate() {
            let col = self.first_col + c as u64;
            for k in window[0] as usize..window[1] as usize {
                let row = self.indices[k];
                let (a, b) = if self.transpose { (col, row) } else { (row, col) };
                emit_index(&mut out, a);
                out.push(' ');
                emit_index(&mut out, b);
                if !self.values.is_empty() {
                    out.push(' ');
                    self.values[k].emit(&mut out, self.precision);
                }
                out.push('\n');
            }
        }
        out
    }
}

/// Storage order of a dense source slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOrder {
    /// `values[r * ncols + c]`
    RowMajor,
    /// `values[c * nrows + r]`
    ColMajor,
}

/// Formats a dense matrix, one value per line in column-major order regardless of
/// the source storage order. Partitioned by column groups sized so each work unit
/// holds roughly `chunk_size_values` records.
pub struct DenseFormatter<'a, V: ValueType> {
    values: &'a [V],
    nrows: usize,
    ncols: usize,
    order: StorageOrder,
    col: usize,
}

impl<'a, V: ValueType> DenseFormatter<'a, V> {
    /// Builds a formatter over an `nrows x ncols` dense slice.
    pub fn new(values: &'a [V], nrows: u64, ncols: u64, order: StorageOrder) -> Result<Self> {
        let (nrows, ncols) = (nrows as usize, ncols as usize);
        if nrows.checked_mul(ncols) != Some(values.len()) {
            return Err(ParmatError::InvalidArgument(format!(
                "dense slice holds {} values, dimensions require {}",
                values.len(),
                nrows.saturating_mul(ncols)
            )));
        }
        Ok(Self {
            values,
            nrows,
            ncols,
            order,
            col: 0,
        })
    }
}

impl<'a, V: ValueType> Formatter for DenseFormatter<'a, V> {
    type Chunk = DenseChunk<'a, V>;

    fn has_next(&self) -> bool {
        self.col < self.ncols && self.nrows > 0
    }

    fn next_chunk(&mut self, options: &WriteOptions) -> Self::Chunk {
        let group = (options.chunk_size_values.max(1) / self.nrows.max(1))
            .max(1)
            .min(self.ncols - self.col);
        let first_col = self.col;
        self.col += group;

        DenseChunk {
            values: self.values,
            nrows: self.nrows,
            ncols: self.ncols,
            order: self.order,
            cols: first_col..first_col + group,
            precision: options.precision,
        }
    }
}

/// Work unit of [`DenseFormatter`]: a run of whole columns.
pub struct DenseChunk<'a, V: ValueType> {
    values: &'a [V],
    nrows: usize,
    ncols: usize,
    order: StorageOrder,
    cols: std::ops::Range<usize>,
    precision: Option<usize>,
}

impl<V: ValueType> FormatChunk for DenseChunk<'_, V> {
    fn render(self) -> String {
        let mut out = String::with_capacity(self.cols.len() * self.nrows * RECORD_RESERVE);
        for col in self.cols {
            for row in 0..self.nrows {
                let offset = match self.order {
                    StorageOrder::RowMajor => row * self.ncols + col,
                    StorageOrder::ColMajor => col * self.nrows + row,
                };
                self.values[offset].emit(&mut out, self.precision);
                out.push('\n');
            }
        }
        out
    }
}
