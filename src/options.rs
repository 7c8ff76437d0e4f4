//! Shared configuration for the read and write pipelines.
//!
//! Both option structs use builder-style setters so call sites can tune a single
//! knob without naming every field:
//!
//! ```rust
//! use parmat::ReadOptions;
//!
//! let options = ReadOptions::default().chunk_size_bytes(1 << 16).num_threads(4);
//! assert_eq!(options.chunk_size_bytes, 1 << 16);
//! ```

/// Default size of a read chunk before extension to the next record boundary.
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 1 << 20;

/// Default number of records targeted per write work unit.
pub const DEFAULT_CHUNK_SIZE_VALUES: usize = 1 << 12;

/// Options governing [`read_body`](crate::read_body) and the convenience readers.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Target byte length of each chunk read from the stream. Chunks are extended
    /// to the next newline, so the actual length may exceed this slightly.
    pub chunk_size_bytes: usize,

    /// Worker count for the parallel engine. `0` selects the number of available
    /// CPU cores. `1` runs the pipeline inline without a pool.
    pub num_threads: usize,

    /// When true and the header declares a non-`general` symmetry, mirrored
    /// entries are synthesized so the handler observes a general matrix.
    pub generalize_symmetry: bool,

    /// When false, the pipeline runs inline regardless of `num_threads`.
    pub parallel_ok: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
            num_threads: 0,
            generalize_symmetry: false,
            parallel_ok: true,
        }
    }
}

impl ReadOptions {
    /// Sets the target chunk size in bytes.
    pub fn chunk_size_bytes(mut self, bytes: usize) -> Self {
        self.chunk_size_bytes = bytes;
        self
    }

    /// Sets the worker count (`0` = auto).
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Enables or disables symmetry generalization.
    pub fn generalize_symmetry(mut self, enable: bool) -> Self {
        self.generalize_symmetry = enable;
        self
    }

    /// Enables or disables parallelism altogether.
    pub fn parallel_ok(mut self, enable: bool) -> Self {
        self.parallel_ok = enable;
        self
    }
}

/// Options governing [`write_body`](crate::write_body) and the convenience writers.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Target number of records per formatter work unit. Column-oriented
    /// formatters scale this to a column count.
    pub chunk_size_values: usize,

    /// Worker count for the parallel engine. `0` selects the number of available
    /// CPU cores. `1` runs the pipeline inline without a pool.
    pub num_threads: usize,

    /// Number of digits after the decimal point for floating-point values,
    /// emitted in scientific notation. `None` emits the shortest form that
    /// round-trips exactly.
    pub precision: Option<usize>,

    /// Emit a single `%` line even when the header comment is empty.
    pub always_comment: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            chunk_size_values: DEFAULT_CHUNK_SIZE_VALUES,
            num_threads: 0,
            precision: None,
            always_comment: false,
        }
    }
}

impl WriteOptions {
    /// Sets the target records per work unit.
    pub fn chunk_size_values(mut self, values: usize) -> Self {
        self.chunk_size_values = values;
        self
    }

    /// Sets the worker count (`0` = auto).
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Sets the floating-point precision (`None` = shortest round-trip form).
    pub fn precision(mut self, digits: Option<usize>) -> Self {
        self.precision = digits;
        self
    }

    /// Forces a comment line even when the comment is empty.
    pub fn always_comment(mut self, enable: bool) -> Self {
        self.always_comment = enable;
        self
    }
}
