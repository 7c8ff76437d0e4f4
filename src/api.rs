//! Convenience entry points pairing the engine with the built-in containers.
//!
//! These cover the common whole-file operations; callers with custom containers
//! compose [`read_header`](crate::read_header) / [`read_body`](crate::read_body)
//! with their own [`Handler`](crate::Handler), and
//! [`write_header`](crate::write_header) / [`write_body`](crate::write_body) with
//! their own [`Formatter`](crate::Formatter).

use std::io::{BufRead, Write};

use crate::containers::{DenseCollector, DoubletCollector, TripletAppender, TripletCollector};
use crate::engine::{read_body, write_body};
use crate::error::{ParmatError, Result};
use crate::format::{CscFormatter, DenseFormatter, StorageOrder, TripletFormatter};
use crate::header::{read_header, write_header, Field, Format, Header, Object, Symmetry};
use crate::options::{ReadOptions, WriteOptions};
use crate::value::ValueType;

fn expect_layout(header: &Header, format: Format, object: Object) -> Result<()> {
    if header.format != format || header.object != object {
        return Err(ParmatError::InvalidArgument(format!(
            "expected a {format} {object} file, header declares {} {}",
            header.format, header.object
        )));
    }
    Ok(())
}

/// Reads a coordinate matrix into `(header, rows, cols, values)` triplet vectors.
///
/// Without generalization the vectors are in file order. With
/// `options.generalize_symmetry` and a non-`general` header, mirrored records are
/// interleaved and the overall order is unspecified.
pub fn read_matrix_market_triplet<R, V>(
    stream: &mut R,
    options: &ReadOptions,
) -> Result<(Header, Vec<u64>, Vec<u64>, Vec<V>)>
where
    R: BufRead + Send,
    V: ValueType,
{
    let header = read_header(stream)?;
    expect_layout(&header, Format::Coordinate, Object::Matrix)?;

    if options.generalize_symmetry && header.symmetry != Symmetry::General {
        // Mirroring at most doubles the record count; the exact total depends on
        // how many diagonal records the file carries.
        let sink = TripletAppender::<V>::with_size_hint(2 * header.nnz as usize);
        read_body(stream, &header, &sink, options)?;
        let (rows, cols, values) = sink.into_parts()?;
        Ok((header, rows, cols, values))
    } else {
        let sink = TripletCollector::<V>::with_capacity(header.nnz as usize);
        read_body(stream, &header, &sink, options)?;
        let (rows, cols, values) = sink.into_parts()?;
        Ok((header, rows, cols, values))
    }
}

/// Reads a coordinate vector into `(header, indices, values)` doublet vectors.
pub fn read_matrix_market_doublet<R, V>(
    stream: &mut R,
    options: &ReadOptions,
) -> Result<(Header, Vec<u64>, Vec<V>)>
where
    R: BufRead + Send,
    V: ValueType,
{
    let header = read_header(stream)?;
    expect_layout(&header, Format::Coordinate, Object::Vector)?;

    let sink = DoubletCollector::<V>::with_capacity(header.nnz as usize);
    read_body(stream, &header, &sink, options)?;
    let (indices, values) = sink.into_parts()?;
    Ok((header, indices, values))
}

/// Reads an array file into `(header, values)` with column-major values.
///
/// Non-`general` files store only the lower triangle; with
/// `options.generalize_symmetry` the mirrored triangle is filled in, otherwise
/// the upper triangle stays zero.
pub fn read_matrix_market_array<R, V>(
    stream: &mut R,
    options: &ReadOptions,
) -> Result<(Header, Vec<V>)>
where
    R: BufRead + Send,
    V: ValueType,
{
    let header = read_header(stream)?;
    if header.format != Format::Array {
        return Err(ParmatError::InvalidArgument(format!(
            "expected an array file, header declares {} {}",
            header.format, header.object
        )));
    }

    let sink = DenseCollector::<V>::new(header.nrows, header.ncols);
    read_body(stream, &header, &sink, options)?;
    let values = sink.into_values()?;
    Ok((header, values))
}

/// Writes a coordinate matrix from triplet slices.
///
/// `header` supplies the shape, symmetry, and comment; object, format, `nnz`,
/// and field are derived from the slices. An empty `values` slice writes a
/// `pattern` file.
pub fn write_matrix_market_triplet<W, V>(
    w: &mut W,
    mut header: Header,
    rows: &[u64],
    cols: &[u64],
    values: &[V],
    options: &WriteOptions,
) -> Result<()>
where
    W: Write + Send,
    V: ValueType,
{
    header.object = Object::Matrix;
    header.format = Format::Coordinate;
    header.nnz = rows.len() as u64;
    header.field = if values.is_empty() {
        Field::Pattern
    } else {
        V::FIELD
    };

    let formatter = TripletFormatter::new(rows, cols, values)?;
    write_header(w, &header, options)?;
    write_body(w, formatter, options)
}

/// Writes a coordinate vector from index/value slices. An empty `values`
/// slice writes a `pattern` file.
pub fn write_matrix_market_doublet<W, V>(
    w: &mut W,
    length: u64,
    indices: &[u64],
    values: &[V],
    options: &WriteOptions,
) -> Result<()>
where
    W: Write + Send,
    V: ValueType,
{
    let header = Header {
        field: if values.is_empty() {
            Field::Pattern
        } else {
            V::FIELD
        },
        ..Header::vector(length, indices.len() as u64)
    };

    let formatter = TripletFormatter::doublet(indices, values)?;
    write_header(w, &header, options)?;
    write_body(w, formatter, options)
}

/// Writes a coordinate matrix from CSC arrays, or from CSR arrays when
/// `transpose` is set.
pub fn write_matrix_market_csc<W, V>(
    w: &mut W,
    mut header: Header,
    ptrs: &[u64],
    indices: &[u64],
    values: &[V],
    transpose: bool,
    options: &WriteOptions,
) -> Result<()>
where
    W: Write + Send,
    V: ValueType,
{
    header.object = Object::Matrix;
    header.format = Format::Coordinate;
    header.nnz = indices.len() as u64;
    header.field = if values.is_empty() {
        Field::Pattern
    } else {
        V::FIELD
    };

    let formatter = CscFormatter::new(ptrs, indices, values, transpose)?;
    write_header(w, &header, options)?;
    write_body(w, formatter, options)
}

/// Writes a dense matrix as an array file, one value per line in column-major
/// order regardless of `order`.
pub fn write_matrix_market_array<W, V>(
    w: &mut W,
    mut header: Header,
    values: &[V],
    order: StorageOrder,
    options: &WriteOptions,
) -> Result<()>
where
    W: Write + Send,
    V: ValueType,
{
    header.object = Object::Matrix;
    header.format = Format::Array;
    header.nnz = header.nrows.saturating_mul(header.ncols);
    header.field = V::FIELD;

    let formatter = DenseFormatter::new(values, header.nrows, header.ncols, order)?;
    write_header(w, &header, options)?;
    write_body(w, formatter, options)
}

/// Memory-mapped whole-file reads.
///
/// Mapping the file lets chunking run over an in-memory slice with no stream
/// copies; the engine is otherwise identical.
#[cfg(feature = "mmap")]
#[allow(unsafe_code)]
pub mod file {
    use std::fs::File;
    use std::path::Path;

    use super::*;

    fn map(path: &Path) -> Result<memmap2::Mmap> {
        let file = File::open(path)?;
        // Safety: the mapping is read-only and private to this process; parmat
        // never mutates the file while the map is alive.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Ok(map)
    }

    /// [`read_matrix_market_triplet`] over a memory-mapped file.
    pub fn read_matrix_market_triplet_file<P, V>(
        path: P,
        options: &ReadOptions,
    ) -> Result<(Header, Vec<u64>, Vec<u64>, Vec<V>)>
    where
        P: AsRef<Path>,
        V: ValueType,
    {
        let map = map(path.as_ref())?;
        let mut bytes: &[u8] = &map;
        read_matrix_market_triplet(&mut bytes, options)
    }

    /// [`read_matrix_market_array`] over a memory-mapped file.
    pub fn read_matrix_market_array_file<P, V>(
        path: P,
        options: &ReadOptions,
    ) -> Result<(Header, Vec<V>)>
    where
        P: AsRef<Path>,
        V: ValueType,
    {
        let map = map(path.as_ref())?;
        let mut bytes: &[u8] = &map;
        read_matrix_market_array(&mut bytes, options)
    }
}
