//! Per-chunk body parsers.
//!
//! Each entry point parses one chunk produced by [`get_next_chunk`](crate::chunk::get_next_chunk)
//! and feeds a [`ChunkHandler`]. Chunks are independently parseable because the
//! chunker guarantees no record straddles chunks; `chunk_line_start` anchors every
//! diagnostic to the 1-based line number in the original file.
//!
//! Blank and whitespace-only lines are skipped and never advance the record
//! ordinal, so parsers track their own intra-chunk record offset. Each parser
//! returns the number of records it consumed; the engine sums these against the
//! header's declared count.

use crate::error::{ParmatError, Result};
use crate::handler::ChunkHandler;
use crate::header::{Field, Header, Symmetry};
use crate::options::ReadOptions;
use crate::value::{parse_float, parse_int, ValueType};

/// Parses one chunk of a coordinate-format matrix body.
///
/// Each non-blank line is `row col [value]` with 1-based indices; records reach the
/// handler 0-based. `pattern` files carry no value slot and the handler receives
/// the value type's canonical one.
pub fn read_chunk_matrix_coordinate<C: ChunkHandler>(
    chunk: &[u8],
    header: &Header,
    chunk_line_start: u64,
    handler: &mut C,
    _options: &ReadOptions,
) -> Result<u64> {
    let text = chunk_text(chunk, chunk_line_start)?;
    let mut records = 0u64;
    for (offset, line) in text.lines().enumerate() {
        let line_no = chunk_line_start + offset as u64;
        let mut tokens = line.split_ascii_whitespace();
        let Some(row_token) = tokens.next() else {
            continue;
        };
        let row = parse_index(row_token, header.nrows, "row", line_no)?;
        let col_token = tokens.next().ok_or_else(|| ParmatError::InvalidValue {
            line: line_no,
            msg: "expected a column index".to_string(),
        })?;
        let col = parse_index(col_token, header.ncols, "column", line_no)?;
        let value = parse_value::<C::Value, _>(&mut tokens, header.field, line_no)?;
        expect_end_of_line(&mut tokens, line_no)?;

        handler.handle(row - 1, col - 1, value)?;
        records += 1;
    }
    Ok(records)
}

/// Parses one chunk of a coordinate-format vector body: `index [value]` per line.
pub fn read_chunk_vector_coordinate<C: ChunkHandler>(
    chunk: &[u8],
    header: &Header,
    chunk_line_start: u64,
    handler: &mut C,
) -> Result<u64> {
    let text = chunk_text(chunk, chunk_line_start)?;
    let mut records = 0u64;
    for (offset, line) in text.lines().enumerate() {
        let line_no = chunk_line_start + offset as u64;
        let mut tokens = line.split_ascii_whitespace();
        let Some(index_token) = tokens.next() else {
            continue;
        };
        let index = parse_index(index_token, header.nrows, "index", line_no)?;
        let value = parse_value::<C::Value, _>(&mut tokens, header.field, line_no)?;
        expect_end_of_line(&mut tokens, line_no)?;

        handler.handle_vector(index - 1, value)?;
        records += 1;
    }
    Ok(records)
}

/// Parses one chunk of an array-format body: one value per line, column-major.
///
/// `(row0, col0)` is the position of the chunk's first record, precomputed by the
/// engine from the chunk's record ordinal so no per-record division is needed. For
/// non-`general` symmetries only the lower triangle (diagonal included) is stored
/// and positions advance column-major through that portion.
pub fn read_chunk_array<C: ChunkHandler>(
    chunk: &[u8],
    header: &Header,
    chunk_line_start: u64,
    handler: &mut C,
    row0: u64,
    col0: u64,
) -> Result<u64> {
    let text = chunk_text(chunk, chunk_line_start)?;
    let mut row = row0;
    let mut col = col0;
    let mut records = 0u64;
    for (offset, line) in text.lines().enumerate() {
        let line_no = chunk_line_start + offset as u64;
        let mut tokens = line.split_ascii_whitespace();
        if tokens.clone().next().is_none() {
            continue;
        }
        if col >= header.ncols || header.nrows == 0 {
            let expected = expected_records(header);
            return Err(ParmatError::FileTooLong {
                expected,
                found: expected + 1,
            });
        }
        let value = parse_value::<C::Value, _>(&mut tokens, header.field, line_no)?;
        expect_end_of_line(&mut tokens, line_no)?;

        handler.handle(row, col, value)?;
        records += 1;

        row += 1;
        if row == header.nrows {
            col += 1;
            row = if header.symmetry == Symmetry::General {
                0
            } else {
                col
            };
        }
    }
    Ok(records)
}

/// The number of body records a conforming file must carry.
pub(crate) fn expected_records(header: &Header) -> u64 {
    match header.format {
        crate::header::Format::Coordinate => header.nnz,
        crate::header::Format::Array => {
            if header.symmetry == Symmetry::General {
                header.nnz
            } else {
                // Lower triangle of a square matrix, diagonal included.
                let n = header.nrows;
                n * (n + 1) / 2
            }
        }
    }
}

/// The `(row, col)` of the array record at body ordinal `ordinal`.
pub(crate) fn array_start_position(header: &Header, ordinal: u64) -> (u64, u64) {
    if header.nrows == 0 {
        return (0, 0);
    }
    if header.symmetry == Symmetry::General {
        (ordinal % header.nrows, ordinal / header.nrows)
    } else {
        // Column c of the stored triangle holds nrows - c records.
        let mut remaining = ordinal;
        let mut col = 0u64;
        while col < header.ncols && remaining >= header.nrows - col {
            remaining -= header.nrows - col;
            col += 1;
        }
        (col + remaining, col)
    }
}

fn chunk_text(chunk: &[u8], chunk_line_start: u64) -> Result<&str> {
    match std::str::from_utf8(chunk) {
        Ok(text) => Ok(text),
        Err(e) => {
            let lines_before = chunk[..e.valid_up_to()]
                .iter()
                .filter(|&&b| b == b'\n')
                .count() as u64;
            Err(ParmatError::InvalidValue {
                line: chunk_line_start + lines_before,
                msg: "body is not valid UTF-8".to_string(),
            })
        }
    }
}

fn parse_index(token: &str, dim: u64, what: &str, line_no: u64) -> Result<u64> {
    let index = match token.parse::<u64>() {
        Ok(index) => index,
        Err(_) => {
            // Negative or overflowing indices are domain errors, anything else
            // is malformed.
            let unsigned = token
                .strip_prefix('-')
                .or_else(|| token.strip_prefix('+'))
                .unwrap_or(token);
            let mut digits = unsigned.bytes();
            let numeric = digits.len() > 0 && digits.all(|b| b.is_ascii_digit());
            return Err(if numeric {
                ParmatError::OutOfRange {
                    line: line_no,
                    msg: format!("{what} index {token} is outside 1..={dim}"),
                }
            } else {
                ParmatError::InvalidValue {
                    line: line_no,
                    msg: format!("malformed {what} index {token:?}"),
                }
            });
        }
    };
    if index < 1 || index > dim {
        return Err(ParmatError::OutOfRange {
            line: line_no,
            msg: format!("{what} index {index} is outside 1..={dim}"),
        });
    }
    Ok(index)
}

fn parse_value<'t, V: ValueType, I: Iterator<Item = &'t str>>(
    tokens: &mut I,
    field: Field,
    line_no: u64,
) -> Result<V> {
    let mut next = |what: &str| {
        tokens.next().ok_or_else(|| ParmatError::InvalidValue {
            line: line_no,
            msg: format!("expected {what}"),
        })
    };
    match field {
        Field::Pattern => Ok(V::pattern_default()),
        Field::Integer => V::from_integer(parse_int(next("an integer value")?, line_no)?, line_no),
        Field::Real | Field::Double => {
            V::from_real(parse_float(next("a numeric value")?, line_no)?, line_no)
        }
        Field::Complex => {
            let re = parse_float(next("a real part")?, line_no)?;
            let im = parse_float(next("an imaginary part")?, line_no)?;
            V::from_complex(re, im, line_no)
        }
    }
}

fn expect_end_of_line<'t>(tokens: &mut impl Iterator<Item = &'t str>, line_no: u64) -> Result<()> {
    if let Some(junk) = tokens.next() {
        return Err(ParmatError::InvalidValue {
            line: line_no,
            msg: format!("trailing characters {junk:?} after record"),
        });
    }
    Ok(())
}
