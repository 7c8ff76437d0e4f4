//! Chunked stream input.
//!
//! The body of a file is consumed in fixed-size byte windows extended to the next
//! record boundary, so every chunk is independently parseable. Line counting is a
//! separate, cheap pass: the engine needs each chunk's line count before it can
//! assign the chunk's starting line number (and through it the chunk's record
//! offset) to the parse task.

use std::io::{BufRead, Read};

use crate::error::Result;
use crate::options::ReadOptions;

/// Reads the next chunk from `stream`.
///
/// Up to `options.chunk_size_bytes` are read, then the buffer is extended up to and
/// including the next newline so no record straddles chunks. At end of stream the
/// remaining bytes are returned as-is, possibly without a trailing newline.
/// Returns `None` once the stream is exhausted.
pub fn get_next_chunk<R: BufRead>(stream: &mut R, options: &ReadOptions) -> Result<Option<Vec<u8>>> {
    let target = options.chunk_size_bytes.max(1);
    let mut buf = Vec::with_capacity(target + 64);

    (&mut *stream).take(target as u64).read_to_end(&mut buf)?;
    if buf.is_empty() {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        stream.read_until(b'\n', &mut buf)?;
    }
    Ok(Some(buf))
}

/// Counts the lines in a chunk: newline-terminated lines, plus one if the chunk
/// ends without a trailing newline but still carries content.
pub fn count_lines(chunk: &[u8]) -> u64 {
    let newlines = chunk.iter().filter(|&&b| b == b'\n').count() as u64;
    if chunk.last().is_some_and(|&b| b != b'\n') {
        newlines + 1
    } else {
        newlines
    }
}
