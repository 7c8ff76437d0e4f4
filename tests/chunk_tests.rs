#![allow(missing_docs)]

use parmat::chunk::{count_lines, get_next_chunk};
use parmat::ReadOptions;

fn chunks_of(data: &str, chunk_size: usize) -> Vec<Vec<u8>> {
    let options = ReadOptions::default().chunk_size_bytes(chunk_size);
    let mut stream = data.as_bytes();
    let mut out = Vec::new();
    while let Some(chunk) = get_next_chunk(&mut stream, &options).unwrap() {
        out.push(chunk);
    }
    out
}

#[test]
fn test_chunks_end_on_record_boundaries() {
    let data = "1 1 1.0\n22 22 2.0\n3 3 3.0\n";
    for chunk_size in [1, 2, 5, 8, 100] {
        for chunk in chunks_of(data, chunk_size) {
            assert_eq!(*chunk.last().unwrap(), b'\n', "chunk_size={chunk_size}");
        }
    }
}

#[test]
fn test_chunk_concatenation_reproduces_input() {
    let data = "1 1 1.0\n22 22 2.0\n3 3 3.0\nno trailing newline";
    for chunk_size in [1, 3, 7, 64, 1 << 20] {
        let joined: Vec<u8> = chunks_of(data, chunk_size).concat();
        assert_eq!(joined, data.as_bytes(), "chunk_size={chunk_size}");
    }
}

#[test]
fn test_final_chunk_may_lack_newline() {
    let chunks = chunks_of("a\nb", 1);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1], b"b");
}

#[test]
fn test_empty_stream_yields_no_chunks() {
    assert!(chunks_of("", 1024).is_empty());
}

#[test]
fn test_count_lines_terminated() {
    assert_eq!(count_lines(b"a\nb\nc\n"), 3);
}

#[test]
fn test_count_lines_unterminated_tail() {
    assert_eq!(count_lines(b"a\nb\nc"), 3);
}

#[test]
fn test_count_lines_empty() {
    assert_eq!(count_lines(b""), 0);
}

#[test]
fn test_count_lines_blank_lines_count() {
    assert_eq!(count_lines(b"\n\n1 1 1.0\n"), 3);
}

#[test]
fn test_count_lines_crlf() {
    assert_eq!(count_lines(b"a\r\nb\r\n"), 2);
}
