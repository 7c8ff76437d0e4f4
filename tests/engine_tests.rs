#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use parmat::{
    read_body, read_header, read_matrix_market_triplet, write_matrix_market_triplet, ChunkHandler,
    Handler, Header, ParmatError, ReadOptions, WriteOptions,
};

// Deterministic pseudo-random generator, good enough to vary record shapes.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn synthesize(nnz: usize, dim: u64) -> (Vec<u64>, Vec<u64>, Vec<f64>, String) {
    let mut rng = Lcg(0x5eed);
    let mut rows = Vec::with_capacity(nnz);
    let mut cols = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    for _ in 0..nnz {
        rows.push(rng.next() % dim);
        cols.push(rng.next() % dim);
        values.push((rng.next() as f64) / 1e4 - 50.0);
    }

    let mut text = Vec::new();
    write_matrix_market_triplet(
        &mut text,
        Header::coordinate(dim, dim, 0),
        &rows,
        &cols,
        &values,
        &WriteOptions::default().num_threads(1),
    )
    .unwrap();
    (rows, cols, values, String::from_utf8(text).unwrap())
}

#[test]
fn test_results_are_independent_of_chunk_size_and_threads() {
    let (rows, cols, values, text) = synthesize(2000, 97);

    for chunk_size in [64, 257, 4096, 1 << 24] {
        for threads in [0, 1, 2, 8] {
            let options = ReadOptions::default()
                .chunk_size_bytes(chunk_size)
                .num_threads(threads);
            let (header, r, c, v) =
                read_matrix_market_triplet::<_, f64>(&mut text.as_bytes(), &options).unwrap();
            assert_eq!(header.nnz, 2000);
            assert_eq!(r, rows, "chunk_size={chunk_size} threads={threads}");
            assert_eq!(c, cols, "chunk_size={chunk_size} threads={threads}");
            assert_eq!(v, values, "chunk_size={chunk_size} threads={threads}");
        }
    }
}

#[test]
fn test_parallel_write_matches_sequential_write() {
    let (rows, cols, values, _) = synthesize(2000, 97);

    let mut sequential = Vec::new();
    write_matrix_market_triplet(
        &mut sequential,
        Header::coordinate(97, 97, 0),
        &rows,
        &cols,
        &values,
        &WriteOptions::default().num_threads(1),
    )
    .unwrap();

    for threads in [0, 2, 8] {
        let mut parallel = Vec::new();
        write_matrix_market_triplet(
            &mut parallel,
            Header::coordinate(97, 97, 0),
            &rows,
            &cols,
            &values,
            &WriteOptions::default().num_threads(threads).chunk_size_values(37),
        )
        .unwrap();
        assert_eq!(parallel, sequential, "threads={threads}");
    }
}

#[test]
fn test_error_line_is_exact_under_parallel_parse() {
    let (_, _, _, clean) = synthesize(3000, 61);
    // Corrupt one known record. Record i sits on body line i + 1, after the
    // two header lines.
    let corrupt_record = 1234;
    let text = {
        let mut lines: Vec<&str> = clean.split_inclusive('\n').collect();
        lines[2 + corrupt_record] = "1 1 bogus\n";
        lines.concat()
    };

    for threads in [1, 4] {
        let options = ReadOptions::default().chunk_size_bytes(128).num_threads(threads);
        match read_matrix_market_triplet::<_, f64>(&mut text.as_bytes(), &options) {
            Err(ParmatError::InvalidValue { line, msg }) => {
                assert_eq!(line, 3 + corrupt_record as u64, "threads={threads}");
                assert!(msg.contains("bogus"));
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }
}

#[test]
fn test_cardinality_checks_under_parallel_parse() {
    let (_, _, _, text) = synthesize(500, 31);
    let options = ReadOptions::default().chunk_size_bytes(64).num_threads(4);

    // Drop the last record.
    let short = &text[..text.len() - text.split_inclusive('\n').last().unwrap().len()];
    match read_matrix_market_triplet::<_, f64>(&mut short.as_bytes(), &options) {
        Err(ParmatError::FileTooShort { expected, found }) => {
            assert_eq!((expected, found), (500, 499));
        }
        other => panic!("expected FileTooShort, got {other:?}"),
    }

    // Append an extra record.
    let long = format!("{text}1 1 0.5\n");
    match read_matrix_market_triplet::<_, f64>(&mut long.as_bytes(), &options) {
        Err(ParmatError::FileTooLong { expected, found }) => {
            assert_eq!(expected, 500);
            assert!(found > 500);
        }
        other => panic!("expected FileTooLong, got {other:?}"),
    }
}

#[test]
fn test_read_body_returns_total_line_count() {
    let text = "%%MatrixMarket matrix coordinate real general\n\
                % note\n\
                2 2 2\n\
                1 1 1.0\n\
                2 2 2.0\n";
    let mut stream = text.as_bytes();
    let header = read_header(&mut stream).unwrap();
    assert_eq!(header.header_line_count, 3);

    let sink = OrderProbe::default();
    let lines = read_body(
        &mut stream,
        &header,
        &sink,
        &ReadOptions::default().num_threads(1),
    )
    .unwrap();
    assert_eq!(lines, 5);
}

/// A handler that refuses parallel execution and records arrival order.
#[derive(Default)]
struct OrderProbe {
    seen: Arc<Mutex<Vec<(u64, u64, f64)>>>,
}

struct OrderProbeSink {
    seen: Arc<Mutex<Vec<(u64, u64, f64)>>>,
}

impl Handler for OrderProbe {
    type Value = f64;
    type Chunk = OrderProbeSink;
    const PARALLEL_OK: bool = false;

    fn chunk_handler(&self, _offset: u64) -> OrderProbeSink {
        OrderProbeSink {
            seen: Arc::clone(&self.seen),
        }
    }
}

impl ChunkHandler for OrderProbeSink {
    type Value = f64;

    fn handle(&mut self, row: u64, col: u64, value: f64) -> parmat::Result<()> {
        self.seen.lock().unwrap().push((row, col, value));
        Ok(())
    }
}

#[test]
fn test_non_parallel_handler_forces_file_order() {
    let (rows, cols, values, text) = synthesize(1000, 53);

    let mut stream = text.as_bytes();
    let header = read_header(&mut stream).unwrap();

    // Tiny chunks and a large requested pool; PARALLEL_OK = false must still
    // deliver records in file order.
    let probe = OrderProbe::default();
    read_body(
        &mut stream,
        &header,
        &probe,
        &ReadOptions::default().chunk_size_bytes(64).num_threads(8),
    )
    .unwrap();

    let seen = probe.seen.lock().unwrap();
    let expected: Vec<(u64, u64, f64)> = rows
        .iter()
        .zip(&cols)
        .zip(&values)
        .map(|((&r, &c), &v)| (r, c, v))
        .collect();
    assert_eq!(*seen, expected);
}

#[test]
fn test_parallel_ok_false_in_options_forces_file_order() {
    let (rows, _, _, text) = synthesize(500, 53);

    let options = ReadOptions::default()
        .chunk_size_bytes(64)
        .num_threads(8)
        .parallel_ok(false);
    let (_, r, _, _) = read_matrix_market_triplet::<_, f64>(&mut text.as_bytes(), &options).unwrap();
    assert_eq!(r, rows);
}

#[test]
fn test_io_error_surfaces_from_read() {
    struct FailingReader;
    impl std::io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        }
    }

    let header = Header::coordinate(2, 2, 1);
    let sink = OrderProbe::default();
    let mut stream = std::io::BufReader::new(FailingReader);
    match read_body(&mut stream, &header, &sink, &ReadOptions::default()) {
        Err(ParmatError::Io(e)) => assert_eq!(e.to_string(), "boom"),
        other => panic!("expected Io, got {other:?}"),
    }
}
