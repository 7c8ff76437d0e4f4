#![allow(missing_docs)]

use parmat::{
    read_header, write_header, Field, Format, Header, Object, ParmatError, Symmetry, WriteOptions,
};

fn parse(text: &str) -> parmat::Result<Header> {
    read_header(&mut text.as_bytes())
}

#[test]
fn test_banner_coordinate_matrix() {
    let header = parse("%%MatrixMarket matrix coordinate real general\n3 4 5\n").unwrap();
    assert_eq!(header.object, Object::Matrix);
    assert_eq!(header.format, Format::Coordinate);
    assert_eq!(header.field, Field::Real);
    assert_eq!(header.symmetry, Symmetry::General);
    assert_eq!((header.nrows, header.ncols, header.nnz), (3, 4, 5));
    assert_eq!(header.header_line_count, 2);
}

#[test]
fn test_banner_is_case_insensitive() {
    let header = parse("%%matrixmarket MATRIX Coordinate INTEGER Skew-Symmetric\n4 4 2\n").unwrap();
    assert_eq!(header.field, Field::Integer);
    assert_eq!(header.symmetry, Symmetry::SkewSymmetric);
}

#[test]
fn test_comment_block_is_collected() {
    let header = parse(
        "%%MatrixMarket matrix coordinate real general\n\
         % first line\n\
         %second line\n\
         2 2 1\n",
    )
    .unwrap();
    // One optional leading space is stripped, newlines between lines preserved.
    assert_eq!(header.comment, "first line\nsecond line");
    assert_eq!(header.header_line_count, 4);
}

#[test]
fn test_blank_lines_before_dimensions_are_counted() {
    let header = parse(
        "%%MatrixMarket matrix coordinate real general\n\
         \n\
         % comment\n\
         \n\
         2 2 1\n",
    )
    .unwrap();
    assert_eq!(header.header_line_count, 5);
    assert_eq!(header.comment, "comment");
}

#[test]
fn test_crlf_line_endings() {
    let header =
        parse("%%MatrixMarket matrix coordinate real general\r\n% note\r\n2 2 1\r\n").unwrap();
    assert_eq!(header.comment, "note");
    assert_eq!((header.nrows, header.ncols, header.nnz), (2, 2, 1));
}

#[test]
fn test_array_matrix_dimensions() {
    let header = parse("%%MatrixMarket matrix array double general\n4 5\n").unwrap();
    assert_eq!(header.format, Format::Array);
    assert_eq!((header.nrows, header.ncols), (4, 5));
    assert_eq!(header.nnz, 20);
}

#[test]
fn test_coordinate_vector_dimensions() {
    let header = parse("%%MatrixMarket vector coordinate real general\n5 2\n").unwrap();
    assert_eq!(header.object, Object::Vector);
    assert_eq!((header.nrows, header.ncols, header.nnz), (5, 1, 2));
}

#[test]
fn test_array_vector_dimensions() {
    let header = parse("%%MatrixMarket vector array real general\n7\n").unwrap();
    assert_eq!((header.nrows, header.ncols, header.nnz), (7, 1, 7));
}

#[test]
fn test_missing_banner() {
    match parse("3 3 3\n") {
        Err(ParmatError::InvalidHeader(msg)) => assert!(msg.contains("banner")),
        other => panic!("expected InvalidHeader, got {other:?}"),
    }
}

#[test]
fn test_unknown_field_token() {
    match parse("%%MatrixMarket matrix coordinate quaternion general\n2 2 1\n") {
        Err(ParmatError::InvalidHeader(msg)) => assert!(msg.contains("quaternion")),
        other => panic!("expected InvalidHeader, got {other:?}"),
    }
}

#[test]
fn test_wrong_dimension_arity() {
    match parse("%%MatrixMarket matrix coordinate real general\n3 3\n") {
        Err(ParmatError::InvalidDimensions { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected InvalidDimensions, got {other:?}"),
    }
}

#[test]
fn test_negative_dimension() {
    match parse("%%MatrixMarket matrix coordinate real general\n3 -3 1\n") {
        Err(ParmatError::InvalidDimensions { .. }) => {}
        other => panic!("expected InvalidDimensions, got {other:?}"),
    }
}

#[test]
fn test_truncated_header() {
    match parse("%%MatrixMarket matrix coordinate real general\n% only comments\n") {
        Err(ParmatError::InvalidDimensions { .. }) => {}
        other => panic!("expected InvalidDimensions, got {other:?}"),
    }
}

#[test]
fn test_symmetric_requires_square() {
    match parse("%%MatrixMarket matrix coordinate real symmetric\n2 3 1\n") {
        Err(ParmatError::InvalidHeader(msg)) => assert!(msg.contains("square")),
        other => panic!("expected InvalidHeader, got {other:?}"),
    }
}

#[test]
fn test_hermitian_requires_complex() {
    match parse("%%MatrixMarket matrix coordinate real hermitian\n2 2 1\n") {
        Err(ParmatError::InvalidHeader(msg)) => assert!(msg.contains("complex")),
        other => panic!("expected InvalidHeader, got {other:?}"),
    }
}

#[test]
fn test_pattern_array_is_rejected() {
    match parse("%%MatrixMarket matrix array pattern general\n2 2\n") {
        Err(ParmatError::InvalidHeader(_)) => {}
        other => panic!("expected InvalidHeader, got {other:?}"),
    }
}

#[test]
fn test_write_header_output() {
    let header = Header {
        comment: "generated".to_string(),
        ..Header::coordinate(3, 4, 5)
    };
    let mut out = Vec::new();
    write_header(&mut out, &header, &WriteOptions::default()).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "%%MatrixMarket matrix coordinate real general\n%generated\n3 4 5\n"
    );
}

#[test]
fn test_write_header_always_comment() {
    let mut out = Vec::new();
    let options = WriteOptions::default().always_comment(true);
    write_header(&mut out, &Header::coordinate(1, 1, 1), &options).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "%%MatrixMarket matrix coordinate real general\n%\n1 1 1\n"
    );
}

#[test]
fn test_write_header_vector() {
    let mut out = Vec::new();
    write_header(&mut out, &Header::vector(9, 4), &WriteOptions::default()).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "%%MatrixMarket vector coordinate real general\n9 4\n"
    );
}

#[test]
fn test_header_round_trip() {
    let original = Header {
        field: Field::Complex,
        symmetry: Symmetry::Hermitian,
        comment: "line one\nline two".to_string(),
        ..Header::coordinate(6, 6, 9)
    };
    let mut out = Vec::new();
    write_header(&mut out, &original, &WriteOptions::default()).unwrap();

    let read_back = read_header(&mut &out[..]).unwrap();
    assert_eq!(read_back.field, Field::Complex);
    assert_eq!(read_back.symmetry, Symmetry::Hermitian);
    assert_eq!(read_back.comment, original.comment);
    assert_eq!(
        (read_back.nrows, read_back.ncols, read_back.nnz),
        (original.nrows, original.ncols, original.nnz)
    );
}
