//! The Matrix Market header codec.
//!
//! A Matrix Market file opens with a banner line, an optional comment block, and a
//! dimension line:
//!
//! ```text
//! %%MatrixMarket matrix coordinate real general
//! % any number of comment lines
//! 3 3 3
//! ```
//!
//! The banner tokens are matched case-insensitively on read and emitted lowercase on
//! write. Blank lines are permitted anywhere before the dimension line and count
//! toward [`Header::header_line_count`], which downstream error reporting uses to
//! translate chunk-local offsets into file-global line numbers.
//!
//! The dimension line arity depends on `(format, object)`:
//!
//! | format | object | dimension line |
//! |--------|--------|----------------|
//! | coordinate | matrix | `nrows ncols nnz` |
//! | coordinate | vector | `length nnz` |
//! | array | matrix | `nrows ncols` |
//! | array | vector | `length` |

use std::fmt;
use std::io::{BufRead, Write};

use crate::error::{ParmatError, Result};
use crate::options::WriteOptions;

/// What the file stores: a matrix or a (sparse) vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    /// A two-dimensional matrix.
    Matrix,
    /// A one-dimensional vector; the second dimension is implicitly 1.
    Vector,
}

/// How body records encode entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One `row col [value]` record per line.
    Coordinate,
    /// One value per line, in column-major order.
    Array,
}

/// The numeric field of the body records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Signed decimal integers.
    Integer,
    /// Floating-point values.
    Real,
    /// Floating-point values; treated identically to `real` on read.
    Double,
    /// Two whitespace-separated floats per value: real part, imaginary part.
    Complex,
    /// No value column; presence of a coordinate implies a unit value.
    Pattern,
}

/// The symmetry declared by the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    /// No symmetry; every entry is stored explicitly.
    General,
    /// `A[i,j] == A[j,i]`; only the lower triangle is stored.
    Symmetric,
    /// `A[i,j] == -A[j,i]`; only the lower triangle is stored.
    SkewSymmetric,
    /// `A[i,j] == conj(A[j,i])`; only the lower triangle is stored.
    Hermitian,
}

impl Object {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("matrix") {
            Some(Self::Matrix)
        } else if token.eq_ignore_ascii_case("vector") {
            Some(Self::Vector)
        } else {
            None
        }
    }
}

impl Format {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("coordinate") {
            Some(Self::Coordinate)
        } else if token.eq_ignore_ascii_case("array") {
            Some(Self::Array)
        } else {
            None
        }
    }
}

impl Field {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("integer") {
            Some(Self::Integer)
        } else if token.eq_ignore_ascii_case("real") {
            Some(Self::Real)
        } else if token.eq_ignore_ascii_case("double") {
            Some(Self::Double)
        } else if token.eq_ignore_ascii_case("complex") {
            Some(Self::Complex)
        } else if token.eq_ignore_ascii_case("pattern") {
            Some(Self::Pattern)
        } else {
            None
        }
    }
}

impl Symmetry {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("general") {
            Some(Self::General)
        } else if token.eq_ignore_ascii_case("symmetric") {
            Some(Self::Symmetric)
        } else if token.eq_ignore_ascii_case("skew-symmetric") {
            Some(Self::SkewSymmetric)
        } else if token.eq_ignore_ascii_case("hermitian") {
            Some(Self::Hermitian)
        } else {
            None
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Matrix => "matrix",
            Self::Vector => "vector",
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Coordinate => "coordinate",
            Self::Array => "array",
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Double => "double",
            Self::Complex => "complex",
            Self::Pattern => "pattern",
        })
    }
}

impl fmt::Display for Symmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::General => "general",
            Self::Symmetric => "symmetric",
            Self::SkewSymmetric => "skew-symmetric",
            Self::Hermitian => "hermitian",
        })
    }
}

/// The parsed (or to-be-written) header of a Matrix Market file.
///
/// Immutable after parse; populate the public fields before a write. Dimensions are
/// 64-bit so files beyond the 32-bit index range are representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Number of rows. For vectors this is the vector length.
    pub nrows: u64,
    /// Number of columns. For vectors this is 1.
    pub ncols: u64,
    /// Declared body record count. For array files this is derived from the
    /// dimensions rather than read from the file.
    pub nnz: u64,
    /// Matrix or vector.
    pub object: Object,
    /// Coordinate or array.
    pub format: Format,
    /// Numeric field of the body.
    pub field: Field,
    /// Declared symmetry.
    pub symmetry: Symmetry,
    /// Comment block between banner and dimension line, `%` markers stripped,
    /// lines joined with `\n`, no trailing newline.
    pub comment: String,
    /// Number of text lines the header occupies, including blank lines and the
    /// dimension line. Body line numbering starts at `header_line_count + 1`.
    pub header_line_count: u64,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            nrows: 0,
            ncols: 0,
            nnz: 0,
            object: Object::Matrix,
            format: Format::Coordinate,
            field: Field::Real,
            symmetry: Symmetry::General,
            comment: String::new(),
            header_line_count: 0,
        }
    }
}

impl Header {
    /// Builds a coordinate-matrix header with the given shape.
    pub fn coordinate(nrows: u64, ncols: u64, nnz: u64) -> Self {
        Self {
            nrows,
            ncols,
            nnz,
            ..Self::default()
        }
    }

    /// Builds an array-matrix header with the given shape.
    pub fn array(nrows: u64, ncols: u64) -> Self {
        Self {
            nrows,
            ncols,
            nnz: nrows.saturating_mul(ncols),
            format: Format::Array,
            ..Self::default()
        }
    }

    /// Builds a coordinate-vector header with the given length.
    pub fn vector(length: u64, nnz: u64) -> Self {
        Self {
            nrows: length,
            ncols: 1,
            nnz,
            object: Object::Vector,
            ..Self::default()
        }
    }

    /// Checks the structural invariants the Matrix Market specification mandates.
    pub fn validate(&self) -> Result<()> {
        if self.symmetry != Symmetry::General && self.nrows != self.ncols {
            return Err(ParmatError::InvalidHeader(format!(
                "{} matrices must be square, got {}x{}",
                self.symmetry, self.nrows, self.ncols
            )));
        }
        if self.symmetry == Symmetry::Hermitian && self.field != Field::Complex {
            return Err(ParmatError::InvalidHeader(
                "hermitian requires the complex field".to_string(),
            ));
        }
        if self.format == Format::Array && self.field == Field::Pattern {
            return Err(ParmatError::InvalidHeader(
                "array format cannot use the pattern field".to_string(),
            ));
        }
        if self.object == Object::Vector && self.ncols > 1 {
            return Err(ParmatError::InvalidHeader(
                "vectors are one-dimensional".to_string(),
            ));
        }
        Ok(())
    }
}

const BANNER_TAG: &str = "%%MatrixMarket";

/// Reads the banner, comment block, and dimension line, leaving `stream`
/// positioned at the first body line.
pub fn read_header<R: BufRead>(stream: &mut R) -> Result<Header> {
    let mut line_buf = String::new();
    let mut lines_consumed: u64 = 0;

    // Banner: first non-blank line.
    let banner = loop {
        line_buf.clear();
        if stream.read_line(&mut line_buf)? == 0 {
            return Err(ParmatError::InvalidHeader(
                "empty input, banner line missing".to_string(),
            ));
        }
        lines_consumed += 1;
        let line = trim_line(&line_buf);
        if !line.trim().is_empty() {
            break line.to_string();
        }
    };

    let mut header = parse_banner(&banner)?;

    // Comment block, then the dimension line. Blank lines are permitted anywhere
    // before the dimension line.
    let mut comment_lines: Vec<String> = Vec::new();
    let dimension_line = loop {
        line_buf.clear();
        if stream.read_line(&mut line_buf)? == 0 {
            return Err(ParmatError::InvalidDimensions {
                line: lines_consumed + 1,
                msg: "end of input before dimension line".to_string(),
            });
        }
        lines_consumed += 1;
        let line = trim_line(&line_buf);
        if let Some(rest) = line.strip_prefix('%') {
            comment_lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        break line.to_string();
    };

    header.comment = comment_lines.join("\n");
    parse_dimensions(&mut header, &dimension_line, lines_consumed)?;
    header.header_line_count = lines_consumed;
    header.validate()?;
    Ok(header)
}

/// Writes the banner, comment block, and dimension line.
///
/// Banner tokens are emitted lowercase. Each comment line is prefixed with `%`;
/// when the comment is empty, a single `%` line is emitted only if
/// `options.always_comment` is set.
pub fn write_header<W: Write>(w: &mut W, header: &Header, options: &WriteOptions) -> Result<()> {
    header.validate()?;

    writeln!(
        w,
        "{BANNER_TAG} {} {} {} {}",
        header.object, header.format, header.field, header.symmetry
    )?;

    if header.comment.is_empty() {
        if options.always_comment {
            writeln!(w, "%")?;
        }
    } else {
        for line in header.comment.split('\n') {
            writeln!(w, "%{line}")?;
        }
    }

    match (header.format, header.object) {
        (Format::Coordinate, Object::Matrix) => {
            writeln!(w, "{} {} {}", header.nrows, header.ncols, header.nnz)?;
        }
        (Format::Coordinate, Object::Vector) => {
            writeln!(w, "{} {}", header.nrows, header.nnz)?;
        }
        (Format::Array, Object::Matrix) => {
            writeln!(w, "{} {}", header.nrows, header.ncols)?;
        }
        (Format::Array, Object::Vector) => {
            writeln!(w, "{}", header.nrows)?;
        }
    }
    Ok(())
}

fn parse_banner(line: &str) -> Result<Header> {
    let mut tokens = line.split_ascii_whitespace();
    let tag = tokens.next().unwrap_or("");
    if !tag.eq_ignore_ascii_case(BANNER_TAG) {
        return Err(ParmatError::InvalidHeader(format!(
            "banner must start with {BANNER_TAG}, got {tag:?}"
        )));
    }

    let mut next = |what: &str| {
        tokens
            .next()
            .ok_or_else(|| ParmatError::InvalidHeader(format!("banner is missing the {what} token")))
    };

    let object_tok = next("object")?;
    let format_tok = next("format")?;
    let field_tok = next("field")?;
    let symmetry_tok = next("symmetry")?;

    let object = Object::parse(object_tok)
        .ok_or_else(|| ParmatError::InvalidHeader(format!("unknown object {object_tok:?}")))?;
    let format = Format::parse(format_tok)
        .ok_or_else(|| ParmatError::InvalidHeader(format!("unknown format {format_tok:?}")))?;
    let field = Field::parse(field_tok)
        .ok_or_else(|| ParmatError::InvalidHeader(format!("unknown field {field_tok:?}")))?;
    let symmetry = Symmetry::parse(symmetry_tok)
        .ok_or_else(|| ParmatError::InvalidHeader(format!("unknown symmetry {symmetry_tok:?}")))?;

    if tokens.next().is_some() {
        return Err(ParmatError::InvalidHeader(
            "trailing tokens after symmetry".to_string(),
        ));
    }

    Ok(Header {
        object,
        format,
        field,
        symmetry,
        ..Header::default()
    })
}

fn parse_dimensions(header: &mut Header, line: &str, line_no: u64) -> Result<()> {
    let mut values = [0u64; 3];
    let mut count = 0usize;
    for token in line.split_ascii_whitespace() {
        if count == 3 {
            count += 1;
            break;
        }
        values[count] = token.parse::<u64>().map_err(|_| ParmatError::InvalidDimensions {
            line: line_no,
            msg: format!("expected a non-negative integer, got {token:?}"),
        })?;
        count += 1;
    }

    let expected = match (header.format, header.object) {
        (Format::Coordinate, Object::Matrix) => 3,
        (Format::Coordinate, Object::Vector) | (Format::Array, Object::Matrix) => 2,
        (Format::Array, Object::Vector) => 1,
    };
    if count != expected {
        return Err(ParmatError::InvalidDimensions {
            line: line_no,
            msg: format!(
                "{} {} requires {expected} dimension values, got {count}",
                header.format, header.object
            ),
        });
    }

    match (header.format, header.object) {
        (Format::Coordinate, Object::Matrix) => {
            header.nrows = values[0];
            header.ncols = values[1];
            header.nnz = values[2];
        }
        (Format::Coordinate, Object::Vector) => {
            header.nrows = values[0];
            header.ncols = 1;
            header.nnz = values[1];
        }
        (Format::Array, Object::Matrix) => {
            header.nrows = values[0];
            header.ncols = values[1];
            header.nnz = values[0].checked_mul(values[1]).ok_or_else(|| {
                ParmatError::InvalidDimensions {
                    line: line_no,
                    msg: "nrows * ncols overflows u64".to_string(),
                }
            })?;
        }
        (Format::Array, Object::Vector) => {
            header.nrows = values[0];
            header.ncols = 1;
            header.nnz = values[0];
        }
    }
    Ok(())
}

fn trim_line(raw: &str) -> &str {
    raw.trim_end_matches('\n').trim_end_matches('\r')
}
