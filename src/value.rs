//! Locale-independent numeric conversion.
//!
//! All parsing goes through `str::parse`, which implements fixed, locale-independent
//! semantics: `.` is the decimal point, an optional leading sign is accepted, floats
//! take an `e`/`E` exponent, and `nan`/`inf`/`infinity` (any case) are accepted.
//! Emission uses `Display`, which produces the shortest form that round-trips
//! exactly; an explicit precision switches to scientific notation with a fixed
//! number of digits.
//!
//! The [`ValueType`] trait is the seam between the file's declared field and the
//! caller's element type. Conversions only widen: an `integer` file can populate a
//! real or complex container, a `real` file can populate a complex container, but a
//! `complex` file cannot populate a real one and a `real` file cannot populate an
//! integer one. Narrowing attempts fail with
//! [`InvalidValue`](crate::ParmatError::InvalidValue).

use std::fmt::Write as _;

use num_complex::Complex;
use num_traits::{One, Zero};

use crate::error::{ParmatError, Result};
use crate::header::Field;

/// Parses a signed 64-bit integer token.
///
/// Accepts an optional leading sign followed by decimal digits only. Overflow is
/// reported as [`OutOfRange`](crate::ParmatError::OutOfRange), any other defect as
/// [`InvalidValue`](crate::ParmatError::InvalidValue).
pub fn parse_int(token: &str, line: u64) -> Result<i64> {
    token.parse::<i64>().map_err(|_| int_error(token, line))
}

/// Parses an unsigned 64-bit integer token, used for indices and dimensions.
pub fn parse_uint(token: &str, line: u64) -> Result<u64> {
    token.parse::<u64>().map_err(|_| int_error(token, line))
}

/// Parses a floating-point token. `nan`, `inf`, and `infinity` are accepted in any
/// case, with an optional sign.
pub fn parse_float(token: &str, line: u64) -> Result<f64> {
    token.parse::<f64>().map_err(|_| ParmatError::InvalidValue {
        line,
        msg: format!("malformed floating-point value {token:?}"),
    })
}

/// Parses the two tokens of a complex value: real part, imaginary part.
pub fn parse_complex(re_token: &str, im_token: &str, line: u64) -> Result<Complex<f64>> {
    Ok(Complex::new(
        parse_float(re_token, line)?,
        parse_float(im_token, line)?,
    ))
}

// An integer token that fails to parse is either malformed or overflowed. Tokens
// that are syntactically valid integers can only have failed on overflow.
fn int_error(token: &str, line: u64) -> ParmatError {
    let unsigned = token
        .strip_prefix('+')
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token);
    let mut digits = unsigned.bytes();
    let well_formed = digits.len() > 0 && digits.all(|b| b.is_ascii_digit());
    if well_formed {
        ParmatError::OutOfRange {
            line,
            msg: format!("integer {token:?} overflows 64 bits"),
        }
    } else {
        ParmatError::InvalidValue {
            line,
            msg: format!("malformed integer {token:?}"),
        }
    }
}

/// Appends an integer in its canonical decimal form.
pub fn emit_int(out: &mut String, value: i64) {
    let _ = write!(out, "{value}");
}

/// Appends a float, shortest round-trip form by default, fixed-digit scientific
/// notation when `precision` is set.
pub fn emit_float(out: &mut String, value: f64, precision: Option<usize>) {
    match precision {
        None => {
            let _ = write!(out, "{value}");
        }
        Some(digits) => {
            let _ = write!(out, "{value:.digits$e}");
        }
    }
}

/// Appends a complex value as two space-separated floats.
pub fn emit_complex(out: &mut String, value: Complex<f64>, precision: Option<usize>) {
    emit_float(out, value.re, precision);
    out.push(' ');
    emit_float(out, value.im, precision);
}

/// Element types a handler or formatter can carry.
///
/// `One` supplies the canonical "1" used for `pattern` records, `Zero` the fill
/// value of pre-sized dense containers. The `from_*` constructors implement the
/// widening rules; each reports its own narrowing failures with the offending
/// line number.
pub trait ValueType: Copy + Send + Sync + Zero + One + 'static {
    /// The field written for this element type.
    const FIELD: Field;

    /// The value assigned to records of a `pattern` file.
    fn pattern_default() -> Self {
        Self::one()
    }

    /// Converts a parsed `integer` field value.
    fn from_integer(v: i64, line: u64) -> Result<Self>;

    /// Converts a parsed `real`/`double` field value.
    fn from_real(v: f64, line: u64) -> Result<Self>;

    /// Converts a parsed `complex` field value.
    fn from_complex(re: f64, im: f64, line: u64) -> Result<Self>;

    /// Additive inverse, used for skew-symmetric generalization.
    fn negate(self) -> Self;

    /// Complex conjugate, used for hermitian generalization. Identity for real
    /// and integer types.
    fn conjugate(self) -> Self {
        self
    }

    /// Appends the textual form of this value.
    fn emit(self, out: &mut String, precision: Option<usize>);
}

fn narrowing(line: u64, from: &str, to: &str) -> ParmatError {
    ParmatError::InvalidValue {
        line,
        msg: format!("cannot narrow a {from} value into a {to} container"),
    }
}

impl ValueType for i32 {
    const FIELD: Field = Field::Integer;

    fn from_integer(v: i64, line: u64) -> Result<Self> {
        i32::try_from(v).map_err(|_| ParmatError::OutOfRange {
            line,
            msg: format!("integer {v} overflows 32 bits"),
        })
    }

    fn from_real(_v: f64, line: u64) -> Result<Self> {
        Err(narrowing(line, "real", "integer"))
    }

    fn from_complex(_re: f64, _im: f64, line: u64) -> Result<Self> {
        Err(narrowing(line, "complex", "integer"))
    }

    fn negate(self) -> Self {
        self.wrapping_neg()
    }

    fn emit(self, out: &mut String, _precision: Option<usize>) {
        emit_int(out, i64::from(self));
    }
}

impl ValueType for i64 {
    const FIELD: Field = Field::Integer;

    fn from_integer(v: i64, _line: u64) -> Result<Self> {
        Ok(v)
    }

    fn from_real(_v: f64, line: u64) -> Result<Self> {
        Err(narrowing(line, "real", "integer"))
    }

    fn from_complex(_re: f64, _im: f64, line: u64) -> Result<Self> {
        Err(narrowing(line, "complex", "integer"))
    }

    fn negate(self) -> Self {
        self.wrapping_neg()
    }

    fn emit(self, out: &mut String, _precision: Option<usize>) {
        emit_int(out, self);
    }
}

impl ValueType for f32 {
    const FIELD: Field = Field::Real;

    fn from_integer(v: i64, _line: u64) -> Result<Self> {
        Ok(v as f32)
    }

    fn from_real(v: f64, _line: u64) -> Result<Self> {
        Ok(v as f32)
    }

    fn from_complex(_re: f64, _im: f64, line: u64) -> Result<Self> {
        Err(narrowing(line, "complex", "real"))
    }

    fn negate(self) -> Self {
        -self
    }

    fn emit(self, out: &mut String, precision: Option<usize>) {
        emit_float(out, f64::from(self), precision);
    }
}

impl ValueType for f64 {
    const FIELD: Field = Field::Real;

    fn from_integer(v: i64, _line: u64) -> Result<Self> {
        Ok(v as f64)
    }

    fn from_real(v: f64, _line: u64) -> Result<Self> {
        Ok(v)
    }

    fn from_complex(_re: f64, _im: f64, line: u64) -> Result<Self> {
        Err(narrowing(line, "complex", "real"))
    }

    fn negate(self) -> Self {
        -self
    }

    fn emit(self, out: &mut String, precision: Option<usize>) {
        emit_float(out, self, precision);
    }
}

impl ValueType for Complex<f32> {
    const FIELD: Field = Field::Complex;

    fn from_integer(v: i64, _line: u64) -> Result<Self> {
        Ok(Complex::new(v as f32, 0.0))
    }

    fn from_real(v: f64, _line: u64) -> Result<Self> {
        Ok(Complex::new(v as f32, 0.0))
    }

    fn from_complex(re: f64, im: f64, _line: u64) -> Result<Self> {
        Ok(Complex::new(re as f32, im as f32))
    }

    fn negate(self) -> Self {
        -self
    }

    fn conjugate(self) -> Self {
        self.conj()
    }

    fn emit(self, out: &mut String, precision: Option<usize>) {
        emit_complex(
            out,
            Complex::new(f64::from(self.re), f64::from(self.im)),
            precision,
        );
    }
}

impl ValueType for Complex<f64> {
    const FIELD: Field = Field::Complex;

    fn from_integer(v: i64, _line: u64) -> Result<Self> {
        Ok(Complex::new(v as f64, 0.0))
    }

    fn from_real(v: f64, _line: u64) -> Result<Self> {
        Ok(Complex::new(v, 0.0))
    }

    fn from_complex(re: f64, im: f64, _line: u64) -> Result<Self> {
        Ok(Complex::new(re, im))
    }

    fn negate(self) -> Self {
        -self
    }

    fn conjugate(self) -> Self {
        self.conj()
    }

    fn emit(self, out: &mut String, precision: Option<usize>) {
        emit_complex(out, self, precision);
    }
}
