//! Fixed-point decimal coordinates.
//!
//! Drawing coordinates are quantized to thousandths and stored as `i64`
//! so that point equality and angle comparisons are exact integer
//! operations. Two endpoints entered through different segments compare
//! equal whenever they round to the same thousandth.
//!
//! Rounding is half away from zero on the magnitude, which matches
//! decimal `ROUND_HALF_UP` at three places.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places kept for every coordinate.
pub const DECIMAL_PLACES: u32 = 3;

/// Integer units per drawing unit (`10^DECIMAL_PLACES`).
pub const SCALE: i64 = 1_000;

/// [`SCALE`] as a float.
pub const SCALE_F64: f64 = 1_000.0;

/// Largest accepted coordinate magnitude, in drawing units.
///
/// Keeps every quantized value far from `i64` overflow, so differences
/// and cross products computed in `i128` are always exact.
pub const MAX_COORD_MAGNITUDE: f64 = 1.0e12;

const MAX_INTEGER_PART: i64 = 1_000_000_000_000;

/// Why a value could not be turned into a [`Coord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuantizeError {
    /// NaN or an infinity.
    #[error("coordinate is not a finite number")]
    NonFinite,

    /// Magnitude above [`MAX_COORD_MAGNITUDE`].
    #[error("coordinate magnitude exceeds the supported range")]
    OutOfRange,

    /// Text that is not a plain decimal number (`-12.5`, `3`, `.25`).
    #[error("coordinate text is not a decimal number")]
    Unparseable,
}

/// A coordinate with exactly three decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord(i64);

impl Coord {
    /// The origin coordinate.
    pub const ZERO: Self = Self(0);

    /// Build a coordinate from raw thousandths.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// Build a coordinate from a whole number of drawing units.
    #[must_use]
    pub fn from_int(value: i32) -> Self {
        Self(i64::from(value) * SCALE)
    }

    /// Quantize a floating-point value to the nearest thousandth.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::NonFinite`] for NaN or infinities and
    /// [`QuantizeError::OutOfRange`] above [`MAX_COORD_MAGNITUDE`].
    pub fn from_f64(value: f64) -> Result<Self, QuantizeError> {
        if !value.is_finite() {
            return Err(QuantizeError::NonFinite);
        }
        if value.abs() > MAX_COORD_MAGNITUDE {
            return Err(QuantizeError::OutOfRange);
        }
        let magnitude = exact_scaled_magnitude(value.abs());
        let units = i64::try_from(magnitude).map_err(|_| QuantizeError::OutOfRange)?;
        Ok(Self(if value.is_sign_negative() { -units } else { units }))
    }

    /// Raw value in thousandths.
    #[must_use]
    pub const fn units(self) -> i64 {
        self.0
    }

    /// Value in drawing units as a float (for display and measurement only).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE_F64
    }
}

/// `round_half_up(magnitude * SCALE)` computed on the exact binary value
/// of a finite, non-negative float.
///
/// Scaling in floating point first would round twice: `1.2345` is stored
/// just below the midpoint and must quantize to `1.234`.
fn exact_scaled_magnitude(magnitude: f64) -> i128 {
    const MANTISSA_BITS: u32 = 52;
    const EXPONENT_BIAS: i32 = 1_075;

    let bits = magnitude.to_bits();
    let fraction = i128::from(bits & ((1_u64 << MANTISSA_BITS) - 1));
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let biased = ((bits >> MANTISSA_BITS) & 0x7ff) as i32;
    let (mantissa, exponent) = if biased == 0 {
        (fraction, 1 - EXPONENT_BIAS)
    } else {
        (fraction | (1 << MANTISSA_BITS), biased - EXPONENT_BIAS)
    };

    let scaled = mantissa * i128::from(SCALE);
    if exponent >= 0 {
        return scaled << exponent;
    }
    let shift = exponent.unsigned_abs();
    // `scaled < 2^63`, so anything shifted this far is below one half.
    if shift >= 64 {
        return 0;
    }
    let whole = scaled >> shift;
    let remainder = scaled - (whole << shift);
    if remainder >= 1 << (shift - 1) {
        whole + 1
    } else {
        whole
    }
}

impl FromStr for Coord {
    type Err = QuantizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(QuantizeError::Unparseable);
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(QuantizeError::Unparseable);
        }

        let mut whole: i64 = 0;
        for b in int_part.bytes() {
            whole = whole * 10 + i64::from(b - b'0');
            if whole > MAX_INTEGER_PART {
                return Err(QuantizeError::OutOfRange);
            }
        }

        let mut units = whole * SCALE;
        let mut frac = frac_part.bytes();
        let mut place = SCALE / 10;
        for _ in 0..DECIMAL_PLACES {
            let digit = frac.next().map_or(0, |b| i64::from(b - b'0'));
            units += digit * place;
            place /= 10;
        }
        // Half-up: the first dropped digit decides.
        if frac.next().is_some_and(|b| b >= b'5') {
            units += 1;
        }
        if units > MAX_INTEGER_PART * SCALE {
            return Err(QuantizeError::OutOfRange);
        }

        Ok(Self(if negative { -units } else { units }))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        write!(f, "{sign}{}.{:03}", magnitude / scale, magnitude % scale)
    }
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CoordVisitor)
    }
}

/// Accepts a JSON number or a decimal string.
struct CoordVisitor;

impl serde::de::Visitor<'_> for CoordVisitor {
    type Value = Coord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Coord, E> {
        Coord::from_f64(v).map_err(E::custom)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Coord, E> {
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Coord, E> {
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Coord, E> {
        v.parse().map_err(E::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_f64_rounds_half_away_from_zero() {
        assert_eq!(Coord::from_f64(1.0).unwrap().units(), 1_000);
        assert_eq!(Coord::from_f64(0.25).unwrap().units(), 250);
        assert_eq!(Coord::from_f64(2.5e-4).unwrap().units(), 0);
        assert_eq!(Coord::from_f64(0.0015).unwrap().units(), 2);
        assert_eq!(Coord::from_f64(-0.0015).unwrap().units(), -2);
    }

    #[test]
    fn from_f64_rounds_the_stored_binary_value() {
        // Each literal is stored slightly below its decimal midpoint.
        assert_eq!(Coord::from_f64(1.0005).unwrap().units(), 1_000);
        assert_eq!(Coord::from_f64(1.2345).unwrap().units(), 1_234);
        assert_eq!(Coord::from_f64(0.1235).unwrap().units(), 123);
        assert_eq!(Coord::from_f64(-1.2345).unwrap().units(), -1_234);
    }

    #[test]
    fn from_f64_handles_extremes() {
        assert_eq!(Coord::from_f64(5e-324).unwrap(), Coord::ZERO);
        assert_eq!(Coord::from_f64(-0.0).unwrap(), Coord::ZERO);
        assert_eq!(
            Coord::from_f64(MAX_COORD_MAGNITUDE).unwrap().units(),
            1_000_000_000_000_000
        );
        assert_eq!(
            Coord::from_f64(123_456_789.0125).unwrap().units(),
            123_456_789_013
        );
    }

    #[test]
    fn from_f64_rejects_non_finite_and_huge() {
        assert_eq!(Coord::from_f64(f64::NAN), Err(QuantizeError::NonFinite));
        assert_eq!(
            Coord::from_f64(f64::NEG_INFINITY),
            Err(QuantizeError::NonFinite)
        );
        assert_eq!(Coord::from_f64(2.0e12), Err(QuantizeError::OutOfRange));
    }

    #[test]
    fn parse_exact_decimal_text() {
        assert_eq!("10".parse::<Coord>().unwrap(), Coord::from_int(10));
        assert_eq!("-12.5".parse::<Coord>().unwrap().units(), -12_500);
        assert_eq!(".25".parse::<Coord>().unwrap().units(), 250);
        assert_eq!("+3.".parse::<Coord>().unwrap().units(), 3_000);
        assert_eq!(" 7.125 ".parse::<Coord>().unwrap().units(), 7_125);
    }

    #[test]
    fn parse_rounds_extra_digits_half_up() {
        assert_eq!("0.0004".parse::<Coord>().unwrap().units(), 0);
        assert_eq!("0.0005".parse::<Coord>().unwrap().units(), 1);
        assert_eq!("1.99950".parse::<Coord>().unwrap().units(), 2_000);
        assert_eq!("-1.2345".parse::<Coord>().unwrap().units(), -1_235);
    }

    #[test]
    fn parse_rejects_garbage() {
        for text in ["", "-", ".", "abc", "1e5", "1.2.3", "--1", "0x10"] {
            assert_eq!(
                text.parse::<Coord>(),
                Err(QuantizeError::Unparseable),
                "{text:?} should not parse",
            );
        }
        assert_eq!(
            "99999999999999".parse::<Coord>(),
            Err(QuantizeError::OutOfRange)
        );
    }

    #[test]
    fn display_always_has_three_places() {
        assert_eq!(Coord::from_int(10).to_string(), "10.000");
        assert_eq!(Coord::from_units(-1_005).to_string(), "-1.005");
        assert_eq!(Coord::from_units(-5).to_string(), "-0.005");
        assert_eq!(Coord::ZERO.to_string(), "0.000");
    }

    #[test]
    fn float_and_text_inputs_agree() {
        let from_float = Coord::from_f64(15.0).unwrap();
        let from_text: Coord = "15.000".parse().unwrap();
        assert_eq!(from_float, from_text);
    }

    #[test]
    fn serde_accepts_numbers_and_strings() {
        let c: Coord = serde_json::from_str("12.5").unwrap();
        assert_eq!(c.units(), 12_500);
        let c: Coord = serde_json::from_str("-3").unwrap();
        assert_eq!(c.units(), -3_000);
        let c: Coord = serde_json::from_str("\"0.1\"").unwrap();
        assert_eq!(c.units(), 100);
        assert!(serde_json::from_str::<Coord>("\"x\"").is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Coord::from_units(1_250)).unwrap();
        assert_eq!(json, "\"1.250\"");
    }
}
