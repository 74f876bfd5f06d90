//! Exact rationals for the imbalance parameter and the component size bounds.
//!
//! The size bounds multiply by `1 + eps` repeatedly, so denominators grow
//! geometrically; arbitrary precision keeps the bounds exact for small `eps`.

use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::errors::RationalError;

pub type Rational = BigRational;

/// Builds `num / den`, rejecting a zero denominator.
pub fn ratio(num: i64, den: i64) -> Result<Rational, RationalError> {
    if den == 0 {
        return Err(RationalError::ZeroDenominator);
    }
    Ok(Rational::new(BigInt::from(num), BigInt::from(den)))
}

pub fn from_usize(value: usize) -> Rational {
    Rational::from_integer(BigInt::from(value))
}

/// `num / den` for counts; `den` must be non-zero.
pub fn ratio_usize(num: usize, den: usize) -> Rational {
    Rational::new(BigInt::from(num), BigInt::from(den.max(1)))
}

/// Parses `"a/b"`, `"a"` or a finite decimal such as `"0.25"`.
pub fn parse(input: &str) -> Result<Rational, RationalError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RationalError::Parse(input.to_string()));
    }

    if let Some((int_part, frac_part)) = trimmed.split_once('.') {
        let negative = int_part.starts_with('-');
        let int_digits = int_part.trim_start_matches(['-', '+']);
        if !frac_part.chars().all(|c| c.is_ascii_digit())
            || !int_digits.chars().all(|c| c.is_ascii_digit())
            || (int_digits.is_empty() && frac_part.is_empty())
        {
            return Err(RationalError::Parse(input.to_string()));
        }
        let digits = format!("{}{}", int_digits, frac_part);
        let mut num = BigInt::from_str(&digits).map_err(|_| RationalError::Parse(input.to_string()))?;
        if negative {
            num = -num;
        }
        let den = num_traits::pow(BigInt::from(10), frac_part.len());
        return Ok(Rational::new(num, den));
    }

    if let Some((num, den)) = trimmed.split_once('/') {
        let num = BigInt::from_str(num.trim()).map_err(|_| RationalError::Parse(input.to_string()))?;
        let den = BigInt::from_str(den.trim()).map_err(|_| RationalError::Parse(input.to_string()))?;
        if den.is_zero() {
            return Err(RationalError::ZeroDenominator);
        }
        return Ok(Rational::new(num, den));
    }

    BigInt::from_str(trimmed)
        .map(Rational::from_integer)
        .map_err(|_| RationalError::Parse(input.to_string()))
}

/// Floor of a non-negative rational as `usize`.
pub fn floor_to_usize(r: &Rational) -> Result<usize, RationalError> {
    r.floor().to_integer().to_usize().ok_or(RationalError::Overflow)
}

/// Ceiling of a non-negative rational as `usize`.
pub fn ceil_to_usize(r: &Rational) -> Result<usize, RationalError> {
    r.ceil().to_integer().to_usize().ok_or(RationalError::Overflow)
}

pub fn is_positive(r: &Rational) -> bool {
    r.is_positive()
}

pub fn one_plus(r: &Rational) -> Rational {
    Rational::one() + r
}

/// Renders `num/den`, or just `num` for integers.
pub fn display(r: &Rational) -> String {
    if r.is_integer() {
        r.to_integer().to_string()
    } else {
        format!("{}/{}", r.numer(), r.denom())
    }
}
