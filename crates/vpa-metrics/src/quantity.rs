//! Kubernetes resource quantity conversion
//!
//! `k8s-openapi` carries quantities as opaque strings. This module parses
//! them into an exact scaled integer so CPU can be read at milli-unit
//! precision and memory as whole bytes, rounding away from zero the same
//! way the API server does.

use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::str::FromStr;

/// A parsed quantity: `(-1)^negative * mantissa * 10^exp10 * 2^exp2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedQuantity {
    negative: bool,
    mantissa: u128,
    exp10: i32,
    exp2: u32,
}

impl ParsedQuantity {
    /// `q * 1000` rounded away from zero, or `None` if it does not fit in an `i64`
    pub fn milli_value(&self) -> Option<i64> {
        self.scaled_round(3)
    }

    /// `q` rounded away from zero, or `None` if it does not fit in an `i64`
    pub fn value(&self) -> Option<i64> {
        self.scaled_round(0)
    }

    fn scaled_round(&self, shift: i32) -> Option<i64> {
        let numerator = self.mantissa.checked_mul(1u128.checked_shl(self.exp2)?)?;
        let exp = self.exp10.checked_add(shift)?;

        let (quotient, has_remainder) = if exp >= 0 {
            (numerator.checked_mul(pow10(exp.unsigned_abs())?)?, false)
        } else {
            match pow10(exp.unsigned_abs()) {
                Some(denominator) => (numerator / denominator, numerator % denominator != 0),
                // Denominator larger than any u128 numerator
                None => (0, numerator != 0),
            }
        };

        // Inexact results round away from zero
        let mut magnitude = i64::try_from(quotient).ok()?;
        if has_remainder {
            magnitude = magnitude.checked_add(1)?;
        }
        Some(if self.negative { -magnitude } else { magnitude })
    }
}

fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

fn invalid(value: &str, reason: &'static str) -> Error {
    Error::Quantity {
        value: value.to_string(),
        reason,
    }
}

impl FromStr for ParsedQuantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(invalid(s, "empty quantity"));
        }

        let (negative, rest) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let mut mantissa: u128 = 0;
        let mut fraction_digits: i32 = 0;
        let mut seen_dot = false;
        let mut seen_digit = false;
        for c in number.chars() {
            if c == '.' {
                if seen_dot {
                    return Err(invalid(s, "more than one decimal point"));
                }
                seen_dot = true;
                continue;
            }
            let digit = u128::from(c as u8 - b'0');
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
                .ok_or_else(|| invalid(s, "too many digits"))?;
            if seen_dot {
                fraction_digits += 1;
            }
            seen_digit = true;
        }
        if !seen_digit {
            return Err(invalid(s, "missing digits"));
        }

        let (suffix_exp10, exp2) = parse_suffix(suffix).ok_or_else(|| invalid(s, "unknown suffix"))?;

        let exp10 = suffix_exp10
            .checked_sub(fraction_digits)
            .ok_or_else(|| invalid(s, "exponent out of range"))?;

        Ok(Self {
            negative: negative && mantissa != 0,
            mantissa,
            exp10,
            exp2,
        })
    }
}

/// Returns the (power of ten, power of two) a suffix stands for
fn parse_suffix(suffix: &str) -> Option<(i32, u32)> {
    let scale = match suffix {
        "" => (0, 0),
        "Ki" => (0, 10),
        "Mi" => (0, 20),
        "Gi" => (0, 30),
        "Ti" => (0, 40),
        "Pi" => (0, 50),
        "Ei" => (0, 60),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        _ => {
            let exponent = suffix.strip_prefix(['e', 'E'])?;
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (exponent.parse::<i32>().ok()?, 0)
        }
    };
    Some(scale)
}

/// Parse a quantity
pub fn parse(quantity: &Quantity) -> Result<ParsedQuantity> {
    quantity.0.parse()
}

/// CPU quantity in cores, at milli-core precision
pub fn cpu_cores(quantity: &Quantity) -> Result<f64> {
    let milli = parse(quantity)?
        .milli_value()
        .ok_or_else(|| invalid(&quantity.0, "value out of range"))?;
    Ok(milli as f64 / 1000.0)
}

/// Memory quantity in bytes
pub fn memory_bytes(quantity: &Quantity) -> Result<f64> {
    let bytes = parse(quantity)?
        .value()
        .ok_or_else(|| invalid(&quantity.0, "value out of range"))?;
    Ok(bytes as f64)
}
