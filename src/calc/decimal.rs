//! Decimal helpers over `BigRational`: literal parsing, significant-digit
//! rounding, square roots and printing.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::CalcError;

/// Upper bound on the digits of any exact intermediate value.
pub(super) const MAX_DIGITS: usize = 100_000;

/// pi to 300 significant digits; rounded to the requested precision.
pub(super) const PI: &str = "3.14159265358979323846264338327950288419716939937510582097494459230781640628620899862803482534211706798214808651328230664709384460955058223172535940812848111745028410270193852110555964462294895493038196442881097566593344612847564823378678316527120190914564856692346034861045432664821339360726024914127";

/// e to 300 significant digits.
pub(super) const E: &str = "2.71828182845904523536028747135266249775724709369995957496696762772407663035354759457138217852516642742746639193200305992181741359662904357290033429526059563073813232862794349076323382988075319525101901157383418793070215408914993488416750924476146066808226480016847741185374234544243710753907774499206";

/// Decimal exponents at or above this print in exponent notation.
const UPPER_EXP: i64 = 21;
/// Decimal exponents below this print in exponent notation.
const LOWER_EXP: i64 = -6;

/// Digits in the magnitude of `n`; zero has one digit.
pub(super) fn digit_len(n: &BigInt) -> usize {
    n.magnitude().to_string().len()
}

/// `10^k` as a rational.
pub(super) fn pow10(k: i64) -> BigRational {
    let magnitude = BigInt::from(10u32).pow(u32::try_from(k.unsigned_abs()).unwrap_or(u32::MAX));
    if k >= 0 {
        BigRational::from_integer(magnitude)
    } else {
        BigRational::new(BigInt::one(), magnitude)
    }
}

/// Reject values whose numerator and denominator together exceed
/// [`MAX_DIGITS`].
pub(super) fn check_size(value: BigRational) -> Result<BigRational, CalcError> {
    if digit_len(value.numer()) + digit_len(value.denom()) > MAX_DIGITS {
        return Err(CalcError::Domain(format!(
            "result exceeds {MAX_DIGITS} digits"
        )));
    }
    Ok(value)
}

/// Parse an unsigned literal such as `12`, `0.5`, `.5` or `6.02e23` exactly.
pub(super) fn parse_literal(text: &str) -> Result<BigRational, CalcError> {
    let invalid = || CalcError::Domain(format!("invalid number '{text}'"));

    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => {
            let exponent: i64 = text[at + 1..].parse().map_err(|_| invalid())?;
            (&text[..at], exponent)
        }
        None => (text, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{whole}{fraction}");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let fraction_len = i64::try_from(fraction.len()).map_err(|_| invalid())?;
    let scale = exponent - fraction_len;
    if scale.unsigned_abs() > MAX_DIGITS as u64 {
        return Err(CalcError::Domain(format!(
            "number '{text}' exceeds {MAX_DIGITS} digits"
        )));
    }
    let integer: BigInt = digits.parse().map_err(|_| invalid())?;
    check_size(BigRational::from_integer(integer) * pow10(scale))
}

/// The `e` with `10^(e-1) <= |value| < 10^e`. `value` must be non-zero.
fn decimal_exponent(value: &BigRational) -> i64 {
    let magnitude = value.abs();
    let estimate = digit_len(magnitude.numer()) as i64 - digit_len(magnitude.denom()) as i64;
    if magnitude >= pow10(estimate) {
        estimate + 1
    } else {
        estimate
    }
}

/// `|value|` scaled to an integer of `digits` significant digits (rounded
/// half away from zero) and the power of ten it was scaled by.
fn significand(value: &BigRational, digits: u32) -> (BigInt, i64) {
    let scale = i64::from(digits) - decimal_exponent(value);
    let scaled = (value.abs() * pow10(scale)).round().to_integer();
    (scaled, scale)
}

/// Round to `digits` significant digits, half away from zero.
pub(super) fn round_significant(value: &BigRational, digits: u32) -> BigRational {
    if value.is_zero() {
        return BigRational::zero();
    }
    let (scaled, scale) = significand(value, digits);
    let rounded = BigRational::from_integer(scaled) * pow10(-scale);
    if value.is_negative() { -rounded } else { rounded }
}

/// Square root to `digits` significant digits. `value` must be
/// non-negative.
pub(super) fn sqrt(value: &BigRational, digits: u32) -> BigRational {
    if value.is_zero() {
        return BigRational::zero();
    }
    // sqrt(a/b) = sqrt(a*b)/b, computed on integers scaled by 10^(2m).
    let extra = i64::from(digits) + 10 + digit_len(value.denom()) as i64;
    let radicand = value.numer() * value.denom() * pow10(2 * extra).to_integer();
    let root = BigRational::new(radicand.sqrt(), value.denom() * pow10(extra).to_integer());
    round_significant(&root, digits)
}

/// Print `value` with at most `digits` significant digits.
///
/// Trailing zeros are dropped. Decimal exponents in `-6..21` print
/// positionally, others as `d.ddde+N`.
pub(super) fn format_significant(value: &BigRational, digits: u32) -> String {
    if value.is_zero() {
        return "0".to_owned();
    }
    let (scaled, scale) = significand(value, digits);
    let mut mantissa = scaled.to_string();
    // Exponent of the leading digit; rounding may have carried into a new one.
    let exponent = mantissa.len() as i64 - 1 - scale;
    let trimmed = mantissa.trim_end_matches('0').len();
    mantissa.truncate(trimmed);

    let sign = if value.is_negative() { "-" } else { "" };
    let body = if (LOWER_EXP..UPPER_EXP).contains(&exponent) {
        positional(&mantissa, exponent)
    } else {
        scientific(&mantissa, exponent)
    };
    format!("{sign}{body}")
}

fn positional(mantissa: &str, exponent: i64) -> String {
    let int_digits = exponent + 1;
    let len = mantissa.len() as i64;
    if int_digits <= 0 {
        format!("0.{}{mantissa}", "0".repeat(int_digits.unsigned_abs() as usize))
    } else if int_digits >= len {
        format!("{mantissa}{}", "0".repeat((int_digits - len) as usize))
    } else {
        let (int_part, frac_part) = mantissa.split_at(int_digits as usize);
        format!("{int_part}.{frac_part}")
    }
}

fn scientific(mantissa: &str, exponent: i64) -> String {
    let (lead, rest) = mantissa.split_at(1);
    let sign = if exponent >= 0 { "+" } else { "-" };
    if rest.is_empty() {
        format!("{lead}e{sign}{}", exponent.unsigned_abs())
    } else {
        format!("{lead}.{rest}e{sign}{}", exponent.unsigned_abs())
    }
}

/// Print an exact rational as `n` or `n/d`.
pub(super) fn format_fraction(value: &BigRational) -> String {
    if value.is_integer() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}
