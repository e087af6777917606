//! Number modes and tree evaluation.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::CalcError;
use super::decimal::{self, MAX_DIGITS};
use super::parser::{BinaryOp, Expr};

/// Largest argument accepted by `!` in the exact modes.
const MAX_FACTORIAL: u32 = 5_000;

/// Functions only [`Float`] provides.
const NUMBER_ONLY: &[&str] = &[
    "cbrt", "exp", "ln", "log", "log10", "log2", "sin", "cos", "tan", "asin", "acos", "atan",
];

/// Arithmetic for one number mode.
pub(super) trait Arithmetic {
    type Value;

    fn literal(&self, text: &str) -> Result<Self::Value, CalcError>;
    fn constant(&self, name: &str) -> Result<Self::Value, CalcError>;
    fn negate(&self, value: Self::Value) -> Self::Value;
    fn binary(&self, op: BinaryOp, lhs: Self::Value, rhs: Self::Value) -> Result<Self::Value, CalcError>;
    fn factorial(&self, value: Self::Value) -> Result<Self::Value, CalcError>;
    fn call(&self, name: &str, args: Vec<Self::Value>) -> Result<Self::Value, CalcError>;
}

pub(super) fn eval<A: Arithmetic>(arith: &A, expr: &Expr) -> Result<A::Value, CalcError> {
    match expr {
        Expr::Number(text) => arith.literal(text),
        Expr::Name(name) => arith.constant(name),
        Expr::Negate(inner) => Ok(arith.negate(eval(arith, inner)?)),
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(arith, lhs)?;
            let rhs = eval(arith, rhs)?;
            arith.binary(*op, lhs, rhs)
        }
        Expr::Factorial(inner) => arith.factorial(eval(arith, inner)?),
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|arg| eval(arith, arg))
                .collect::<Result<Vec<_>, _>>()?;
            arith.call(name, values)
        }
    }
}

fn arity(function: &str, expected: &'static str, got: usize) -> CalcError {
    CalcError::Arity {
        function: function.to_owned(),
        expected,
        got,
    }
}

fn one_arg<T>(name: &str, mut args: Vec<T>) -> Result<T, CalcError> {
    match args.len() {
        1 => args.pop().ok_or_else(|| arity(name, "1", 0)),
        got => Err(arity(name, "1", got)),
    }
}

fn fold_extreme<T>(
    name: &str,
    args: Vec<T>,
    keep_first: impl Fn(&T, &T) -> bool,
) -> Result<T, CalcError> {
    let mut values = args.into_iter();
    let first = values.next().ok_or_else(|| arity(name, "at least 1", 0))?;
    Ok(values.fold(first, |best, next| if keep_first(&best, &next) { best } else { next }))
}

/// IEEE double arithmetic.
pub(super) struct Float {
    precision: u32,
}

impl Float {
    pub(super) fn new(precision: u32) -> Self {
        Self { precision }
    }

    /// The exact decimal value of the double, rounded to the precision.
    pub(super) fn render(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_owned();
        }
        if value.is_infinite() {
            return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
        }
        match BigRational::from_float(value) {
            Some(exact) => decimal::format_significant(&exact, self.precision),
            None => value.to_string(),
        }
    }
}

impl Arithmetic for Float {
    type Value = f64;

    fn literal(&self, text: &str) -> Result<f64, CalcError> {
        text.parse()
            .map_err(|_| CalcError::Domain(format!("invalid number '{text}'")))
    }

    fn constant(&self, name: &str) -> Result<f64, CalcError> {
        match name {
            "pi" => Ok(std::f64::consts::PI),
            "e" => Ok(std::f64::consts::E),
            _ => Err(CalcError::UnknownName(name.to_owned())),
        }
    }

    fn negate(&self, value: f64) -> f64 {
        -value
    }

    fn binary(&self, op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, CalcError> {
        Ok(match op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Rem if rhs == 0.0 => lhs,
            BinaryOp::Rem => lhs - rhs * (lhs / rhs).floor(),
            BinaryOp::Pow => lhs.powf(rhs),
        })
    }

    fn factorial(&self, value: f64) -> Result<f64, CalcError> {
        if value < 0.0 || value.fract() != 0.0 {
            return Err(CalcError::Domain(format!(
                "factorial needs a non-negative integer, got {value}"
            )));
        }
        if value > 170.0 {
            return Ok(f64::INFINITY);
        }
        Ok((2..=value as u32).map(f64::from).product())
    }

    fn call(&self, name: &str, args: Vec<f64>) -> Result<f64, CalcError> {
        let unary: fn(f64) -> f64 = match name {
            "min" => return fold_extreme(name, args, |a, b| a <= b),
            "max" => return fold_extreme(name, args, |a, b| a >= b),
            "log" => {
                return match args.as_slice() {
                    [x] => Ok(x.ln()),
                    [x, base] => Ok(x.ln() / base.ln()),
                    _ => Err(arity(name, "1 or 2", args.len())),
                };
            }
            "abs" => f64::abs,
            "floor" => f64::floor,
            "ceil" => f64::ceil,
            "round" => f64::round,
            "sqrt" => f64::sqrt,
            "cbrt" => f64::cbrt,
            "exp" => f64::exp,
            "ln" => f64::ln,
            "log10" => f64::log10,
            "log2" => f64::log2,
            "sin" => f64::sin,
            "cos" => f64::cos,
            "tan" => f64::tan,
            "asin" => f64::asin,
            "acos" => f64::acos,
            "atan" => f64::atan,
            _ => return Err(CalcError::UnknownFunction(name.to_owned())),
        };
        Ok(unary(one_arg(name, args)?))
    }
}

/// Exact rational arithmetic, optionally rounded to a number of
/// significant digits after every operation.
pub(super) struct Exact {
    digits: Option<u32>,
}

impl Exact {
    /// BigNumber mode.
    pub(super) fn rounded(digits: u32) -> Self {
        Self {
            digits: Some(digits),
        }
    }

    /// Fraction mode.
    pub(super) fn fraction() -> Self {
        Self { digits: None }
    }

    pub(super) fn render(&self, value: &BigRational) -> String {
        match self.digits {
            Some(digits) => decimal::format_significant(value, digits),
            None => decimal::format_fraction(value),
        }
    }

    fn settle(&self, value: BigRational) -> Result<BigRational, CalcError> {
        let value = decimal::check_size(value)?;
        Ok(match self.digits {
            Some(digits) => decimal::round_significant(&value, digits),
            None => value,
        })
    }

    fn sqrt(&self, value: BigRational) -> Result<BigRational, CalcError> {
        if value.is_negative() {
            return Err(CalcError::Domain("square root of a negative number".into()));
        }
        if let Some(digits) = self.digits {
            return Ok(decimal::sqrt(&value, digits));
        }
        let numer = value.numer().sqrt();
        let denom = value.denom().sqrt();
        if &numer * &numer == *value.numer() && &denom * &denom == *value.denom() {
            Ok(BigRational::new(numer, denom))
        } else {
            Err(CalcError::Domain(format!(
                "sqrt({}) is irrational and has no exact fraction",
                decimal::format_fraction(&value)
            )))
        }
    }

    fn pow(&self, base: BigRational, exponent: BigRational) -> Result<BigRational, CalcError> {
        if exponent == BigRational::new(BigInt::one(), BigInt::from(2)) {
            return self.sqrt(base);
        }
        if !exponent.is_integer() {
            return Err(CalcError::Domain(
                "non-integer exponents other than 0.5 need number mode".into(),
            ));
        }
        let power = exponent.to_integer();
        if base.is_zero() && power.is_negative() {
            return Err(CalcError::Domain(
                "0 cannot be raised to a negative power".into(),
            ));
        }
        if base.is_zero() || base.is_one() || power.is_zero() {
            return Ok(if power.is_zero() { BigRational::one() } else { base });
        }

        let base_digits = decimal::digit_len(base.numer()).max(decimal::digit_len(base.denom()));
        let magnitude = power
            .magnitude()
            .to_u64()
            .filter(|p| base_digits as u64 * p <= MAX_DIGITS as u64 && *p <= u64::from(u32::MAX))
            .ok_or_else(|| CalcError::Domain(format!("result exceeds {MAX_DIGITS} digits")))?;

        let raised = match self.digits {
            Some(digits) => pow_rounded(&base, magnitude, digits + 10),
            None => {
                let exp = u32::try_from(magnitude).unwrap_or(u32::MAX);
                BigRational::new(base.numer().pow(exp), base.denom().pow(exp))
            }
        };
        let raised = if power.is_negative() { raised.recip() } else { raised };
        self.settle(raised)
    }
}

/// `base^exp` by squaring, rounding each product to `digits`.
fn pow_rounded(base: &BigRational, mut exp: u64, digits: u32) -> BigRational {
    let mut result = BigRational::one();
    let mut square = base.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result = decimal::round_significant(&(&result * &square), digits);
        }
        exp >>= 1;
        if exp > 0 {
            square = decimal::round_significant(&(&square * &square), digits);
        }
    }
    result
}

impl Arithmetic for Exact {
    type Value = BigRational;

    fn literal(&self, text: &str) -> Result<BigRational, CalcError> {
        self.settle(decimal::parse_literal(text)?)
    }

    fn constant(&self, name: &str) -> Result<BigRational, CalcError> {
        let digits = match name {
            "pi" => decimal::PI,
            "e" => decimal::E,
            _ => return Err(CalcError::UnknownName(name.to_owned())),
        };
        if self.digits.is_none() {
            return Err(CalcError::Domain(format!(
                "'{name}' is irrational and has no exact fraction"
            )));
        }
        self.settle(decimal::parse_literal(digits)?)
    }

    fn negate(&self, value: BigRational) -> BigRational {
        -value
    }

    fn binary(&self, op: BinaryOp, lhs: BigRational, rhs: BigRational) -> Result<BigRational, CalcError> {
        let value = match op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div if rhs.is_zero() => {
                return Err(CalcError::Domain("division by zero".into()));
            }
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Rem if rhs.is_zero() => lhs,
            BinaryOp::Rem => {
                let quotient = (&lhs / &rhs).floor();
                lhs - rhs * quotient
            }
            BinaryOp::Pow => return self.pow(lhs, rhs),
        };
        self.settle(value)
    }

    fn factorial(&self, value: BigRational) -> Result<BigRational, CalcError> {
        let n = value
            .is_integer()
            .then(|| value.to_integer())
            .filter(|n| !n.is_negative())
            .ok_or_else(|| {
                CalcError::Domain(format!(
                    "factorial needs a non-negative integer, got {}",
                    self.render(&value)
                ))
            })?;
        let n = n
            .to_u32()
            .filter(|n| *n <= MAX_FACTORIAL)
            .ok_or_else(|| CalcError::Domain(format!("factorial limited to {MAX_FACTORIAL}!")))?;
        let product = (2..=n).fold(BigInt::one(), |acc, k| acc * k);
        self.settle(BigRational::from_integer(product))
    }

    fn call(&self, name: &str, args: Vec<BigRational>) -> Result<BigRational, CalcError> {
        let value = match name {
            "min" => fold_extreme(name, args, |a, b| a <= b)?,
            "max" => fold_extreme(name, args, |a, b| a >= b)?,
            "abs" => one_arg(name, args)?.abs(),
            "floor" => one_arg(name, args)?.floor(),
            "ceil" => one_arg(name, args)?.ceil(),
            "round" => one_arg(name, args)?.round(),
            "sqrt" => self.sqrt(one_arg(name, args)?)?,
            _ if NUMBER_ONLY.contains(&name) => {
                return Err(CalcError::Domain(format!("{name} is only available in number mode")));
            }
            _ => return Err(CalcError::UnknownFunction(name.to_owned())),
        };
        self.settle(value)
    }
}
