//! Arithmetic expression evaluation for the `math_eval` tool.
//!
//! Expressions are parsed once into an [`Expr`](parser::Expr) tree and then
//! evaluated in one of three number modes:
//!
//! - [`NumberMode::Number`]: IEEE doubles, printed as the exact decimal
//!   value of the double rounded to the requested precision
//! - [`NumberMode::BigNumber`]: decimals rounded to `precision` significant
//!   digits after every operation
//! - [`NumberMode::Fraction`]: exact rationals, printed as `n/d`
//!
//! Both exact modes are backed by `num-rational`'s `BigRational`.

mod decimal;
mod eval;
mod parser;

use serde::{Deserialize, Serialize};

use eval::{Exact, Float};

/// Significant digits used when no precision is given.
pub const DEFAULT_PRECISION: u32 = 64;

/// Smallest accepted precision.
pub const MIN_PRECISION: u32 = 16;

/// Largest accepted precision.
pub const MAX_PRECISION: u32 = 256;

/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    /// The expression text is malformed. `position` is a 1-based
    /// character column.
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// An identifier that is neither a constant nor a function call.
    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },

    /// The expression is well-formed but has no value in this mode
    /// (division by zero, out-of-range result, and so on).
    #[error("math error: {0}")]
    Domain(String),

    #[error("precision must be between {MIN_PRECISION} and {MAX_PRECISION}, got {0}")]
    Precision(u32),
}

impl CalcError {
    /// Whether the caller's input is at fault, as opposed to the
    /// expression having no value.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Domain(_))
    }
}

/// How numbers are represented while evaluating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberMode {
    #[serde(rename = "number")]
    Number,
    #[default]
    BigNumber,
    Fraction,
}

impl NumberMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::BigNumber => "BigNumber",
            Self::Fraction => "Fraction",
        }
    }
}

impl std::fmt::Display for NumberMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A formatted evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub mode: NumberMode,
    pub result: String,
    pub value_type: &'static str,
}

/// Evaluate `expression` in `mode`.
///
/// `precision` bounds the significant digits of the printed result in every
/// mode, and additionally rounds each intermediate value in
/// [`NumberMode::BigNumber`].
///
/// # Errors
///
/// Returns [`CalcError::Precision`] if `precision` is outside
/// [`MIN_PRECISION`]`..=`[`MAX_PRECISION`], a syntax or name error for
/// malformed input, and [`CalcError::Domain`] when the value does not exist.
///
/// # Examples
///
/// ```
/// use web_tools::calc::{evaluate, NumberMode};
///
/// let third = evaluate("1/3 + 1/6", NumberMode::Fraction, 64).unwrap();
/// assert_eq!(third.result, "1/2");
///
/// let sum = evaluate("0.1 + 0.2", NumberMode::BigNumber, 64).unwrap();
/// assert_eq!(sum.result, "0.3");
/// ```
pub fn evaluate(expression: &str, mode: NumberMode, precision: u32) -> Result<Evaluation, CalcError> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
        return Err(CalcError::Precision(precision));
    }
    let expr = parser::parse(expression)?;

    let result = match mode {
        NumberMode::Number => {
            let float = Float::new(precision);
            float.render(eval::eval(&float, &expr)?)
        }
        NumberMode::BigNumber => {
            let decimal = Exact::rounded(precision);
            decimal.render(&eval::eval(&decimal, &expr)?)
        }
        NumberMode::Fraction => {
            let fraction = Exact::fraction();
            fraction.render(&eval::eval(&fraction, &expr)?)
        }
    };

    Ok(Evaluation {
        mode,
        result,
        value_type: mode.as_str(),
    })
}
