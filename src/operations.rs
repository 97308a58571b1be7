//! Arithmetic operation strategies
//!
//! An [`Operation`] is a stateless binary function over exact decimals with
//! its own precondition check. The ten built-in strategies are the variants
//! of [`Arithmetic`]; additional strategies can be supplied by implementing
//! the trait and registering a factory in the
//! [`OperationRegistry`](crate::registry::OperationRegistry).

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

use crate::error::{CalcError, Result};

/// Largest number of decimal places tried when snapping an approximate root
/// back onto an exact value.
const ROOT_SNAP_MAX_DP: u32 = 12;

/// Capability set every operation strategy provides.
///
/// `validate` and `compute` are independent so each can be exercised on its
/// own; `execute` runs them in order and never computes after a rejection.
pub trait Operation: fmt::Debug + Send + Sync {
    /// Registry key, persisted with every calculation (e.g. `"add"`).
    fn name(&self) -> &str;

    /// Human-readable name (e.g. `"Addition"`).
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Reject operands the computation is not defined for.
    ///
    /// # Errors
    /// Returns [`CalcError::Validation`] naming the violated precondition.
    fn validate(&self, _a: Decimal, _b: Decimal) -> Result<()> {
        Ok(())
    }

    /// Compute the result, assuming `validate` has accepted the operands.
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] if the result cannot be represented.
    fn compute(&self, a: Decimal, b: Decimal) -> Result<Decimal>;

    /// Validate, then compute.
    ///
    /// # Errors
    /// Propagates the error of whichever step fails first.
    fn execute(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        self.validate(a, b)?;
        self.compute(a, b)
    }
}

/// The built-in arithmetic strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arithmetic {
    /// a + b
    Add,
    /// a - b
    Subtract,
    /// a * b
    Multiply,
    /// a / b, rejects b == 0
    Divide,
    /// a ^ b, rejects b < 0
    Power,
    /// a ^ (1 / b), rejects a < 0 and b == 0
    Root,
    /// a mod b with the sign of a, rejects b == 0
    Modulus,
    /// floor(a / b), rejects b == 0
    IntegerDivision,
    /// (a / b) * 100, rejects b == 0
    Percentage,
    /// |a - b|
    AbsoluteDifference,
}

impl Arithmetic {
    /// Every built-in, in the order they are presented to users.
    pub const ALL: [Arithmetic; 10] = [
        Arithmetic::Add,
        Arithmetic::Subtract,
        Arithmetic::Multiply,
        Arithmetic::Divide,
        Arithmetic::Power,
        Arithmetic::Root,
        Arithmetic::Modulus,
        Arithmetic::IntegerDivision,
        Arithmetic::Percentage,
        Arithmetic::AbsoluteDifference,
    ];

    /// Registry key for this operation
    pub fn key(&self) -> &'static str {
        match self {
            Arithmetic::Add => "add",
            Arithmetic::Subtract => "subtract",
            Arithmetic::Multiply => "multiply",
            Arithmetic::Divide => "divide",
            Arithmetic::Power => "power",
            Arithmetic::Root => "root",
            Arithmetic::Modulus => "modulus",
            Arithmetic::IntegerDivision => "int_divide",
            Arithmetic::Percentage => "percent",
            Arithmetic::AbsoluteDifference => "abs_diff",
        }
    }

    /// Human-readable name for the operation
    pub fn label(&self) -> &'static str {
        match self {
            Arithmetic::Add => "Addition",
            Arithmetic::Subtract => "Subtraction",
            Arithmetic::Multiply => "Multiplication",
            Arithmetic::Divide => "Division",
            Arithmetic::Power => "Power",
            Arithmetic::Root => "Root",
            Arithmetic::Modulus => "Modulus",
            Arithmetic::IntegerDivision => "IntegerDivision",
            Arithmetic::Percentage => "Percentage",
            Arithmetic::AbsoluteDifference => "AbsoluteDifference",
        }
    }

    /// One-line description used by the REPL help text
    pub fn summary(&self) -> &'static str {
        match self {
            Arithmetic::Add => "a + b",
            Arithmetic::Subtract => "a - b",
            Arithmetic::Multiply => "a * b",
            Arithmetic::Divide => "a / b",
            Arithmetic::Power => "a raised to the power b",
            Arithmetic::Root => "the b-th root of a",
            Arithmetic::Modulus => "remainder of a / b",
            Arithmetic::IntegerDivision => "floor of a / b",
            Arithmetic::Percentage => "a as a percentage of b",
            Arithmetic::AbsoluteDifference => "|a - b|",
        }
    }

    fn overflow(&self) -> CalcError {
        CalcError::operation(format!("{} result is out of range", self.label()))
    }
}

impl fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Operation for Arithmetic {
    fn name(&self) -> &str {
        self.key()
    }

    fn display_name(&self) -> &str {
        self.label()
    }

    fn validate(&self, a: Decimal, b: Decimal) -> Result<()> {
        match self {
            Arithmetic::Divide if b.is_zero() => {
                Err(CalcError::validation("Division by zero is not allowed"))
            }
            Arithmetic::IntegerDivision if b.is_zero() => Err(CalcError::validation(
                "Integer division by zero is not allowed",
            )),
            Arithmetic::Modulus if b.is_zero() => {
                Err(CalcError::validation("Modulus by zero is not allowed"))
            }
            Arithmetic::Percentage if b.is_zero() => Err(CalcError::validation(
                "Percentage with a zero base: division by zero is not allowed",
            )),
            Arithmetic::Power if b < Decimal::ZERO => {
                Err(CalcError::validation("Negative exponents not supported"))
            }
            Arithmetic::Power if a < Decimal::ZERO && !b.fract().is_zero() => Err(
                CalcError::validation("Cannot raise negative number to fractional power"),
            ),
            Arithmetic::Root if a < Decimal::ZERO => Err(CalcError::validation(
                "Cannot calculate root of negative number",
            )),
            Arithmetic::Root if b.is_zero() => {
                Err(CalcError::validation("Zero root is undefined"))
            }
            _ => Ok(()),
        }
    }

    fn compute(&self, a: Decimal, b: Decimal) -> Result<Decimal> {
        let result = match self {
            Arithmetic::Add => a.checked_add(b),
            Arithmetic::Subtract => a.checked_sub(b),
            Arithmetic::Multiply => a.checked_mul(b),
            Arithmetic::Divide => a.checked_div(b),
            Arithmetic::Power => power(a, b),
            Arithmetic::Root => root(a, b),
            Arithmetic::Modulus => a.checked_rem(b),
            Arithmetic::IntegerDivision => a.checked_div(b).map(|q| q.floor()),
            Arithmetic::Percentage => a
                .checked_div(b)
                .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED)),
            Arithmetic::AbsoluteDifference => a.checked_sub(b).map(|d| d.abs()),
        };

        result.map(|r| r.normalize()).ok_or_else(|| self.overflow())
    }
}

/// Integral exponents go through repeated multiplication so they stay exact.
fn power(base: Decimal, exponent: Decimal) -> Option<Decimal> {
    if exponent.fract().is_zero() {
        if let Some(n) = exponent.to_i64() {
            return base.checked_powi(n);
        }
        // Exponents past i64 only have a finite answer for these bases.
        if base.is_zero() || base == Decimal::ONE {
            return Some(base);
        }
        if base == Decimal::NEGATIVE_ONE {
            let even = (exponent % Decimal::TWO).is_zero();
            return Some(if even { Decimal::ONE } else { base });
        }
    }
    base.checked_powd(exponent)
}

/// `a ^ (1 / b)` via the transcendental path, snapped back onto an exact
/// value when one exists (`root(16, 2)` is `4`, not `3.99999...`).
fn root(radicand: Decimal, degree: Decimal) -> Option<Decimal> {
    if radicand.is_zero() {
        return (degree > Decimal::ZERO).then_some(Decimal::ZERO);
    }

    let approx = if degree == Decimal::TWO {
        radicand.sqrt()?
    } else {
        radicand.checked_powd(Decimal::ONE.checked_div(degree)?)?
    };

    // Degrees past i64 keep the approximation.
    let integral_degree = if degree.fract().is_zero() {
        degree.to_i64()
    } else {
        None
    };
    if let Some(n) = integral_degree {
        for dp in 0..=ROOT_SNAP_MAX_DP {
            let candidate = approx.round_dp(dp);
            if candidate.checked_powi(n) == Some(radicand) {
                return Some(candidate);
            }
        }
    }

    Some(approx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn addition_is_exact_in_decimal() {
        assert_eq!(Arithmetic::Add.execute(d("0.1"), d("0.2")).unwrap(), d("0.3"));
    }

    #[test]
    fn modulus_sign_follows_dividend() {
        assert_eq!(Arithmetic::Modulus.execute(d("-7"), d("3")).unwrap(), d("-1"));
        assert_eq!(Arithmetic::Modulus.execute(d("7"), d("-3")).unwrap(), d("1"));
    }

    #[test]
    fn integer_division_floors() {
        assert_eq!(
            Arithmetic::IntegerDivision.execute(d("7"), d("2")).unwrap(),
            d("3")
        );
        assert_eq!(
            Arithmetic::IntegerDivision.execute(d("-7"), d("2")).unwrap(),
            d("-4")
        );
    }

    #[test]
    fn root_snaps_to_exact_values() {
        assert_eq!(Arithmetic::Root.execute(d("16"), d("2")).unwrap(), d("4"));
        assert_eq!(Arithmetic::Root.execute(d("27"), d("3")).unwrap(), d("3"));
        assert_eq!(Arithmetic::Root.execute(d("0.25"), d("2")).unwrap(), d("0.5"));
        assert_eq!(Arithmetic::Root.execute(d("0"), d("5")).unwrap(), d("0"));
    }

    #[test]
    fn root_of_non_perfect_power_is_approximate() {
        let r = Arithmetic::Root.execute(d("2"), d("2")).unwrap();
        assert_eq!(r.round_dp(6), d("1.414214"));
    }

    #[test]
    fn huge_integral_degree_keeps_the_approximation() {
        let r = Arithmetic::Root
            .execute(d("16"), d("10000000000000000000"))
            .unwrap();
        assert_eq!(r.round_dp(10), d("1"));
    }

    #[test]
    fn huge_integral_exponent_on_unit_bases() {
        let huge = d("100000000000000000000");
        assert_eq!(Arithmetic::Power.execute(d("1"), huge).unwrap(), d("1"));
        assert_eq!(Arithmetic::Power.execute(d("0"), huge).unwrap(), d("0"));
        assert_eq!(Arithmetic::Power.execute(d("-1"), huge).unwrap(), d("1"));
        assert_eq!(
            Arithmetic::Power.execute(d("-1"), huge + Decimal::ONE).unwrap(),
            d("-1")
        );
    }

    #[test]
    fn power_with_integral_exponent_is_exact() {
        assert_eq!(Arithmetic::Power.execute(d("2"), d("10")).unwrap(), d("1024"));
        assert_eq!(Arithmetic::Power.execute(d("1.5"), d("2")).unwrap(), d("2.25"));
        assert_eq!(Arithmetic::Power.execute(d("5"), d("0")).unwrap(), d("1"));
    }

    #[test]
    fn compute_can_run_without_validate() {
        // Zero exponent root is only rejected by validate.
        assert!(Arithmetic::Root.validate(d("16"), d("0")).is_err());
        assert!(Arithmetic::Add.validate(d("1"), d("0")).is_ok());
    }

    #[test]
    fn overflow_is_an_operation_error() {
        let err = Arithmetic::Multiply
            .execute(Decimal::MAX, d("2"))
            .unwrap_err();
        assert!(err.is_operation());
        assert!(err.message().contains("Multiplication"));
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = Arithmetic::ALL.iter().map(|a| a.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Arithmetic::ALL.len());
    }
}
