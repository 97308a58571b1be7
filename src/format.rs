//! Display formatting for results and history lines

use rust_decimal::Decimal;

use crate::calculation::Calculation;

/// Round to `precision` decimal places and drop trailing zeros
pub fn format_decimal(value: Decimal, precision: u32) -> String {
    value.round_dp(precision).normalize().to_string()
}

/// Render a history entry as `op(a, b) = result`
pub fn format_calculation(calculation: &Calculation, precision: u32) -> String {
    format!(
        "{}({}, {}) = {}",
        calculation.operation(),
        calculation.operand1().normalize(),
        calculation.operand2().normalize(),
        format_decimal(calculation.result(), precision)
    )
}
