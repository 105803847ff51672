//! Money calculation utilities using rust_decimal for precision
//!
//! Line totals are rounded on their own before they are summed, so the
//! subtotal always equals the sum of the figures printed on the document.

use rust_decimal::prelude::*;
use shared::models::QuoteLine;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Fixed VAT rate (20%)
pub const VAT_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Largest amount a stored money column holds (9,999,999,999.99)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Round to 2 decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert f64 to Decimal for calculation
///
/// Callers validate finiteness first; non-finite input maps to zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// `qty × unit_price`, rounded
pub fn line_total(qty: i32, unit_price: Decimal) -> Decimal {
    round_money(Decimal::from(qty) * unit_price)
}

/// Sum of the already-rounded line totals
pub fn subtotal(lines: &[QuoteLine]) -> Decimal {
    lines.iter().map(|l| l.line_total_ex_vat).sum()
}

/// Subtotal, VAT and VAT-inclusive total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal_ex_vat: Decimal,
    pub vat: Decimal,
    pub total_inc_vat: Decimal,
}

impl Totals {
    pub fn from_subtotal(subtotal_ex_vat: Decimal) -> Self {
        let vat = round_money(subtotal_ex_vat * VAT_RATE);
        Self {
            subtotal_ex_vat,
            vat,
            total_inc_vat: subtotal_ex_vat + vat,
        }
    }
}

/// Format an amount as `£1,234.50`
pub fn format_money(amount: Decimal, symbol: &str) -> String {
    let rounded = round_money(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{frac_part}")
}
