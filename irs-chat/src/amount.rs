//! Locale-tolerant amount parsing.
//!
//! Users write `2.500€`, `2500,50`, `1,234.56`, `40k` or `2,5 mil`. The
//! parser settles which separator is the decimal point, applies the
//! thousands multiplier, and never fails: anything it cannot read is zero.
//!
//! | Separators present | Rule |
//! |--------------------|------|
//! | both `,` and `.`   | the last one is the decimal point, the other is dropped |
//! | only `,`           | decimal if a single comma is followed by 1-2 digits, otherwise thousands |
//! | only `.`           | decimal if a single dot is followed by 1-2 digits and at most 3 digits precede it, otherwise thousands |
//!
//! `1.234` therefore reads as 1234: in Portuguese text a dot followed by
//! three digits is almost always a thousands separator.

use std::str::FromStr;

use irs_core::calculations::common::round_half_up;
use rust_decimal::Decimal;
use tracing::debug;

/// Reporting period attached to an extracted amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    Monthly,
    Annual,
    #[default]
    Unspecified,
}

impl Frequency {
    /// Factor that turns an amount in this period into an annual amount.
    pub fn annual_factor(&self) -> Decimal {
        match self {
            Self::Monthly => Decimal::from(12),
            Self::Annual | Self::Unspecified => Decimal::ONE,
        }
    }
}

/// Parses `raw` into an amount, multiplying by 1000 for a glued `k`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use irs_chat::amount::parse_amount;
///
/// assert_eq!(parse_amount("1.500"), dec!(1500));
/// assert_eq!(parse_amount("2,5"), dec!(2.5));
/// assert_eq!(parse_amount("45.000"), dec!(45000));
/// assert_eq!(parse_amount("40k"), dec!(40000));
/// assert_eq!(parse_amount("abc"), dec!(0));
/// ```
pub fn parse_amount(raw: &str) -> Decimal {
    parse_amount_with_multiplier(raw, false)
}

/// Parses `raw`, multiplying by 1000 when `thousands` is set (the caller saw
/// a separate `mil` marker) or when a `k` is glued to the digits.
pub fn parse_amount_with_multiplier(
    raw: &str,
    thousands: bool,
) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Decimal::ZERO;
    }

    let canonical = disambiguate_separators(&cleaned);
    let value = match Decimal::from_str(&canonical) {
        Ok(value) => value,
        Err(error) => {
            debug!(raw, %canonical, %error, "unparseable amount, using 0");
            return Decimal::ZERO;
        }
    };

    let multiplier = if thousands || has_glued_k(raw) {
        Decimal::ONE_THOUSAND
    } else {
        Decimal::ONE
    };
    match value.checked_mul(multiplier) {
        Some(amount) => round_half_up(amount),
        None => {
            debug!(raw, "amount overflows with thousands multiplier, using 0");
            Decimal::ZERO
        }
    }
}

/// The single normalisation step every extracted amount goes through:
/// parse, apply the thousands multiplier, then annualise.
pub fn normalize_amount(
    raw: &str,
    thousands: bool,
    frequency: Frequency,
) -> Decimal {
    let amount = parse_amount_with_multiplier(raw, thousands);
    match amount.checked_mul(frequency.annual_factor()) {
        Some(annual) => round_half_up(annual),
        None => {
            debug!(raw, ?frequency, "annualised amount overflows, using 0");
            Decimal::ZERO
        }
    }
}

/// Formats an amount the way Portuguese text writes it: `2.500,00`.
///
/// The output always reads back to the same value through [`parse_amount`].
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_half_up(amount.abs());
    let units = rounded.trunc();
    let cents = ((rounded - units) * Decimal::ONE_HUNDRED).trunc().to_string();

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < Decimal::ZERO { "-" } else { "" };
    format!("{sign}{grouped},{cents:0>2}")
}

fn disambiguate_separators(cleaned: &str) -> String {
    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let canonical = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) => {
            if comma > dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (Some(comma), None) => {
            let fraction = &cleaned[comma + 1..];
            if cleaned.matches(',').count() == 1 && (1..=2).contains(&fraction.len()) {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(dot)) => {
            let fraction = &cleaned[dot + 1..];
            let integer = &cleaned[..dot];
            if cleaned.matches('.').count() == 1
                && (1..=2).contains(&fraction.len())
                && integer.len() <= 3
            {
                cleaned.to_string()
            } else {
                cleaned.replace('.', "")
            }
        }
        (None, None) => cleaned.to_string(),
    };

    if canonical.starts_with('.') {
        format!("0{canonical}")
    } else {
        canonical
    }
}

/// True when a `k` directly follows the last digit, as in `40k`.
fn has_glued_k(raw: &str) -> bool {
    let Some(last_digit) = raw.rfind(|c: char| c.is_ascii_digit()) else {
        return false;
    };
    raw[last_digit + 1..]
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'k'))
}
