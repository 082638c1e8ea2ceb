use irs_chat::parse_amount;
use irs_core::{CivilStatus, Regime};
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a command-line amount is not a number.
#[derive(Debug, Error)]
#[error("invalid amount '{input}': expected digits with optional '.', ',' or a trailing 'k'")]
pub struct ParseMoneyError {
    input: String,
}

/// Parses a command-line amount.
///
/// Accepts the same forms as free text (`1500`, `1.500`, `2.500,50`, `40k`)
/// and an optional euro sign, but rejects anything else instead of reading
/// it as zero.
pub fn parse_money(s: &str) -> Result<Decimal, ParseMoneyError> {
    let trimmed = s.trim().trim_end_matches('€').trim();
    let digits = trimmed.strip_suffix(['k', 'K']).unwrap_or(trimmed);
    let well_formed = digits.starts_with(|c: char| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',');
    if !well_formed {
        tracing::error!(input = %s, "invalid amount");
        return Err(ParseMoneyError {
            input: s.to_string(),
        });
    }
    Ok(parse_amount(trimmed))
}

pub fn parse_civil_status(s: &str) -> Result<CivilStatus, String> {
    CivilStatus::parse(s).ok_or_else(|| {
        format!("unknown civil status '{s}' (expected single, married, divorced or widowed)")
    })
}

pub fn parse_regime(s: &str) -> Result<Regime, String> {
    Regime::parse(s)
        .ok_or_else(|| format!("unknown regime '{s}' (expected simplified or organized)"))
}

/// Formats an optional amount for display, using "-" when `None`.
pub fn opt_amount_display(d: &Option<Decimal>) -> String {
    d.map(|v| format!("{} €", irs_chat::format_amount(v)))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_money_accepts_portuguese_forms() {
        assert_eq!(parse_money("1500").unwrap(), dec!(1500));
        assert_eq!(parse_money("1.500").unwrap(), dec!(1500));
        assert_eq!(parse_money("2.500,50").unwrap(), dec!(2500.50));
        assert_eq!(parse_money(" 40k ").unwrap(), dec!(40000));
        assert_eq!(parse_money("900€").unwrap(), dec!(900));
    }

    #[test]
    fn parse_money_rejects_garbage() {
        assert!(parse_money("").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("-100").is_err());
        assert!(parse_money("12x").is_err());
    }

    #[test]
    fn parse_civil_status_and_regime() {
        assert_eq!(parse_civil_status("Married").unwrap(), CivilStatus::Married);
        assert!(parse_civil_status("complicated").is_err());
        assert_eq!(parse_regime("simplified").unwrap(), Regime::Simplified);
        assert!(parse_regime("flat").is_err());
    }

    #[test]
    fn opt_amount_display_handles_none() {
        assert_eq!(opt_amount_display(&Some(dec!(1234.5))), "1.234,50 €");
        assert_eq!(opt_amount_display(&None), "-");
    }
}
