//! Rounding helpers shared by the engine and the validator.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a money amount to two decimal places, half away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use irs_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(3648.002)), dec!(3648.00));
/// assert_eq!(round_half_up(dec!(1007.375)), dec!(1007.38));
/// assert_eq!(round_half_up(dec!(-10.005)), dec!(-10.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a ratio to four decimal places, half away from zero.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative amounts to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Sums `values`, pinning the result at [`Decimal::MAX`] or [`Decimal::MIN`]
/// instead of overflowing.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use irs_core::calculations::common::saturating_sum;
///
/// assert_eq!(saturating_sum([dec!(1.5), dec!(2)]), dec!(3.5));
/// assert_eq!(saturating_sum([Decimal::MAX, dec!(1)]), Decimal::MAX);
/// ```
pub fn saturating_sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(value))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn round_half_up_rounds_midpoint_away_from_zero() {
        assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
        assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
    }

    #[test]
    fn round_rate_keeps_four_places() {
        assert_eq!(round_rate(dec!(0.145920)), dec!(0.1459));
        assert_eq!(round_rate(dec!(0.14595)), dec!(0.1460));
    }

    #[test]
    fn saturating_sum_pins_at_the_bounds() {
        assert_eq!(saturating_sum([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert_eq!(saturating_sum([Decimal::MIN, dec!(-1)]), Decimal::MIN);
        assert_eq!(saturating_sum(Vec::<Decimal>::new()), dec!(0));
    }

    #[test]
    fn non_negative_clamps() {
        assert_eq!(non_negative(dec!(-0.01)), dec!(0));
        assert_eq!(non_negative(dec!(12.5)), dec!(12.5));
    }
}
