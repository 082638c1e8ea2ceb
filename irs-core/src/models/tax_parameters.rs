//! Versioned tax parameters for one tax year.
//!
//! A [`TaxParameterTable`] is configuration, not logic: it is loaded from
//! disk (see the `irs-data` crate) and injected into the engine and the
//! validator, so a new tax year only needs a new table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ExpenseCategory;

/// Reasons a parameter table is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("tax year {0} has no brackets")]
    NoBrackets(i32),

    #[error("first bracket must start at 0, got {0}")]
    FirstBracketNotAtZero(Decimal),

    #[error("bracket {index} is empty or inverted ({min} to {max})")]
    EmptyBracket {
        index: usize,
        min: Decimal,
        max: Decimal,
    },

    #[error("bracket {index} starts at {min} but the previous bracket ends at {previous_max}")]
    NotContiguous {
        index: usize,
        min: Decimal,
        previous_max: Decimal,
    },

    #[error("only the last bracket may be unbounded (bracket {0} has no upper limit)")]
    UnboundedBeforeLast(usize),

    #[error("last bracket must be unbounded")]
    BoundedLastBracket,

    #[error("bracket {index} rate {rate} is outside [0, 1]")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("bracket {index} rate {rate} is lower than the previous rate {previous}")]
    DecreasingRate {
        index: usize,
        rate: Decimal,
        previous: Decimal,
    },

    #[error("{0} must be non-negative, got {1}")]
    NegativeAmount(&'static str, Decimal),

    #[error("deduction rule for {category} is invalid (rate {rate}, cap {cap})")]
    InvalidDeductionRule {
        category: ExpenseCategory,
        rate: Decimal,
        cap: Decimal,
    },

    #[error("simplified expense rate must be between 0 and 1, got {0}")]
    InvalidSimplifiedRate(Decimal),
}

/// One marginal-rate bracket.
///
/// `max_income` of `None` means the bracket is unbounded above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    /// Width of the bracket, `None` for the unbounded top bracket.
    pub fn width(&self) -> Option<Decimal> {
        self.max_income.map(|max| max - self.min_income)
    }

    /// True when `income` falls in `(min_income, max_income]`.
    ///
    /// The upper edge belongs to this bracket, so a boundary amount is taxed
    /// at the lower of the two adjacent rates.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income > self.min_income && self.max_income.is_none_or(|max| income <= max)
    }
}

/// Deduction for one expense category: `min(expense * rate, cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRule {
    pub rate: Decimal,
    pub cap: Decimal,
}

impl DeductionRule {
    pub fn new(
        rate: Decimal,
        cap: Decimal,
    ) -> Self {
        Self { rate, cap }
    }

    /// Deduction contributed by `expense`; negative spend contributes nothing.
    pub fn deduction(
        &self,
        expense: Decimal,
    ) -> Decimal {
        expense
            .max(Decimal::ZERO)
            .saturating_mul(self.rate)
            .min(self.cap)
    }

    /// Smallest spend that reaches the cap, `None` when the rate is zero.
    pub fn spend_at_cap(&self) -> Option<Decimal> {
        if self.rate.is_zero() {
            None
        } else {
            Some(self.cap / self.rate)
        }
    }
}

/// Per-category deduction rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRules {
    pub health: DeductionRule,
    pub education: DeductionRule,
    pub housing: DeductionRule,
    pub donations: DeductionRule,
}

impl DeductionRules {
    pub fn rule(
        &self,
        category: ExpenseCategory,
    ) -> &DeductionRule {
        match category {
            ExpenseCategory::Health => &self.health,
            ExpenseCategory::Education => &self.education,
            ExpenseCategory::Housing => &self.housing,
            ExpenseCategory::Donations => &self.donations,
        }
    }
}

/// Flat allowances subtracted from gross income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowances {
    /// Specific deduction every taxpayer gets.
    pub personal: Decimal,
    /// Added when the taxpayer is married.
    pub spouse: Decimal,
    /// Per dependent, for the first and second dependent.
    pub dependent: Decimal,
    /// Per dependent, from the third dependent onwards.
    pub third_plus_dependent: Decimal,
    /// Extra allowance per dependent with a disability.
    #[serde(default)]
    pub disabled_dependent: Decimal,
}

impl Allowances {
    /// Combined allowance for `count` dependents: the first two at
    /// `dependent`, every further one at `third_plus_dependent`.
    pub fn dependents_allowance(
        &self,
        count: u32,
    ) -> Decimal {
        let first_two = Decimal::from(count.min(2));
        let further = Decimal::from(count.saturating_sub(2));
        self.dependent
            .saturating_mul(first_two)
            .saturating_add(self.third_plus_dependent.saturating_mul(further))
    }
}

/// Plausibility limits used by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLimits {
    pub max_dependents: u32,
    pub max_income: Decimal,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_dependents: 10,
            max_income: Decimal::from(1_000_000),
        }
    }
}

/// Everything the engine needs for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxParameterTable {
    pub tax_year: i32,
    /// Ordered by `min_income`, contiguous, covering `[0, ∞)`.
    pub brackets: Vec<TaxBracket>,
    pub allowances: Allowances,
    pub deductions: DeductionRules,
    /// Share of independent income deducted under the simplified regime.
    pub simplified_expense_rate: Decimal,
    #[serde(default)]
    pub limits: ValidationLimits,
}

impl TaxParameterTable {
    /// Checks bracket ordering and coverage, rate monotonicity, and that no
    /// allowance, cap or rate is negative.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParameterError`] found.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let Some(first) = self.brackets.first() else {
            return Err(ParameterError::NoBrackets(self.tax_year));
        };
        if !first.min_income.is_zero() {
            return Err(ParameterError::FirstBracketNotAtZero(first.min_income));
        }

        let last_index = self.brackets.len() - 1;
        let mut previous: Option<&TaxBracket> = None;
        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(ParameterError::InvalidRate {
                    index,
                    rate: bracket.rate,
                });
            }

            match bracket.max_income {
                Some(max) if max <= bracket.min_income => {
                    return Err(ParameterError::EmptyBracket {
                        index,
                        min: bracket.min_income,
                        max,
                    });
                }
                None if index != last_index => {
                    return Err(ParameterError::UnboundedBeforeLast(index));
                }
                _ => {}
            }

            if let Some(prev) = previous {
                let previous_max = prev.max_income.unwrap_or(Decimal::MAX);
                if bracket.min_income != previous_max {
                    return Err(ParameterError::NotContiguous {
                        index,
                        min: bracket.min_income,
                        previous_max,
                    });
                }
                if bracket.rate < prev.rate {
                    return Err(ParameterError::DecreasingRate {
                        index,
                        rate: bracket.rate,
                        previous: prev.rate,
                    });
                }
            }
            previous = Some(bracket);
        }

        if self.brackets[last_index].max_income.is_some() {
            return Err(ParameterError::BoundedLastBracket);
        }

        let allowances = [
            ("personal allowance", self.allowances.personal),
            ("spouse allowance", self.allowances.spouse),
            ("dependent allowance", self.allowances.dependent),
            ("third-plus dependent allowance", self.allowances.third_plus_dependent),
            ("disabled dependent allowance", self.allowances.disabled_dependent),
        ];
        for (name, amount) in allowances {
            if amount < Decimal::ZERO {
                return Err(ParameterError::NegativeAmount(name, amount));
            }
        }

        for category in ExpenseCategory::ALL {
            let rule = self.deductions.rule(category);
            if rule.rate < Decimal::ZERO || rule.rate > Decimal::ONE || rule.cap < Decimal::ZERO {
                return Err(ParameterError::InvalidDeductionRule {
                    category,
                    rate: rule.rate,
                    cap: rule.cap,
                });
            }
        }

        let simplified = self.simplified_expense_rate;
        if simplified < Decimal::ZERO || simplified > Decimal::ONE {
            return Err(ParameterError::InvalidSimplifiedRate(
                self.simplified_expense_rate,
            ));
        }

        Ok(())
    }

    /// The bracket containing `taxable_income`, `None` for zero income.
    pub fn bracket_for(
        &self,
        taxable_income: Decimal,
    ) -> Option<&TaxBracket> {
        self.brackets.iter().find(|b| b.contains(taxable_income))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn table() -> TaxParameterTable {
        TaxParameterTable {
            tax_year: 2025,
            brackets: vec![
                TaxBracket {
                    min_income: dec!(0),
                    max_income: Some(dec!(8059)),
                    rate: dec!(0.125),
                },
                TaxBracket {
                    min_income: dec!(8059),
                    max_income: Some(dec!(12160)),
                    rate: dec!(0.16),
                },
                TaxBracket {
                    min_income: dec!(12160),
                    max_income: None,
                    rate: dec!(0.215),
                },
            ],
            allowances: Allowances {
                personal: dec!(4104),
                spouse: dec!(4104),
                dependent: dec!(600),
                third_plus_dependent: dec!(900),
                disabled_dependent: dec!(1200),
            },
            deductions: DeductionRules {
                health: DeductionRule::new(dec!(0.15), dec!(1000)),
                education: DeductionRule::new(dec!(0.30), dec!(800)),
                housing: DeductionRule::new(dec!(0.15), dec!(700)),
                donations: DeductionRule::new(dec!(0.25), dec!(500)),
            },
            simplified_expense_rate: dec!(0.25),
            limits: ValidationLimits::default(),
        }
    }

    #[test]
    fn valid_table_passes() {
        assert_eq!(table().validate(), Ok(()));
    }

    #[test]
    fn empty_brackets_rejected() {
        let mut t = table();
        t.brackets.clear();

        assert_eq!(t.validate(), Err(ParameterError::NoBrackets(2025)));
    }

    #[test]
    fn gap_between_brackets_rejected() {
        let mut t = table();
        t.brackets[1].min_income = dec!(8100);

        assert_eq!(
            t.validate(),
            Err(ParameterError::NotContiguous {
                index: 1,
                min: dec!(8100),
                previous_max: dec!(8059),
            })
        );
    }

    #[test]
    fn decreasing_rate_rejected() {
        let mut t = table();
        t.brackets[2].rate = dec!(0.10);

        assert!(matches!(
            t.validate(),
            Err(ParameterError::DecreasingRate { index: 2, .. })
        ));
    }

    #[test]
    fn bounded_top_bracket_rejected() {
        let mut t = table();
        t.brackets[2].max_income = Some(dec!(50000));

        assert_eq!(t.validate(), Err(ParameterError::BoundedLastBracket));
    }

    #[test]
    fn unbounded_middle_bracket_rejected() {
        let mut t = table();
        t.brackets[1].max_income = None;

        assert_eq!(t.validate(), Err(ParameterError::UnboundedBeforeLast(1)));
    }

    #[test]
    fn negative_allowance_rejected() {
        let mut t = table();
        t.allowances.spouse = dec!(-1);

        assert_eq!(
            t.validate(),
            Err(ParameterError::NegativeAmount("spouse allowance", dec!(-1)))
        );
    }

    #[test]
    fn boundary_amount_belongs_to_lower_bracket() {
        let t = table();

        assert_eq!(t.bracket_for(dec!(8059)).map(|b| b.rate), Some(dec!(0.125)));
        assert_eq!(t.bracket_for(dec!(8059.01)).map(|b| b.rate), Some(dec!(0.16)));
        assert_eq!(t.bracket_for(dec!(0)), None);
    }

    #[test]
    fn deduction_rule_is_capped() {
        let rule = DeductionRule::new(dec!(0.30), dec!(800));

        assert_eq!(rule.deduction(dec!(1000)), dec!(300.00));
        assert_eq!(rule.deduction(dec!(5000)), dec!(800));
        assert_eq!(rule.deduction(dec!(-50)), dec!(0));
        assert_eq!(rule.spend_at_cap().map(|s| s.round_dp(2)), Some(dec!(2666.67)));
    }

    #[test]
    fn dependents_allowance_is_tiered_from_the_third() {
        let t = table();

        assert_eq!(t.allowances.dependents_allowance(0), dec!(0));
        assert_eq!(t.allowances.dependents_allowance(1), dec!(600));
        assert_eq!(t.allowances.dependents_allowance(2), dec!(1200));
        assert_eq!(t.allowances.dependents_allowance(3), dec!(2100));
        assert_eq!(t.allowances.dependents_allowance(7), dec!(5700));
    }

    #[test]
    fn dependents_allowance_handles_the_largest_count() {
        let t = table();

        assert_eq!(
            t.allowances.dependents_allowance(u32::MAX),
            dec!(1200) + dec!(900) * Decimal::from(u32::MAX - 2)
        );
    }

    #[test]
    fn bracket_width_is_none_for_the_top_bracket() {
        let t = table();

        assert_eq!(t.brackets[0].width(), Some(t.brackets[0].max_income.unwrap()));
        assert_eq!(t.brackets.last().unwrap().width(), None);
    }
}
