//! Range and consistency checks on a fiscal profile.
//!
//! [`Validator::validate`] only reports; it never blocks computation. The
//! optional [`Validator::clamp`] pass produces a corrected copy and lists
//! every value it changed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{ExpenseCategory, FiscalProfile, ProfileField, Regime, TaxParameterTable};

/// Findings for one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One value changed by [`Validator::clamp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub field: ProfileField,
    pub before: Decimal,
    pub after: Decimal,
}

/// Categories the assistant actively suggests declaring.
const SUGGESTED_CATEGORIES: [ExpenseCategory; 3] = [
    ExpenseCategory::Health,
    ExpenseCategory::Education,
    ExpenseCategory::Housing,
];

#[derive(Debug, Clone)]
pub struct Validator<'a> {
    params: &'a TaxParameterTable,
}

impl<'a> Validator<'a> {
    pub fn new(params: &'a TaxParameterTable) -> Self {
        Self { params }
    }

    pub fn validate(
        &self,
        profile: &FiscalProfile,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (name, value) in monetary_fields(profile) {
            if value < Decimal::ZERO {
                report.errors.push(format!("{name} cannot be negative"));
            }
        }
        for (category, amount) in &profile.expenses {
            if *amount < Decimal::ZERO {
                report
                    .errors
                    .push(format!("{category} expenses cannot be negative"));
            }
        }

        let dependents = profile.dependents.unwrap_or(0);
        if profile.disabled_dependents.unwrap_or(0) > dependents {
            report
                .errors
                .push("disabled dependents cannot exceed dependents".to_string());
        }
        if dependents > self.params.limits.max_dependents {
            report.warnings.push(format!(
                "{dependents} dependents is unusually high; please confirm"
            ));
        }

        if profile.regime != Some(Regime::Simplified) {
            for (category, amount) in &profile.expenses {
                let rule = self.params.deductions.rule(*category);
                if amount.saturating_mul(rule.rate) > rule.cap {
                    report.warnings.push(format!(
                        "{category} expenses of {amount} exceed the deduction cap; only {} will be deducted",
                        rule.cap
                    ));
                }
            }
        }

        let total_income = profile.total_income();
        if total_income <= Decimal::ZERO {
            report.warnings.push("no income declared".to_string());
        } else if total_income > self.params.limits.max_income {
            report.warnings.push(format!(
                "declared income of {total_income} is above the plausible limit of {}",
                self.params.limits.max_income
            ));
        }
        if let Some(withholding) = profile.withholding_tax {
            if total_income > Decimal::ZERO && withholding > total_income {
                report
                    .warnings
                    .push("tax withheld exceeds declared income".to_string());
            }
        }

        if profile.regime != Some(Regime::Simplified) {
            for category in SUGGESTED_CATEGORIES {
                if profile.expense(category).is_none() {
                    report.suggestions.push(format!(
                        "declare your {} expenses to lower taxable income",
                        category.label()
                    ));
                }
            }
        }
        if profile.employment_income.is_some() && profile.withholding_tax.is_none() {
            report.suggestions.push(
                "declare the tax withheld at source to estimate your refund".to_string(),
            );
        }

        for error in &report.errors {
            warn!(%error, "profile validation error");
        }

        report
    }

    /// Returns a corrected copy of `profile` and the changes made.
    ///
    /// Negative amounts become zero, disabled dependents are limited to the
    /// dependent count, and each expense is lowered to the largest whole-cent
    /// spend whose deduction does not exceed its cap.
    pub fn clamp(
        &self,
        profile: &FiscalProfile,
    ) -> (FiscalProfile, Vec<Adjustment>) {
        let mut fixed = profile.clone();
        let mut adjustments = Vec::new();

        let money_slots = [
            (ProfileField::EmploymentIncome, &mut fixed.employment_income),
            (ProfileField::IndependentIncome, &mut fixed.independent_income),
            (ProfileField::PensionIncome, &mut fixed.pension_income),
            (ProfileField::Subsidies, &mut fixed.subsidies),
            (ProfileField::WithholdingTax, &mut fixed.withholding_tax),
        ];
        for (field, slot) in money_slots {
            if let Some(value) = *slot {
                if value < Decimal::ZERO {
                    *slot = Some(Decimal::ZERO);
                    adjustments.push(Adjustment {
                        field,
                        before: value,
                        after: Decimal::ZERO,
                    });
                }
            }
        }

        let dependents = fixed.dependents.unwrap_or(0);
        if let Some(disabled) = fixed.disabled_dependents {
            if disabled > dependents {
                fixed.disabled_dependents = Some(dependents);
                adjustments.push(Adjustment {
                    field: ProfileField::DisabledDependents,
                    before: Decimal::from(disabled),
                    after: Decimal::from(dependents),
                });
            }
        }

        for (category, amount) in fixed.expenses.iter_mut() {
            let before = *amount;
            let rule = self.params.deductions.rule(*category);
            let mut after = before.max(Decimal::ZERO);
            if let Some(limit) = rule.spend_at_cap() {
                after = after.min(limit.round_dp_with_strategy(2, RoundingStrategy::ToZero));
            }
            if after != before {
                *amount = after;
                adjustments.push(Adjustment {
                    field: ProfileField::Expense(*category),
                    before,
                    after,
                });
            }
        }

        (fixed, adjustments)
    }
}

fn monetary_fields(profile: &FiscalProfile) -> Vec<(&'static str, Decimal)> {
    [
        ("employment income", profile.employment_income),
        ("independent income", profile.independent_income),
        ("pension income", profile.pension_income),
        ("subsidies", profile.subsidies),
        ("withholding tax", profile.withholding_tax),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v)))
    .collect()
}
