//! Progressive income tax computation.
//!
//! The engine turns a [`FiscalProfile`] snapshot into a [`CalculationResult`]
//! using a [`TaxParameterTable`]:
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | Gross income: every income slot plus subsidies |
//! | 2    | Deductions: personal, spouse, tiered dependents, disabled dependents, expenses |
//! | 3    | Taxable income: `max(0, gross - deductions)` |
//! | 4    | Tax due: bracket-wise sum of `slice * rate` |
//! | 5    | Effective rate: `tax_due / gross` |
//! | 6    | Marginal rate: rate of the bracket holding taxable income |
//! | 7    | Balance: `withholding - tax_due` (positive is a refund) |
//!
//! Under the simplified regime step 2 replaces the itemized expense
//! deductions with a flat share of independent income; everything else is
//! shared between the two paths.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use irs_core::calculations::TaxEngine;
//! use irs_core::{
//!     Allowances, CivilStatus, DeductionRule, DeductionRules, FiscalProfile, TaxBracket,
//!     TaxParameterTable, ValidationLimits,
//! };
//!
//! let params = TaxParameterTable {
//!     tax_year: 2025,
//!     brackets: vec![
//!         TaxBracket { min_income: dec!(0), max_income: Some(dec!(10000)), rate: dec!(0.10) },
//!         TaxBracket { min_income: dec!(10000), max_income: None, rate: dec!(0.20) },
//!     ],
//!     allowances: Allowances {
//!         personal: dec!(4000),
//!         spouse: dec!(0),
//!         dependent: dec!(600),
//!         third_plus_dependent: dec!(900),
//!         disabled_dependent: dec!(0),
//!     },
//!     deductions: DeductionRules {
//!         health: DeductionRule::new(dec!(0.15), dec!(1000)),
//!         education: DeductionRule::new(dec!(0.30), dec!(800)),
//!         housing: DeductionRule::new(dec!(0.15), dec!(700)),
//!         donations: DeductionRule::new(dec!(0.25), dec!(500)),
//!     },
//!     simplified_expense_rate: dec!(0.25),
//!     limits: ValidationLimits::default(),
//! };
//!
//! let profile = FiscalProfile {
//!     employment_income: Some(dec!(20000)),
//!     civil_status: Some(CivilStatus::Single),
//!     dependents: Some(0),
//!     withholding_tax: Some(dec!(2500)),
//!     ..Default::default()
//! };
//!
//! let engine = TaxEngine::new(&params).unwrap();
//! let result = engine.compute(&profile);
//!
//! // 16000 taxable: 10000 * 10% + 6000 * 20%
//! assert_eq!(result.taxable_income, dec!(16000));
//! assert_eq!(result.tax_due, dec!(2200.00));
//! assert_eq!(result.refund_or_payment, dec!(300.00));
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{non_negative, round_half_up, round_rate, saturating_sum};
use crate::models::{
    BracketTax, CalculationResult, CivilStatus, DeductionBreakdown, ExpenseCategory, FiscalProfile,
    ParameterError, Regime, TaxParameterTable,
};

/// Calculator bound to one year's parameters.
///
/// The table is validated once in [`TaxEngine::new`]; after that
/// [`TaxEngine::compute`] is total and deterministic.
#[derive(Debug, Clone)]
pub struct TaxEngine<'a> {
    params: &'a TaxParameterTable,
}

impl<'a> TaxEngine<'a> {
    /// Creates an engine for `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] when the table fails
    /// [`TaxParameterTable::validate`].
    pub fn new(params: &'a TaxParameterTable) -> Result<Self, ParameterError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &TaxParameterTable {
        self.params
    }

    /// Computes the full result for `profile`.
    ///
    /// Unset fields count as zero, so a partial profile still yields a
    /// result; callers should check [`FiscalProfile::is_computable`] before
    /// presenting it as final.
    pub fn compute(
        &self,
        profile: &FiscalProfile,
    ) -> CalculationResult {
        let gross_income = self.gross_income(profile);
        let deductions = self.deductions(profile);
        let taxable_income = self.taxable_income(gross_income, deductions.total);
        let brackets = self.bracket_breakdown(taxable_income);
        let tax_due = round_half_up(saturating_sum(brackets.iter().map(|b| b.tax)));
        let effective_rate = self.effective_rate(tax_due, gross_income);
        let marginal_rate = self.marginal_rate(taxable_income);
        let withholding_tax = round_half_up(non_negative(
            profile.withholding_tax.unwrap_or_default(),
        ));
        let refund_or_payment = withholding_tax - tax_due;

        debug!(
            tax_year = self.params.tax_year,
            %gross_income,
            deductions = %deductions.total,
            %taxable_income,
            %tax_due,
            %refund_or_payment,
            "computed tax"
        );

        CalculationResult {
            tax_year: self.params.tax_year,
            gross_income,
            deductions,
            taxable_income,
            tax_due,
            effective_rate,
            marginal_rate,
            withholding_tax,
            refund_or_payment,
            brackets,
        }
    }

    /// Sum of every income slot and subsidies. Negative entries count as zero
    /// and the total saturates at [`Decimal::MAX`].
    fn gross_income(
        &self,
        profile: &FiscalProfile,
    ) -> Decimal {
        let total = saturating_sum(
            [
                profile.employment_income,
                profile.independent_income,
                profile.pension_income,
                profile.subsidies,
            ]
            .into_iter()
            .flatten()
            .map(non_negative),
        );
        round_half_up(total)
    }

    fn deductions(
        &self,
        profile: &FiscalProfile,
    ) -> DeductionBreakdown {
        let allowances = &self.params.allowances;

        let personal = allowances.personal;
        let spouse = if profile.civil_status == Some(CivilStatus::Married) {
            allowances.spouse
        } else {
            Decimal::ZERO
        };

        let dependent_count = profile.dependents.unwrap_or(0);
        let dependents = allowances.dependents_allowance(dependent_count);

        let disabled_count = profile
            .disabled_dependents
            .unwrap_or(0)
            .min(dependent_count);
        let disabled_dependents = allowances
            .disabled_dependent
            .saturating_mul(Decimal::from(disabled_count));

        let (expenses, flat_expense) = match profile.regime {
            Some(Regime::Simplified) => (BTreeMap::new(), self.flat_expense(profile)),
            _ => (self.itemized_expenses(profile), Decimal::ZERO),
        };

        let total = round_half_up(saturating_sum(
            [personal, spouse, dependents, disabled_dependents, flat_expense]
                .into_iter()
                .chain(expenses.values().copied()),
        ));

        DeductionBreakdown {
            personal,
            spouse,
            dependents,
            disabled_dependents,
            expenses,
            flat_expense,
            total,
        }
    }

    /// `min(expense * rate, cap)` for every declared category.
    fn itemized_expenses(
        &self,
        profile: &FiscalProfile,
    ) -> BTreeMap<ExpenseCategory, Decimal> {
        profile
            .expenses
            .iter()
            .map(|(category, amount)| {
                let rule = self.params.deductions.rule(*category);
                (*category, rule.deduction(*amount))
            })
            .collect()
    }

    /// Flat share of independent income used by the simplified regime.
    fn flat_expense(
        &self,
        profile: &FiscalProfile,
    ) -> Decimal {
        round_half_up(
            non_negative(profile.independent_income.unwrap_or_default())
                .saturating_mul(self.params.simplified_expense_rate),
        )
    }

    fn taxable_income(
        &self,
        gross_income: Decimal,
        total_deductions: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(gross_income.saturating_sub(total_deductions)))
    }

    /// Walks the brackets from the bottom and taxes the slice of income
    /// falling in each one. Brackets starting at or above `taxable_income`
    /// contribute nothing and are left out.
    fn bracket_breakdown(
        &self,
        taxable_income: Decimal,
    ) -> Vec<BracketTax> {
        self.params
            .brackets
            .iter()
            .take_while(|bracket| bracket.min_income < taxable_income)
            .map(|bracket| {
                let above_floor = taxable_income - bracket.min_income;
                let taxable_amount = bracket
                    .width()
                    .map_or(above_floor, |width| width.min(above_floor));
                BracketTax {
                    min_income: bracket.min_income,
                    max_income: bracket.max_income,
                    rate: bracket.rate,
                    taxable_amount,
                    tax: taxable_amount.saturating_mul(bracket.rate),
                }
            })
            .collect()
    }

    fn effective_rate(
        &self,
        tax_due: Decimal,
        gross_income: Decimal,
    ) -> Decimal {
        if gross_income <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            round_rate(tax_due / gross_income)
        }
    }

    /// Zero income has no marginal exposure, so it maps to 0 rather than the
    /// lowest bracket's rate.
    fn marginal_rate(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        self.params
            .bracket_for(taxable_income)
            .map_or(Decimal::ZERO, |bracket| bracket.rate)
    }
}

/// One-shot convenience over [`TaxEngine`].
///
/// # Errors
///
/// Returns [`ParameterError`] when `params` is not a valid table.
pub fn compute(
    profile: &FiscalProfile,
    params: &TaxParameterTable,
) -> Result<CalculationResult, ParameterError> {
    Ok(TaxEngine::new(params)?.compute(profile))
}
