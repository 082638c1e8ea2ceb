use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ExpenseCategory;

/// Itemized deductions that took gross income down to taxable income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    pub personal: Decimal,
    pub spouse: Decimal,
    /// Sum of the tiered per-dependent allowances.
    pub dependents: Decimal,
    pub disabled_dependents: Decimal,
    /// Capped deduction per category (itemized path only).
    pub expenses: BTreeMap<ExpenseCategory, Decimal>,
    /// Flat share of independent income (simplified regime only).
    pub flat_expense: Decimal,
    pub total: Decimal,
}

/// Tax accrued within one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTax {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    /// Portion of taxable income that fell in this bracket.
    pub taxable_amount: Decimal,
    pub tax: Decimal,
}

/// Output of the tax engine. Derived from a profile snapshot, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub tax_year: i32,
    pub gross_income: Decimal,
    pub deductions: DeductionBreakdown,
    pub taxable_income: Decimal,
    pub tax_due: Decimal,
    /// `tax_due / gross_income`, 0 when there is no income.
    pub effective_rate: Decimal,
    /// Rate of the bracket holding the last unit of taxable income.
    pub marginal_rate: Decimal,
    pub withholding_tax: Decimal,
    /// Positive for a refund, negative when tax is owed.
    pub refund_or_payment: Decimal,
    pub brackets: Vec<BracketTax>,
}

impl CalculationResult {
    pub fn is_refund(&self) -> bool {
        self.refund_or_payment > Decimal::ZERO
    }

    pub fn is_payment(&self) -> bool {
        self.refund_or_payment < Decimal::ZERO
    }
}
