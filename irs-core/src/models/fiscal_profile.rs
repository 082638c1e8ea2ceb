use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CivilStatus, ExpenseCategory, Regime};
use crate::calculations::common::saturating_sum;

/// A taxpayer's declared situation.
///
/// Every field is optional until filled. The same type doubles as the
/// partial profile produced by one extraction pass; [`FiscalProfile::merge`]
/// folds a partial profile into an accumulated one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalProfile {
    // Annual income by slot
    pub employment_income: Option<Decimal>,
    pub independent_income: Option<Decimal>,
    pub pension_income: Option<Decimal>,
    /// Holiday, Christmas or other subsidies paid on top of income.
    pub subsidies: Option<Decimal>,

    // Household
    pub civil_status: Option<CivilStatus>,
    pub dependents: Option<u32>,
    pub disabled_dependents: Option<u32>,

    /// Annual deductible spend per category.
    #[serde(default)]
    pub expenses: BTreeMap<ExpenseCategory, Decimal>,

    /// Tax already retained through payroll.
    pub withholding_tax: Option<Decimal>,
    pub regime: Option<Regime>,
}

/// Addressable fields of a [`FiscalProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileField {
    EmploymentIncome,
    IndependentIncome,
    PensionIncome,
    Subsidies,
    CivilStatus,
    Dependents,
    DisabledDependents,
    Expense(ExpenseCategory),
    WithholdingTax,
    Regime,
}

impl ProfileField {
    pub fn is_income(&self) -> bool {
        matches!(
            self,
            Self::EmploymentIncome | Self::IndependentIncome | Self::PensionIncome
        )
    }
}

impl FiscalProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field has been filled.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True once at least one income slot holds a value.
    pub fn has_income(&self) -> bool {
        self.employment_income.is_some()
            || self.independent_income.is_some()
            || self.pension_income.is_some()
    }

    /// A profile can be computed once income, civil status and dependents are known.
    pub fn is_computable(&self) -> bool {
        self.has_income() && self.civil_status.is_some() && self.dependents.is_some()
    }

    /// Sum of every income slot and subsidies; unset fields count as zero.
    /// The total saturates instead of overflowing.
    pub fn total_income(&self) -> Decimal {
        saturating_sum(
            [
                self.employment_income,
                self.independent_income,
                self.pension_income,
                self.subsidies,
            ]
            .into_iter()
            .flatten(),
        )
    }

    pub fn expense(
        &self,
        category: ExpenseCategory,
    ) -> Option<Decimal> {
        self.expenses.get(&category).copied()
    }

    pub fn set_expense(
        &mut self,
        category: ExpenseCategory,
        amount: Decimal,
    ) {
        self.expenses.insert(category, amount);
    }

    pub fn is_set(
        &self,
        field: ProfileField,
    ) -> bool {
        match field {
            ProfileField::EmploymentIncome => self.employment_income.is_some(),
            ProfileField::IndependentIncome => self.independent_income.is_some(),
            ProfileField::PensionIncome => self.pension_income.is_some(),
            ProfileField::Subsidies => self.subsidies.is_some(),
            ProfileField::CivilStatus => self.civil_status.is_some(),
            ProfileField::Dependents => self.dependents.is_some(),
            ProfileField::DisabledDependents => self.disabled_dependents.is_some(),
            ProfileField::Expense(category) => self.expenses.contains_key(&category),
            ProfileField::WithholdingTax => self.withholding_tax.is_some(),
            ProfileField::Regime => self.regime.is_some(),
        }
    }

    /// Overwrites every field that `partial` sets; fields it leaves unset are kept.
    pub fn merge(
        &mut self,
        partial: &FiscalProfile,
    ) {
        fn take<T: Copy>(
            slot: &mut Option<T>,
            value: Option<T>,
        ) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.employment_income, partial.employment_income);
        take(&mut self.independent_income, partial.independent_income);
        take(&mut self.pension_income, partial.pension_income);
        take(&mut self.subsidies, partial.subsidies);
        take(&mut self.civil_status, partial.civil_status);
        take(&mut self.dependents, partial.dependents);
        take(&mut self.disabled_dependents, partial.disabled_dependents);
        take(&mut self.withholding_tax, partial.withholding_tax);
        take(&mut self.regime, partial.regime);

        for (category, amount) in &partial.expenses {
            self.expenses.insert(*category, *amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_profile_is_empty_and_not_computable() {
        let profile = FiscalProfile::new();

        assert!(profile.is_empty());
        assert!(!profile.is_computable());
        assert_eq!(profile.total_income(), Decimal::ZERO);
    }

    #[test]
    fn computable_needs_income_status_and_dependents() {
        let mut profile = FiscalProfile {
            independent_income: Some(dec!(12000)),
            civil_status: Some(CivilStatus::Single),
            ..Default::default()
        };
        assert!(!profile.is_computable());

        profile.dependents = Some(0);
        assert!(profile.is_computable());
    }

    #[test]
    fn total_income_includes_subsidies() {
        let profile = FiscalProfile {
            employment_income: Some(dec!(20000)),
            pension_income: Some(dec!(3000)),
            subsidies: Some(dec!(1500)),
            ..Default::default()
        };

        assert_eq!(profile.total_income(), dec!(24500));
    }

    #[test]
    fn total_income_saturates_on_overflow() {
        let profile = FiscalProfile {
            employment_income: Some(Decimal::MAX),
            pension_income: Some(Decimal::MAX),
            ..Default::default()
        };

        assert_eq!(profile.total_income(), Decimal::MAX);
    }

    #[test]
    fn merge_overwrites_only_fields_set_in_partial() {
        let mut profile = FiscalProfile {
            employment_income: Some(dec!(18000)),
            civil_status: Some(CivilStatus::Single),
            ..Default::default()
        };
        profile.set_expense(ExpenseCategory::Health, dec!(300));

        let mut partial = FiscalProfile {
            civil_status: Some(CivilStatus::Married),
            dependents: Some(2),
            ..Default::default()
        };
        partial.set_expense(ExpenseCategory::Education, dec!(1200));

        profile.merge(&partial);

        assert_eq!(profile.employment_income, Some(dec!(18000)));
        assert_eq!(profile.civil_status, Some(CivilStatus::Married));
        assert_eq!(profile.dependents, Some(2));
        assert_eq!(profile.expense(ExpenseCategory::Health), Some(dec!(300)));
        assert_eq!(profile.expense(ExpenseCategory::Education), Some(dec!(1200)));
    }

    #[test]
    fn is_set_tracks_expense_categories_individually() {
        let mut profile = FiscalProfile::new();
        profile.set_expense(ExpenseCategory::Housing, Decimal::ZERO);

        assert!(profile.is_set(ProfileField::Expense(ExpenseCategory::Housing)));
        assert!(!profile.is_set(ProfileField::Expense(ExpenseCategory::Health)));
    }
}
