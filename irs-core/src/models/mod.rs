mod calculation_result;
mod civil_status;
mod expense_category;
mod fiscal_profile;
mod regime;
mod tax_parameters;

pub use calculation_result::{BracketTax, CalculationResult, DeductionBreakdown};
pub use civil_status::CivilStatus;
pub use expense_category::ExpenseCategory;
pub use fiscal_profile::{FiscalProfile, ProfileField};
pub use regime::Regime;
pub use tax_parameters::{
    Allowances, DeductionRule, DeductionRules, ParameterError, TaxBracket, TaxParameterTable,
    ValidationLimits,
};
