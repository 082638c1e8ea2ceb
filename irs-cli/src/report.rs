//! Plain-text rendering of profiles, validation reports and results.

use std::fmt::Write;

use irs_chat::format_amount;
use irs_core::{
    Adjustment, CalculationResult, ExpenseCategory, FiscalProfile, ProfileField, ValidationReport,
};
use rust_decimal::Decimal;

use crate::utils::opt_amount_display;

fn money(amount: Decimal) -> String {
    format!("{} €", format_amount(amount))
}

/// `0.1459` as `14,59%`.
pub fn percent(rate: Decimal) -> String {
    format!("{}%", format_amount(rate * Decimal::ONE_HUNDRED))
}

fn field_label(field: ProfileField) -> String {
    match field {
        ProfileField::EmploymentIncome => "rendimento do trabalho".to_string(),
        ProfileField::IndependentIncome => "rendimento independente".to_string(),
        ProfileField::PensionIncome => "pensões".to_string(),
        ProfileField::Subsidies => "subsídios".to_string(),
        ProfileField::CivilStatus => "estado civil".to_string(),
        ProfileField::Dependents => "dependentes".to_string(),
        ProfileField::DisabledDependents => "dependentes com deficiência".to_string(),
        ProfileField::Expense(category) => format!("despesas de {}", category.label()),
        ProfileField::WithholdingTax => "retenção na fonte".to_string(),
        ProfileField::Regime => "regime".to_string(),
    }
}

pub fn render_profile(profile: &FiscalProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Rendimento do trabalho:  {}",
        opt_amount_display(&profile.employment_income)
    );
    let _ = writeln!(
        out,
        "Rendimento independente: {}",
        opt_amount_display(&profile.independent_income)
    );
    let _ = writeln!(
        out,
        "Pensões:                 {}",
        opt_amount_display(&profile.pension_income)
    );
    let _ = writeln!(
        out,
        "Subsídios:               {}",
        opt_amount_display(&profile.subsidies)
    );
    let _ = writeln!(
        out,
        "Estado civil:            {}",
        profile.civil_status.map_or("-", |s| s.label())
    );
    let _ = writeln!(
        out,
        "Dependentes:             {}",
        profile.dependents.map_or_else(|| "-".to_string(), |d| d.to_string())
    );
    if let Some(disabled) = profile.disabled_dependents {
        let _ = writeln!(out, "  com deficiência:       {disabled}");
    }
    for category in ExpenseCategory::ALL {
        if let Some(amount) = profile.expense(category) {
            let _ = writeln!(
                out,
                "Despesas de {:<12} {}",
                format!("{}:", category.label()),
                money(amount)
            );
        }
    }
    let _ = writeln!(
        out,
        "Retenção na fonte:       {}",
        opt_amount_display(&profile.withholding_tax)
    );
    if let Some(regime) = profile.regime {
        let _ = writeln!(out, "Regime:                  {}", regime.as_str());
    }
    out
}

pub fn render_result(result: &CalculationResult) -> String {
    let mut out = String::new();
    let d = &result.deductions;
    let _ = writeln!(out, "IRS {}", result.tax_year);
    let _ = writeln!(out, "Rendimento bruto:        {}", money(result.gross_income));
    let _ = writeln!(out, "Deduções:                {}", money(d.total));
    let _ = writeln!(out, "  pessoal:               {}", money(d.personal));
    if !d.spouse.is_zero() {
        let _ = writeln!(out, "  cônjuge:               {}", money(d.spouse));
    }
    if !d.dependents.is_zero() {
        let _ = writeln!(out, "  dependentes:           {}", money(d.dependents));
    }
    if !d.disabled_dependents.is_zero() {
        let _ = writeln!(out, "  deficiência:           {}", money(d.disabled_dependents));
    }
    for (category, amount) in &d.expenses {
        let _ = writeln!(out, "  {:<22} {}", format!("{}:", category.label()), money(*amount));
    }
    if !d.flat_expense.is_zero() {
        let _ = writeln!(out, "  regime simplificado:   {}", money(d.flat_expense));
    }
    let _ = writeln!(out, "Rendimento coletável:    {}", money(result.taxable_income));
    let _ = writeln!(out, "Imposto:                 {}", money(result.tax_due));
    let _ = writeln!(out, "Taxa efetiva:            {}", percent(result.effective_rate));
    let _ = writeln!(out, "Taxa marginal:           {}", percent(result.marginal_rate));
    let _ = writeln!(out, "Retenção na fonte:       {}", money(result.withholding_tax));

    let balance = if result.is_refund() {
        format!("Reembolso:               {}", money(result.refund_or_payment))
    } else if result.is_payment() {
        format!("A pagar:                 {}", money(result.refund_or_payment.abs()))
    } else {
        "Sem acerto".to_string()
    };
    let _ = writeln!(out, "{balance}");

    if !result.brackets.is_empty() {
        let _ = writeln!(out, "Escalões:");
        for bracket in &result.brackets {
            let upper = bracket
                .max_income
                .map_or_else(|| "∞".to_string(), format_amount);
            let _ = writeln!(
                out,
                "  {} .. {} a {}: {} -> {}",
                format_amount(bracket.min_income),
                upper,
                percent(bracket.rate),
                money(bracket.taxable_amount),
                money(bracket.tax)
            );
        }
    }
    out
}

pub fn render_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    for error in &report.errors {
        let _ = writeln!(out, "erro: {error}");
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "aviso: {warning}");
    }
    for suggestion in &report.suggestions {
        let _ = writeln!(out, "sugestão: {suggestion}");
    }
    out
}

pub fn render_adjustments(adjustments: &[Adjustment]) -> String {
    let mut out = String::new();
    for adjustment in adjustments {
        let _ = writeln!(
            out,
            "corrigido: {} de {} para {}",
            field_label(adjustment.field),
            format_amount(adjustment.before),
            format_amount(adjustment.after)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use irs_core::{BracketTax, CivilStatus, DeductionBreakdown};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn percent_uses_decimal_comma() {
        assert_eq!(percent(dec!(0.1459)), "14,59%");
        assert_eq!(percent(dec!(0.48)), "48,00%");
        assert_eq!(percent(dec!(0)), "0,00%");
    }

    #[test]
    fn render_result_shows_payment_and_brackets() {
        let result = CalculationResult {
            tax_year: 2025,
            gross_income: dec!(10000),
            deductions: DeductionBreakdown {
                personal: dec!(4104),
                total: dec!(4104),
                ..Default::default()
            },
            taxable_income: dec!(5896),
            tax_due: dec!(737.00),
            effective_rate: dec!(0.0737),
            marginal_rate: dec!(0.125),
            withholding_tax: dec!(500),
            refund_or_payment: dec!(-237.00),
            brackets: vec![BracketTax {
                min_income: dec!(0),
                max_income: Some(dec!(8059)),
                rate: dec!(0.125),
                taxable_amount: dec!(5896),
                tax: dec!(737.00),
            }],
        };

        let text = render_result(&result);

        assert!(text.contains("Rendimento coletável:    5.896,00 €"));
        assert!(text.contains("A pagar:                 237,00 €"));
        assert!(text.contains("  0,00 .. 8.059,00 a 12,50%: 5.896,00 € -> 737,00 €"));
        assert!(!text.contains("cônjuge"));
    }

    #[test]
    fn render_profile_marks_missing_fields() {
        let profile = FiscalProfile {
            civil_status: Some(CivilStatus::Married),
            ..Default::default()
        };

        let text = render_profile(&profile);

        assert!(text.contains("Estado civil:            casado(a)"));
        assert!(text.contains("Dependentes:             -"));
    }

    #[test]
    fn render_adjustments_lists_each_change() {
        let adjustments = vec![Adjustment {
            field: ProfileField::Expense(ExpenseCategory::Education),
            before: dec!(5000),
            after: dec!(2666.66),
        }];

        assert_eq!(
            render_adjustments(&adjustments),
            "corrigido: despesas de educação de 5.000,00 para 2.666,66\n"
        );
    }
}
