//! Free text to partial [`FiscalProfile`].
//!
//! Extraction is a single pass over normalized text:
//!
//! 1. civil status, dependents, disabled dependents and regime, each decided
//!    by the first matching rule of its list;
//! 2. amount groups in [`RuleSet::amounts`] order, each taking the first
//!    rule match whose amount has not been claimed by an earlier field;
//! 3. when the caller says which field it just asked for, a bare answer
//!    ("2", "1500 euros", "nenhum") fills that field if the rules did not.
//!
//! Every amount goes through [`normalize_amount`], so thousands markers and
//! monthly periods are applied the same way for income and expenses.

use std::ops::Range;

use irs_core::{FiscalProfile, ProfileField};
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use tracing::debug;

use crate::amount::{Frequency, normalize_amount};
use crate::rules::{CountSource, ExtractorError, Rule, RuleSet};
use crate::text::normalize_text;
use crate::vocabulary::Vocabulary;

/// Characters inspected after an amount when looking for a period marker.
const TRAILING_WINDOW: usize = 30;
/// Characters inspected before an amount when nothing follows it.
const LEADING_WINDOW: usize = 20;

/// Which rule filled which field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub field: ProfileField,
    pub rule: String,
}

/// A partial profile together with the rules that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub profile: FiscalProfile,
    pub matches: Vec<RuleMatch>,
}

impl Extraction {
    /// Name of the rule that filled `field`, if any.
    pub fn rule_for(
        &self,
        field: ProfileField,
    ) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.field == field)
            .map(|m| m.rule.as_str())
    }

    fn record(
        &mut self,
        field: ProfileField,
        rule: &str,
    ) {
        debug!(?field, rule, "field extracted");
        self.matches.push(RuleMatch {
            field,
            rule: rule.to_string(),
        });
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    vocabulary: Vocabulary,
    rules: RuleSet,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(Vocabulary::default()).expect("built-in vocabulary compiles")
    }
}

impl FieldExtractor {
    /// Builds an extractor from `vocabulary`, compiling its rule lists once.
    pub fn new(vocabulary: Vocabulary) -> Result<Self, ExtractorError> {
        let rules = RuleSet::compile(&vocabulary)?;
        Ok(Self { vocabulary, rules })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The ordered rule lists, for inspecting precedence.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Extracts every field the text mentions. Empty text yields an empty profile.
    pub fn extract(
        &self,
        text: &str,
    ) -> FiscalProfile {
        self.extract_detailed(text, None).profile
    }

    /// Like [`FieldExtractor::extract`], also accepting a bare answer for
    /// `expected`, the field the caller just asked about.
    pub fn extract_for(
        &self,
        text: &str,
        expected: Option<ProfileField>,
    ) -> FiscalProfile {
        self.extract_detailed(text, expected).profile
    }

    pub fn extract_detailed(
        &self,
        text: &str,
        expected: Option<ProfileField>,
    ) -> Extraction {
        let text = normalize_text(text);
        let mut extraction = Extraction::default();
        if text.is_empty() {
            return extraction;
        }

        let mut claimed: Vec<Range<usize>> = Vec::new();

        if let Some((status, rule)) = first_match(&self.rules.civil_status, &text) {
            extraction.profile.civil_status = Some(status);
            extraction.record(ProfileField::CivilStatus, rule);
        }
        if let Some((count, rule)) = self.count(&self.rules.dependents, &text, &mut claimed) {
            extraction.profile.dependents = Some(count);
            extraction.record(ProfileField::Dependents, rule);
        }
        if let Some((count, rule)) =
            self.count(&self.rules.disabled_dependents, &text, &mut claimed)
        {
            extraction.profile.disabled_dependents = Some(count);
            extraction.record(ProfileField::DisabledDependents, rule);
        }
        if let Some((regime, rule)) = first_match(&self.rules.regime, &text) {
            extraction.profile.regime = Some(regime);
            extraction.record(ProfileField::Regime, rule);
        }

        for group in &self.rules.amounts {
            if extraction.profile.is_set(group.field) {
                continue;
            }
            if group.fallback && extraction.profile.has_income() {
                continue;
            }
            for rule in &group.rules {
                if let Some(amount) = self.claim_amount(&rule.pattern, &text, &mut claimed) {
                    set_amount(&mut extraction.profile, group.field, amount);
                    extraction.record(group.field, &rule.name);
                    break;
                }
            }
        }

        if let Some(field) = expected {
            self.fill_expected(field, &text, &mut claimed, &mut extraction);
        }

        extraction
    }

    /// Bare-answer fallback for the field the caller asked about.
    fn fill_expected(
        &self,
        field: ProfileField,
        text: &str,
        claimed: &mut Vec<Range<usize>>,
        extraction: &mut Extraction,
    ) {
        let profile = &mut extraction.profile;
        let already = if field.is_income() {
            profile.has_income()
        } else {
            profile.is_set(field)
        };
        if already {
            return;
        }

        match field {
            ProfileField::Dependents | ProfileField::DisabledDependents => {
                let count = self
                    .rules
                    .bare_count
                    .captures(text)
                    .and_then(|caps| self.count_value(&caps))
                    .or_else(|| self.rules.decline.is_match(text).then_some(0));
                if let Some(count) = count {
                    if field == ProfileField::Dependents {
                        profile.dependents = Some(count);
                    } else {
                        profile.disabled_dependents = Some(count);
                    }
                    extraction.record(field, "context_bare_count");
                }
            }
            ProfileField::EmploymentIncome
            | ProfileField::IndependentIncome
            | ProfileField::PensionIncome
            | ProfileField::Subsidies
            | ProfileField::WithholdingTax => {
                if let Some(amount) = self.claim_amount(&self.rules.bare_amount, text, claimed) {
                    set_amount(profile, field, amount);
                    extraction.record(field, "context_bare_amount");
                }
            }
            ProfileField::Expense(_) => {
                if let Some(amount) = self.claim_amount(&self.rules.bare_amount, text, claimed) {
                    set_amount(profile, field, amount);
                    extraction.record(field, "context_bare_amount");
                } else if self.rules.decline.is_match(text) {
                    set_amount(profile, field, Decimal::ZERO);
                    extraction.record(field, "context_decline");
                }
            }
            ProfileField::CivilStatus | ProfileField::Regime => {}
        }
    }

    /// First rule of `rules` yielding a count; captured digit spans are claimed.
    fn count<'r>(
        &self,
        rules: &'r [Rule<CountSource>],
        text: &str,
        claimed: &mut Vec<Range<usize>>,
    ) -> Option<(u32, &'r str)> {
        for rule in rules {
            let Some(caps) = rule.pattern.captures(text) else {
                continue;
            };
            let count = match rule.outcome {
                CountSource::Fixed(count) => Some(count),
                CountSource::Captured => self.count_value(&caps),
            };
            if let Some(count) = count {
                if let Some(span) = caps.name("count") {
                    claimed.push(span.range());
                }
                return Some((count, rule.name.as_str()));
            }
        }
        None
    }

    fn count_value(
        &self,
        caps: &Captures<'_>,
    ) -> Option<u32> {
        let raw = caps.name("count")?.as_str();
        raw.parse::<u32>()
            .ok()
            .or_else(|| self.vocabulary.number_word(raw))
    }

    /// First match of `pattern` whose amount is not yet claimed, normalized
    /// to an annual figure. The amount span is claimed on success.
    fn claim_amount(
        &self,
        pattern: &Regex,
        text: &str,
        claimed: &mut Vec<Range<usize>>,
    ) -> Option<Decimal> {
        for caps in pattern.captures_iter(text) {
            let Some(amount) = caps.name("amount") else {
                continue;
            };
            let span = amount.range();
            if claimed.iter().any(|c| overlaps(c, &span)) {
                continue;
            }
            let whole = caps.get(0).map_or(span.clone(), |m| m.range());
            let frequency = self.frequency(text, &whole);
            let value = normalize_amount(amount.as_str(), caps.name("mil").is_some(), frequency);
            claimed.push(span);
            return Some(value);
        }
        None
    }

    /// Period of the amount matched at `span`.
    ///
    /// The matched phrase and a short trailing window are searched first and
    /// the nearest marker wins; otherwise the last marker in a short leading
    /// window. Windows stop at digits and clause separators so a period
    /// attached to another figure is not borrowed. With no local marker the
    /// whole text decides: monthly when it names a month and never a year.
    fn frequency(
        &self,
        text: &str,
        span: &Range<usize>,
    ) -> Frequency {
        let trailing: String = text[span.end..]
            .chars()
            .take_while(|c| !is_window_stop(*c))
            .take(TRAILING_WINDOW)
            .collect();
        let forward = format!("{}{}", &text[span.clone()], trailing);
        let monthly = self.rules.monthly.find(&forward).map(|m| m.start());
        let annual = self.rules.annual.find(&forward).map(|m| m.start());
        match (monthly, annual) {
            (Some(m), Some(a)) if m < a => return Frequency::Monthly,
            (Some(_), Some(_)) | (None, Some(_)) => return Frequency::Annual,
            (Some(_), None) => return Frequency::Monthly,
            (None, None) => {}
        }

        let mut leading: Vec<char> = text[..span.start]
            .chars()
            .rev()
            .take_while(|c| !is_window_stop(*c))
            .take(LEADING_WINDOW)
            .collect();
        leading.reverse();
        let backward: String = leading.into_iter().collect();
        let monthly = self.rules.monthly.find_iter(&backward).last().map(|m| m.end());
        let annual = self.rules.annual.find_iter(&backward).last().map(|m| m.end());
        match (monthly, annual) {
            (Some(m), Some(a)) if m > a => Frequency::Monthly,
            (Some(_), None) => Frequency::Monthly,
            (_, Some(_)) => Frequency::Annual,
            (None, None) => self.text_frequency(text),
        }
    }

    fn text_frequency(
        &self,
        text: &str,
    ) -> Frequency {
        match (self.rules.monthly.is_match(text), self.rules.annual.is_match(text)) {
            (true, false) => Frequency::Monthly,
            _ => Frequency::Unspecified,
        }
    }
}

fn first_match<'r, T: Copy>(
    rules: &'r [Rule<T>],
    text: &str,
) -> Option<(T, &'r str)> {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(text))
        .map(|rule| (rule.outcome, rule.name.as_str()))
}

fn overlaps(
    a: &Range<usize>,
    b: &Range<usize>,
) -> bool {
    a.start < b.end && b.start < a.end
}

fn is_window_stop(c: char) -> bool {
    c.is_ascii_digit() || c == ',' || c == ';' || c == '.'
}

fn set_amount(
    profile: &mut FiscalProfile,
    field: ProfileField,
    amount: Decimal,
) {
    match field {
        ProfileField::EmploymentIncome => profile.employment_income = Some(amount),
        ProfileField::IndependentIncome => profile.independent_income = Some(amount),
        ProfileField::PensionIncome => profile.pension_income = Some(amount),
        ProfileField::Subsidies => profile.subsidies = Some(amount),
        ProfileField::WithholdingTax => profile.withholding_tax = Some(amount),
        ProfileField::Expense(category) => profile.set_expense(category, amount),
        ProfileField::CivilStatus
        | ProfileField::Dependents
        | ProfileField::DisabledDependents
        | ProfileField::Regime => {}
    }
}

#[cfg(test)]
mod tests {
    use irs_core::{CivilStatus, ExpenseCategory, Regime};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn extract(text: &str) -> FiscalProfile {
        FieldExtractor::default().extract(text)
    }

    // =========================================================================
    // Income tests
    // =========================================================================

    #[test]
    fn married_with_two_children_and_monthly_salary() {
        let profile = extract("Sou casado, tenho 2 filhos e ganho 2.500€ por mês");

        assert_eq!(profile.civil_status, Some(CivilStatus::Married));
        assert_eq!(profile.dependents, Some(2));
        assert_eq!(profile.employment_income, Some(dec!(30000)));
    }

    #[test]
    fn annual_salary_is_not_multiplied() {
        let profile = extract("O meu salário é de 28.000 euros por ano");

        assert_eq!(profile.employment_income, Some(dec!(28000)));
    }

    #[test]
    fn mil_marker_multiplies_amount() {
        let profile = extract("ganho 35 mil por ano");

        assert_eq!(profile.employment_income, Some(dec!(35000)));
    }

    #[test]
    fn glued_k_multiplies_amount() {
        let profile = extract("recebo 40k");

        assert_eq!(profile.employment_income, Some(dec!(40000)));
    }

    #[test]
    fn freelance_income_fills_independent_slot() {
        let profile = extract("Sou freelancer e faturo 2000 euros por mês");

        assert_eq!(profile.independent_income, Some(dec!(24000)));
        assert_eq!(profile.employment_income, None);
    }

    #[test]
    fn salary_and_green_receipts_fill_separate_slots() {
        let profile = extract("ganho 1500 por mês e passo recibos verdes de 3000 por ano");

        assert_eq!(profile.employment_income, Some(dec!(18000)));
        assert_eq!(profile.independent_income, Some(dec!(3000)));
    }

    #[test]
    fn pension_fills_pension_slot() {
        let profile = extract("Estou reformado, a minha pensão é de 900€ por mês");

        assert_eq!(profile.pension_income, Some(dec!(10800)));
        assert_eq!(profile.employment_income, None);
    }

    #[test]
    fn currency_with_period_falls_back_to_employment() {
        let extraction =
            FieldExtractor::default().extract_detailed("São 1800€ por mês", None);

        assert_eq!(extraction.profile.employment_income, Some(dec!(21600)));
        assert_eq!(
            extraction.rule_for(ProfileField::EmploymentIncome),
            Some("income_currency_with_period")
        );
    }

    #[test]
    fn subsidies_and_withholding_are_extracted() {
        let profile = extract(
            "ganho 20000 por ano, recebi 1500 de subsídio de natal e tive 2.400 de retenção na fonte",
        );

        assert_eq!(profile.employment_income, Some(dec!(20000)));
        assert_eq!(profile.subsidies, Some(dec!(1500)));
        assert_eq!(profile.withholding_tax, Some(dec!(2400)));
    }

    // =========================================================================
    // Household tests
    // =========================================================================

    #[test]
    fn negated_partner_reads_as_single() {
        let profile = extract("não tenho cônjuge");

        assert_eq!(profile.civil_status, Some(CivilStatus::Single));
    }

    #[test]
    fn civil_status_variants() {
        assert_eq!(extract("sou viúva").civil_status, Some(CivilStatus::Widowed));
        assert_eq!(
            extract("estou divorciado").civil_status,
            Some(CivilStatus::Divorced)
        );
        assert_eq!(extract("solteira").civil_status, Some(CivilStatus::Single));
        assert_eq!(
            extract("vivo em união de facto").civil_status,
            Some(CivilStatus::Married)
        );
    }

    #[test]
    fn dependents_from_number_word() {
        assert_eq!(extract("tenho três filhos").dependents, Some(3));
        assert_eq!(extract("temos duas filhas").dependents, Some(2));
    }

    #[test]
    fn dependents_negation_forces_zero() {
        assert_eq!(extract("não tenho filhos").dependents, Some(0));
        assert_eq!(extract("sem dependentes").dependents, Some(0));
    }

    #[test]
    fn single_daughter_counts_as_one() {
        assert_eq!(extract("tenho uma filha").dependents, Some(1));
        assert_eq!(extract("é filho único").dependents, Some(1));
    }

    #[test]
    fn digits_win_over_number_words() {
        let extraction =
            FieldExtractor::default().extract_detailed("tenho 4 filhos, dois na escola", None);

        assert_eq!(extraction.profile.dependents, Some(4));
        assert_eq!(
            extraction.rule_for(ProfileField::Dependents),
            Some("dependents_digits")
        );
    }

    #[test]
    fn disabled_dependents_are_counted() {
        let profile = extract("tenho 3 filhos, um deles com deficiência");

        assert_eq!(profile.dependents, Some(3));
        assert_eq!(profile.disabled_dependents, Some(1));
    }

    #[test]
    fn dependent_count_is_not_reused_as_amount() {
        let profile = extract("tenho 2 filhos");

        assert_eq!(profile.dependents, Some(2));
        assert_eq!(profile.employment_income, None);
        assert!(profile.expenses.is_empty());
    }

    #[test]
    fn regime_is_extracted() {
        assert_eq!(
            extract("estou no regime simplificado").regime,
            Some(Regime::Simplified)
        );
        assert_eq!(
            extract("tenho contabilidade organizada").regime,
            Some(Regime::Organized)
        );
    }

    // =========================================================================
    // Expense tests
    // =========================================================================

    #[test]
    fn expenses_by_category() {
        let profile = extract("gastei 800 em saúde e 1200 em educação");

        assert_eq!(profile.expense(ExpenseCategory::Health), Some(dec!(800)));
        assert_eq!(profile.expense(ExpenseCategory::Education), Some(dec!(1200)));
    }

    #[test]
    fn monthly_rent_is_annualized() {
        let profile = extract("pago 650€ de renda por mês");

        assert_eq!(profile.expense(ExpenseCategory::Housing), Some(dec!(7800)));
    }

    #[test]
    fn monthly_period_does_not_leak_to_other_amounts() {
        let profile = extract("ganho 30000 por ano; pago 500 de renda por mês");

        assert_eq!(profile.employment_income, Some(dec!(30000)));
        assert_eq!(profile.expense(ExpenseCategory::Housing), Some(dec!(6000)));
    }

    #[test]
    fn monthly_marker_in_a_later_clause_is_applied() {
        assert_eq!(
            extract("O meu salário é 1.200€, recebo mensalmente").employment_income,
            Some(dec!(14400))
        );
        assert_eq!(
            extract("ganho 2000 euros, pagos mensalmente").employment_income,
            Some(dec!(24000))
        );
        assert_eq!(extract("Ganho 1500. É por mês.").employment_income, Some(dec!(18000)));
    }

    #[test]
    fn text_wide_month_is_ignored_when_a_year_is_named() {
        let profile = extract("ganho 30000, pago a renda todos os meses e declaro ao ano");

        assert_eq!(profile.employment_income, Some(dec!(30000)));
    }

    #[test]
    fn overflowing_amounts_do_not_panic() {
        let profile = extract("ganho 9999999999999999999999999999 por mês");
        assert_eq!(profile.employment_income, Some(dec!(0)));

        let profile = extract("recebo 79228162514264337593543950335k");
        assert_eq!(profile.employment_income, Some(dec!(0)));
    }

    #[test]
    fn tuition_mensalidade_is_annualized() {
        let profile = extract("a mensalidade da escola é 150");

        assert_eq!(profile.expense(ExpenseCategory::Education), Some(dec!(1800)));
    }

    #[test]
    fn income_amount_is_not_reused_as_expense() {
        let profile = extract("ganho 1500 euros em casa");

        assert_eq!(profile.employment_income, Some(dec!(1500)));
        assert_eq!(profile.expense(ExpenseCategory::Housing), None);
    }

    // =========================================================================
    // Context and edge case tests
    // =========================================================================

    #[test]
    fn empty_and_blank_text_yield_empty_profile() {
        assert!(extract("").is_empty());
        assert!(extract("   \n\t ").is_empty());
    }

    #[test]
    fn unrelated_text_yields_empty_profile() {
        assert!(extract("olá, bom dia!").is_empty());
    }

    #[test]
    fn bare_amount_answers_expected_income() {
        let extractor = FieldExtractor::default();

        let profile = extractor.extract_for("1500 por mês", Some(ProfileField::EmploymentIncome));

        assert_eq!(profile.employment_income, Some(dec!(18000)));
        assert_eq!(extractor.extract("1500").employment_income, None);
    }

    #[test]
    fn bare_count_answers_expected_dependents() {
        let extractor = FieldExtractor::default();

        assert_eq!(
            extractor
                .extract_for("2", Some(ProfileField::Dependents))
                .dependents,
            Some(2)
        );
        assert_eq!(
            extractor
                .extract_for("três", Some(ProfileField::Dependents))
                .dependents,
            Some(3)
        );
        assert_eq!(
            extractor
                .extract_for("nenhum", Some(ProfileField::Dependents))
                .dependents,
            Some(0)
        );
    }

    #[test]
    fn decline_answers_expected_expense_with_zero() {
        let profile = FieldExtractor::default().extract_for(
            "não tenho",
            Some(ProfileField::Expense(ExpenseCategory::Health)),
        );

        assert_eq!(profile.expense(ExpenseCategory::Health), Some(dec!(0)));
    }

    #[test]
    fn custom_vocabulary_is_honoured() {
        let mut vocabulary = Vocabulary::default();
        vocabulary.income.employment_verbs.push("aufere".to_string());

        let extractor = FieldExtractor::new(vocabulary).unwrap();

        assert_eq!(
            extractor.extract("ele aufere 1.200 mensais").employment_income,
            Some(dec!(14400))
        );
    }
}
