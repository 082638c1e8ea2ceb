//! Ordered match rules compiled from a [`Vocabulary`].
//!
//! Every field has a prioritized list of rules. The extractor tries them in
//! list order and the first rule that matches decides the field; later rules
//! are never consulted. The lists are public so precedence can be inspected
//! and pinned by tests.
//!
//! Amount fields are grouped, and groups run in the order of
//! [`RuleSet::amounts`]. An amount claimed by an earlier group (or a
//! dependent count) is skipped by later groups, so one number never fills
//! two fields.

use irs_core::{CivilStatus, ExpenseCategory, ProfileField, Regime};
use regex::Regex;
use thiserror::Error;

use crate::vocabulary::Vocabulary;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("rule '{rule}' does not compile: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

/// One named pattern and what a match means.
#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub name: String,
    pub pattern: Regex,
    pub outcome: T,
}

/// How a dependent-count rule turns a match into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    /// Read the `count` capture as digits or a counting word.
    Captured,
    Fixed(u32),
}

/// Prioritized rules for one amount field.
#[derive(Debug, Clone)]
pub struct AmountGroup {
    pub field: ProfileField,
    /// Fallback groups only run when no income slot has been filled yet.
    pub fallback: bool,
    pub rules: Vec<Rule<ProfileField>>,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    pub civil_status: Vec<Rule<CivilStatus>>,
    pub dependents: Vec<Rule<CountSource>>,
    pub disabled_dependents: Vec<Rule<CountSource>>,
    pub regime: Vec<Rule<Regime>>,
    pub amounts: Vec<AmountGroup>,
    pub(crate) monthly: Regex,
    pub(crate) annual: Regex,
    pub(crate) bare_amount: Regex,
    pub(crate) bare_count: Regex,
    pub(crate) decline: Regex,
}

/// Regex alternation of literal phrases, longest first so the leftmost-first
/// engine prefers "recibos verdes" over "recibo".
fn alternation(phrases: &[String]) -> String {
    if phrases.is_empty() {
        return r"\b\B".to_string();
    }
    let mut sorted: Vec<&String> = phrases.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|")
}

fn phrase(phrases: &[String]) -> String {
    format!(r"\b(?:{})\b", alternation(phrases))
}

fn joined(lists: &[&[String]]) -> Vec<String> {
    lists.iter().flat_map(|l| l.iter().cloned()).collect()
}

fn compile<T>(
    name: impl Into<String>,
    pattern: &str,
    outcome: T,
) -> Result<Rule<T>, ExtractorError> {
    let name = name.into();
    let pattern = Regex::new(pattern).map_err(|source| ExtractorError::InvalidPattern {
        rule: name.clone(),
        source,
    })?;
    Ok(Rule {
        name,
        pattern,
        outcome,
    })
}

struct AmountPatterns {
    amount: String,
    currency: String,
}

impl AmountPatterns {
    fn new(vocabulary: &Vocabulary) -> Self {
        // The leading class keeps a match from starting inside "2.500".
        Self {
            amount: format!(
                r"(?:^|[^\d.,])(?P<amount>\d(?:[\d.,]*\d)?(?:k\b)?)(?:\s*(?P<mil>{})\b)?",
                alternation(&vocabulary.thousands)
            ),
            currency: alternation(&vocabulary.currency),
        }
    }

    /// Keyword first, then a short gap that does not cross a clause, then the amount.
    fn keyword_then_amount(
        &self,
        keywords: &[String],
    ) -> String {
        format!(r"{}[^\d,;]{{0,25}}?{}", phrase(keywords), self.amount)
    }

    /// Amount, optional currency, up to three words, then the keyword.
    fn amount_then_keyword(
        &self,
        keywords: &[String],
    ) -> String {
        format!(
            r"{}\s*(?:{})?\s*(?:[a-z]+\s+){{0,3}}?{}",
            self.amount,
            self.currency,
            phrase(keywords)
        )
    }

    /// Amount with a currency marker followed by a period ("1500€ por mes").
    fn amount_with_period(
        &self,
        vocabulary: &Vocabulary,
    ) -> String {
        let periods = joined(&[&vocabulary.monthly, &vocabulary.annual]);
        format!(
            r"{}\s*(?:{})\s*(?:por|ao|a|cada|/)\s*{}",
            self.amount,
            self.currency,
            phrase(&periods)
        )
    }

    /// Both rule shapes for one field. "200 em saude e 1000 em educacao"
    /// reads correctly only if the trailing-keyword form is tried first.
    fn group(
        &self,
        prefix: &str,
        field: ProfileField,
        leading: &[String],
        trailing: &[String],
    ) -> Result<AmountGroup, ExtractorError> {
        Ok(AmountGroup {
            field,
            fallback: false,
            rules: vec![
                compile(
                    format!("{prefix}_amount_then_keyword"),
                    &self.amount_then_keyword(trailing),
                    field,
                )?,
                compile(
                    format!("{prefix}_keyword_then_amount"),
                    &self.keyword_then_amount(leading),
                    field,
                )?,
            ],
        })
    }
}

impl RuleSet {
    /// Compiles every rule list from `vocabulary`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::InvalidPattern`] naming the first rule whose
    /// pattern fails to compile.
    pub fn compile(vocabulary: &Vocabulary) -> Result<Self, ExtractorError> {
        let patterns = AmountPatterns::new(vocabulary);
        let income = &vocabulary.income;
        let expenses = &vocabulary.expenses;

        let mut amounts = vec![
            patterns.group(
                "subsidies",
                ProfileField::Subsidies,
                &income.subsidies,
                &income.subsidies,
            )?,
            patterns.group(
                "withholding",
                ProfileField::WithholdingTax,
                &income.withholding,
                &income.withholding,
            )?,
            patterns.group(
                "independent",
                ProfileField::IndependentIncome,
                &joined(&[&income.independent_verbs, &income.independent_nouns]),
                &income.independent_nouns,
            )?,
            patterns.group(
                "pension",
                ProfileField::PensionIncome,
                &income.pension,
                &income.pension,
            )?,
            patterns.group(
                "employment",
                ProfileField::EmploymentIncome,
                &joined(&[&income.employment_verbs, &income.employment_nouns]),
                &income.employment_nouns,
            )?,
        ];
        for category in ExpenseCategory::ALL {
            let keywords = match category {
                ExpenseCategory::Health => &expenses.health,
                ExpenseCategory::Education => &expenses.education,
                ExpenseCategory::Housing => &expenses.housing,
                ExpenseCategory::Donations => &expenses.donations,
            };
            amounts.push(patterns.group(
                category.as_str(),
                ProfileField::Expense(category),
                keywords,
                keywords,
            )?);
        }
        amounts.push(AmountGroup {
            field: ProfileField::EmploymentIncome,
            fallback: true,
            rules: vec![compile(
                "income_currency_with_period",
                &patterns.amount_with_period(vocabulary),
                ProfileField::EmploymentIncome,
            )?],
        });

        let civil = &vocabulary.civil_status;
        let civil_status = vec![
            compile(
                "civil_negated_partner",
                &phrase(&civil.negated_partner),
                CivilStatus::Single,
            )?,
            compile("civil_widowed", &phrase(&civil.widowed), CivilStatus::Widowed)?,
            compile("civil_divorced", &phrase(&civil.divorced), CivilStatus::Divorced)?,
            compile("civil_married", &phrase(&civil.married), CivilStatus::Married)?,
            compile("civil_single", &phrase(&civil.single), CivilStatus::Single)?,
        ];

        let deps = &vocabulary.dependents;
        let all_nouns = joined(&[&deps.plural_nouns, &deps.singular_nouns]);
        let counting_words: Vec<String> = vocabulary
            .number_words
            .iter()
            .filter(|(_, value)| **value >= 2)
            .map(|(word, _)| word.clone())
            .collect();
        let unit_words: Vec<String> = vocabulary
            .number_words
            .iter()
            .filter(|(_, value)| **value == 1)
            .map(|(word, _)| word.clone())
            .collect();
        let any_words: Vec<String> = vocabulary.number_words.keys().cloned().collect();

        let dependents = vec![
            compile(
                "dependents_digits",
                &format!(r"\b(?P<count>\d{{1,2}})\s+{}", phrase(&all_nouns)),
                CountSource::Captured,
            )?,
            compile(
                "dependents_number_word",
                &format!(
                    r"\b(?P<count>{})\s+{}",
                    alternation(&counting_words),
                    phrase(&deps.plural_nouns)
                ),
                CountSource::Captured,
            )?,
            compile(
                "dependents_negation",
                &format!(r"{}\s+{}", phrase(&deps.negations), phrase(&all_nouns)),
                CountSource::Fixed(0),
            )?,
            compile(
                "dependents_single",
                &format!(
                    r"\b(?:{})\s+{}|{}",
                    alternation(&unit_words),
                    phrase(&deps.singular_nouns),
                    phrase(&deps.only_child)
                ),
                CountSource::Fixed(1),
            )?,
        ];

        let disabled_dependents = vec![compile(
            "disabled_dependents_count",
            &format!(
                r"\b(?P<count>\d{{1,2}}|{})\s+(?:[a-z]+\s+)?{}",
                alternation(&any_words),
                phrase(&deps.disability)
            ),
            CountSource::Captured,
        )?];

        let regime = vec![
            compile(
                "regime_organized",
                &phrase(&vocabulary.regime.organized),
                Regime::Organized,
            )?,
            compile(
                "regime_simplified",
                &phrase(&vocabulary.regime.simplified),
                Regime::Simplified,
            )?,
        ];

        let regex = |name: &str, pattern: &str| -> Result<Regex, ExtractorError> {
            Regex::new(pattern).map_err(|source| ExtractorError::InvalidPattern {
                rule: name.to_string(),
                source,
            })
        };

        Ok(Self {
            civil_status,
            dependents,
            disabled_dependents,
            regime,
            amounts,
            monthly: regex("monthly_marker", &phrase(&vocabulary.monthly))?,
            annual: regex("annual_marker", &phrase(&vocabulary.annual))?,
            bare_amount: regex("bare_amount", &patterns.amount)?,
            bare_count: regex(
                "bare_count",
                &format!(r"\b(?P<count>\d{{1,2}}|{})\b", alternation(&any_words)),
            )?,
            decline: regex("decline", &phrase(&vocabulary.declines))?,
        })
    }

    /// Rule names for `field`, in the order they are tried.
    pub fn precedence(
        &self,
        field: ProfileField,
    ) -> Vec<&str> {
        fn names<T>(rules: &[Rule<T>]) -> Vec<&str> {
            rules.iter().map(|r| r.name.as_str()).collect()
        }

        match field {
            ProfileField::CivilStatus => names(&self.civil_status),
            ProfileField::Dependents => names(&self.dependents),
            ProfileField::DisabledDependents => names(&self.disabled_dependents),
            ProfileField::Regime => names(&self.regime),
            amount_field => self
                .amounts
                .iter()
                .filter(|group| group.field == amount_field)
                .flat_map(|group| names(&group.rules))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rules() -> RuleSet {
        RuleSet::compile(&Vocabulary::default()).unwrap()
    }

    #[test]
    fn civil_status_precedence_is_pinned() {
        assert_eq!(
            rules().precedence(ProfileField::CivilStatus),
            vec![
                "civil_negated_partner",
                "civil_widowed",
                "civil_divorced",
                "civil_married",
                "civil_single",
            ]
        );
    }

    #[test]
    fn dependents_precedence_is_pinned() {
        assert_eq!(
            rules().precedence(ProfileField::Dependents),
            vec![
                "dependents_digits",
                "dependents_number_word",
                "dependents_negation",
                "dependents_single",
            ]
        );
    }

    #[test]
    fn employment_income_falls_back_to_currency_with_period() {
        assert_eq!(
            rules().precedence(ProfileField::EmploymentIncome),
            vec![
                "employment_amount_then_keyword",
                "employment_keyword_then_amount",
                "income_currency_with_period",
            ]
        );
    }

    #[test]
    fn trailing_keyword_is_tried_first() {
        assert_eq!(
            rules().precedence(ProfileField::Expense(ExpenseCategory::Housing)),
            vec!["housing_amount_then_keyword", "housing_keyword_then_amount"]
        );
    }

    #[test]
    fn amount_groups_run_income_before_expenses() {
        let order: Vec<ProfileField> = rules().amounts.iter().map(|g| g.field).collect();

        assert_eq!(
            order,
            vec![
                ProfileField::Subsidies,
                ProfileField::WithholdingTax,
                ProfileField::IndependentIncome,
                ProfileField::PensionIncome,
                ProfileField::EmploymentIncome,
                ProfileField::Expense(ExpenseCategory::Health),
                ProfileField::Expense(ExpenseCategory::Education),
                ProfileField::Expense(ExpenseCategory::Housing),
                ProfileField::Expense(ExpenseCategory::Donations),
                ProfileField::EmploymentIncome,
            ]
        );
    }

    #[test]
    fn alternation_prefers_longest_phrase() {
        let phrases = vec!["recibo".to_string(), "recibos verdes".to_string()];

        assert_eq!(alternation(&phrases), "recibos verdes|recibo");
    }

    #[test]
    fn empty_vocabulary_list_never_matches() {
        let mut vocabulary = Vocabulary::default();
        vocabulary.regime.simplified.clear();

        let rules = RuleSet::compile(&vocabulary).unwrap();

        assert!(!rules.regime[1].pattern.is_match("regime simplificado"));
    }
}
