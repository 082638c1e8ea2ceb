//! Multi-turn collection of a [`FiscalProfile`].
//!
//! [`ConversationState`] is a value: [`ConversationState::respond`] consumes
//! the current state and returns the next one, so a session can be stored,
//! replayed or dropped without shared mutable state.

use irs_core::{ExpenseCategory, FiscalProfile, ProfileField};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extractor::FieldExtractor;

/// Weighted confidence a profile must exceed before it counts as complete.
pub const COMPLETENESS_THRESHOLD: f64 = 0.7;

const INCOME_WEIGHT: f64 = 2.0;
const CIVIL_STATUS_WEIGHT: f64 = 2.0;
const DEPENDENTS_WEIGHT: f64 = 2.0;
const EXPENSE_WEIGHT: f64 = 1.0;
const WEIGHTED_EXPENSES: [ExpenseCategory; 3] = [
    ExpenseCategory::Health,
    ExpenseCategory::Education,
    ExpenseCategory::Housing,
];

/// Share of the weighted fields a profile has filled, in `[0, 1]`.
///
/// Income, civil status and dependents weigh 2 each; health, education and
/// housing expenses weigh 1 each.
pub fn profile_confidence(profile: &FiscalProfile) -> f64 {
    let max = INCOME_WEIGHT
        + CIVIL_STATUS_WEIGHT
        + DEPENDENTS_WEIGHT
        + EXPENSE_WEIGHT * WEIGHTED_EXPENSES.len() as f64;

    let mut score = 0.0;
    if profile.has_income() {
        score += INCOME_WEIGHT;
    }
    if profile.civil_status.is_some() {
        score += CIVIL_STATUS_WEIGHT;
    }
    if profile.dependents.is_some() {
        score += DEPENDENTS_WEIGHT;
    }
    for category in WEIGHTED_EXPENSES {
        if profile.expense(category).is_some() {
            score += EXPENSE_WEIGHT;
        }
    }
    score / max
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Step {
    #[default]
    Greeting,
    Income,
    CivilStatus,
    Dependents,
    Health,
    Education,
    Complete,
}

impl Step {
    /// Question steps in the order they are asked.
    pub const QUESTIONS: [Step; 5] = [
        Step::Income,
        Step::CivilStatus,
        Step::Dependents,
        Step::Health,
        Step::Education,
    ];

    /// Field the step asks for. Income is asked as employment income; any
    /// income slot satisfies it.
    pub fn field(&self) -> Option<ProfileField> {
        match self {
            Step::Income => Some(ProfileField::EmploymentIncome),
            Step::CivilStatus => Some(ProfileField::CivilStatus),
            Step::Dependents => Some(ProfileField::Dependents),
            Step::Health => Some(ProfileField::Expense(ExpenseCategory::Health)),
            Step::Education => Some(ProfileField::Expense(ExpenseCategory::Education)),
            Step::Greeting | Step::Complete => None,
        }
    }

    pub fn is_filled(
        &self,
        profile: &FiscalProfile,
    ) -> bool {
        match self {
            Step::Greeting => true,
            Step::Income => profile.has_income(),
            Step::Complete => false,
            other => other.field().is_some_and(|field| profile.is_set(field)),
        }
    }

    /// Expense steps may be declined; a reply that fills nothing records zero.
    pub fn is_optional(&self) -> bool {
        matches!(self, Step::Health | Step::Education)
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Step::Greeting => {
                "Olá! Vou ajudar a estimar o seu IRS. Conte-me um pouco sobre a sua situação."
            }
            Step::Income => {
                "Quanto ganha? Pode indicar o valor mensal ou anual (por exemplo, 1.500€ por mês)."
            }
            Step::CivilStatus => {
                "Qual é o seu estado civil? (solteiro, casado, divorciado ou viúvo)"
            }
            Step::Dependents => "Quantos dependentes tem a seu cargo?",
            Step::Health => {
                "Quanto gastou em saúde este ano? Se não teve despesas, diga \"nenhuma\"."
            }
            Step::Education => {
                "E em educação? Se não teve despesas, diga \"nenhuma\"."
            }
            Step::Complete => "Tenho os dados necessários para calcular a sua estimativa.",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            Step::Income => Some("Indique um valor, por exemplo \"ganho 1.500€ por mês\"."),
            Step::CivilStatus => Some("Responda, por exemplo, \"sou casado\" ou \"solteira\"."),
            Step::Dependents => Some("Indique um número, por exemplo \"2\" ou \"nenhum\"."),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Accumulated profile, current step and the turns that led there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    profile: FiscalProfile,
    step: Step,
    history: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> &FiscalProfile {
        &self.profile
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn confidence(&self) -> f64 {
        profile_confidence(&self.profile)
    }

    /// Computable and above [`COMPLETENESS_THRESHOLD`].
    pub fn is_complete(&self) -> bool {
        self.profile.is_computable() && self.confidence() > COMPLETENESS_THRESHOLD
    }

    /// Fields of the question steps still unanswered, in asking order.
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        Step::QUESTIONS
            .iter()
            .filter(|step| !step.is_filled(&self.profile))
            .filter_map(|step| step.field())
            .collect()
    }

    /// The question for the current step.
    pub fn prompt(&self) -> &'static str {
        self.step.prompt()
    }

    /// Folds one user reply into the state and returns the next state, whose
    /// last history turn is the assistant's reply.
    ///
    /// Re-extracted fields overwrite stored ones. The step pointer only
    /// moves forward, to the first unanswered question or to
    /// [`Step::Complete`].
    pub fn respond(
        self,
        input: &str,
        extractor: &FieldExtractor,
    ) -> Self {
        let mut state = self;
        let asked = state.step.field();
        let partial = extractor.extract_for(input, asked);
        state.profile.merge(&partial);
        state.history.push(Turn {
            speaker: Speaker::User,
            text: input.to_string(),
        });

        match asked {
            Some(ProfileField::Expense(category))
                if state.step.is_optional() && !state.step.is_filled(&state.profile) =>
            {
                state.profile.set_expense(category, Decimal::ZERO);
            }
            _ => {}
        }

        let previous = state.step;
        let next = if previous == Step::Complete || state.is_complete() {
            Step::Complete
        } else {
            state.next_unanswered().max(previous)
        };
        state.step = next;
        debug!(
            ?previous,
            ?next,
            confidence = state.confidence(),
            "conversation advanced"
        );

        let reply = match previous.hint() {
            Some(hint) if next == previous => format!("Não percebi. {hint} {}", next.prompt()),
            _ => next.prompt().to_string(),
        };
        state.history.push(Turn {
            speaker: Speaker::Assistant,
            text: reply,
        });
        state
    }

    /// A fresh conversation.
    pub fn reset(self) -> Self {
        debug!("conversation reset");
        Self::new()
    }

    fn next_unanswered(&self) -> Step {
        Step::QUESTIONS
            .into_iter()
            .find(|step| !step.is_filled(&self.profile))
            .unwrap_or(Step::Complete)
    }
}
