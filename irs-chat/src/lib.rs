//! Natural-language front end for the IRS estimator.
//!
//! [`FieldExtractor`] turns Portuguese free text into a partial
//! [`irs_core::FiscalProfile`]; [`ConversationState`] accumulates those
//! partial profiles over several turns and decides what to ask next.

pub mod amount;
pub mod conversation;
pub mod extractor;
pub mod rules;
pub mod text;
pub mod vocabulary;

pub use amount::{Frequency, format_amount, normalize_amount, parse_amount};
pub use conversation::{ConversationState, Speaker, Step, Turn, profile_confidence};
pub use extractor::{Extraction, FieldExtractor, RuleMatch};
pub use rules::{ExtractorError, RuleSet};
pub use vocabulary::Vocabulary;
