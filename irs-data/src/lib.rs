//! Loading versioned configuration from disk.
//!
//! Parameter tables are TOML files (`irs_<year>.toml`); bracket rows may also
//! come from CSV; the extractor vocabulary can be overridden from TOML.

pub mod brackets;
pub mod error;
pub mod parameters;
pub mod repository;
pub mod vocabulary;

pub use brackets::{BracketLoader, BracketRecord};
pub use error::LoaderError;
pub use parameters::ParameterTableLoader;
pub use repository::FileParameterRepository;
pub use vocabulary::VocabularyLoader;
