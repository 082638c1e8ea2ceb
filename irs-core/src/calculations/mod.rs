//! Tax computation for a fiscal profile.

pub mod common;
pub mod engine;

pub use engine::{TaxEngine, compute};
