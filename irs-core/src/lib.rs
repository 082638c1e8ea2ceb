pub mod calculations;
pub mod models;
pub mod repository;
pub mod validation;

pub use calculations::TaxEngine;
pub use models::*;
pub use repository::{ParameterRepository, RepositoryError};
pub use validation::{Adjustment, ValidationReport, Validator};
