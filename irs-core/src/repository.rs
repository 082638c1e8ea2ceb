use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ParameterError, TaxParameterTable};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("No parameter table for tax year {0}")]
    NotFound(i32),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed parameter table: {0}")]
    Malformed(String),

    #[error("Invalid parameter table: {0}")]
    Invalid(#[from] ParameterError),
}

/// Source of versioned tax parameter tables.
///
/// Tables are configuration: each backend stores one table per tax year and
/// hands back a validated copy.
#[async_trait]
pub trait ParameterRepository: Send + Sync {
    async fn get_parameter_table(&self, year: i32) -> Result<TaxParameterTable, RepositoryError>;

    /// Years with a stored table, ascending.
    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError>;
}
