use std::path::PathBuf;

use irs_chat::ExtractorError;
use irs_core::ParameterError;
use thiserror::Error;

/// Errors that can occur when loading configuration files.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No brackets for tax year {0}")]
    NoBracketsForYear(i32),

    #[error("Invalid parameter table: {0}")]
    Invalid(#[from] ParameterError),

    #[error("Invalid vocabulary: {0}")]
    Vocabulary(#[from] ExtractorError),
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::CsvParse(err.to_string())
    }
}

impl From<toml::de::Error> for LoaderError {
    fn from(err: toml::de::Error) -> Self {
        LoaderError::TomlParse(err.to_string())
    }
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, LoaderError> {
    std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
