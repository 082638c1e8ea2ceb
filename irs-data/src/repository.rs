use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use irs_core::{ParameterRepository, RepositoryError, TaxParameterTable};
use tracing::{debug, warn};

/// Parameter tables stored as `irs_<year>.toml` files in one directory.
#[derive(Debug, Clone)]
pub struct FileParameterRepository {
    dir: PathBuf,
}

impl FileParameterRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(
        &self,
        year: i32,
    ) -> PathBuf {
        self.dir.join(format!("irs_{year}.toml"))
    }
}

/// Tax year encoded in a file name such as `irs_2025.toml`.
fn year_from_file_name(name: &str) -> Option<i32> {
    name.strip_prefix("irs_")?
        .strip_suffix(".toml")?
        .parse()
        .ok()
}

#[async_trait]
impl ParameterRepository for FileParameterRepository {
    async fn get_parameter_table(&self, year: i32) -> Result<TaxParameterTable, RepositoryError> {
        let path = self.path_for(year);
        let source = match tokio::fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(year));
            }
            Err(e) => {
                return Err(RepositoryError::Storage(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let table: TaxParameterTable = toml::from_str(&source)
            .map_err(|e| RepositoryError::Malformed(format!("{}: {}", path.display(), e)))?;
        if table.tax_year != year {
            return Err(RepositoryError::Malformed(format!(
                "{} declares tax year {}",
                path.display(),
                table.tax_year
            )));
        }
        table.validate()?;

        debug!(year, path = %path.display(), "parameter table read");
        Ok(table)
    }

    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| RepositoryError::Storage(format!("{}: {}", self.dir.display(), e)))?;

        let mut years = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
        {
            let name = entry.file_name();
            match name.to_str().and_then(year_from_file_name) {
                Some(year) => years.push(year),
                None => warn!(file = ?name, "ignoring file in parameter directory"),
            }
        }
        years.sort_unstable();
        Ok(years)
    }
}
