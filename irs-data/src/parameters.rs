use std::path::Path;

use irs_core::TaxParameterTable;
use tracing::debug;

use crate::error::{LoaderError, read_file};

/// Reads [`TaxParameterTable`]s from TOML.
///
/// Every table is validated before it is returned, so callers never see a
/// table with gaps between brackets or negative allowances.
pub struct ParameterTableLoader;

impl ParameterTableLoader {
    pub fn from_toml_str(source: &str) -> Result<TaxParameterTable, LoaderError> {
        let table: TaxParameterTable = toml::from_str(source)?;
        table.validate()?;
        debug!(
            year = table.tax_year,
            brackets = table.brackets.len(),
            "parameter table loaded"
        );
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<TaxParameterTable, LoaderError> {
        Self::from_toml_str(&read_file(path)?)
    }
}

#[cfg(test)]
mod tests {
    use irs_core::ParameterError;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const MINIMAL: &str = r#"
tax_year = 2030
simplified_expense_rate = "0.25"

[[brackets]]
min_income = "0"
max_income = "10000"
rate = "0.10"

[[brackets]]
min_income = "10000"
rate = "0.30"

[allowances]
personal = "4000"
spouse = "4000"
dependent = "600"
third_plus_dependent = "900"

[deductions]
health = { rate = "0.15", cap = "1000" }
education = { rate = "0.30", cap = "800" }
housing = { rate = "0.15", cap = "700" }
donations = { rate = "0.25", cap = "500" }
"#;

    #[test]
    fn test_minimal_table_uses_defaults() {
        let table = ParameterTableLoader::from_toml_str(MINIMAL).unwrap();

        assert_eq!(table.tax_year, 2030);
        assert_eq!(table.brackets.len(), 2);
        assert_eq!(table.brackets[1].max_income, None);
        assert_eq!(table.allowances.disabled_dependent, dec!(0));
        assert_eq!(table.limits.max_dependents, 10);
    }

    #[test]
    fn test_invalid_table_is_rejected() {
        let gap = MINIMAL.replace("min_income = \"10000\"", "min_income = \"12000\"");

        let err = ParameterTableLoader::from_toml_str(&gap).expect_err("gap between brackets");

        assert!(matches!(
            err,
            LoaderError::Invalid(ParameterError::NotContiguous { index: 1, .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ParameterTableLoader::from_toml_str("tax_year = ").expect_err("bad toml");

        assert!(matches!(err, LoaderError::TomlParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ParameterTableLoader::from_path(Path::new("does/not/exist.toml"))
            .expect_err("missing file");

        assert!(matches!(err, LoaderError::Io { .. }));
    }
}
