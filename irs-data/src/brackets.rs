use std::io::Read;

use irs_core::{TaxBracket, TaxParameterTable};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::LoaderError;

/// A single record from a bracket CSV file.
///
/// - `year`: the tax year (e.g., 2025)
/// - `min_income`: lower bound of the bracket, exclusive
/// - `max_income`: upper bound, inclusive (empty for unlimited)
/// - `rate`: marginal rate as a decimal (e.g., 0.125 for 12.5%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub year: i32,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl From<&BracketRecord> for TaxBracket {
    fn from(record: &BracketRecord) -> Self {
        TaxBracket {
            min_income: record.min_income,
            max_income: record.max_income,
            rate: record.rate,
        }
    }
}

/// Loader for bracket rows kept in CSV, one file possibly holding several years.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or
    /// a string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Brackets for `year`, ordered by lower bound.
    pub fn brackets_for(
        records: &[BracketRecord],
        year: i32,
    ) -> Result<Vec<TaxBracket>, LoaderError> {
        let mut brackets: Vec<TaxBracket> = records
            .iter()
            .filter(|r| r.year == year)
            .map(TaxBracket::from)
            .collect();
        if brackets.is_empty() {
            return Err(LoaderError::NoBracketsForYear(year));
        }
        brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
        Ok(brackets)
    }

    /// Replaces the brackets of `table` with the CSV rows for its year and
    /// re-validates the table.
    pub fn apply(
        table: &mut TaxParameterTable,
        records: &[BracketRecord],
    ) -> Result<usize, LoaderError> {
        let brackets = Self::brackets_for(records, table.tax_year)?;
        let count = brackets.len();
        table.brackets = brackets;
        table.validate()?;
        debug!(year = table.tax_year, count, "brackets replaced from CSV");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = r#"year,min_income,max_income,rate
2024,0,7703,0.13
2024,7703,11623,0.165
2024,11623,16472,0.22
2024,16472,21321,0.25
2024,21321,27146,0.32
2024,27146,39791,0.355
2024,39791,51997,0.435
2024,51997,81199,0.45
2024,81199,,0.48
2025,8059,12160,0.16
2025,0,8059,0.125
2025,12160,,0.215
"#;

    #[test]
    fn test_parse_csv_single_bracket() {
        let csv = "year,min_income,max_income,rate\n2025,0,8059,0.125";

        let records = BracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![BracketRecord {
                year: 2025,
                min_income: dec!(0),
                max_income: Some(dec!(8059)),
                rate: dec!(0.125),
            }]
        );
    }

    #[test]
    fn test_parse_csv_unlimited_max_income() {
        let csv = "year,min_income,max_income,rate\n2025,83696,,0.48";

        let records = BracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].max_income, None);
        assert_eq!(records[0].rate, dec!(0.48));
    }

    #[test]
    fn test_brackets_for_filters_and_sorts_by_year() {
        let records = BracketLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        let brackets = BracketLoader::brackets_for(&records, 2025).unwrap();

        assert_eq!(brackets.len(), 3);
        assert_eq!(brackets[0].min_income, dec!(0));
        assert_eq!(brackets[1].min_income, dec!(8059));
        assert_eq!(brackets[2].max_income, None);
        assert_eq!(
            BracketLoader::brackets_for(&records, 2024).unwrap().len(),
            9
        );
    }

    #[test]
    fn test_brackets_for_missing_year() {
        let records = BracketLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        let err = BracketLoader::brackets_for(&records, 2030).expect_err("no 2030 rows");

        assert!(matches!(err, LoaderError::NoBracketsForYear(2030)));
    }

    #[test]
    fn test_parse_invalid_csv_missing_column() {
        let csv = "year,min_income\n2025,0";

        let err = BracketLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");

        let LoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_invalid_csv_bad_decimal() {
        let csv = "year,min_income,max_income,rate\n2025,abc,8059,0.125";

        let err = BracketLoader::parse(csv.as_bytes()).expect_err("Should fail for bad decimal");

        assert!(matches!(err, LoaderError::CsvParse(_)));
    }
}
