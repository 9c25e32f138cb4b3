//! Dataset Module
//! Immutable survey table with category and numeric column access.

use crate::error::{DashError, Result};
use polars::prelude::*;
use std::io::Cursor;

/// Number of rows inspected when inferring column types.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Strings read as missing values, matching the usual spreadsheet and
/// dataframe conventions.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single cell read as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Null, empty or NaN.
    Missing,
    Number(f64),
    /// Present but not parseable as a number.
    Text(String),
}

/// Tabular data loaded once per view.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    source: String,
}

impl Dataset {
    pub fn new(df: DataFrame, source: impl Into<String>) -> Self {
        Self {
            df,
            source: source.into(),
        }
    }

    /// Parse CSV bytes with a header row and inferred column types.
    ///
    /// Cells that do not fit the inferred type become null, as do blank
    /// cells and any of [`NA_TOKENS`].
    pub fn from_csv_bytes(bytes: Vec<u8>, source: &str) -> Result<Self> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(DashError::EmptyDataset {
                source_name: source.to_string(),
            });
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_ignore_errors(true)
            .with_parse_options(CsvParseOptions::default().with_null_values(Some(
                NullValues::AllColumns(NA_TOKENS.iter().map(|t| (*t).into()).collect()),
            )))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        Ok(Self::new(df, source))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Names of columns with a numeric dtype.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Whether the named column holds numbers; drives category ordering.
    pub fn is_numeric(&self, name: &str) -> Result<bool> {
        Ok(is_numeric_dtype(self.column(name)?.dtype()))
    }

    /// Category labels of a column, `None` for missing entries.
    pub fn labels(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.column(name)?.as_materialized_series();
        Ok(series.iter().map(|value| label_of(&value)).collect())
    }

    /// Column values coerced to numbers where possible.
    pub fn cells(&self, name: &str) -> Result<Vec<Cell>> {
        let series = self.column(name)?.as_materialized_series();
        Ok(series.iter().map(|value| cell_of(&value)).collect())
    }

    fn column(&self, name: &str) -> Result<&Column> {
        let present = self
            .df
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == name);
        if !present {
            return Err(DashError::ColumnNotFound {
                column: name.to_string(),
                available: self.column_names(),
            });
        }
        Ok(self.df.column(name)?)
    }
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn is_missing_text(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || NA_TOKENS.contains(&trimmed)
}

fn label_of(value: &AnyValue<'_>) -> Option<String> {
    if value.is_null() {
        return None;
    }
    if let Some(s) = value.get_str() {
        return (!is_missing_text(s)).then(|| s.to_string());
    }
    match value {
        AnyValue::Float64(f) if f.is_nan() => None,
        AnyValue::Float32(f) if f.is_nan() => None,
        other => Some(other.to_string().trim_matches('"').to_string()),
    }
}

fn cell_of(value: &AnyValue<'_>) -> Cell {
    if value.is_null() {
        return Cell::Missing;
    }
    if let Some(s) = value.get_str() {
        if is_missing_text(s) {
            return Cell::Missing;
        }
        return match s.trim().parse::<f64>() {
            Ok(n) if n.is_nan() => Cell::Missing,
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(s.to_string()),
        };
    }
    if let AnyValue::Boolean(b) = value {
        return Cell::Number(if *b { 1.0 } else { 0.0 });
    }
    match value.extract::<f64>() {
        Some(n) if n.is_nan() => Cell::Missing,
        Some(n) => Cell::Number(n),
        None => Cell::Text(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let df = df!(
            "sex" => &[Some("F"), Some("M"), None, Some("F")],
            "final_grade" => &[Some(12i64), Some(9), Some(15), None],
        )
        .unwrap();
        Dataset::new(df, "memory")
    }

    #[test]
    fn labels_skip_nulls() {
        let ds = sample();
        let labels = ds.labels("sex").unwrap();
        assert_eq!(
            labels,
            vec![Some("F".to_string()), Some("M".to_string()), None, Some("F".to_string())]
        );
    }

    #[test]
    fn numeric_labels_have_no_quotes() {
        let ds = sample();
        let labels = ds.labels("final_grade").unwrap();
        assert_eq!(labels[0].as_deref(), Some("12"));
        assert_eq!(labels[3], None);
    }

    #[test]
    fn missing_column_lists_available_columns() {
        let ds = sample();
        match ds.labels("Gender") {
            Err(DashError::ColumnNotFound { column, available }) => {
                assert_eq!(column, "Gender");
                assert_eq!(available, vec!["sex", "final_grade"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn cells_parse_text_numbers() {
        let df = df!("gpa" => &[Some("3.5"), Some(" 4 "), Some("absent"), None, Some("")]).unwrap();
        let ds = Dataset::new(df, "memory");
        assert_eq!(
            ds.cells("gpa").unwrap(),
            vec![
                Cell::Number(3.5),
                Cell::Number(4.0),
                Cell::Text("absent".to_string()),
                Cell::Missing,
                Cell::Missing,
            ]
        );
    }

    #[test]
    fn csv_bytes_infer_numeric_columns() {
        let csv = "sex,final_grade,address_type\nF,10,U\nM,12,R\nF,,U\n";
        let ds = Dataset::from_csv_bytes(csv.as_bytes().to_vec(), "inline").unwrap();
        assert_eq!(ds.row_count(), 3);
        assert!(ds.is_numeric("final_grade").unwrap());
        assert!(!ds.is_numeric("sex").unwrap());
        assert_eq!(ds.numeric_columns(), vec!["final_grade"]);
        assert_eq!(ds.cells("final_grade").unwrap()[2], Cell::Missing);
    }

    #[test]
    fn na_tokens_are_missing() {
        let csv = "sex,final_grade\nF,10\nNA,12\nM,N/A\nF,NaN\nM,14\n";
        let ds = Dataset::from_csv_bytes(csv.as_bytes().to_vec(), "inline").unwrap();
        assert_eq!(
            ds.labels("sex").unwrap(),
            vec![
                Some("F".to_string()),
                None,
                Some("M".to_string()),
                Some("F".to_string()),
                Some("M".to_string()),
            ]
        );
        let grades = ds.cells("final_grade").unwrap();
        assert_eq!(grades[2], Cell::Missing);
        assert_eq!(grades[3], Cell::Missing);
        assert_eq!(grades[4], Cell::Number(14.0));
    }

    #[test]
    fn in_memory_na_text_agrees_between_labels_and_cells() {
        let df = df!("answer" => &["NaN", "null", "Yes"]).unwrap();
        let ds = Dataset::new(df, "memory");
        assert_eq!(ds.labels("answer").unwrap(), vec![None, None, Some("Yes".to_string())]);
        assert_eq!(
            ds.cells("answer").unwrap(),
            vec![Cell::Missing, Cell::Missing, Cell::Text("Yes".to_string())]
        );
    }

    #[test]
    fn blank_input_is_empty_dataset() {
        let err = Dataset::from_csv_bytes(b"  \n".to_vec(), "blank.csv").unwrap_err();
        assert!(matches!(err, DashError::EmptyDataset { .. }));
    }
}
