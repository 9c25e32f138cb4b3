//! Summarizer Module
//! Frequency tables, grouped means, grouped values and cross tabulations.

use crate::data::{Cell, Dataset};
use crate::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ordering of a frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyOrder {
    /// Numeric order for numeric columns, lexicographic otherwise.
    CategoryAscending,
    #[default]
    CountDescending,
}

/// What to do with value cells that are present but not numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonNumericPolicy {
    #[default]
    Exclude,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub category: String,
    pub count: usize,
}

/// Category counts of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub column: String,
    pub order: FrequencyOrder,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    /// Number of non-missing values counted.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.count)
    }

    pub fn pairs(&self) -> Vec<(&str, usize)> {
        self.entries
            .iter()
            .map(|e| (e.category.as_str(), e.count))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateEntry {
    pub category: String,
    /// NaN when the group had no usable values.
    pub mean: f64,
    pub count: usize,
}

/// Mean of a value column per group category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub group_column: String,
    pub value_column: String,
    pub entries: Vec<AggregateEntry>,
    /// Non-numeric cells skipped under [`NonNumericPolicy::Exclude`].
    pub excluded: usize,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupValues {
    pub category: String,
    pub values: Vec<f64>,
}

/// Raw numeric values per group category, for box charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedValues {
    pub group_column: String,
    pub value_column: String,
    pub groups: Vec<GroupValues>,
    pub excluded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossSeries {
    pub name: String,
    /// Aligned with [`CrossTable::categories`].
    pub counts: Vec<usize>,
}

/// Counts per category split into named series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTable {
    pub categories: Vec<String>,
    pub series: Vec<CrossSeries>,
}

impl CrossTable {
    pub fn total(&self) -> usize {
        self.series.iter().flat_map(|s| s.counts.iter()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn count(&self, category: &str, series: &str) -> Option<usize> {
        let idx = self.categories.iter().position(|c| c == category)?;
        self.series
            .iter()
            .find(|s| s.name == series)
            .and_then(|s| s.counts.get(idx).copied())
    }
}

/// Stateless summary operations over a [`Dataset`].
pub struct Summarizer;

impl Summarizer {
    /// Count each category of `column`; missing values are not counted.
    ///
    /// Ties keep the order in which categories first appear.
    pub fn frequency(
        dataset: &Dataset,
        column: &str,
        order: FrequencyOrder,
    ) -> Result<FrequencyTable> {
        let labels = dataset.labels(column)?;
        let numeric = dataset.is_numeric(column)?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<FrequencyEntry> = Vec::new();
        for label in labels.into_iter().flatten() {
            match index.get(&label) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(label.clone(), entries.len());
                    entries.push(FrequencyEntry {
                        category: label,
                        count: 1,
                    });
                }
            }
        }

        match order {
            FrequencyOrder::CountDescending => entries.sort_by(|a, b| b.count.cmp(&a.count)),
            FrequencyOrder::CategoryAscending => {
                entries.sort_by(|a, b| compare_categories(&a.category, &b.category, numeric))
            }
        }

        debug!(column, categories = entries.len(), "frequency table");
        Ok(FrequencyTable {
            column: column.to_string(),
            order,
            entries,
        })
    }

    /// Mean of `value_column` per category of `group_column`, ascending by category.
    pub fn grouped_mean(
        dataset: &Dataset,
        group_column: &str,
        value_column: &str,
        policy: NonNumericPolicy,
    ) -> Result<AggregateTable> {
        let grouped = Self::grouped_values(dataset, group_column, value_column, policy)?;

        let entries = grouped
            .groups
            .into_iter()
            .map(|g| {
                let count = g.values.len();
                let mean = if count == 0 {
                    f64::NAN
                } else {
                    g.values.iter().sum::<f64>() / count as f64
                };
                AggregateEntry {
                    category: g.category,
                    mean,
                    count,
                }
            })
            .collect();

        Ok(AggregateTable {
            group_column: grouped.group_column,
            value_column: grouped.value_column,
            entries,
            excluded: grouped.excluded,
        })
    }

    /// Numeric values of `value_column` collected per category of `group_column`.
    ///
    /// Every non-missing group category gets an entry, even if none of its
    /// values were usable.
    pub fn grouped_values(
        dataset: &Dataset,
        group_column: &str,
        value_column: &str,
        policy: NonNumericPolicy,
    ) -> Result<GroupedValues> {
        let groups = dataset.labels(group_column)?;
        let cells = dataset.cells(value_column)?;
        let numeric = dataset.is_numeric(group_column)?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut collected: Vec<GroupValues> = Vec::new();
        let mut excluded = 0usize;

        for (group, cell) in groups.into_iter().zip(cells) {
            let Some(group) = group else {
                continue;
            };
            let slot = *index.entry(group.clone()).or_insert_with(|| {
                collected.push(GroupValues {
                    category: group.clone(),
                    values: Vec::new(),
                });
                collected.len() - 1
            });

            match cell {
                Cell::Number(v) => collected[slot].values.push(v),
                Cell::Missing => {}
                Cell::Text(value) => match policy {
                    NonNumericPolicy::Exclude => excluded += 1,
                    NonNumericPolicy::Error => {
                        return Err(DashError::NonNumericValue {
                            column: value_column.to_string(),
                            category: group,
                            value,
                        });
                    }
                },
            }
        }

        collected.sort_by(|a, b| compare_categories(&a.category, &b.category, numeric));

        if excluded > 0 {
            debug!(value_column, excluded, "skipped non-numeric values");
        }

        Ok(GroupedValues {
            group_column: group_column.to_string(),
            value_column: value_column.to_string(),
            groups: collected,
            excluded,
        })
    }

    /// Rows counted by `(column, by)`; rows missing either value are skipped.
    pub fn crosstab(dataset: &Dataset, column: &str, by: &str) -> Result<CrossTable> {
        let rows = dataset.labels(column)?;
        let colors = dataset.labels(by)?;
        let rows_numeric = dataset.is_numeric(column)?;
        let colors_numeric = dataset.is_numeric(by)?;

        let pairs: Vec<(String, String)> = rows
            .into_iter()
            .zip(colors)
            .filter_map(|(r, c)| Some((r?, c?)))
            .collect();

        let categories = sorted_unique(pairs.iter().map(|(r, _)| r.as_str()), rows_numeric);
        let names = sorted_unique(pairs.iter().map(|(_, c)| c.as_str()), colors_numeric);

        let cat_index = position_map(&categories);
        let name_index = position_map(&names);

        let mut series: Vec<CrossSeries> = names
            .iter()
            .map(|name| CrossSeries {
                name: name.clone(),
                counts: vec![0; categories.len()],
            })
            .collect();

        for (r, c) in &pairs {
            series[name_index[c.as_str()]].counts[cat_index[r.as_str()]] += 1;
        }

        Ok(CrossTable { categories, series })
    }

    /// Frequency tables of several columns aligned on their shared categories.
    ///
    /// Each `(label, column)` becomes one series; absent categories count 0.
    pub fn compare_frequencies(
        dataset: &Dataset,
        columns: &[(String, String)],
    ) -> Result<CrossTable> {
        let mut tables = Vec::with_capacity(columns.len());
        let mut all_numeric = true;
        for (label, column) in columns {
            all_numeric &= dataset.is_numeric(column)?;
            tables.push((
                label.clone(),
                Self::frequency(dataset, column, FrequencyOrder::CategoryAscending)?,
            ));
        }

        let categories = sorted_unique(
            tables
                .iter()
                .flat_map(|(_, t)| t.entries.iter().map(|e| e.category.as_str())),
            all_numeric,
        );

        let series = tables
            .into_iter()
            .map(|(name, table)| CrossSeries {
                name,
                counts: categories
                    .iter()
                    .map(|c| table.get(c).unwrap_or(0))
                    .collect(),
            })
            .collect();

        Ok(CrossTable { categories, series })
    }
}

/// Numeric comparison when both labels parse, lexicographic otherwise.
fn compare_categories(a: &str, b: &str, numeric: bool) -> Ordering {
    if numeric {
        if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
            return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        }
    }
    a.cmp(b)
}

fn sorted_unique<'a>(labels: impl Iterator<Item = &'a str>, numeric: bool) -> Vec<String> {
    let mut unique: Vec<String> = labels
        .collect::<HashSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    unique.sort_by(|a, b| compare_categories(a, b, numeric).then_with(|| a.cmp(b)));
    unique
}

fn position_map(items: &[String]) -> HashMap<&str, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset(df: DataFrame) -> Dataset {
        Dataset::new(df, "memory")
    }

    fn repeated(parts: &[(&str, usize)]) -> Vec<String> {
        parts
            .iter()
            .flat_map(|(v, n)| std::iter::repeat(v.to_string()).take(*n))
            .collect()
    }

    #[test]
    fn sex_counts_descending() {
        let ds = dataset(df!("sex" => repeated(&[("M", 48), ("F", 52)])).unwrap());
        let table = Summarizer::frequency(&ds, "sex", FrequencyOrder::CountDescending).unwrap();
        assert_eq!(table.pairs(), vec![("F", 52), ("M", 48)]);
    }

    #[test]
    fn address_type_counts_sum_to_rows() {
        let ds = dataset(df!("address_type" => repeated(&[("U", 286), ("R", 63)])).unwrap());
        let table =
            Summarizer::frequency(&ds, "address_type", FrequencyOrder::CountDescending).unwrap();
        assert_eq!(table.total(), 349);
        assert_eq!(table.get("U"), Some(286));
        assert_eq!(table.get("R"), Some(63));
    }

    #[test]
    fn empty_dataset_gives_empty_table() {
        let ds = dataset(df!("sex" => Vec::<String>::new()).unwrap());
        let table = Summarizer::frequency(&ds, "sex", FrequencyOrder::CountDescending).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn missing_values_are_not_counted() {
        let values: Vec<Option<&str>> = vec![
            Some("F"),
            Some("M"),
            None,
            Some("F"),
            Some("M"),
            Some("F"),
            Some("F"),
            Some("M"),
            Some("F"),
            Some("M"),
        ];
        let ds = dataset(df!("sex" => values).unwrap());
        let table = Summarizer::frequency(&ds, "sex", FrequencyOrder::CountDescending).unwrap();
        assert_eq!(table.total(), 9);
    }

    #[test]
    fn ties_keep_first_appearance() {
        let ds = dataset(df!("reason" => &["home", "course", "course", "home", "other"]).unwrap());
        let table = Summarizer::frequency(&ds, "reason", FrequencyOrder::CountDescending).unwrap();
        assert_eq!(table.pairs(), vec![("home", 2), ("course", 2), ("other", 1)]);
    }

    #[test]
    fn category_order_is_numeric_for_numeric_columns() {
        let ds = dataset(df!("travel_time" => &[10i64, 2, 1, 2, 10, 10]).unwrap());
        let table =
            Summarizer::frequency(&ds, "travel_time", FrequencyOrder::CategoryAscending).unwrap();
        assert_eq!(table.pairs(), vec![("1", 1), ("2", 2), ("10", 3)]);
    }

    #[test]
    fn category_order_is_lexicographic_for_text() {
        let ds = dataset(df!("family_size" => &["LE3", "GT3", "GT3"]).unwrap());
        let table =
            Summarizer::frequency(&ds, "family_size", FrequencyOrder::CategoryAscending).unwrap();
        assert_eq!(table.pairs(), vec![("GT3", 2), ("LE3", 1)]);
    }

    #[test]
    fn frequency_is_idempotent() {
        let ds = dataset(df!("sex" => &["F", "M", "M", "F", "X"]).unwrap());
        let first = Summarizer::frequency(&ds, "sex", FrequencyOrder::CountDescending).unwrap();
        let second = Summarizer::frequency(&ds, "sex", FrequencyOrder::CountDescending).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn frequency_unknown_column() {
        let ds = dataset(df!("sex" => &["F"]).unwrap());
        let err = Summarizer::frequency(&ds, "Gender", FrequencyOrder::CountDescending).unwrap_err();
        assert!(matches!(err, DashError::ColumnNotFound { ref column, .. } if column == "Gender"));
    }

    #[test]
    fn grouped_mean_one_entry_per_group() {
        let ds = dataset(
            df!(
                "sex" => &[Some("M"), Some("F"), Some("F"), None, Some("M")],
                "final_grade" => &[Some(10.0), Some(12.0), Some(14.0), Some(20.0), None],
            )
            .unwrap(),
        );
        let table =
            Summarizer::grouped_mean(&ds, "sex", "final_grade", NonNumericPolicy::Exclude).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries[0].category, "F");
        assert_eq!(table.get("F"), Some(13.0));
        assert_eq!(table.get("M"), Some(10.0));
        assert_eq!(table.entries[1].count, 1);
    }

    #[test]
    fn grouped_mean_group_without_values_is_nan() {
        let ds = dataset(
            df!(
                "Gender" => &["Male", "Female"],
                "H.S.C (GPA)" => &[Some(4.5), None],
            )
            .unwrap(),
        );
        let table =
            Summarizer::grouped_mean(&ds, "Gender", "H.S.C (GPA)", NonNumericPolicy::Exclude)
                .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get("Female").unwrap().is_nan());
        assert_eq!(table.get("Male"), Some(4.5));
    }

    #[test]
    fn grouped_mean_excludes_non_numeric() {
        let ds = dataset(
            df!(
                "Gender" => &["Male", "Male", "Female"],
                "H.S.C (GPA)" => &["4.0", "absent", "5.0"],
            )
            .unwrap(),
        );
        let table =
            Summarizer::grouped_mean(&ds, "Gender", "H.S.C (GPA)", NonNumericPolicy::Exclude)
                .unwrap();
        assert_eq!(table.excluded, 1);
        assert_eq!(table.get("Male"), Some(4.0));
        assert_eq!(table.get("Female"), Some(5.0));
    }

    #[test]
    fn grouped_mean_strict_policy_fails() {
        let ds = dataset(
            df!(
                "Gender" => &["Male", "Male"],
                "H.S.C (GPA)" => &["4.0", "absent"],
            )
            .unwrap(),
        );
        let err = Summarizer::grouped_mean(&ds, "Gender", "H.S.C (GPA)", NonNumericPolicy::Error)
            .unwrap_err();
        match err {
            DashError::NonNumericValue {
                column,
                category,
                value,
            } => {
                assert_eq!(column, "H.S.C (GPA)");
                assert_eq!(category, "Male");
                assert_eq!(value, "absent");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn grouped_mean_missing_value_column() {
        let ds = dataset(df!("sex" => &["F"]).unwrap());
        let err = Summarizer::grouped_mean(&ds, "sex", "study_time", NonNumericPolicy::Exclude)
            .unwrap_err();
        assert!(matches!(err, DashError::ColumnNotFound { ref column, .. } if column == "study_time"));
    }

    #[test]
    fn grouped_values_keep_raw_values() {
        let ds = dataset(
            df!(
                "sex" => &["M", "F", "M"],
                "study_time" => &[1i64, 3, 2],
            )
            .unwrap(),
        );
        let grouped =
            Summarizer::grouped_values(&ds, "sex", "study_time", NonNumericPolicy::Exclude)
                .unwrap();
        assert_eq!(grouped.groups.len(), 2);
        assert_eq!(grouped.groups[0].category, "F");
        assert_eq!(grouped.groups[0].values, vec![3.0]);
        assert_eq!(grouped.groups[1].values, vec![1.0, 2.0]);
    }

    #[test]
    fn crosstab_counts_pairs() {
        let ds = dataset(
            df!(
                "year" => &[Some("1st"), Some("2nd"), Some("1st"), Some("1st"), None],
                "Gender" => &[Some("Male"), Some("Female"), Some("Female"), None, Some("Male")],
            )
            .unwrap(),
        );
        let table = Summarizer::crosstab(&ds, "year", "Gender").unwrap();
        assert_eq!(table.categories, vec!["1st", "2nd"]);
        assert_eq!(table.series.len(), 2);
        assert_eq!(table.series[0].name, "Female");
        assert_eq!(table.count("1st", "Male"), Some(1));
        assert_eq!(table.count("1st", "Female"), Some(1));
        assert_eq!(table.count("2nd", "Female"), Some(1));
        assert_eq!(table.count("2nd", "Male"), Some(0));
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn compare_aligns_on_union_of_categories() {
        let ds = dataset(
            df!(
                "mother_education" => &[4i64, 4, 2, 1],
                "father_education" => &[3i64, 2, 2, 0],
            )
            .unwrap(),
        );
        let columns = vec![
            ("Mother".to_string(), "mother_education".to_string()),
            ("Father".to_string(), "father_education".to_string()),
        ];
        let table = Summarizer::compare_frequencies(&ds, &columns).unwrap();
        assert_eq!(table.categories, vec!["0", "1", "2", "3", "4"]);
        assert_eq!(table.series[0].name, "Mother");
        assert_eq!(table.series[0].counts, vec![0, 1, 1, 0, 2]);
        assert_eq!(table.series[1].counts, vec![1, 0, 2, 1, 0]);
    }

    #[test]
    fn sorted_unique_dedups_and_orders_numerically() {
        let labels = ["10", "2", "10", "1", "2"];
        assert_eq!(sorted_unique(labels.into_iter(), true), vec!["1", "2", "10"]);
        assert_eq!(sorted_unique(labels.into_iter(), false), vec!["1", "10", "2"]);
    }

    #[test]
    fn na_tokens_from_csv_are_not_categories_or_values() {
        let csv = "sex,final_grade\nF,10\nNA,12\nM,N/A\nF,NaN\nM,14\n";
        let ds = Dataset::from_csv_bytes(csv.as_bytes().to_vec(), "inline").unwrap();

        let table = Summarizer::frequency(&ds, "sex", FrequencyOrder::CountDescending).unwrap();
        assert_eq!(table.pairs(), vec![("F", 2), ("M", 2)]);
        assert_eq!(table.total(), 4);

        let means =
            Summarizer::grouped_mean(&ds, "sex", "final_grade", NonNumericPolicy::Error).unwrap();
        assert_eq!(means.get("F"), Some(10.0));
        assert_eq!(means.get("M"), Some(14.0));
        assert_eq!(means.excluded, 0);
    }
}
