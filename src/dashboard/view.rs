//! View Module
//! Turns one configured page and its dataset into a rendered view.

use crate::charts::{ChartData, ChartRenderer, ChartSpec};
use crate::config::{DashboardConfig, MetricCard, PageSpec, SectionSpec, SummarySpec};
use crate::data::Dataset;
use crate::error::{DashError, Result};
use crate::stats::{
    describe_groups, AggregateTable, CrossTable, FrequencyTable, GroupSummary, NonNumericPolicy,
    Summarizer,
};
use tracing::debug;

/// Settings shared by every view of a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub chart_width: u32,
    pub chart_height: u32,
    pub non_numeric: NonNumericPolicy,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            chart_width: 900,
            chart_height: 480,
            non_numeric: NonNumericPolicy::Exclude,
        }
    }
}

impl From<&DashboardConfig> for ViewOptions {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            chart_width: config.chart.width,
            chart_height: config.chart.height,
            non_numeric: config.summary.non_numeric,
        }
    }
}

/// The table printed next to a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryTable {
    Frequency(FrequencyTable),
    Aggregate(AggregateTable),
    Distribution(Vec<GroupSummary>),
    Cross {
        /// Header of the category column.
        category_title: String,
        table: CrossTable,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSection {
    pub title: String,
    pub narrative: Option<String>,
    pub table: Option<SummaryTable>,
    pub chart_svg: String,
    /// Non-numeric cells skipped while summarizing.
    pub excluded: usize,
}

/// One rendered dashboard page.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub slug: String,
    pub title: String,
    pub heading: String,
    pub intro: Option<String>,
    pub source: String,
    pub row_count: usize,
    pub metrics: Vec<MetricCard>,
    pub sections: Vec<RenderedSection>,
}

/// Render every section of `page` from `dataset`.
///
/// Depends only on its arguments. The first failing section aborts the
/// whole view.
pub fn render_view(page: &PageSpec, dataset: &Dataset, options: &ViewOptions) -> Result<View> {
    if dataset.is_empty() {
        return Err(DashError::EmptyDataset {
            source_name: dataset.source().to_string(),
        });
    }

    let sections = page
        .sections
        .iter()
        .map(|section| render_section(section, dataset, options))
        .collect::<Result<Vec<_>>>()?;

    Ok(View {
        slug: page.slug.clone(),
        title: page.title.clone(),
        heading: page.heading().to_string(),
        intro: page.intro.clone(),
        source: dataset.source().to_string(),
        row_count: dataset.row_count(),
        metrics: page.metrics.clone(),
        sections,
    })
}

fn render_section(
    section: &SectionSpec,
    dataset: &Dataset,
    options: &ViewOptions,
) -> Result<RenderedSection> {
    let (table, data, excluded, x_default, y_default) = match &section.summary {
        SummarySpec::Frequency { column, order } => {
            let table = Summarizer::frequency(dataset, column, *order)?;
            let data = ChartData::from(&table);
            (
                SummaryTable::Frequency(table),
                data,
                0,
                column.clone(),
                "Count".to_string(),
            )
        }
        SummarySpec::GroupedMean { group, value } => {
            let table = Summarizer::grouped_mean(dataset, group, value, options.non_numeric)?;
            let data = ChartData::from(&table);
            let excluded = table.excluded;
            (
                SummaryTable::Aggregate(table),
                data,
                excluded,
                group.clone(),
                format!("Average {value}"),
            )
        }
        SummarySpec::Distribution { group, value } => {
            let grouped = Summarizer::grouped_values(dataset, group, value, options.non_numeric)?;
            let data = ChartData::from(&grouped);
            (
                SummaryTable::Distribution(describe_groups(&grouped)),
                data,
                grouped.excluded,
                group.clone(),
                value.clone(),
            )
        }
        SummarySpec::Crosstab { column, by } => {
            let table = Summarizer::crosstab(dataset, column, by)?;
            let data = ChartData::from(&table);
            (
                SummaryTable::Cross {
                    category_title: column.clone(),
                    table,
                },
                data,
                0,
                column.clone(),
                "Count".to_string(),
            )
        }
        SummarySpec::Compare { columns } => {
            let pairs: Vec<(String, String)> = columns
                .iter()
                .map(|c| (c.label.clone(), c.column.clone()))
                .collect();
            let table = Summarizer::compare_frequencies(dataset, &pairs)?;
            let data = ChartData::from(&table);
            (
                SummaryTable::Cross {
                    category_title: "Category".to_string(),
                    table,
                },
                data,
                0,
                "Category".to_string(),
                "Count".to_string(),
            )
        }
    };

    let spec = ChartSpec {
        kind: section.chart,
        title: section.title.clone(),
        x_title: section.x_title.clone().unwrap_or(x_default),
        y_title: section.y_title.clone().unwrap_or(y_default),
        width: options.chart_width,
        height: options.chart_height,
    };
    let chart_svg = ChartRenderer::render_svg(&spec, &data)?;

    debug!(
        section = %section.title,
        chart = section.chart.name(),
        summary = section.summary.kind_name(),
        "rendered section"
    );

    Ok(RenderedSection {
        title: section.title.clone(),
        narrative: section.narrative.clone(),
        table: section.show_table.then_some(table),
        chart_svg,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChartKind, CompareColumn};
    use crate::stats::FrequencyOrder;
    use polars::prelude::*;

    fn students() -> Dataset {
        let df = df!(
            "sex" => &["F", "M", "F", "F", "M"],
            "final_grade" => &[12i64, 10, 15, 11, 9],
            "mother_education" => &[4i64, 2, 3, 4, 1],
            "father_education" => &[3i64, 2, 2, 4, 1],
        )
        .unwrap();
        Dataset::new(df, "students.csv")
    }

    fn section(title: &str, chart: ChartKind, summary: SummarySpec) -> SectionSpec {
        SectionSpec {
            title: title.to_string(),
            chart,
            summary,
            narrative: None,
            show_table: true,
            x_title: None,
            y_title: None,
        }
    }

    fn page(sections: Vec<SectionSpec>) -> PageSpec {
        PageSpec {
            slug: "gender".to_string(),
            title: "School GP15 Math".to_string(),
            header: Some("GP15 Gender Data Analysis".to_string()),
            source: "students.csv".to_string(),
            intro: None,
            metrics: vec![],
            sections,
        }
    }

    #[test]
    fn renders_every_section() {
        let spec = page(vec![
            section(
                "Distribution of Sex",
                ChartKind::Pie,
                SummarySpec::Frequency {
                    column: "sex".to_string(),
                    order: FrequencyOrder::CountDescending,
                },
            ),
            section(
                "Final Grade by Sex",
                ChartKind::Box,
                SummarySpec::Distribution {
                    group: "sex".to_string(),
                    value: "final_grade".to_string(),
                },
            ),
            section(
                "Parental Education",
                ChartKind::Histogram,
                SummarySpec::Compare {
                    columns: vec![
                        CompareColumn {
                            label: "Mother".to_string(),
                            column: "mother_education".to_string(),
                        },
                        CompareColumn {
                            label: "Father".to_string(),
                            column: "father_education".to_string(),
                        },
                    ],
                },
            ),
        ]);

        let view = render_view(&spec, &students(), &ViewOptions::default()).unwrap();
        assert_eq!(view.heading, "GP15 Gender Data Analysis");
        assert_eq!(view.row_count, 5);
        assert_eq!(view.sections.len(), 3);
        assert!(view.sections.iter().all(|s| s.chart_svg.contains("<svg")));

        match &view.sections[0].table {
            Some(SummaryTable::Frequency(table)) => {
                assert_eq!(table.pairs(), vec![("F", 3), ("M", 2)]);
            }
            other => panic!("unexpected table: {other:?}"),
        }
        match &view.sections[1].table {
            Some(SummaryTable::Distribution(groups)) => {
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].group_name, "F");
            }
            other => panic!("unexpected table: {other:?}"),
        }
    }

    #[test]
    fn hidden_table_is_omitted() {
        let mut s = section(
            "Mean Grade",
            ChartKind::Bar,
            SummarySpec::GroupedMean {
                group: "sex".to_string(),
                value: "final_grade".to_string(),
            },
        );
        s.show_table = false;
        let view = render_view(&page(vec![s]), &students(), &ViewOptions::default()).unwrap();
        assert!(view.sections[0].table.is_none());
        assert!(view.sections[0].chart_svg.contains("12.67"));
    }

    #[test]
    fn missing_column_fails_whole_view() {
        let spec = page(vec![
            section(
                "Distribution of Sex",
                ChartKind::Pie,
                SummarySpec::Frequency {
                    column: "sex".to_string(),
                    order: FrequencyOrder::CountDescending,
                },
            ),
            section(
                "Travel Time",
                ChartKind::Bar,
                SummarySpec::Frequency {
                    column: "travel_time".to_string(),
                    order: FrequencyOrder::CategoryAscending,
                },
            ),
        ]);
        let err = render_view(&spec, &students(), &ViewOptions::default()).unwrap_err();
        assert!(matches!(err, DashError::ColumnNotFound { ref column, .. } if column == "travel_time"));
    }

    #[test]
    fn empty_dataset_fails_view() {
        let df = df!("sex" => Vec::<String>::new()).unwrap();
        let dataset = Dataset::new(df, "empty.csv");
        let err = render_view(&page(vec![]), &dataset, &ViewOptions::default()).unwrap_err();
        assert!(matches!(err, DashError::EmptyDataset { .. }));
    }
}
