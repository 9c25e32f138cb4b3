//! Chart Series Module
//! Chart-ready data built from summary tables, plus the color palette.

use crate::config::ChartKind;
use crate::stats::{AggregateTable, CrossTable, FrequencyTable, GroupedValues};
use plotters::style::RGBColor;

/// Soft qualitative palette; colors repeat after the last entry.
pub const PALETTE: [RGBColor; 11] = [
    RGBColor(102, 197, 204),
    RGBColor(246, 207, 113),
    RGBColor(248, 156, 116),
    RGBColor(220, 176, 242),
    RGBColor(135, 197, 95),
    RGBColor(158, 185, 243),
    RGBColor(254, 136, 177),
    RGBColor(201, 219, 116),
    RGBColor(139, 224, 164),
    RGBColor(180, 151, 231),
    RGBColor(179, 179, 179),
];

pub fn palette_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Titles and pixel size of one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub width: u32,
    pub height: u32,
}

/// Data for a single chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// One value per category; `decimals` controls the bar labels.
    Values {
        categories: Vec<String>,
        values: Vec<f64>,
        decimals: usize,
    },
    /// Several named series over shared categories.
    Series {
        categories: Vec<String>,
        series: Vec<(String, Vec<f64>)>,
    },
    /// Raw samples per category.
    Samples {
        categories: Vec<String>,
        samples: Vec<Vec<f64>>,
    },
}

impl ChartData {
    pub fn categories(&self) -> &[String] {
        match self {
            ChartData::Values { categories, .. }
            | ChartData::Series { categories, .. }
            | ChartData::Samples { categories, .. } => categories,
        }
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Values { values, .. } => !values.iter().any(|v| v.is_finite()),
            ChartData::Series { series, .. } => !series
                .iter()
                .flat_map(|(_, v)| v.iter())
                .any(|v| v.is_finite() && *v > 0.0),
            ChartData::Samples { samples, .. } => samples.iter().all(|s| s.is_empty()),
        }
    }

    /// Whether a chart of `kind` can draw this data.
    pub fn fits(&self, kind: ChartKind) -> bool {
        matches!(
            (kind, self),
            (ChartKind::Bar | ChartKind::Pie | ChartKind::Donut, ChartData::Values { .. })
                | (ChartKind::Box, ChartData::Samples { .. })
                | (ChartKind::Histogram, ChartData::Series { .. })
        )
    }
}

impl From<&FrequencyTable> for ChartData {
    fn from(table: &FrequencyTable) -> Self {
        ChartData::Values {
            categories: table.entries.iter().map(|e| e.category.clone()).collect(),
            values: table.entries.iter().map(|e| e.count as f64).collect(),
            decimals: 0,
        }
    }
}

impl From<&AggregateTable> for ChartData {
    fn from(table: &AggregateTable) -> Self {
        ChartData::Values {
            categories: table.entries.iter().map(|e| e.category.clone()).collect(),
            values: table.entries.iter().map(|e| e.mean).collect(),
            decimals: 2,
        }
    }
}

impl From<&GroupedValues> for ChartData {
    fn from(grouped: &GroupedValues) -> Self {
        ChartData::Samples {
            categories: grouped.groups.iter().map(|g| g.category.clone()).collect(),
            samples: grouped.groups.iter().map(|g| g.values.clone()).collect(),
        }
    }
}

impl From<&CrossTable> for ChartData {
    fn from(table: &CrossTable) -> Self {
        ChartData::Series {
            categories: table.categories.clone(),
            series: table
                .series
                .iter()
                .map(|s| (s.name.clone(), s.counts.iter().map(|&c| c as f64).collect()))
                .collect(),
        }
    }
}
