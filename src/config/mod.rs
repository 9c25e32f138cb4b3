//! Dashboard configuration - the table of pages and their sections.
//!
//! A dashboard is described entirely by data: each page names a CSV source
//! and an ordered list of sections, and each section pairs one summary with
//! one chart kind. Configuration is read from TOML; a built-in table of the
//! GP15 and Arts Faculty pages ships with the binary.

use crate::data::LoaderOptions;
use crate::error::{DashError, Result};
use crate::stats::{FrequencyOrder, NonNumericPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

const BUILTIN_CONFIG: &str = include_str!("default.toml");

/// Chart used to display a section's summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Pie,
    Donut,
    Box,
    /// Grouped bars, one color per series.
    Histogram,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Donut => "donut",
            ChartKind::Box => "box",
            ChartKind::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareColumn {
    pub label: String,
    pub column: String,
}

/// The computation behind a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummarySpec {
    Frequency {
        column: String,
        #[serde(default)]
        order: FrequencyOrder,
    },
    GroupedMean {
        group: String,
        value: String,
    },
    /// Raw values per group, drawn as box plots.
    Distribution {
        group: String,
        value: String,
    },
    Crosstab {
        column: String,
        by: String,
    },
    /// Several columns' frequencies side by side.
    Compare {
        columns: Vec<CompareColumn>,
    },
}

impl SummarySpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SummarySpec::Frequency { .. } => "frequency",
            SummarySpec::GroupedMean { .. } => "grouped_mean",
            SummarySpec::Distribution { .. } => "distribution",
            SummarySpec::Crosstab { .. } => "crosstab",
            SummarySpec::Compare { .. } => "compare",
        }
    }

    /// Whether `chart` can display this summary.
    pub fn allows(&self, chart: ChartKind) -> bool {
        match self {
            SummarySpec::Frequency { .. } => {
                matches!(chart, ChartKind::Bar | ChartKind::Pie | ChartKind::Donut)
            }
            SummarySpec::GroupedMean { .. } => chart == ChartKind::Bar,
            SummarySpec::Distribution { .. } => chart == ChartKind::Box,
            SummarySpec::Crosstab { .. } | SummarySpec::Compare { .. } => {
                chart == ChartKind::Histogram
            }
        }
    }
}

/// A headline number shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub help: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub title: String,
    pub chart: ChartKind,
    pub summary: SummarySpec,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default = "default_true")]
    pub show_table: bool,
    #[serde(default)]
    pub x_title: Option<String>,
    #[serde(default)]
    pub y_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub header: Option<String>,
    pub source: String,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub metrics: Vec<MetricCard>,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

impl PageSpec {
    pub fn heading(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    /// 0 disables caching: every view fetches its source again.
    pub cache_ttl_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            cache_ttl_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    pub non_numeric: NonNumericPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 900,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub title: String,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub summary: SummarySettings,
    #[serde(default)]
    pub chart: ChartSettings,
    pub pages: Vec<PageSpec>,
}

impl DashboardConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DashboardConfig =
            toml::from_str(content).map_err(|e| DashError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DashError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// The page table compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    pub fn page(&self, slug: &str) -> Option<&PageSpec> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            cache_ttl: (self.fetch.cache_ttl_secs > 0)
                .then(|| Duration::from_secs(self.fetch.cache_ttl_secs)),
            ..LoaderOptions::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(DashError::Config("no pages defined".to_string()));
        }
        if self.chart.width < 100 || self.chart.height < 100 {
            return Err(DashError::Config(format!(
                "chart size {}x{} is too small",
                self.chart.width, self.chart.height
            )));
        }

        let mut slugs = HashSet::new();
        for page in &self.pages {
            validate_slug(&page.slug)?;
            // index.html is the navigation page
            if page.slug == "index" {
                return Err(DashError::Config("slug 'index' is reserved".to_string()));
            }
            if !slugs.insert(page.slug.as_str()) {
                return Err(DashError::Config(format!(
                    "duplicate page slug '{}'",
                    page.slug
                )));
            }
            if page.source.trim().is_empty() {
                return Err(DashError::Config(format!(
                    "page '{}' has no source",
                    page.slug
                )));
            }

            for section in &page.sections {
                if !section.summary.allows(section.chart) {
                    return Err(DashError::Config(format!(
                        "page '{}', section '{}': a {} summary cannot be drawn as a {} chart",
                        page.slug,
                        section.title,
                        section.summary.kind_name(),
                        section.chart.name()
                    )));
                }
                if let SummarySpec::Compare { columns } = &section.summary {
                    if columns.is_empty() {
                        return Err(DashError::Config(format!(
                            "page '{}', section '{}': compare needs at least one column",
                            page.slug, section.title
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DashError::Config(format!(
            "invalid page slug '{slug}' (use a-z, 0-9, '-' and '_')"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
title = "Test"

[[pages]]
slug = "sex"
title = "Sex"
source = "students.csv"

[[pages.sections]]
title = "Distribution of Sex"
chart = "pie"
summary = { kind = "frequency", column = "sex" }
"#;

    #[test]
    fn builtin_config_is_valid() {
        let config = DashboardConfig::builtin().unwrap();
        assert!(config.pages.len() >= 4);
        assert!(config.page("gender").is_some());
        assert!(config.page("arts").is_some());
    }

    #[test]
    fn defaults_fill_in() {
        let config = DashboardConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.fetch.cache_ttl_secs, 0);
        assert_eq!(config.summary.non_numeric, NonNumericPolicy::Exclude);
        assert_eq!(config.chart.width, 900);

        let section = &config.pages[0].sections[0];
        assert!(section.show_table);
        assert_eq!(
            section.summary,
            SummarySpec::Frequency {
                column: "sex".to_string(),
                order: FrequencyOrder::CountDescending,
            }
        );
        assert!(config.loader_options().cache_ttl.is_none());
    }

    #[test]
    fn rejects_mismatched_chart() {
        let content = MINIMAL.replace("chart = \"pie\"", "chart = \"box\"");
        let err = DashboardConfig::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("cannot be drawn as a box chart"));
    }

    #[test]
    fn rejects_duplicate_slugs() {
        let content = format!(
            "{MINIMAL}\n[[pages]]\nslug = \"sex\"\ntitle = \"Again\"\nsource = \"x.csv\"\n"
        );
        let err = DashboardConfig::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("duplicate page slug"));
    }

    #[test]
    fn rejects_reserved_and_invalid_slugs() {
        let reserved = MINIMAL.replace("slug = \"sex\"", "slug = \"index\"");
        assert!(DashboardConfig::from_toml_str(&reserved).is_err());

        let invalid = MINIMAL.replace("slug = \"sex\"", "slug = \"Sex Page\"");
        assert!(DashboardConfig::from_toml_str(&invalid).is_err());
    }

    #[test]
    fn cache_ttl_maps_to_loader_options() {
        let content = MINIMAL.replace(
            "title = \"Test\"\n",
            "title = \"Test\"\n\n[fetch]\ncache_ttl_secs = 300\n",
        );
        let config = DashboardConfig::from_toml_str(&content).unwrap();
        assert_eq!(
            config.loader_options().cache_ttl,
            Some(Duration::from_secs(300))
        );
    }
}
