//! Static Chart Renderer
//! Draws bar, pie, donut, box and grouped-bar charts as SVG documents.
//!
//! Layout:
//! 1. Caption centered above the plot
//! 2. Plot area with axis titles from the chart spec
//! 3. Legend (grouped bars only) in the upper right corner
//!
//! Empty summaries render a "No data" placeholder instead of an empty axis.

use crate::charts::series::{palette_color, ChartData, ChartSpec};
use crate::config::ChartKind;
use crate::error::{DashError, Result};
use plotters::coord::Shift;
use plotters::element::{Boxplot, Pie};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const FONT: &str = "sans-serif";
const CAPTION_SIZE: i32 = 20;
const LABEL_SIZE: i32 = 13;

type DrawResult<DB> =
    std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render a chart to an SVG string.
    pub fn render_svg(spec: &ChartSpec, data: &ChartData) -> Result<String> {
        if !data.fits(spec.kind) {
            return Err(DashError::Chart(format!(
                "{} chart cannot draw this data",
                spec.kind.name()
            )));
        }

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (spec.width, spec.height))
                .into_drawing_area();
            Self::draw(&root, spec, data).map_err(|e| DashError::Chart(e.to_string()))?;
            root.present()
                .map_err(|e| DashError::Chart(e.to_string()))?;
        }
        Ok(svg)
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
        data: &ChartData,
    ) -> DrawResult<DB> {
        root.fill(&WHITE)?;

        if data.is_empty() {
            return Self::draw_placeholder(root, spec);
        }

        match (spec.kind, data) {
            (
                ChartKind::Bar,
                ChartData::Values {
                    categories,
                    values,
                    decimals,
                },
            ) => Self::draw_bars(root, spec, categories, values, *decimals),
            (ChartKind::Pie | ChartKind::Donut, ChartData::Values { values, .. })
                if !values.iter().any(|v| v.is_finite() && *v > 0.0) =>
            {
                Self::draw_placeholder(root, spec)
            }
            (ChartKind::Pie, ChartData::Values { categories, values, .. }) => {
                Self::draw_pie(root, spec, categories, values, false)
            }
            (ChartKind::Donut, ChartData::Values { categories, values, .. }) => {
                Self::draw_pie(root, spec, categories, values, true)
            }
            (ChartKind::Box, ChartData::Samples { categories, samples }) => {
                Self::draw_boxes(root, spec, categories, samples)
            }
            (ChartKind::Histogram, ChartData::Series { categories, series }) => {
                Self::draw_grouped_bars(root, spec, categories, series)
            }
            // Checked by `fits` before drawing.
            _ => Self::draw_placeholder(root, spec),
        }
    }

    fn draw_placeholder<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
    ) -> DrawResult<DB> {
        let area = root.titled(&spec.title, (FONT, CAPTION_SIZE))?;
        let (w, h) = area.dim_in_pixel();
        let style = TextStyle::from((FONT, 16).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        area.draw(&Text::new(
            "No data",
            (w as i32 / 2, h as i32 / 2),
            style,
        ))?;
        Ok(())
    }

    fn draw_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
        categories: &[String],
        values: &[f64],
        decimals: usize,
    ) -> DrawResult<DB> {
        let n = categories.len();
        let (y_min, y_max) = Self::value_range(values.iter().copied());

        let mut chart = ChartBuilder::on(root)
            .caption(&spec.title, (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)?;

        let label_at = |x: &f64| category_label(categories, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&label_at)
            .x_desc(spec.x_title.as_str())
            .y_desc(spec.y_title.as_str())
            .draw()?;

        chart.draw_series(
            values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, &v)| {
                    let x = i as f64;
                    Rectangle::new([(x - 0.35, 0.0), (x + 0.35, v)], palette_color(i).filled())
                }),
        )?;

        // Labels sit beyond the end of each bar, below it for negative values.
        let label_font = (FONT, LABEL_SIZE).into_font();
        chart.draw_series(
            values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, &v)| {
                    let anchor = if v < 0.0 { VPos::Top } else { VPos::Bottom };
                    let style =
                        TextStyle::from(label_font.clone()).pos(Pos::new(HPos::Center, anchor));
                    Text::new(format!("{v:.decimals$}"), (i as f64, v), style)
                }),
        )?;

        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
        categories: &[String],
        values: &[f64],
        donut: bool,
    ) -> DrawResult<DB> {
        let area = root.titled(&spec.title, (FONT, CAPTION_SIZE))?;
        let (w, h) = area.dim_in_pixel();

        // Slices with no share would only add overlapping labels.
        let (labels, sizes): (Vec<String>, Vec<f64>) = categories
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .filter(|(_, v)| v.is_finite() && *v > 0.0)
            .unzip();
        let colors: Vec<RGBColor> = (0..sizes.len()).map(palette_color).collect();

        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.35;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style((FONT, 14).into_font().color(&BLACK));
        pie.percentages((FONT, 12).into_font().color(&BLACK));
        if donut {
            pie.donut_hole(radius * 0.4);
        }
        area.draw(&pie)?;
        Ok(())
    }

    fn draw_boxes<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
        categories: &[String],
        samples: &[Vec<f64>],
    ) -> DrawResult<DB> {
        let n = categories.len() as u32;
        let (y_min, y_max) = Self::sample_range(samples);

        let mut chart = ChartBuilder::on(root)
            .caption(&spec.title, (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d((0u32..n).into_segmented(), y_min..y_max)?;

        let label_at = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => categories.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len())
            .x_label_formatter(&label_at)
            .x_desc(spec.x_title.as_str())
            .y_desc(spec.y_title.as_str())
            .draw()?;

        for (i, values) in samples.iter().enumerate() {
            if values.is_empty() {
                continue;
            }
            let color = palette_color(i);
            let key = SegmentValue::CenterOf(i as u32);

            // Quartiles and whiskers are computed by plotters.
            let quartiles = Quartiles::new(values);
            chart.draw_series(std::iter::once(
                Boxplot::new_vertical(key.clone(), &quartiles)
                    .width(40)
                    .whisker_width(0.6)
                    .style(color.stroke_width(2)),
            ))?;

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            chart.draw_series(std::iter::once(Cross::new(
                (key, mean as f32),
                5,
                BLACK.stroke_width(2),
            )))?;
        }

        Ok(())
    }

    fn draw_grouped_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
        categories: &[String],
        series: &[(String, Vec<f64>)],
    ) -> DrawResult<DB> {
        let n = categories.len();
        let (y_min, y_max) =
            Self::value_range(series.iter().flat_map(|(_, v)| v.iter().copied()));

        let mut chart = ChartBuilder::on(root)
            .caption(&spec.title, (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)?;

        let label_at = |x: &f64| category_label(categories, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&label_at)
            .x_desc(spec.x_title.as_str())
            .y_desc(spec.y_title.as_str())
            .draw()?;

        let bar_width = 0.8 / series.len().max(1) as f64;
        for (s, (name, values)) in series.iter().enumerate() {
            let color = palette_color(s);
            let offset = -0.4 + bar_width * s as f64;
            chart
                .draw_series(values.iter().enumerate().map(move |(i, &v)| {
                    let left = i as f64 + offset;
                    Rectangle::new([(left, 0.0), (left + bar_width, v)], color.filled())
                }))?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    }

    /// Value axis spanning zero and every finite value, with headroom for
    /// bar labels on whichever side has bars.
    fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min == 0.0 && max == 0.0 {
            return (0.0, 1.0);
        }
        let lower = if min < 0.0 { min * 1.15 } else { 0.0 };
        let upper = if max > 0.0 { max * 1.15 } else { 0.0 };
        (lower, upper)
    }

    fn sample_range(samples: &[Vec<f64>]) -> (f32, f32) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in samples.iter().flatten() {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if min.is_infinite() {
            return (0.0, 1.0);
        }
        let pad = if max > min { (max - min) * 0.1 } else { 1.0 };
        ((min - pad) as f32, (max + pad) as f32)
    }
}

/// Category name for an axis position; blank between categories.
fn category_label(categories: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 0.01 || rounded < 0.0 {
        return String::new();
    }
    categories
        .get(rounded as usize)
        .cloned()
        .unwrap_or_default()
}
