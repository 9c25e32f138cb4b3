//! HTML page generation for the static dashboard

use crate::dashboard::view::{RenderedSection, SummaryTable, View};
use crate::stats::{AggregateTable, CrossTable, FrequencyTable, GroupSummary};
use askama_escape::Html;
use std::io::{self, Write};

/// One entry of the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub slug: String,
    pub title: String,
    pub failed: bool,
}

impl NavEntry {
    pub fn href(&self) -> String {
        format!("{}.html", self.slug)
    }
}

const STYLE: &str = r#"
    :root {
        --bg: #f7f8fa;
        --card: #ffffff;
        --border: #dde1e6;
        --text: #1f2328;
        --dim: #656d76;
        --accent: #1f6feb;
        --error: #cf222e;
    }
    * { box-sizing: border-box; }
    body {
        margin: 0;
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
        background: var(--bg);
        color: var(--text);
        line-height: 1.5;
        display: flex;
    }
    nav {
        width: 240px;
        min-height: 100vh;
        padding: 1.5rem 1rem;
        background: var(--card);
        border-right: 1px solid var(--border);
    }
    nav .brand { font-weight: 700; margin-bottom: 1rem; }
    nav a {
        display: block;
        padding: 0.4rem 0.6rem;
        border-radius: 6px;
        color: var(--text);
        text-decoration: none;
    }
    nav a:hover { background: var(--bg); }
    nav a.active { background: var(--accent); color: #fff; }
    nav a.failed { color: var(--error); }
    main { flex: 1; padding: 2rem; max-width: 1100px; }
    h1 { border-bottom: 3px solid var(--accent); padding-bottom: 0.4rem; }
    .source { color: var(--dim); font-size: 0.875rem; }
    .metrics { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; margin: 1.5rem 0; }
    .metric { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1rem; }
    .metric-label { color: var(--dim); font-size: 0.875rem; }
    .metric-value { font-size: 2rem; font-weight: 700; }
    section { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.25rem; margin: 1.5rem 0; }
    section svg { max-width: 100%; height: auto; }
    table { border-collapse: collapse; margin: 1rem 0; }
    th, td { border: 1px solid var(--border); padding: 0.3rem 0.8rem; text-align: left; }
    th { background: var(--bg); }
    td.num { text-align: right; font-variant-numeric: tabular-nums; }
    .note { color: var(--dim); font-size: 0.875rem; }
    .error { border-color: var(--error); color: var(--error); }
"#;

/// Write a rendered view as a full HTML document.
pub fn write_view<W: Write>(
    writer: &mut W,
    site_title: &str,
    nav: &[NavEntry],
    view: &View,
) -> io::Result<()> {
    write_head(writer, &format!("{} | {}", view.title, site_title))?;
    write_nav(writer, site_title, nav, Some(&view.slug))?;

    writeln!(writer, "<main>")?;
    writeln!(writer, "<h1>{}</h1>", escape(&view.heading))?;
    writeln!(
        writer,
        "<p class=\"source\">{} rows from {}</p>",
        view.row_count,
        escape(&view.source)
    )?;
    if let Some(intro) = &view.intro {
        writeln!(writer, "<p>{}</p>", escape(intro))?;
    }

    if !view.metrics.is_empty() {
        writeln!(writer, "<div class=\"metrics\">")?;
        for metric in &view.metrics {
            let help = metric.help.as_deref().unwrap_or_default();
            writeln!(
                writer,
                "<div class=\"metric\" title=\"{}\"><div class=\"metric-label\">{}</div><div class=\"metric-value\">{}</div></div>",
                escape(help),
                escape(&metric.label),
                escape(&metric.value)
            )?;
        }
        writeln!(writer, "</div>")?;
    }

    for section in &view.sections {
        write_section(writer, section)?;
    }

    writeln!(writer, "</main>")?;
    write_tail(writer)
}

/// Write the page shown when a view could not be rendered.
pub fn write_error<W: Write>(
    writer: &mut W,
    site_title: &str,
    nav: &[NavEntry],
    slug: &str,
    heading: &str,
    message: &str,
) -> io::Result<()> {
    write_head(writer, &format!("{heading} | {site_title}"))?;
    write_nav(writer, site_title, nav, Some(slug))?;
    writeln!(writer, "<main>")?;
    writeln!(writer, "<h1>{}</h1>", escape(heading))?;
    writeln!(
        writer,
        "<section class=\"error\"><h2>This page could not be rendered</h2><p>{}</p></section>",
        escape(message)
    )?;
    writeln!(writer, "</main>")?;
    write_tail(writer)
}

/// Write the landing page listing every page.
pub fn write_index<W: Write>(writer: &mut W, site_title: &str, nav: &[NavEntry]) -> io::Result<()> {
    write_head(writer, site_title)?;
    write_nav(writer, site_title, nav, None)?;
    writeln!(writer, "<main>")?;
    writeln!(writer, "<h1>{}</h1>", escape(site_title))?;
    writeln!(writer, "<ul>")?;
    for entry in nav {
        let status = if entry.failed { " (failed)" } else { "" };
        writeln!(
            writer,
            "<li><a href=\"{}\">{}</a>{}</li>",
            escape(&entry.href()),
            escape(&entry.title),
            status
        )?;
    }
    writeln!(writer, "</ul>")?;
    writeln!(writer, "</main>")?;
    write_tail(writer)
}

fn write_head<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{}</title>
<style>{}</style>
</head>
<body>
"#,
        escape(title),
        STYLE
    )
}

fn write_tail<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "</body>\n</html>")
}

fn write_nav<W: Write>(
    writer: &mut W,
    site_title: &str,
    nav: &[NavEntry],
    active: Option<&str>,
) -> io::Result<()> {
    writeln!(writer, "<nav>")?;
    writeln!(
        writer,
        "<div class=\"brand\"><a href=\"index.html\">{}</a></div>",
        escape(site_title)
    )?;
    for entry in nav {
        let mut classes = Vec::new();
        if active == Some(entry.slug.as_str()) {
            classes.push("active");
        }
        if entry.failed {
            classes.push("failed");
        }
        writeln!(
            writer,
            "<a class=\"{}\" href=\"{}\">{}</a>",
            classes.join(" "),
            escape(&entry.href()),
            escape(&entry.title)
        )?;
    }
    writeln!(writer, "</nav>")
}

fn write_section<W: Write>(writer: &mut W, section: &RenderedSection) -> io::Result<()> {
    writeln!(writer, "<section>")?;
    writeln!(writer, "<h2>{}</h2>", escape(&section.title))?;
    if let Some(table) = &section.table {
        writeln!(writer, "<p>Data summary:</p>")?;
        match table {
            SummaryTable::Frequency(t) => write_frequency_table(writer, t)?,
            SummaryTable::Aggregate(t) => write_aggregate_table(writer, t)?,
            SummaryTable::Distribution(groups) => write_distribution_table(writer, groups)?,
            SummaryTable::Cross {
                category_title,
                table,
            } => write_cross_table(writer, category_title, table)?,
        }
    }
    // Chart SVG is generated by plotters and embedded as-is.
    writeln!(writer, "{}", section.chart_svg)?;
    if let Some(narrative) = &section.narrative {
        writeln!(writer, "<p>{}</p>", escape(narrative))?;
    }
    if section.excluded > 0 {
        writeln!(
            writer,
            "<p class=\"note\">{} non-numeric value(s) were excluded.</p>",
            section.excluded
        )?;
    }
    writeln!(writer, "</section>")
}

fn write_frequency_table<W: Write>(writer: &mut W, table: &FrequencyTable) -> io::Result<()> {
    writeln!(writer, "<table>")?;
    writeln!(
        writer,
        "<tr><th>{}</th><th>Count</th><th>Share</th></tr>",
        escape(&table.column)
    )?;
    let total = table.total();
    for entry in &table.entries {
        writeln!(
            writer,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape(&entry.category),
            entry.count,
            percent(entry.count, total)
        )?;
    }
    writeln!(writer, "</table>")
}

fn write_aggregate_table<W: Write>(writer: &mut W, table: &AggregateTable) -> io::Result<()> {
    writeln!(writer, "<table>")?;
    writeln!(
        writer,
        "<tr><th>{}</th><th>Average {}</th><th>N</th></tr>",
        escape(&table.group_column),
        escape(&table.value_column)
    )?;
    for entry in &table.entries {
        writeln!(
            writer,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape(&entry.category),
            number(entry.mean, 2),
            entry.count
        )?;
    }
    writeln!(writer, "</table>")
}

fn write_distribution_table<W: Write>(writer: &mut W, groups: &[GroupSummary]) -> io::Result<()> {
    writeln!(writer, "<table>")?;
    writeln!(
        writer,
        "<tr><th>Group</th><th>N</th><th>Mean</th><th>Median</th><th>Std</th><th>Min</th><th>Q1</th><th>Q3</th><th>Max</th></tr>"
    )?;
    for g in groups {
        writeln!(
            writer,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape(&g.group_name),
            g.count,
            number(g.mean, 3),
            number(g.median, 3),
            number(g.std, 3),
            number(g.min, 3),
            number(g.q1, 3),
            number(g.q3, 3),
            number(g.max, 3)
        )?;
    }
    writeln!(writer, "</table>")
}

fn write_cross_table<W: Write>(
    writer: &mut W,
    category_title: &str,
    table: &CrossTable,
) -> io::Result<()> {
    writeln!(writer, "<table>")?;
    write!(writer, "<tr><th>{}</th>", escape(category_title))?;
    for series in &table.series {
        write!(writer, "<th>{}</th>", escape(&series.name))?;
    }
    writeln!(writer, "</tr>")?;
    for (i, category) in table.categories.iter().enumerate() {
        write!(writer, "<tr><td>{}</td>", escape(category))?;
        for series in &table.series {
            write!(
                writer,
                "<td class=\"num\">{}</td>",
                series.counts.get(i).copied().unwrap_or(0)
            )?;
        }
        writeln!(writer, "</tr>")?;
    }
    writeln!(writer, "</table>")
}

fn percent(count: usize, total: usize) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}

fn number(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        "-".to_string()
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape(s: &str) -> String {
    askama_escape::escape(s, Html).to_string()
}
