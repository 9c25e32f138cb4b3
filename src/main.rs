//! Survey Dash - CSV survey summaries and a static chart dashboard
//!
//! Renders the configured pages to HTML, or prints single summaries
//! from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use survey_dash::data::{DataLoader, DataSource, LoaderOptions};
use survey_dash::stats::{AggregateTable, FrequencyOrder, FrequencyTable, NonNumericPolicy};
use survey_dash::{Dashboard, DashboardConfig, Summarizer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "survey-dash", version, about = "CSV survey summaries and static chart dashboards")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every page (or one) to static HTML
    Render {
        /// Page table in TOML; the built-in pages are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "dashboard")]
        out: PathBuf,
        /// Render only this page
        #[arg(short, long)]
        page: Option<String>,
        /// Open index.html when done
        #[arg(long)]
        open: bool,
    },
    /// List the configured pages
    Pages {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the columns of a CSV source
    Columns {
        #[arg(short, long)]
        source: String,
    },
    /// Count occurrences of each category in a column
    Frequency {
        #[arg(short, long)]
        source: String,
        #[arg(short, long)]
        column: String,
        #[arg(long, value_enum, default_value_t = OrderArg::Count)]
        order: OrderArg,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Average a numeric column per category of another
    Mean {
        #[arg(short, long)]
        source: String,
        #[arg(short, long)]
        group: String,
        #[arg(long)]
        value: String,
        #[arg(long, value_enum, default_value_t = PolicyArg::Exclude)]
        non_numeric: PolicyArg,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    /// Most frequent first
    Count,
    /// Category order
    Category,
}

impl From<OrderArg> for FrequencyOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Count => FrequencyOrder::CountDescending,
            OrderArg::Category => FrequencyOrder::CategoryAscending,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Exclude,
    Error,
}

impl From<PolicyArg> for NonNumericPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Exclude => NonNumericPolicy::Exclude,
            PolicyArg::Error => NonNumericPolicy::Error,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Render {
            config,
            out,
            page,
            open,
        } => render(config.as_deref(), &out, page.as_deref(), open),
        Command::Pages { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", config.title);
            for page in &config.pages {
                println!(
                    "  {:<12} {:<32} {} section(s)  {}",
                    page.slug,
                    page.title,
                    page.sections.len(),
                    page.source
                );
            }
            Ok(())
        }
        Command::Columns { source } => {
            let dataset = load_source(&source)?;
            println!("{} rows from {}", dataset.row_count(), dataset.source());
            let numeric = dataset.numeric_columns();
            for name in dataset.column_names() {
                let kind = if numeric.contains(&name) { "numeric" } else { "text" };
                println!("  {name:<40} {kind}");
            }
            Ok(())
        }
        Command::Frequency {
            source,
            column,
            order,
            format,
        } => {
            let dataset = load_source(&source)?;
            let table = Summarizer::frequency(&dataset, &column, order.into())?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&table)?),
                Format::Table => print_frequency(&table),
            }
            Ok(())
        }
        Command::Mean {
            source,
            group,
            value,
            non_numeric,
            format,
        } => {
            let dataset = load_source(&source)?;
            let table = Summarizer::grouped_mean(&dataset, &group, &value, non_numeric.into())?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&table)?),
                Format::Table => print_aggregate(&table),
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("survey_dash={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => DashboardConfig::builtin().context("built-in configuration is invalid"),
    }
}

fn load_source(source: &str) -> Result<std::sync::Arc<survey_dash::Dataset>> {
    let loader = DataLoader::new(&LoaderOptions::default())?;
    let dataset = loader
        .load(&DataSource::parse(source))
        .with_context(|| format!("loading {source}"))?;
    Ok(dataset)
}

fn render(config: Option<&Path>, out: &Path, page: Option<&str>, open: bool) -> Result<()> {
    let config = load_config(config)?;
    let dashboard = Dashboard::new(config)?;
    let report = dashboard
        .build(out, page)
        .with_context(|| format!("writing dashboard to {}", out.display()))?;

    for outcome in &report.pages {
        match &outcome.error {
            None => println!("ok      {}", outcome.path.display()),
            Some(error) => println!("FAILED  {}  {error}", outcome.path.display()),
        }
    }
    info!(index = %report.index.display(), "dashboard ready");

    if open {
        open::that(&report.index)
            .with_context(|| format!("opening {}", report.index.display()))?;
    }

    let failed = report.failure_count();
    if failed > 0 {
        bail!("{failed} of {} page(s) failed to render", report.pages.len());
    }
    Ok(())
}

fn print_frequency(table: &FrequencyTable) {
    let width = table
        .entries
        .iter()
        .map(|e| e.category.len())
        .chain([table.column.len()])
        .max()
        .unwrap_or(0);
    println!("{:<width$}  {:>8}", table.column, "count");
    for entry in &table.entries {
        println!("{:<width$}  {:>8}", entry.category, entry.count);
    }
    println!("{:<width$}  {:>8}", "total", table.total());
}

fn print_aggregate(table: &AggregateTable) {
    let width = table
        .entries
        .iter()
        .map(|e| e.category.len())
        .chain([table.group_column.len()])
        .max()
        .unwrap_or(0);
    println!(
        "{:<width$}  {:>10}  {:>6}",
        table.group_column, "mean", "n"
    );
    for entry in &table.entries {
        let mean = if entry.mean.is_finite() {
            format!("{:.2}", entry.mean)
        } else {
            "-".to_string()
        };
        println!("{:<width$}  {:>10}  {:>6}", entry.category, mean, entry.count);
    }
    if table.excluded > 0 {
        println!("({} non-numeric value(s) excluded)", table.excluded);
    }
}
