//! CSV survey summaries and a static chart dashboard.
//!
//! Datasets are loaded from URLs or files ([`data`]), summarized into
//! frequency and grouped-mean tables ([`stats`]), drawn as SVG charts
//! ([`charts`]) and assembled into HTML pages ([`dashboard`]) described by
//! a TOML page table ([`config`]).

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod stats;

pub use config::DashboardConfig;
pub use dashboard::{render_view, Dashboard, SiteReport, View};
pub use data::{DataLoader, DataSource, Dataset};
pub use error::{DashError, Result};
pub use stats::{FrequencyOrder, NonNumericPolicy, Summarizer};
