//! Data module - CSV loading and column access

mod dataset;
mod loader;

pub use dataset::{Cell, Dataset};
pub use loader::{DataLoader, DataSource, LoaderOptions};
