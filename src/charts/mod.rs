//! Charts module - Chart rendering

mod renderer;
mod series;

pub use renderer::ChartRenderer;
pub use series::{palette_color, ChartData, ChartSpec, PALETTE};
