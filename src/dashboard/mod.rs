//! Dashboard module - views, HTML output and site building

pub mod html;
mod site;
mod view;

pub use html::NavEntry;
pub use site::{Dashboard, PageOutcome, SiteReport};
pub use view::{render_view, RenderedSection, SummaryTable, View, ViewOptions};
