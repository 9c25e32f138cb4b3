//! Site Builder Module
//! Loads every page's data, renders the views and writes the HTML files.

use crate::config::{DashboardConfig, PageSpec};
use crate::dashboard::html::{self, NavEntry};
use crate::dashboard::view::{render_view, View, ViewOptions};
use crate::data::{DataLoader, DataSource};
use crate::error::{DashError, Result};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of building one page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub slug: String,
    pub title: String,
    pub path: PathBuf,
    /// Diagnostic shown on the error page, if the view failed.
    pub error: Option<String>,
}

impl PageOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SiteReport {
    pub index: PathBuf,
    pub pages: Vec<PageOutcome>,
}

impl SiteReport {
    pub fn failures(&self) -> impl Iterator<Item = &PageOutcome> {
        self.pages.iter().filter(|p| !p.is_ok())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// A configured dashboard ready to render.
pub struct Dashboard {
    config: DashboardConfig,
    loader: DataLoader,
    options: ViewOptions,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let loader = DataLoader::new(&config.loader_options())?;
        let options = ViewOptions::from(&config);
        Ok(Self {
            config,
            loader,
            options,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Load the page's source and render it.
    pub fn view(&self, page: &PageSpec) -> Result<View> {
        let dataset = self.loader.load(&DataSource::parse(&page.source))?;
        render_view(page, &dataset, &self.options)
    }

    /// Write `index.html` and one file per page into `out_dir`.
    ///
    /// With `only`, just that page is rendered; the navigation still links
    /// every configured page. A failed page becomes an error page and is
    /// reported in the returned [`SiteReport`].
    pub fn build(&self, out_dir: &Path, only: Option<&str>) -> Result<SiteReport> {
        let selected: Vec<&PageSpec> = match only {
            Some(slug) => {
                let page = self.config.page(slug).ok_or_else(|| {
                    DashError::Config(format!(
                        "unknown page '{slug}' (pages: {})",
                        self.slugs().join(", ")
                    ))
                })?;
                vec![page]
            }
            None => self.config.pages.iter().collect(),
        };

        fs::create_dir_all(out_dir)?;
        info!(pages = selected.len(), out = %out_dir.display(), "building dashboard");

        let rendered: Vec<(&PageSpec, Result<View>)> = selected
            .par_iter()
            .map(|page| (*page, self.view(page)))
            .collect();

        let nav: Vec<NavEntry> = self
            .config
            .pages
            .iter()
            .map(|page| NavEntry {
                slug: page.slug.clone(),
                title: page.title.clone(),
                failed: rendered
                    .iter()
                    .any(|(p, r)| p.slug == page.slug && r.is_err()),
            })
            .collect();

        let mut outcomes = Vec::with_capacity(rendered.len());
        for (page, result) in rendered {
            let path = out_dir.join(format!("{}.html", page.slug));
            let mut writer = BufWriter::new(File::create(&path)?);
            let error = match result {
                Ok(view) => {
                    html::write_view(&mut writer, &self.config.title, &nav, &view)?;
                    info!(page = %page.slug, sections = view.sections.len(), "page written");
                    None
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(page = %page.slug, error = %message, "page failed");
                    html::write_error(
                        &mut writer,
                        &self.config.title,
                        &nav,
                        &page.slug,
                        page.heading(),
                        &message,
                    )?;
                    Some(message)
                }
            };
            outcomes.push(PageOutcome {
                slug: page.slug.clone(),
                title: page.title.clone(),
                path,
                error,
            });
        }

        let index = out_dir.join("index.html");
        let mut writer = BufWriter::new(File::create(&index)?);
        html::write_index(&mut writer, &self.config.title, &nav)?;

        Ok(SiteReport {
            index,
            pages: outcomes,
        })
    }

    fn slugs(&self) -> Vec<&str> {
        self.config.pages.iter().map(|p| p.slug.as_str()).collect()
    }
}
