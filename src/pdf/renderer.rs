//! Paginated HTML item table printed to PDF by a headless Chrome.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use minijinja::{context, Environment};
use serde::Serialize;

use super::pages;
use crate::core::{DocumentError, DocumentResult, Margin, PageFormat, RenderConfig};
use crate::metrics;
use crate::models::common::format_amount;
use crate::models::LineItem;

const TEMPLATE_NAME: &str = "invoice_items.html";
const TEMPLATE_SOURCE: &str = include_str!("../../templates/invoice_items.html");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOptions {
    pub rows_per_page: usize,
    pub page_format: PageFormat,
    pub margin: Margin,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            rows_per_page: 28,
            page_format: PageFormat::Letter,
            margin: Margin::default(),
        }
    }
}

impl From<&RenderConfig> for TableOptions {
    fn from(config: &RenderConfig) -> Self {
        TableOptions {
            rows_per_page: config.rows_per_page,
            page_format: config.page_format,
            margin: config.margin,
        }
    }
}

/// One printed row of the item table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub number: usize,
    pub description: String,
    pub quantity: String,
    pub weight: String,
    pub dimensions: String,
    pub packaging: String,
}

impl TableRow {
    fn from_item(number: usize, item: &LineItem) -> Self {
        let packaging = if item.packaging_description.is_empty() {
            item.packaging_code.clone()
        } else {
            item.packaging_description.clone()
        };
        TableRow {
            number,
            description: item.label().to_string(),
            quantity: format_amount(item.quantity_or_one()),
            weight: item.weight(),
            dimensions: item.dimensions(),
            packaging,
        }
    }
}

/// Splits items into pages of at most `rows_per_page`, keeping order.
pub fn paginate(items: &[LineItem], rows_per_page: usize) -> Vec<&[LineItem]> {
    items.chunks(rows_per_page.max(1)).collect()
}

/// Renders the item table as HTML, one `<section class="page">` per page.
pub fn render_html(items: &[LineItem], options: &TableOptions) -> DocumentResult<String> {
    let mut number = 0;
    let pages: Vec<Vec<TableRow>> = paginate(items, options.rows_per_page)
        .into_iter()
        .map(|page| {
            page.iter()
                .map(|item| {
                    number += 1;
                    TableRow::from_item(number, item)
                })
                .collect()
        })
        .collect();

    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;
    let html = env
        .get_template(TEMPLATE_NAME)?
        .render(context! { pages => pages, page_format => options.page_format.to_string() })?;
    Ok(html)
}

/// Produces the item-table PDF that gets spliced into the commercial invoice.
#[async_trait]
pub trait TableRenderer: Send + Sync {
    async fn render(&self, items: &[LineItem], options: &TableOptions, out: &Path) -> DocumentResult<PathBuf>;
}

/// Launches a fresh headless Chrome for every table.
pub struct ChromeRenderer {
    chrome_executable: Option<PathBuf>,
    timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        ChromeRenderer {
            chrome_executable: config.chrome_executable.clone(),
            timeout: config.timeout,
        }
    }

    /// Each launch gets its own profile directory.
    fn browser_config(&self, profile: &Path) -> DocumentResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .user_data_dir(profile);
        if let Some(executable) = &self.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        builder.build().map_err(DocumentError::Render)
    }

    async fn print(browser: &Browser, html: &str, options: &TableOptions) -> DocumentResult<Vec<u8>> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DocumentError::Render(format!("failed to open page: {}", e)))?;
        page.set_content(html)
            .await
            .map_err(|e| DocumentError::Render(format!("failed to set content: {}", e)))?;

        let (width, height) = options.page_format.inches();
        let params = PrintToPdfParams {
            print_background: Some(true),
            paper_width: Some(width),
            paper_height: Some(height),
            margin_top: Some(Margin::to_inches(options.margin.top)),
            margin_bottom: Some(Margin::to_inches(options.margin.bottom)),
            margin_left: Some(Margin::to_inches(options.margin.left)),
            margin_right: Some(Margin::to_inches(options.margin.right)),
            ..Default::default()
        };
        page.pdf(params)
            .await
            .map_err(|e| DocumentError::Render(format!("print to pdf failed: {}", e)))
    }
}

#[async_trait]
impl TableRenderer for ChromeRenderer {
    async fn render(&self, items: &[LineItem], options: &TableOptions, out: &Path) -> DocumentResult<PathBuf> {
        if items.is_empty() {
            let (mut doc, out) = (pages::empty_document(), out.to_path_buf());
            return tokio::task::spawn_blocking(move || -> DocumentResult<PathBuf> {
                doc.save(&out)?;
                Ok(out)
            })
            .await?;
        }

        let html = render_html(items, options)?;
        let started = Instant::now();

        let profile = std::env::temp_dir().join(format!("customs-docs-chrome-{}", uuid::Uuid::new_v4()));
        let config = self.browser_config(&profile)?;
        let launch = async {
            Browser::launch(config)
                .await
                .map_err(|e| DocumentError::Render(format!("failed to launch browser: {}", e)))
        };
        let (mut browser, mut handler) = within(self.timeout, "browser launch", launch).await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let printed = within(self.timeout, "item table rendering", Self::print(&browser, &html, options)).await;

        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "failed to close browser");
        }
        let _ = browser.wait().await;
        events.abort();
        let _ = tokio::fs::remove_dir_all(&profile).await;

        let bytes = printed?;
        tokio::fs::write(out, &bytes).await?;
        metrics::RENDER_DURATION.observe(started.elapsed().as_secs_f64());
        tracing::info!(
            out = %out.display(),
            items = items.len(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "item table rendered"
        );
        Ok(out.to_path_buf())
    }
}

/// Bounds `work` by `limit`, reporting the elapsed step as a timeout.
async fn within<T>(limit: Duration, what: &str, work: impl Future<Output = DocumentResult<T>>) -> DocumentResult<T> {
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| DocumentError::Timeout(format!("{} exceeded {:?}", what, limit)))?
}
