//! HTML-to-PDF rendering engine.
//!
//! Drives a headless Chromium over the DevTools protocol: launch, load the
//! HTML, wait for web fonts, print to PDF, close. The browser is reached
//! through [`BrowserLauncher`] so the lifecycle can be exercised without a
//! real Chromium.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::common::escape_html;
use super::options::css_length_to_inches;
use super::types::{Orientation, RenderOptions};
use super::ReportError;

/// Default and navigation timeout for DevTools requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on the wait for web fonts before printing.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

const FONTS_READY_EXPRESSION: &str = "document.fonts.ready.then(() => true)";

/// Resolved page geometry handed to the browser, all lengths in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub landscape: bool,
    pub print_background: bool,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
}

impl PdfLayout {
    /// Convert render options into print parameters. Fails on malformed margins.
    pub fn from_options(options: &RenderOptions, title: &str) -> Result<Self, ReportError> {
        let (paper_width, paper_height) = options.page_format.dimensions_in();
        let show_header_footer = options.include_header || options.include_footer;

        let header_template = show_header_footer.then(|| {
            if options.include_header {
                format!(
                    "<div style=\"font-size:8px;width:100%;text-align:center;\">{}</div>",
                    escape_html(title)
                )
            } else {
                "<span></span>".to_string()
            }
        });
        let footer_template = show_header_footer.then(|| {
            if options.include_footer {
                "<div style=\"font-size:8px;width:100%;text-align:center;\"><span class=\"pageNumber\"></span> / <span class=\"totalPages\"></span></div>".to_string()
            } else {
                "<span></span>".to_string()
            }
        });

        Ok(Self {
            paper_width,
            paper_height,
            margin_top: css_length_to_inches(&options.margins.top)?,
            margin_right: css_length_to_inches(&options.margins.right)?,
            margin_bottom: css_length_to_inches(&options.margins.bottom)?,
            margin_left: css_length_to_inches(&options.margins.left)?,
            landscape: options.orientation == Orientation::Landscape,
            print_background: true,
            header_template,
            footer_template,
        })
    }
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ReportError>;
}

/// One running browser with at most one page.
#[async_trait]
pub trait BrowserSession: Send {
    /// Open a page and load the HTML into it.
    async fn load(&mut self, html: &str) -> Result<(), ReportError>;

    /// Wait until web fonts have loaded, for at most `max_wait`.
    async fn wait_for_fonts(&mut self, max_wait: Duration) -> Result<(), ReportError>;

    async fn print_pdf(&mut self, layout: &PdfLayout) -> Result<Vec<u8>, ReportError>;

    /// Shut the browser down. Called exactly once per session by the engine.
    async fn close(&mut self) -> Result<(), ReportError>;
}

/// Renders complete HTML documents to PDF bytes.
#[derive(Clone)]
pub struct HtmlToPdfEngine {
    launcher: Arc<dyn BrowserLauncher>,
    settle_delay: Duration,
}

impl HtmlToPdfEngine {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settle_delay: Duration) -> Self {
        Self {
            launcher,
            settle_delay,
        }
    }

    /// Same launcher, different font settle delay.
    pub fn with_settle_delay(&self, settle_delay: Duration) -> Self {
        Self {
            launcher: self.launcher.clone(),
            settle_delay,
        }
    }

    /// Engine backed by a local Chromium.
    pub fn chromium(executable: Option<PathBuf>, settle_delay: Duration) -> Self {
        Self::new(Arc::new(ChromiumLauncher::new(executable)), settle_delay)
    }

    /// Render `html` to PDF. The browser session is closed on every exit path
    /// once it has been launched.
    pub async fn render(
        &self,
        html: &str,
        options: &RenderOptions,
        title: &str,
    ) -> Result<Vec<u8>, ReportError> {
        if options.password.is_some() {
            warn!("PDF password protection is not supported by the browser engine; ignoring");
        }
        let html = apply_watermark(html, options.watermark.as_deref());

        let mut session = self.launcher.launch().await?;
        debug!("browser session launched");

        let result = self.run_session(session.as_mut(), &html, options, title).await;

        if let Err(err) = session.close().await {
            warn!("failed to close browser session: {}", err);
        } else {
            debug!("browser session closed");
        }

        result
    }

    async fn run_session(
        &self,
        session: &mut dyn BrowserSession,
        html: &str,
        options: &RenderOptions,
        title: &str,
    ) -> Result<Vec<u8>, ReportError> {
        session.load(html).await?;

        if let Err(err) = session.wait_for_fonts(self.settle_delay).await {
            // Readiness probe unavailable; fall back to a fixed settle delay.
            warn!(
                "font readiness check failed ({}), sleeping {:?}",
                err, self.settle_delay
            );
            tokio::time::sleep(self.settle_delay).await;
        }

        let layout = PdfLayout::from_options(options, title)?;
        let pdf = session.print_pdf(&layout).await?;
        debug!("printed PDF, {} bytes", pdf.len());
        Ok(pdf)
    }
}

/// Overlay a diagonal watermark on every page.
pub fn apply_watermark(html: &str, watermark: Option<&str>) -> String {
    let Some(mark) = watermark.filter(|m| !m.trim().is_empty()) else {
        return html.to_string();
    };

    let overlay = format!(
        "<div class=\"watermark\" style=\"position:fixed;top:40%;left:0;width:100%;text-align:center;font-size:72px;color:rgba(0,0,0,0.08);transform:rotate(-30deg);z-index:1000;pointer-events:none;\">{}</div>\n",
        escape_html(mark)
    );

    match html.rfind("</body>") {
        Some(pos) => {
            let mut result = String::with_capacity(html.len() + overlay.len());
            result.push_str(&html[..pos]);
            result.push_str(&overlay);
            result.push_str(&html[pos..]);
            result
        }
        None => format!("{html}{overlay}"),
    }
}

/// Launches a headless Chromium configured for containers.
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
    request_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ReportError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--font-render-hinting=none")
            .window_size(1920, 1080)
            .request_timeout(self.request_timeout);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ReportError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(ChromiumSession {
            browser,
            page: None,
            handler_task: Some(handler_task),
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, ReportError> {
        self.page
            .as_ref()
            .ok_or_else(|| ReportError::PageLoad("no page loaded".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn load(&mut self, html: &str) -> Result<(), ReportError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ReportError::PageLoad(e.to_string()))?;
        page.set_content(html)
            .await
            .map_err(|e| ReportError::PageLoad(e.to_string()))?;
        self.page = Some(page);
        Ok(())
    }

    async fn wait_for_fonts(&mut self, max_wait: Duration) -> Result<(), ReportError> {
        let page = self.page()?;
        let params = EvaluateParams::builder()
            .expression(FONTS_READY_EXPRESSION)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(ReportError::PageLoad)?;

        match tokio::time::timeout(max_wait, page.evaluate_expression(params)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(ReportError::PageLoad(err.to_string())),
            Err(_) => {
                debug!("fonts not ready after {:?}, printing anyway", max_wait);
                Ok(())
            }
        }
    }

    async fn print_pdf(&mut self, layout: &PdfLayout) -> Result<Vec<u8>, ReportError> {
        let page = self.page()?;
        let mut params = PrintToPdfParams::builder()
            .paper_width(layout.paper_width)
            .paper_height(layout.paper_height)
            .margin_top(layout.margin_top)
            .margin_right(layout.margin_right)
            .margin_bottom(layout.margin_bottom)
            .margin_left(layout.margin_left)
            .landscape(layout.landscape)
            .print_background(layout.print_background);

        if layout.header_template.is_some() || layout.footer_template.is_some() {
            params = params.display_header_footer(true);
            if let Some(header) = &layout.header_template {
                params = params.header_template(header);
            }
            if let Some(footer) = &layout.footer_template {
                params = params.footer_template(footer);
            }
        }

        page.pdf(params.build())
            .await
            .map_err(|e| ReportError::PdfExport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ReportError> {
        self.page = None;
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ReportError::BrowserLaunch(format!("close failed: {}", e)));
        let _ = self.browser.wait().await;
        if let Some(task) = self.handler_task.take() {
            let _ = task.await;
        }
        closed
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}
