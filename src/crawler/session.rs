//! Rendering sessions
//!
//! A renderer turns a page URL into markup. Two implementations exist:
//! - [`ChromiumRenderer`] launches a fresh headless Chromium per page, so
//!   client-side scripts run and no cookies or cache leak between pages
//! - [`HttpRenderer`] performs a plain GET, for catalogs rendered server side
//!
//! Both sleep for the caller-provided settle delay between page load and
//! reading the markup.

use crate::config::{CrawlJob, RendererConfig, RendererKind};
use crate::HarvestError;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::Browser;
use futures::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

/// URL patterns blocked when stylesheets are disabled
const STYLESHEET_PATTERNS: [&str; 2] = ["*.css", "*.css?*"];

/// Failure while rendering one URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("failed to open rendering session: {0}")]
    Session(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("page load timed out")]
    Timeout,

    #[error("could not read rendered markup: {0}")]
    Content(String),
}

/// Produces the rendered markup of a URL
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Loads `url`, waits `settle`, then returns the document markup
    async fn render(&self, url: &Url, settle: Duration) -> Result<String, RenderError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Builds the renderer selected by the job
///
/// # Returns
///
/// * `Ok(Arc<dyn PageRenderer>)` - The renderer shared by all workers
/// * `Err(HarvestError)` - The HTTP client could not be built
pub fn build_renderer(
    job: &CrawlJob,
    config: &RendererConfig,
) -> crate::Result<Arc<dyn PageRenderer>> {
    match job.renderer {
        RendererKind::Chromium => Ok(Arc::new(ChromiumRenderer::new(
            config.clone(),
            job.page_load_timeout,
        ))),
        RendererKind::Http => {
            let client = build_http_client(config, job.page_load_timeout)
                .map_err(|e| HarvestError::Renderer(e.to_string()))?;
            Ok(Arc::new(HttpRenderer::new(client)))
        }
    }
}

/// Headless Chromium renderer, one disposable browser per page
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    config: RendererConfig,
    request_timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(config: RendererConfig, request_timeout: Duration) -> Self {
        Self {
            config,
            request_timeout,
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &Url, settle: Duration) -> Result<String, RenderError> {
        let session = BrowserSession::open(&self.config, self.request_timeout).await?;
        let result = session.load(url, settle).await;
        session.close().await;
        result
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// A running browser with a throwaway profile directory
///
/// Release is guaranteed: [`BrowserSession::close`] shuts the browser down
/// gracefully, and dropping an unclosed session (error path, timeout,
/// cancelled task) kills the browser process and removes the profile on a
/// best-effort basis.
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    block_stylesheets: bool,
    profile: Option<TempDir>,
}

impl BrowserSession {
    /// Launches a browser configured for fast, isolated page loads
    pub async fn open(config: &RendererConfig, request_timeout: Duration) -> Result<Self, RenderError> {
        let profile = tempfile::Builder::new()
            .prefix("listing-harvester-")
            .tempdir()
            .map_err(|e| RenderError::Session(format!("profile directory: {}", e)))?;

        let mut builder = chromiumoxide::BrowserConfig::builder()
            .user_data_dir(profile.path())
            .request_timeout(request_timeout)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !config.headless {
            builder = builder.with_head();
        }
        if config.block_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.arg(format!("--user-agent={}", user_agent));
        }

        let browser_config = builder.build().map_err(RenderError::Session)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        // Drive CDP events until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::trace!("Browser session opened in {}", profile.path().display());

        Ok(Self {
            browser: Some(browser),
            handler,
            block_stylesheets: config.block_stylesheets,
            profile: Some(profile),
        })
    }

    /// Navigates to `url`, waits `settle`, and returns the document markup
    pub async fn load(&self, url: &Url, settle: Duration) -> Result<String, RenderError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Session("session already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        if self.block_stylesheets {
            page.execute(EnableParams::default())
                .await
                .map_err(|e| RenderError::Session(e.to_string()))?;
            page.execute(SetBlockedUrLsParams::new(
                STYLESHEET_PATTERNS.iter().map(|p| p.to_string()).collect(),
            ))
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;
        }

        page.goto(url.as_str())
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        tokio::time::sleep(settle).await;

        page.content()
            .await
            .map_err(|e| RenderError::Content(e.to_string()))
    }

    /// Shuts the browser down and waits for the process to exit
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("Failed to reap browser process: {}", e);
            }
        }
        self.handler.abort();

        // The process has exited, so nothing is writing to the profile anymore
        remove_profile(self.profile.take());
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            // Dropping the Browser kills its child process
            tracing::debug!("Browser session dropped before close, killing browser");
        }
        self.handler.abort();
    }
}

/// Deletes a browser profile directory, logging instead of failing
fn remove_profile(profile: Option<TempDir>) {
    let Some(profile) = profile else {
        return;
    };
    let path = profile.path().to_path_buf();
    if let Err(e) = profile.close() {
        tracing::warn!("Failed to remove browser profile {}: {}", path.display(), e);
    }
}

/// Builds the HTTP client used by the static renderer
pub fn build_http_client(config: &RendererConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = config.user_agent.clone().unwrap_or_else(|| {
        format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    });

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Static renderer: fetches the served HTML without running scripts
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &Url, settle: Duration) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_http_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        tokio::time::sleep(settle).await;

        response
            .text()
            .await
            .map_err(|e| RenderError::Content(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn classify_http_error(url: &Url, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
