use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::CaptureError;

/// Logical viewport the post is rendered at. 2x density keeps the captured
/// image sharp at the 1200x630 preview canvas.
pub const VIEWPORT_WIDTH: u32 = 1200;
pub const VIEWPORT_HEIGHT: u32 = 800;
pub const DEVICE_SCALE_FACTOR: f64 = 2.0;

pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);
/// Extra wait after navigation for client-side rendering to settle.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// One headless-browser session scoped to a single capture request.
///
/// Acquire with [`BrowserSession::launch`], use the page, and call
/// [`BrowserSession::close`] on every exit path; the orchestrator runs its
/// fallible pipeline first and closes the session before propagating any
/// error so the Chromium process never outlives the request.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    pub async fn launch() -> Result<Self, CaptureError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .viewport(Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
                device_scale_factor: Some(DEVICE_SCALE_FACTOR),
                ..Default::default()
            })
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .build()
            .map_err(CaptureError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::Browser(e.to_string()))?;

        // Drive CDP events for the lifetime of the session.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler event error");
                }
            }
        });

        let page = match Self::prepare_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser after setup error");
                }
                handler_task.abort();
                return Err(e);
            }
        };

        debug!("Browser session ready");
        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    async fn prepare_page(browser: &Browser) -> Result<Page, CaptureError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::Browser(e.to_string()))?;
        page.set_user_agent(USER_AGENT)
            .await
            .map_err(|e| CaptureError::Browser(e.to_string()))?;
        Ok(page)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate to the target URL with a bounded wait, then give client-side
    /// rendering a fixed settle delay.
    pub async fn navigate(&self, url: &str) -> Result<(), CaptureError> {
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        };

        match tokio::time::timeout(NAVIGATION_TIMEOUT, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(CaptureError::Navigation(e.to_string())),
            Err(_) => {
                return Err(CaptureError::Navigation(format!(
                    "page load exceeded {}s",
                    NAVIGATION_TIMEOUT.as_secs()
                )))
            }
        }

        tokio::time::sleep(SETTLE_DELAY).await;
        debug!(url = %url, "Navigation settled");
        Ok(())
    }

    /// Tear the session down. Close failures are logged, not propagated; the
    /// capture outcome was already decided by the time this runs.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        self.handler_task.abort();
        debug!("Browser session closed");
    }
}
