use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::browser::BrowserSession;
use crate::screenshot::CapturedImage;
use crate::utils::{generate_id, strip_markup, truncate_str};
use crate::{
    is_threads_url, AppConfig, CaptureError, CaptureRecord, CaptureStore, MetadataExtractor,
    ScreenshotEngine,
};

pub const SHORT_ID_LEN: usize = 8;
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Host assumed when the request carries no Host header.
const FALLBACK_HOST: &str = "localhost:3000";

/// Successful capture response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub success: bool,
    pub short_url: String,
    pub title: String,
    pub description: String,
    pub has_screenshot: bool,
    pub render_method: &'static str,
}

struct RenderedPost {
    title: String,
    description: String,
    shot: CapturedImage,
}

/// End-to-end capture pipeline: validate, render in a scoped browser
/// session, extract and sanitize metadata, screenshot, persist, and build
/// the short link.
#[derive(Debug, Clone)]
pub struct CaptureService {
    config: AppConfig,
    store: CaptureStore,
    extractor: MetadataExtractor,
    screenshots: ScreenshotEngine,
}

impl CaptureService {
    pub fn new(config: AppConfig, store: CaptureStore) -> Self {
        Self {
            config,
            store,
            extractor: MetadataExtractor::new(),
            screenshots: ScreenshotEngine::new(),
        }
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn capture(
        &self,
        url: &str,
        request_host: Option<&str>,
    ) -> Result<CaptureOutcome, CaptureError> {
        if url.is_empty() || !is_threads_url(url) {
            return Err(CaptureError::Validation(format!(
                "not a Threads URL: {url:?}"
            )));
        }

        let session = BrowserSession::launch().await?;
        let rendered = self.render(&session, url).await;
        // Teardown happens before the pipeline result is inspected so the
        // Chromium process is released on every exit path.
        session.close().await;
        let rendered = rendered?;

        let id = generate_id(SHORT_ID_LEN);
        let image = AppConfig::image_url_path(&id);
        let has_screenshot = match self.save_image(&id, &rendered.shot.data).await {
            Ok(()) => {
                debug!(id = %id, size = rendered.shot.data.len(), "Screenshot saved");
                true
            }
            Err(e) => {
                // The capture still succeeds; the record keeps the
                // placeholder image path.
                warn!(id = %id, error = %e, "Failed to save screenshot");
                false
            }
        };

        let record = CaptureRecord {
            id: id.clone(),
            original_url: url.to_string(),
            title: rendered.title.clone(),
            description: rendered.description.clone(),
            image,
            created_at: Utc::now(),
        };
        self.store.append(record)?;

        let short_url = format!("{}/short/{id}", request_origin(request_host));
        info!(
            id = %id,
            render_method = rendered.shot.tier.as_str(),
            region_found = rendered.shot.region_found,
            has_screenshot,
            "Capture complete"
        );

        Ok(CaptureOutcome {
            success: true,
            short_url,
            title: rendered.title,
            description: rendered.description,
            has_screenshot,
            render_method: rendered.shot.tier.as_str(),
        })
    }

    async fn render(
        &self,
        session: &BrowserSession,
        url: &str,
    ) -> Result<RenderedPost, CaptureError> {
        session.navigate(url).await?;

        let html = session
            .page()
            .content()
            .await
            .map_err(|e| CaptureError::Evaluation(e.to_string()))?;
        let metadata = self.extractor.extract(&html);
        let description = truncate_str(&strip_markup(&metadata.description), MAX_DESCRIPTION_LEN);

        let shot = self.screenshots.capture(session.page()).await?;

        Ok(RenderedPost {
            title: metadata.title,
            description,
            shot,
        })
    }

    async fn save_image(&self, id: &str, data: &[u8]) -> Result<(), std::io::Error> {
        tokio::fs::create_dir_all(&self.config.images_dir).await?;
        tokio::fs::write(self.config.image_path(id), data).await
    }
}

/// Origin for the returned short link, derived from the inbound Host header.
/// Local hosts get a plain scheme, everything else is assumed secure.
fn request_origin(request_host: Option<&str>) -> String {
    let host = request_host.unwrap_or(FALLBACK_HOST);
    let scheme = if host.contains("localhost") || host.starts_with("127.") {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_uses_plain_scheme_for_local_hosts() {
        assert_eq!(request_origin(Some("localhost:3000")), "http://localhost:3000");
        assert_eq!(request_origin(Some("127.0.0.1:8080")), "http://127.0.0.1:8080");
        assert_eq!(request_origin(None), "http://localhost:3000");
    }

    #[test]
    fn origin_assumes_https_elsewhere() {
        assert_eq!(request_origin(Some("preview.example.com")), "https://preview.example.com");
    }

    #[test]
    fn outcome_serializes_camel_case() {
        let outcome = CaptureOutcome {
            success: true,
            short_url: "http://localhost:3000/short/abcd1234".into(),
            title: "Threads post".into(),
            description: "Content from Threads".into(),
            has_screenshot: true,
            render_method: "html2canvas",
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["shortUrl"], "http://localhost:3000/short/abcd1234");
        assert_eq!(value["hasScreenshot"], true);
        assert_eq!(value["renderMethod"], "html2canvas");
    }
}
