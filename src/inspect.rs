use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::CaptureError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const IMAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REDIRECTS: usize = 5;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// The fixed set of tags reported by the inspector, placeholder-filled when
/// absent from the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTags {
    pub title: String,
    pub description: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub og_url: String,
    pub og_type: String,
    pub twitter_card: String,
    pub twitter_title: String,
    pub twitter_description: String,
    pub twitter_image: String,
}

/// Reachability of the page's og:image, when one was advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Present,
    Missing,
    NotChecked,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReport {
    pub success: bool,
    /// Final URL after redirects.
    pub url: String,
    pub meta_tags: MetaTags,
    pub image_status: ImageStatus,
    pub status_code: u16,
}

/// Debugging aid independent of the capture flow: fetch a page server-side
/// and report the meta tags it already carries.
#[derive(Debug, Clone)]
pub struct MetaInspector {
    client: Client,
}

impl Default for MetaInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaInspector {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .expect("Failed to create meta inspector HTTP client");

        Self { client }
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn inspect(&self, url: &str) -> Result<MetaReport, CaptureError> {
        Url::parse(url).map_err(|e| CaptureError::Validation(format!("unparseable URL: {e}")))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            CaptureError::UpstreamFetch {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(CaptureError::UpstreamFetch {
                status: Some(status.as_u16()),
                message: format!("upstream returned {status}"),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CaptureError::UpstreamFetch {
                status: Some(status.as_u16()),
                message: e.to_string(),
            })?;

        let meta_tags = parse_meta_tags(&body);
        let image_status = self.check_image(&meta_tags.og_image).await;

        debug!(url = %final_url, status = status.as_u16(), ?image_status, "Meta inspection complete");
        Ok(MetaReport {
            success: true,
            url: final_url,
            meta_tags,
            image_status,
            status_code: status.as_u16(),
        })
    }

    /// HEAD the advertised og:image; a placeholder value means there is
    /// nothing to check.
    async fn check_image(&self, og_image: &str) -> ImageStatus {
        if og_image == missing("og:image") {
            return ImageStatus::NotChecked;
        }

        match self
            .client
            .head(og_image)
            .timeout(IMAGE_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => ImageStatus::Present,
            _ => ImageStatus::Missing,
        }
    }
}

fn missing(tag: &str) -> String {
    format!("{tag} not found")
}

pub(crate) fn parse_meta_tags(html: &str) -> MetaTags {
    let document = Html::parse_document(html);

    MetaTags {
        title: title_text(&document).unwrap_or_else(|| missing("title")),
        description: meta_by_name(&document, "description")
            .unwrap_or_else(|| missing("description")),
        og_title: meta_by_property(&document, "og:title").unwrap_or_else(|| missing("og:title")),
        og_description: meta_by_property(&document, "og:description")
            .unwrap_or_else(|| missing("og:description")),
        og_image: meta_by_property(&document, "og:image").unwrap_or_else(|| missing("og:image")),
        og_url: meta_by_property(&document, "og:url").unwrap_or_else(|| missing("og:url")),
        og_type: meta_by_property(&document, "og:type").unwrap_or_else(|| missing("og:type")),
        twitter_card: meta_by_name(&document, "twitter:card")
            .unwrap_or_else(|| missing("twitter:card")),
        twitter_title: meta_by_name(&document, "twitter:title")
            .unwrap_or_else(|| missing("twitter:title")),
        twitter_description: meta_by_name(&document, "twitter:description")
            .unwrap_or_else(|| missing("twitter:description")),
        twitter_image: meta_by_name(&document, "twitter:image")
            .unwrap_or_else(|| missing("twitter:image")),
    }
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|s| s.trim().to_string())?;
    (!title.is_empty()).then_some(title)
}

fn meta_by_property(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[property='{property}']")).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
}

fn meta_by_name(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name='{name}']")).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
}
