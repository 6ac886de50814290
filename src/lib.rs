use chrono::{DateTime, Utc};

mod browser;
mod capture;
mod config;
mod error;
mod extractor;
mod inspect;
mod logging;
pub mod pages;
mod screenshot;
mod server;
mod store;
mod utils;

pub use browser::BrowserSession;
pub use capture::{CaptureOutcome, CaptureService, MAX_DESCRIPTION_LEN, SHORT_ID_LEN};
pub use config::AppConfig;
pub use error::CaptureError;
pub use extractor::{MetadataExtractor, PageMetadata, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
pub use inspect::{ImageStatus, MetaInspector, MetaReport, MetaTags};
pub use logging::{setup_logging, LogConfig};
pub use screenshot::{CapturedImage, RenderTier, ScreenshotEngine};
pub use server::{build_router, serve, AppState};
pub use store::CaptureStore;

/// One captured Threads post, as persisted and as served back to short-link
/// visitors. Serialized camelCase to match the wire format of the JSON store.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub id: String,
    pub original_url: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

pub fn is_threads_url(url: &str) -> bool {
    url.contains("threads.net") || url.contains("threads.com")
}
