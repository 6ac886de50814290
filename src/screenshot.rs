use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, Viewport as ClipViewport,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::browser::DEVICE_SCALE_FACTOR;
use crate::CaptureError;

/// Target preview canvas, the standard OG image size.
pub const CANVAS_WIDTH: f64 = 1200.0;
pub const CANVAS_HEIGHT: f64 = 630.0;

/// A region qualifies as post content only above this size.
pub const MIN_REGION_WIDTH: f64 = 200.0;
pub const MIN_REGION_HEIGHT: f64 = 100.0;

/// Clips smaller than this are padded outward before capture.
pub const MIN_CLIP_WIDTH: f64 = 1000.0;
pub const MIN_CLIP_HEIGHT: f64 = 500.0;

/// Ordered candidates for the post content region, shared by both tiers.
/// First entries are obfuscated class fragments seen on current Threads
/// markup, then test ids, then progressively more generic guesses.
pub const CONTENT_REGION_SELECTORS: [&str; 12] = [
    r#"[class*="x1n2onr6"]"#,
    r#"[class*="x1f9n5g"]"#,
    r#"[class*="x17dsfyh"]"#,
    r#"[data-testid="post-container"]"#,
    r#"[data-testid="post-content"]"#,
    "article",
    r#"[role="article"]"#,
    ".post-content",
    ".thread-content",
    ".article-content",
    r#"div[dir="auto"]"#,
    "div[lang]",
];

/// Which strategy produced the final image. Observability only; nothing
/// branches on this downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTier {
    RichCanvas,
    DirectClip,
}

impl RenderTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderTier::RichCanvas => "html2canvas",
            RenderTier::DirectClip => "viewport_clip",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub data: Vec<u8>,
    pub tier: RenderTier,
    pub region_found: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub(crate) struct RegionProbe {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub found: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RichRenderResult {
    data_url: Option<String>,
    region_found: bool,
}

/// Two-tier screenshot cascade.
///
/// Tier 1 injects html2canvas and renders the post region (or the whole
/// body) to a PNG data URL inside the page; any failure there falls through.
/// Tier 2 probes the same region selectors for a clip rectangle and captures
/// it over CDP; failure at this tier is fatal to the capture.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotEngine;

impl ScreenshotEngine {
    pub fn new() -> Self {
        Self
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn capture(&self, page: &Page) -> Result<CapturedImage, CaptureError> {
        match self.rich_render(page).await {
            Ok(Some(image)) => {
                debug!(size = image.data.len(), "Rich canvas render succeeded");
                return Ok(image);
            }
            Ok(None) => debug!("html2canvas unavailable, falling back to direct capture"),
            Err(e) => warn!(error = %e, "Rich render failed, falling back to direct capture"),
        }

        self.direct_capture(page).await
    }

    async fn rich_render(&self, page: &Page) -> Result<Option<CapturedImage>, CaptureError> {
        let injected: bool = eval_value(page, INJECT_HTML2CANVAS).await?;
        if !injected {
            return Ok(None);
        }

        let result: RichRenderResult = eval_value(page, &rich_render_script()).await?;
        let Some(data_url) = result.data_url else {
            return Ok(None);
        };

        let encoded = data_url
            .strip_prefix("data:image/png;base64,")
            .unwrap_or(&data_url);
        let data = BASE64
            .decode(encoded)
            .map_err(|e| CaptureError::Evaluation(format!("invalid canvas data URL: {e}")))?;

        Ok(Some(CapturedImage {
            data,
            tier: RenderTier::RichCanvas,
            region_found: result.region_found,
        }))
    }

    async fn direct_capture(&self, page: &Page) -> Result<CapturedImage, CaptureError> {
        let probe: RegionProbe = eval_value(page, &region_probe_script()).await?;
        let clip = clip_region(&probe);
        debug!(
            found = probe.found,
            width = clip.width,
            height = clip.height,
            "Capturing clipped screenshot"
        );

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(ClipViewport {
                x: clip.x,
                y: clip.y,
                width: clip.width,
                height: clip.height,
                scale: 1.0,
            })
            .build();

        let data = page
            .screenshot(params)
            .await
            .map_err(|e| CaptureError::Screenshot(e.to_string()))?;

        Ok(CapturedImage {
            data,
            tier: RenderTier::DirectClip,
            region_found: probe.found,
        })
    }
}

/// Pad undersized regions outward to at least the minimum clip size and
/// clamp the result to the canvas.
pub(crate) fn clip_region(probe: &RegionProbe) -> ClipRect {
    if probe.width < MIN_CLIP_WIDTH || probe.height < MIN_CLIP_HEIGHT {
        return ClipRect {
            x: (probe.x - 100.0).max(0.0),
            y: (probe.y - 50.0).max(0.0),
            width: (probe.width + 200.0).max(MIN_CLIP_WIDTH).min(CANVAS_WIDTH),
            height: (probe.height + 100.0).max(MIN_CLIP_HEIGHT).min(CANVAS_HEIGHT),
        };
    }

    ClipRect {
        x: probe.x.max(0.0),
        y: probe.y.max(0.0),
        width: probe.width,
        height: probe.height,
    }
}

async fn eval_value<T: serde::de::DeserializeOwned>(
    page: &Page,
    script: &str,
) -> Result<T, CaptureError> {
    let params = EvaluateParams::builder()
        .expression(script)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(CaptureError::Evaluation)?;

    page.evaluate(params)
        .await
        .map_err(|e| CaptureError::Evaluation(e.to_string()))?
        .into_value()
        .map_err(|e| CaptureError::Evaluation(e.to_string()))
}

/// Resolves `true` once html2canvas is present, `false` when the CDN script
/// cannot be loaded. Never rejects.
const INJECT_HTML2CANVAS: &str = r#"(() => new Promise((resolve) => {
  if (window.html2canvas) { resolve(true); return; }
  const script = document.createElement('script');
  script.src = 'https://html2canvas.hertzen.com/dist/html2canvas.min.js';
  script.onload = () => resolve(true);
  script.onerror = () => resolve(false);
  document.head.appendChild(script);
  setTimeout(() => resolve(Boolean(window.html2canvas)), 5000);
}))()"#;

fn selectors_json() -> String {
    serde_json::to_string(&CONTENT_REGION_SELECTORS).expect("selector list serializes")
}

fn rich_render_script() -> String {
    format!(
        r#"(() => new Promise((resolve) => {{
  const selectors = {selectors};
  const findTarget = () => {{
    for (const selector of selectors) {{
      const el = document.querySelector(selector);
      if (!el) continue;
      const rect = el.getBoundingClientRect();
      if (rect.width > {min_w} && rect.height > {min_h}) return el;
    }}
    return null;
  }};
  if (!window.html2canvas) {{ resolve({{ dataUrl: null, regionFound: false }}); return; }}
  const options = {{
    width: {width},
    height: {height},
    scale: {scale},
    useCORS: true,
    allowTaint: false,
    backgroundColor: '#ffffff',
    logging: false,
  }};
  const target = findTarget();
  if (!target) {{
    window.html2canvas(document.body, options)
      .then((canvas) => resolve({{ dataUrl: canvas.toDataURL('image/png', 1.0), regionFound: false }}))
      .catch(() => resolve({{ dataUrl: null, regionFound: false }}));
    return;
  }}
  const container = document.createElement('div');
  container.style.position = 'absolute';
  container.style.left = '-9999px';
  container.style.top = '-9999px';
  container.style.width = '{width}px';
  container.style.maxWidth = '{width}px';
  container.style.backgroundColor = '#ffffff';
  container.style.padding = '20px';
  container.style.boxSizing = 'border-box';
  container.appendChild(target.cloneNode(true));
  document.body.appendChild(container);
  window.html2canvas(container, options)
    .then((canvas) => {{
      document.body.removeChild(container);
      resolve({{ dataUrl: canvas.toDataURL('image/png', 1.0), regionFound: true }});
    }})
    .catch(() => {{
      if (document.body.contains(container)) document.body.removeChild(container);
      resolve({{ dataUrl: null, regionFound: true }});
    }});
}}))()"#,
        selectors = selectors_json(),
        min_w = MIN_REGION_WIDTH,
        min_h = MIN_REGION_HEIGHT,
        width = CANVAS_WIDTH,
        height = CANVAS_HEIGHT,
        scale = DEVICE_SCALE_FACTOR,
    )
}

fn region_probe_script() -> String {
    format!(
        r#"(() => {{
  const selectors = {selectors};
  for (const selector of selectors) {{
    const el = document.querySelector(selector);
    if (!el) continue;
    const rect = el.getBoundingClientRect();
    if (rect.width > {min_w} && rect.height > {min_h}) {{
      return {{
        x: rect.left,
        y: rect.top,
        width: Math.min(rect.width, {max_w}),
        height: Math.min(rect.height, {max_h}),
        found: true,
      }};
    }}
  }}
  return {{ x: 0, y: 0, width: {max_w}, height: {max_h}, found: false }};
}})()"#,
        selectors = selectors_json(),
        min_w = MIN_REGION_WIDTH,
        min_h = MIN_REGION_HEIGHT,
        max_w = CANVAS_WIDTH,
        max_h = CANVAS_HEIGHT,
    )
}
