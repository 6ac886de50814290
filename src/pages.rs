use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::CaptureRecord;

/// Delay before the meta refresh forwards human visitors on. Link-preview
/// crawlers read the head tags and never follow the refresh.
const REDIRECT_DELAY_SECS: u32 = 2;

/// Short-link document: OG/Twitter tags for crawlers in the head, a delayed
/// refresh redirect, and a readable fallback body for everyone else.
pub fn short_link_page(record: &CaptureRecord, public_domain: &str) -> Markup {
    let image_url = format!("{public_domain}{}", record.image);
    let short_url = format!("{public_domain}/short/{}", record.id);

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta http-equiv="refresh" content=(format!("{REDIRECT_DELAY_SECS};url={}", record.original_url));
                title { (record.title) }
                meta name="description" content=(record.description);
                meta property="og:title" content=(record.title);
                meta property="og:description" content=(record.description);
                meta property="og:image" content=(image_url);
                meta property="og:url" content=(short_url);
                meta property="og:type" content="article";
                meta name="twitter:card" content="summary_large_image";
                meta name="twitter:title" content=(record.title);
                meta name="twitter:description" content=(record.description);
                meta name="twitter:image" content=(image_url);
            }
            body style="display:flex;flex-direction:column;align-items:center;justify-content:center;min-height:100vh;font-family:Arial,sans-serif;background-color:#f3f4f6" {
                h1 style="color:#1f2937;margin-bottom:1rem" { (record.title) }
                p style="color:#6b7280;text-align:center;max-width:600px" { (record.description) }
                p style="color:#9ca3af;margin-top:2rem" { "Redirecting to the original post..." }
                a href=(record.original_url) style="color:#3b82f6;text-decoration:underline;margin-top:1rem" {
                    "Click here if you are not redirected"
                }
            }
        }
    }
}

pub fn not_found_page() -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Page not found" }
            }
            body style="display:flex;align-items:center;justify-content:center;min-height:100vh;font-family:Arial,sans-serif;background-color:#f3f4f6" {
                div style="text-align:center" {
                    h1 style="color:#111827;margin-bottom:1rem" { "Page not found" }
                    p style="color:#6b7280" { "This short link does not exist or has expired" }
                }
            }
        }
    }
}

/// Minimal capture form served at the root.
pub fn index_page() -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Threads Capture" }
            }
            body style="max-width:640px;margin:4rem auto;font-family:Arial,sans-serif;color:#1f2937" {
                h1 { "Threads Capture" }
                p { "Paste a Threads post URL to get a short link with a rich preview." }
                form id="capture-form" {
                    input id="url" type="url" placeholder="https://www.threads.net/@user/post/..." required style="width:70%;padding:0.5rem";
                    button type="submit" style="padding:0.5rem 1rem" { "Capture" }
                }
                pre id="result" style="background:#f3f4f6;padding:1rem;white-space:pre-wrap" {}
                script { (PreEscaped(r#"
document.getElementById('capture-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const result = document.getElementById('result');
  result.textContent = 'Capturing...';
  try {
    const response = await fetch('/api/capture', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ url: document.getElementById('url').value }),
    });
    result.textContent = JSON.stringify(await response.json(), null, 2);
  } catch (err) {
    result.textContent = String(err);
  }
});
"#)) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record() -> CaptureRecord {
        CaptureRecord {
            id: "abcd1234".into(),
            original_url: "https://www.threads.net/@user/post/123".into(),
            title: "A post title".into(),
            description: "A post description".into(),
            image: "/images/abcd1234.png".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn short_link_page_carries_og_and_twitter_tags() {
        let markup = short_link_page(&record(), "https://preview.example.com").into_string();
        assert!(markup.contains(r#"property="og:title" content="A post title""#));
        assert!(markup
            .contains(r#"property="og:image" content="https://preview.example.com/images/abcd1234.png""#));
        assert!(markup
            .contains(r#"property="og:url" content="https://preview.example.com/short/abcd1234""#));
        assert!(markup.contains(r#"name="twitter:card" content="summary_large_image""#));
    }

    #[test]
    fn short_link_page_delays_the_redirect() {
        let markup = short_link_page(&record(), "http://localhost:3000").into_string();
        assert!(markup.contains(
            r#"http-equiv="refresh" content="2;url=https://www.threads.net/@user/post/123""#
        ));
        assert!(markup.contains("Click here if you are not redirected"));
    }

    #[test]
    fn dynamic_content_is_escaped() {
        let mut rec = record();
        rec.title = r#"<script>alert("x")</script>"#.into();
        let markup = short_link_page(&rec, "http://localhost:3000").into_string();
        assert!(!markup.contains("<script>alert"));
        assert!(markup.contains("&lt;script&gt;"));
    }

    #[test]
    fn not_found_page_has_no_refresh() {
        let markup = not_found_page().into_string();
        assert!(!markup.contains("http-equiv"));
        assert!(markup.contains("does not exist or has expired"));
    }
}
