use scraper::{Html, Selector};
use tracing::debug;

/// Where a strategy reads its value from once the selector matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// `content` attribute of a meta tag.
    MetaContent,
    /// Trimmed text content of the element.
    Text,
}

/// One step of an ordered fallback search over the rendered DOM.
#[derive(Debug, Clone, Copy)]
pub struct SelectorStrategy {
    pub css: &'static str,
    pub source: ValueSource,
}

pub const DEFAULT_TITLE: &str = "Threads post";
pub const DEFAULT_DESCRIPTION: &str = "Content from Threads";

/// Candidates shorter than this are near-empty matches and are skipped.
const MIN_DESCRIPTION_CHARS: usize = 10;

pub const TITLE_STRATEGIES: [SelectorStrategy; 5] = [
    SelectorStrategy {
        css: r#"meta[property="og:title"]"#,
        source: ValueSource::MetaContent,
    },
    SelectorStrategy {
        css: "title",
        source: ValueSource::Text,
    },
    SelectorStrategy {
        css: r#"[data-testid="post-header"]"#,
        source: ValueSource::Text,
    },
    SelectorStrategy {
        css: ".post-header",
        source: ValueSource::Text,
    },
    SelectorStrategy {
        css: "h1",
        source: ValueSource::Text,
    },
];

pub const DESCRIPTION_STRATEGIES: [SelectorStrategy; 6] = [
    SelectorStrategy {
        css: r#"meta[property="og:description"]"#,
        source: ValueSource::MetaContent,
    },
    SelectorStrategy {
        css: r#"meta[name="description"]"#,
        source: ValueSource::MetaContent,
    },
    SelectorStrategy {
        css: r#"[data-testid="post-content"]"#,
        source: ValueSource::Text,
    },
    SelectorStrategy {
        css: ".post-content",
        source: ValueSource::Text,
    },
    SelectorStrategy {
        css: r#"[role="article"] div[dir="auto"]"#,
        source: ValueSource::Text,
    },
    SelectorStrategy {
        css: r#"article div[dir="auto"]"#,
        source: ValueSource::Text,
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

/// Metadata extractor, responsible for locating a title and description in
/// the rendered page. Each field runs its own selector cascade in order and
/// the first acceptable match wins; when nothing matches, the fixed
/// placeholders stand in.
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, html: &str) -> PageMetadata {
        let document = Html::parse_document(html);

        let title = first_acceptable(&document, &TITLE_STRATEGIES, |value| value != DEFAULT_TITLE)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let description = first_acceptable(&document, &DESCRIPTION_STRATEGIES, |value| {
            value != DEFAULT_DESCRIPTION && value.chars().count() > MIN_DESCRIPTION_CHARS
        })
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        debug!(title = %title, description_len = description.len(), "Metadata extracted");
        PageMetadata { title, description }
    }
}

fn first_acceptable(
    document: &Html,
    strategies: &[SelectorStrategy],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    for strategy in strategies {
        let Ok(selector) = Selector::parse(strategy.css) else {
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };

        let value = match strategy.source {
            ValueSource::MetaContent => element.value().attr("content").map(str::to_string),
            ValueSource::Text => Some(element.text().collect::<String>()),
        };
        let Some(value) = value else {
            continue;
        };

        let value = value.trim().to_string();
        if !value.is_empty() && accept(&value) {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> PageMetadata {
        MetadataExtractor::new().extract(html)
    }

    #[test]
    fn og_title_wins_over_document_title() {
        let meta = extract(
            r#"<html><head>
                <meta property="og:title" content="From OG">
                <title>From title</title>
            </head><body></body></html>"#,
        );
        assert_eq!(meta.title, "From OG");
    }

    #[test]
    fn document_title_is_second_choice() {
        let meta = extract("<html><head><title>  A post  </title></head><body></body></html>");
        assert_eq!(meta.title, "A post");
    }

    #[test]
    fn content_selectors_back_up_missing_meta() {
        let meta = extract(r#"<html><body><h1>Heading title</h1></body></html>"#);
        assert_eq!(meta.title, "Heading title");
    }

    #[test]
    fn placeholders_survive_empty_pages() {
        let meta = extract("<html><head></head><body></body></html>");
        assert_eq!(meta.title, DEFAULT_TITLE);
        assert_eq!(meta.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn og_description_wins_over_meta_description() {
        let meta = extract(
            r#"<html><head>
                <meta property="og:description" content="An OG description here">
                <meta name="description" content="A plain description here">
            </head><body></body></html>"#,
        );
        assert_eq!(meta.description, "An OG description here");
    }

    #[test]
    fn near_empty_descriptions_are_skipped() {
        // The article text is 10 chars or fewer, so the cascade keeps going
        // and lands on the placeholder.
        let meta = extract(
            r#"<html><body><article><div dir="auto">short one</div></article></body></html>"#,
        );
        assert_eq!(meta.description, DEFAULT_DESCRIPTION);

        let meta = extract(
            r#"<html><body><article><div dir="auto">long enough post text</div></article></body></html>"#,
        );
        assert_eq!(meta.description, "long enough post text");
    }

    #[test]
    fn post_content_testid_is_preferred_over_article_text() {
        let meta = extract(
            r#"<html><body>
                <div data-testid="post-content">the actual post body text</div>
                <article><div dir="auto">surrounding thread chatter</div></article>
            </body></html>"#,
        );
        assert_eq!(meta.description, "the actual post body text");
    }

    #[test]
    fn placeholder_valued_tags_do_not_win() {
        let html = format!(
            r#"<html><head><meta property="og:title" content="{DEFAULT_TITLE}"></head>
            <body><h1>Real heading</h1></body></html>"#
        );
        assert_eq!(extract(&html).title, "Real heading");
    }
}
