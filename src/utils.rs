use rand::Rng;
use scraper::Html;
use unicode_width::UnicodeWidthChar;

/// Safely truncate a string, ensuring it is not truncated in the middle of multi-byte characters
///
/// This function will:
/// 1. Correctly handle Unicode characters (including Chinese, emoji, etc.)
/// 2. Add ellipsis when maximum length is reached
/// 3. Ensure the output string's display width does not exceed the specified length
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);

        if current_width + char_width + 3 > max_width {
            break;
        }

        result.push(c);
        current_width += char_width;
    }

    result.push_str("...");
    result
}

/// Strip all markup from an HTML fragment, keeping only text content.
///
/// Zero allowed tags and attributes: the fragment is parsed with a real HTML
/// parser and reduced to its text nodes, so extracted descriptions can be
/// echoed into meta tags without carrying injected markup along. Text inside
/// script and style elements is dropped with the element.
pub fn strip_markup(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut out = String::new();

    for node in fragment.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_raw_text = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style")))
            .unwrap_or(false);
        if !in_raw_text {
            out.push_str(&text.text);
        }
    }

    out.trim().to_string()
}

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Random URL-safe identifier of the given length.
pub fn generate_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Hello, world!", 10), "Hello, ...");
        assert_eq!(truncate_str("你好，世界！", 8), "你好...");
        assert_eq!(truncate_str("Hello 你好！", 10), "Hello ...");
        assert_eq!(truncate_str("Hi!", 10), "Hi!");
    }

    #[test]
    fn truncated_descriptions_stay_within_limit() {
        let long = "a".repeat(250);
        let truncated = truncate_str(&long, 200);
        assert!(truncated.chars().count() <= 200);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn strip_markup_removes_tags() {
        assert_eq!(strip_markup("<b>bold</b> and <i>italic</i>"), "bold and italic");
        assert_eq!(strip_markup("plain text"), "plain text");
        assert_eq!(
            strip_markup("<img src=x onerror=alert(1)>caption"),
            "caption"
        );
    }

    #[test]
    fn strip_markup_drops_script_content() {
        assert_eq!(
            strip_markup("before<script>alert('xss')</script>after"),
            "beforeafter"
        );
        assert_eq!(strip_markup("<style>body{}</style>text"), "text");
    }

    #[test]
    fn strip_markup_decodes_entities() {
        assert_eq!(strip_markup("a &amp; b"), "a & b");
    }

    #[test]
    fn generated_ids_are_url_safe() {
        let id = generate_id(8);
        assert_eq!(id.len(), 8);
        assert!(id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_id(8), generate_id(8));
    }
}
