use chrono::Utc;
use tempfile::tempdir;
use threads_capture::{pages, CaptureRecord, CaptureStore};

fn record(id: &str) -> CaptureRecord {
    CaptureRecord {
        id: id.to_string(),
        original_url: "https://www.threads.net/@user/post/123".into(),
        title: "A captured post".into(),
        description: "What the post said, shortened for previews".into(),
        image: format!("/images/{id}.png"),
        created_at: Utc::now(),
    }
}

#[test]
fn known_ids_resolve_to_a_crawlable_document() {
    let dir = tempdir().unwrap();
    let store = CaptureStore::new(dir.path().join("threads.json"));
    store.append(record("abcd1234")).unwrap();

    let found = store.find("abcd1234").expect("record resolves");
    let markup = pages::short_link_page(&found, "https://preview.example.com").into_string();

    // Crawlers get the enriched tags, humans get the delayed redirect.
    assert!(markup.contains(r#"property="og:title" content="A captured post""#));
    assert!(markup.contains(r#"name="twitter:card" content="summary_large_image""#));
    assert!(markup.contains("http-equiv=\"refresh\""));
    assert!(markup.contains("2;url=https://www.threads.net/@user/post/123"));
}

#[test]
fn unknown_ids_fall_back_to_not_found() {
    let dir = tempdir().unwrap();
    let store = CaptureStore::new(dir.path().join("threads.json"));
    store.append(record("abcd1234")).unwrap();

    assert!(store.find("zzzz9999").is_none());

    let markup = pages::not_found_page().into_string();
    assert!(!markup.contains("http-equiv"));
}

#[test]
fn capture_appends_exactly_one_record_per_post() {
    let dir = tempdir().unwrap();
    let store = CaptureStore::new(dir.path().join("threads.json"));

    let before = store.read_all().len();
    store.append(record("abcd1234")).unwrap();
    let records = store.read_all();
    assert_eq!(records.len(), before + 1);

    // All six fields populated on the stored record.
    let stored = &records[0];
    assert_eq!(stored.id.len(), 8);
    assert!(!stored.original_url.is_empty());
    assert!(!stored.title.is_empty());
    assert!(!stored.description.is_empty());
    assert!(stored.image.starts_with("/images/"));
}
