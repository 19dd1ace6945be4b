/*!
 * Tests for the content-addressed page cache
 */

use std::fs;

use bubblefish::page::{FallbackStage, PageTranslation};
use bubblefish::translation::{CacheKey, CacheStore};

use crate::common::{create_temp_dir, sample_fragments};

fn sample_doc() -> PageTranslation {
    PageTranslation::degraded(&sample_fragments(2))
}

#[test]
fn test_cacheKey_shouldBeStableAcrossRenames() {
    // Keys depend on content only; the filename plays no part.
    let bytes = b"the same page bytes";
    assert_eq!(CacheKey::for_image(bytes), CacheKey::for_image(bytes));
    assert_ne!(CacheKey::for_image(bytes), CacheKey::for_image(b"different page"));
}

#[test]
fn test_put_thenGet_shouldReturnStoredDocument() {
    let dir = create_temp_dir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = CacheKey::for_image(b"page");

    store.put(&key, &sample_doc()).unwrap();

    let read_back = store.get(&key).unwrap();
    assert_eq!(read_back, sample_doc());
    assert_eq!(read_back.stage, FallbackStage::OriginalText);
}

#[test]
fn test_get_withMissingEntry_shouldMiss() {
    let dir = create_temp_dir().unwrap();
    let store = CacheStore::new(dir.path());
    assert!(store.get(&CacheKey::for_image(b"never written")).is_none());
}

#[test]
fn test_get_withCorruptEntry_shouldMissInsteadOfFailing() {
    let dir = create_temp_dir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = CacheKey::for_image(b"page");

    fs::write(dir.path().join(format!("{}.json", key)), "not json at all").unwrap();

    assert!(store.get(&key).is_none());
}

#[test]
fn test_put_shouldReplaceExistingEntry() {
    let dir = create_temp_dir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = CacheKey::for_image(b"page");

    store.put(&key, &sample_doc()).unwrap();

    let mut updated = sample_doc();
    updated.success = true;
    updated.stage = FallbackStage::TextOnly;
    store.put(&key, &updated).unwrap();

    assert_eq!(store.get(&key), Some(updated));
}

#[test]
fn test_handEditedEntry_shouldBeReadBackAsAuthoritative() {
    let dir = create_temp_dir().unwrap();
    let store = CacheStore::new(dir.path());
    let key = CacheKey::for_image(b"page");
    store.put(&key, &sample_doc()).unwrap();

    // A proofreader fixes a translation directly in the entry file.
    let path = dir.path().join(format!("{}.json", key));
    let mut doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc["translated_texts"][0]["translated"] = serde_json::Value::from("校對後的譯文");
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let read_back = store.get(&key).unwrap();
    assert_eq!(read_back.translated_texts[0].translated, "校對後的譯文");
}
