/*!
 * Tests for the shared terminology dictionary
 */

use std::fs;

use bubblefish::terminology::{Gender, TermEntry, TerminologyStore};

use crate::common::create_temp_dir;

fn store_at(dir: &std::path::Path) -> TerminologyStore {
    TerminologyStore::load(dir.join("terminology.json"), "ja", "zh")
}

#[test]
fn test_load_withMissingFile_shouldStartEmpty() {
    let dir = create_temp_dir().unwrap();
    let store = store_at(dir.path());
    assert!(store.is_empty());
    assert!(store.lookup("キクル").is_none());
}

#[test]
fn test_merge_shouldPersistAcrossReload() {
    let dir = create_temp_dir().unwrap();
    {
        let store = store_at(dir.path());
        let outcome = store
            .merge([("キクル".to_string(), TermEntry::with_gender("奇庫魯", Gender::Male))])
            .unwrap();
        assert_eq!(outcome.added, 1);
        assert!(outcome.conflicts.is_empty());
    }

    let reloaded = store_at(dir.path());
    assert_eq!(reloaded.len(), 1);
    assert_eq!(
        reloaded.lookup("キクル"),
        Some(TermEntry::with_gender("奇庫魯", Gender::Male))
    );
}

#[test]
fn test_persistedFile_shouldUseAnnotatedPairLayout() {
    let dir = create_temp_dir().unwrap();
    let store = store_at(dir.path());
    store
        .merge([
            ("キクル".to_string(), TermEntry::with_gender("奇庫魯", Gender::Male)),
            ("魔法學院".to_string(), TermEntry::new("魔法學院")),
        ])
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("terminology.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(doc["ja_to_zh"]["キクル"], "奇庫魯(男性)");
    assert_eq!(doc["ja_to_zh"]["魔法學院"], "魔法學院");
    assert_eq!(doc["metadata"]["total_terms"], 2);
    assert_eq!(doc["metadata"]["version"], "1.0");
}

#[test]
fn test_load_withCorruptFile_shouldFallBackToEmptyDictionary() {
    let dir = create_temp_dir().unwrap();
    fs::write(dir.path().join("terminology.json"), "{ not valid json").unwrap();

    let store = store_at(dir.path());
    assert!(store.is_empty());
}

#[test]
fn test_merge_withDisjointSets_shouldBeCommutative() {
    let set_a = [("キクル".to_string(), TermEntry::with_gender("奇庫魯", Gender::Male))];
    let set_b = [("艾諾梅".to_string(), TermEntry::with_gender("艾諾梅", Gender::Female))];

    let dir_ab = create_temp_dir().unwrap();
    let store_ab = store_at(dir_ab.path());
    store_ab.merge(set_a.clone()).unwrap();
    store_ab.merge(set_b.clone()).unwrap();

    let dir_ba = create_temp_dir().unwrap();
    let store_ba = store_at(dir_ba.path());
    store_ba.merge(set_b).unwrap();
    store_ba.merge(set_a).unwrap();

    assert_eq!(store_ab.all_terms(), store_ba.all_terms());
}

#[test]
fn test_merge_withEqualGenders_shouldLetLaterStringWin() {
    let dir = create_temp_dir().unwrap();
    let store = store_at(dir.path());

    store
        .merge([("キクル".to_string(), TermEntry::with_gender("奇庫魯", Gender::Male))])
        .unwrap();
    let outcome = store
        .merge([("キクル".to_string(), TermEntry::with_gender("基克爾", Gender::Male))])
        .unwrap();

    assert_eq!(outcome.updated, 1);
    assert_eq!(
        store.lookup("キクル"),
        Some(TermEntry::with_gender("基克爾", Gender::Male))
    );
}

#[test]
fn test_merge_withUnknownIncomingGender_shouldPreserveKnownTag() {
    let dir = create_temp_dir().unwrap();
    let store = store_at(dir.path());

    store
        .merge([("キクル".to_string(), TermEntry::with_gender("奇庫魯", Gender::Male))])
        .unwrap();
    store
        .merge([("キクル".to_string(), TermEntry::new("基克爾"))])
        .unwrap();

    // The string updates but the first-set gender tag sticks.
    assert_eq!(
        store.lookup("キクル"),
        Some(TermEntry::with_gender("基克爾", Gender::Male))
    );
}

#[test]
fn test_merge_withConflictingGenders_shouldKeepExistingAndReport() {
    let dir = create_temp_dir().unwrap();
    let store = store_at(dir.path());

    store
        .merge([("カナタ".to_string(), TermEntry::with_gender("卡那塔", Gender::Male))])
        .unwrap();
    let outcome = store
        .merge([("カナタ".to_string(), TermEntry::with_gender("加奈田", Gender::Female))])
        .unwrap();

    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.conflicts.len(), 1);
    assert_eq!(outcome.conflicts[0].term, "カナタ");
    assert_eq!(
        store.lookup("カナタ"),
        Some(TermEntry::with_gender("卡那塔", Gender::Male))
    );
}

#[test]
fn test_subsetForTexts_shouldSelectOnlyTermsPresent() {
    let dir = create_temp_dir().unwrap();
    let store = store_at(dir.path());
    store
        .merge([
            ("キクル".to_string(), TermEntry::with_gender("奇庫魯", Gender::Male)),
            ("魔法學院".to_string(), TermEntry::new("魔法學院")),
        ])
        .unwrap();

    let texts = ["キクルさん、行くよ", "早くしろ"];
    let subset = store.subset_for_texts(texts.iter().map(|s| &**s));

    assert_eq!(subset.len(), 1);
    assert!(subset.contains_key("キクル"));
}

#[test]
fn test_searchAndRemove_shouldOperateOnBothColumns() {
    let dir = create_temp_dir().unwrap();
    let store = store_at(dir.path());
    store
        .merge([("キクル".to_string(), TermEntry::with_gender("奇庫魯", Gender::Male))])
        .unwrap();

    assert_eq!(store.search("奇庫").len(), 1);
    assert_eq!(store.search("キク").len(), 1);
    assert!(store.search("無關").is_empty());

    assert!(store.remove("キクル").unwrap());
    assert!(!store.remove("キクル").unwrap());
    assert!(store.is_empty());

    // Removal is persisted too.
    let reloaded = store_at(dir.path());
    assert!(reloaded.is_empty());
}
