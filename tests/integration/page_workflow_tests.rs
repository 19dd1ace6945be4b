/*!
 * End-to-end page translation tests: controller, flow, cache and
 * terminology working together against a scripted provider.
 */

use std::fs;

use bubblefish::app_controller::AppController;
use bubblefish::page::{BoundingBox, FallbackStage, TextFragment};
use bubblefish::providers::{MockOutcome, MockProvider};
use bubblefish::terminology::{Gender, TermEntry, TerminologyStore};
use bubblefish::translation::CacheKey;

use crate::common::{create_temp_dir, reply_for_fragments, sample_fragments, test_config};

#[tokio::test]
async fn test_workflow_withFilteredImageCall_shouldFinishViaTextOnlyAndCache() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(dir.path());
    let provider = MockProvider::scripted([
        MockOutcome::ContentFiltered("image rejected".to_string()),
        MockOutcome::Reply(reply_for_fragments(3)),
    ]);
    let controller = AppController::new(&config, provider.clone()).unwrap();

    let outcome = controller
        .translate_page(b"page-image", sample_fragments(3), false)
        .await
        .unwrap();

    assert!(outcome.translation.success);
    assert_eq!(outcome.translation.stage, FallbackStage::TextOnly);
    assert_eq!(outcome.translation.translated_texts.len(), 3);
    assert_eq!(provider.calls(), 2);

    // The cache entry landed on disk under the content-derived key.
    let key = CacheKey::for_image(b"page-image");
    let entry = fs::read_to_string(config.cache_dir.join(format!("{}.json", key))).unwrap();
    assert!(entry.contains("\"text_only\""));
}

#[tokio::test]
async fn test_workflow_withBothStagesEmpty_shouldProduceDegradedResult() {
    let dir = create_temp_dir().unwrap();
    let provider = MockProvider::scripted([
        MockOutcome::Reply(String::new()),
        MockOutcome::Reply(String::new()),
    ]);
    let controller = AppController::new(&test_config(dir.path()), provider.clone()).unwrap();

    let outcome = controller
        .translate_page(b"page-image", sample_fragments(2), false)
        .await
        .unwrap();

    assert!(!outcome.translation.success);
    assert_eq!(outcome.translation.stage, FallbackStage::OriginalText);
    for entry in &outcome.translation.translated_texts {
        assert_eq!(entry.translated, entry.original);
    }
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_workflow_repeatedCall_shouldBeIdempotentWithZeroApiCalls() {
    let dir = create_temp_dir().unwrap();
    let provider = MockProvider::scripted([MockOutcome::Reply(reply_for_fragments(2))]);
    let controller = AppController::new(&test_config(dir.path()), provider.clone()).unwrap();

    let first = controller
        .translate_page(b"page-image", sample_fragments(2), false)
        .await
        .unwrap();
    let calls_after_first = provider.calls();

    let second = controller
        .translate_page(b"page-image", sample_fragments(2), false)
        .await
        .unwrap();

    assert!(second.from_cache);
    assert_eq!(second.translation, first.translation);
    assert_eq!(provider.calls(), calls_after_first);
}

#[tokio::test]
async fn test_workflow_handEditedCacheEntry_shouldBeServedWithoutRetranslation() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(dir.path());
    let provider = MockProvider::scripted([MockOutcome::Reply(reply_for_fragments(1))]);
    let controller = AppController::new(&config, provider.clone()).unwrap();

    controller
        .translate_page(b"page-image", sample_fragments(1), false)
        .await
        .unwrap();

    // Proofreader edits the persisted document by hand.
    let key = CacheKey::for_image(b"page-image");
    let path = config.cache_dir.join(format!("{}.json", key));
    let mut doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc["translated_texts"][0]["translated"] = serde_json::Value::from("人工修正");
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let outcome = controller
        .translate_page(b"page-image", sample_fragments(1), false)
        .await
        .unwrap();

    assert!(outcome.from_cache);
    assert_eq!(outcome.translation.translated_texts[0].translated, "人工修正");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_workflow_shouldInjectDictionaryTermsWithConfusableRepair() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(dir.path());

    // Seed the dictionary before the controller loads it.
    {
        let store = TerminologyStore::load(&config.terminology_path, "ja", "zh");
        store
            .merge([("エリス".to_string(), TermEntry::with_gender("艾莉絲", Gender::Female))])
            .unwrap();
    }

    let provider = MockProvider::scripted([MockOutcome::Reply(reply_for_texts_for_page())]);
    let controller = AppController::new(&config, provider.clone()).unwrap();

    // The OCR misread エ as 工; the prompt must still carry the entry.
    let fragments = vec![TextFragment::new(
        BoundingBox::new(0, 0, 40, 40),
        "工リスさん、おはよう",
    )];
    controller
        .translate_page(b"page-image", fragments, false)
        .await
        .unwrap();

    let prompt = &provider.seen_payloads()[0].prompt;
    assert!(prompt.contains("エリス"));
    assert!(prompt.contains("艾莉絲(女性)"));
}

fn reply_for_texts_for_page() -> String {
    serde_json::json!({
        "translations": [{
            "original": "エリスさん、おはよう",
            "translated": "艾莉絲小姐，早安",
            "text_direction": "vertical",
            "bubble_type": "pure_white",
            "estimated_font_size": 14
        }],
        "new_terminology": []
    })
    .to_string()
}

#[tokio::test]
async fn test_workflow_discoveredTerms_shouldCarryIntoLaterPages() {
    let dir = create_temp_dir().unwrap();
    let config = test_config(dir.path());

    let first_reply = serde_json::json!({
        "translations": [{
            "original": "キクルだ",
            "translated": "我是奇庫魯",
            "text_direction": "horizontal",
            "bubble_type": "pure_white",
            "estimated_font_size": 14
        }],
        "new_terminology": [{ "source": "キクル", "target": "奇庫魯(男性)" }]
    })
    .to_string();
    let second_reply = serde_json::json!({
        "translations": [{
            "original": "キクルさん!",
            "translated": "奇庫魯先生!",
            "text_direction": "horizontal",
            "bubble_type": "pure_white",
            "estimated_font_size": 14
        }],
        "new_terminology": []
    })
    .to_string();

    let provider = MockProvider::scripted([
        MockOutcome::Reply(first_reply),
        MockOutcome::Reply(second_reply),
    ]);
    let controller = AppController::new(&config, provider.clone()).unwrap();

    let page_one = vec![TextFragment::new(BoundingBox::new(0, 0, 40, 40), "キクルだ")];
    controller.translate_page(b"page-one", page_one, false).await.unwrap();

    let page_two = vec![TextFragment::new(BoundingBox::new(0, 0, 40, 40), "キクルさん!")];
    controller.translate_page(b"page-two", page_two, false).await.unwrap();

    // Page two's prompt reuses the term discovered on page one.
    let prompts = provider.seen_payloads();
    assert!(prompts[1].prompt.contains("奇庫魯(男性)"));

    // And the dictionary was persisted for the next run.
    let store = TerminologyStore::load(&config.terminology_path, "ja", "zh");
    assert_eq!(
        store.lookup("キクル"),
        Some(TermEntry::with_gender("奇庫魯", Gender::Male))
    );
}
