use post_optimizer::drafts::{DraftBackend, DraftStore, JsonFileBackend, PostDraft};
use std::collections::HashSet;
use tempfile::tempdir;

#[tokio::test]
async fn save_list_delete_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");
    let store = DraftStore::open(JsonFileBackend::new(path)).await.unwrap();

    let first = store.save("First draft #rust").await.unwrap();
    let second = store.save("Second draft").await.unwrap();
    assert_ne!(first.id, second.id);

    let drafts = store.list().await;
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].content, "First draft #rust");
    assert_eq!(drafts[1].content, "Second draft");

    assert!(store.delete(first.id).await.unwrap());
    assert!(!store.delete(first.id).await.unwrap());
    let remaining = store.list().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);
}

#[tokio::test]
async fn ids_stay_unique_under_rapid_saves() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");
    let store = DraftStore::open(JsonFileBackend::new(path)).await.unwrap();

    let mut ids = Vec::new();
    for n in 0..5 {
        let draft = store.save(&format!("draft number {}", n)).await.unwrap();
        ids.push(draft.id);
    }

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[tokio::test]
async fn rejects_empty_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");
    let store = DraftStore::open(JsonFileBackend::new(path)).await.unwrap();

    assert!(store.save("   ").await.is_err());
    assert!(store.list().await.is_empty());
}

#[tokio::test]
async fn reopen_reads_persisted_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");

    let store = DraftStore::open(JsonFileBackend::new(path.clone()))
        .await
        .unwrap();
    store.save("keep me").await.unwrap();
    store.save("me too").await.unwrap();
    drop(store);

    let reopened = DraftStore::open(JsonFileBackend::new(path)).await.unwrap();
    let drafts = reopened.list().await;
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].content, "keep me");
    assert_eq!(drafts[1].content, "me too");
}

#[tokio::test]
async fn file_holds_exactly_the_current_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drafts.json");
    let store = DraftStore::open(JsonFileBackend::new(path.clone()))
        .await
        .unwrap();

    store.save("one").await.unwrap();
    let second = store.save("two").await.unwrap();
    store.delete(second.id).await.unwrap();

    let data = std::fs::read_to_string(&path).unwrap();
    let on_disk: Vec<PostDraft> = serde_json::from_str(&data).unwrap();
    assert_eq!(on_disk, store.list().await);
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].content, "one");
}

#[tokio::test]
async fn missing_file_loads_empty() {
    let dir = tempdir().unwrap();
    let backend = JsonFileBackend::new(dir.path().join("nothing_here.json"));
    assert!(backend.load().await.unwrap().is_empty());
}
