//! Integration tests for CatalogStore against a real temp directory.

use cabinet_catalog::{CatalogStore, EntryPatch, GameEntry};
use tempfile::TempDir;

fn store_in(tmp: &TempDir) -> CatalogStore {
  CatalogStore::new(
    tmp.path().join("games.json"),
    tmp.path().join("builds"),
  )
}

fn entry(id: &str, title: &str) -> GameEntry {
  GameEntry::new(
    id.to_string(),
    title.to_string(),
    "someone".to_string(),
    Some("CS101".to_string()),
  )
}

#[tokio::test]
async fn publish_and_list_round_trip() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  assert!(store.list().await.is_empty());

  store.publish(entry("alpha", "Alpha"), false).await.unwrap();
  store.publish(entry("beta", "Beta"), false).await.unwrap();

  let games = store.list().await;
  assert_eq!(games.len(), 2);
  assert_eq!(games[0].id, "alpha");
  assert_eq!(games[1].id, "beta");
}

#[tokio::test]
async fn duplicate_id_without_overwrite_is_conflict_and_leaves_state_unchanged() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  store.publish(entry("alpha", "Original"), false).await.unwrap();
  let before = tokio::fs::read_to_string(tmp.path().join("games.json"))
    .await
    .unwrap();

  let err = store
    .publish(entry("alpha", "Replacement"), false)
    .await
    .unwrap_err();
  assert!(err.to_string().contains("already exists"));

  let after = tokio::fs::read_to_string(tmp.path().join("games.json"))
    .await
    .unwrap();
  assert_eq!(before, after);
  assert_eq!(store.list().await[0].title, "Original");
}

#[tokio::test]
async fn prepare_build_dir_rejects_existing_dir_without_overwrite() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  // A directory on disk is enough to conflict even with no catalog entry.
  tokio::fs::create_dir_all(store.build_dir("alpha"))
    .await
    .unwrap();

  let err = store.prepare_build_dir("alpha", false).await.unwrap_err();
  assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn overwrite_replaces_dir_and_keeps_one_entry() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  let dir = store.prepare_build_dir("alpha", false).await.unwrap();
  tokio::fs::write(dir.join("stale.data"), b"old").await.unwrap();
  store.publish(entry("alpha", "Old"), false).await.unwrap();

  // Overwrite: the old directory is wiped before re-ingestion.
  let dir = store.prepare_build_dir("alpha", true).await.unwrap();
  assert!(!dir.join("stale.data").exists());
  store.publish(entry("alpha", "New"), true).await.unwrap();

  let games = store.list().await;
  let matching: Vec<_> = games.iter().filter(|g| g.id == "alpha").collect();
  assert_eq!(matching.len(), 1);
  assert_eq!(matching[0].title, "New");
}

#[tokio::test]
async fn update_patches_only_supplied_fields() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  let original = store.publish(entry("alpha", "Old"), false).await.unwrap();

  let patch = EntryPatch {
    title: Some("New".to_string()),
    ..Default::default()
  };
  let updated = store.update("alpha", &patch).await.unwrap();

  assert_eq!(updated.title, "New");
  assert_eq!(updated.author, original.author);
  assert_eq!(updated.module_code, original.module_code);
  assert_eq!(updated.upload_date, original.upload_date);
}

#[tokio::test]
async fn update_missing_entry_is_not_found() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);
  store.publish(entry("alpha", "Alpha"), false).await.unwrap();

  let err = store.update("ghost", &EntryPatch::default()).await.unwrap_err();
  assert!(err.to_string().contains("no build"));
}

#[tokio::test]
async fn update_with_missing_catalog_fails_instead_of_wiping() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  // No games.json on disk: update must fail rather than treat the catalog
  // as empty and persist a document that lost every entry.
  let result = store.update("alpha", &EntryPatch::default()).await;
  assert!(result.is_err());
  assert!(!tmp.path().join("games.json").exists());
}

#[tokio::test]
async fn delete_removes_dir_and_entry() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  let dir = store.prepare_build_dir("alpha", false).await.unwrap();
  tokio::fs::write(dir.join("alpha.wasm"), b"module").await.unwrap();
  store.publish(entry("alpha", "Alpha"), false).await.unwrap();

  store.delete("alpha").await.unwrap();

  assert!(!dir.exists());
  assert!(store.list().await.is_empty());
}

#[tokio::test]
async fn delete_tolerates_missing_dir() {
  let tmp = TempDir::new().unwrap();
  let store = store_in(&tmp);

  store.publish(entry("alpha", "Alpha"), false).await.unwrap();
  store.delete("alpha").await.unwrap();
  assert!(store.list().await.is_empty());
}
