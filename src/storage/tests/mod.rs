use super::*;
use crate::types::StatusSnapshot;
use tempfile::TempDir;


async fn open_store() -> (UserStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = UserStore::open(temp_dir.path().join("user_data"))
        .await
        .unwrap();
    (store, temp_dir)
}

const USER: UserId = UserId(42);

#[tokio::test]
async fn test_open_creates_root() {
    let (store, _temp_dir) = open_store().await;
    assert!(store.root().is_dir());
}

#[tokio::test]
async fn test_file_names_follow_prefix_layout() {
    let (store, _temp_dir) = open_store().await;
    let name = |kind| {
        store
            .path_for(USER, kind)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned()
    };

    assert_eq!(name(StoreFile::Config), "config_42.json");
    assert_eq!(name(StoreFile::Status), "status_42.json");
    assert_eq!(name(StoreFile::SentLog), "sent_42.json");
    assert_eq!(name(StoreFile::ErrorLog), "error_42.json");
    assert_eq!(name(StoreFile::Stop), "stop_42.json");
    assert_eq!(name(StoreFile::Start), "start_42.json");
    assert_eq!(name(StoreFile::Session), "session_42.json");
}

#[tokio::test]
async fn test_missing_user_config_is_empty() {
    let (store, _temp_dir) = open_store().await;
    let config = store.load_user_config(USER).await.unwrap();
    assert_eq!(config, crate::config::UserConfig::default());
}

#[tokio::test]
async fn test_user_config_is_read_from_disk() {
    let (store, _temp_dir) = open_store().await;
    std::fs::write(
        store.path_for(USER, StoreFile::Config),
        r#"{"api_id": 1, "api_hash": "abc", "phone": "+1", "source_channel_id": 5}"#,
    )
    .unwrap();

    let config = store.load_user_config(USER).await.unwrap();
    assert!(config.has_credentials());
    assert!(config.channels().is_none());
}

#[tokio::test]
async fn test_malformed_user_config_is_a_storage_error() {
    let (store, _temp_dir) = open_store().await;
    std::fs::write(store.path_for(USER, StoreFile::Config), "{not json").unwrap();

    let err = store.load_user_config(USER).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}
