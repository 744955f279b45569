//! JournaledStore tests
//!
//! Each test works on a journal file inside a fresh temporary directory.

mod common;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use shortener::errors::ShortenerError;
use shortener::storage::journal::JournalEntry;
use shortener::storage::{JournaledStore, Record, RecordStore};
use tempfile::TempDir;

fn temp_journal() -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("data").join("journal.jsonl");
    (path, temp_dir)
}

async fn open_temp() -> (JournaledStore, PathBuf, TempDir) {
    let (path, temp_dir) = temp_journal();
    let store = JournaledStore::open(&path, false).expect("Failed to open journal");
    (store, path, temp_dir)
}

fn journal_lines(path: &PathBuf) -> Vec<JournalEntry> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| JournalEntry::parse(line).unwrap())
        .collect()
}

// =============================================================================
// 存储契约
// =============================================================================

#[tokio::test]
async fn test_dedup_across_owners() {
    let (store, _path, _dir) = open_temp().await;
    common::dedup_across_owners(&store).await;
}

#[tokio::test]
async fn test_same_owner_readd() {
    let (store, _path, _dir) = open_temp().await;
    common::same_owner_readd_is_idempotent(&store).await;
}

#[tokio::test]
async fn test_alias_collision() {
    let (store, _path, _dir) = open_temp().await;
    common::alias_collision_writes_nothing(&store).await;
}

#[tokio::test]
async fn test_missing_keys() {
    let (store, _path, _dir) = open_temp().await;
    common::reads_of_missing_keys(&store).await;
}

#[tokio::test]
async fn test_soft_delete_owner_scoped() {
    let (store, _path, _dir) = open_temp().await;
    common::soft_delete_is_owner_scoped(&store).await;
}

#[tokio::test]
async fn test_foreign_delete_ignored() {
    let (store, _path, _dir) = open_temp().await;
    common::foreign_delete_is_ignored(&store).await;
}

#[tokio::test]
async fn test_batch_existing_urls() {
    let (store, _path, _dir) = open_temp().await;
    common::batch_accepts_existing_urls(&store).await;
}

#[tokio::test]
async fn test_batch_atomic() {
    let (store, path, _dir) = open_temp().await;
    common::batch_is_all_or_nothing(&store).await;
    // 失败的批次不落盘
    assert_eq!(journal_lines(&path).len(), 1);
}

#[tokio::test]
async fn test_close_idempotent() {
    let (store, _path, _dir) = open_temp().await;
    common::close_is_idempotent(&store).await;
    assert!(matches!(
        store.add(&Record::new("https://a.example/", "aaaaaa"), 1).await,
        Err(ShortenerError::BackendUnavailable(_))
    ));
}

// =============================================================================
// 日志格式
// =============================================================================

#[tokio::test]
async fn test_journal_line_format() {
    let (store, path, _dir) = open_temp().await;
    store
        .add(&Record::new("http://ya.ru/", "MPXIy2"), 1)
        .await
        .unwrap();
    store
        .soft_delete_many(&["MPXIy2".to_string()], 1)
        .await
        .unwrap();
    store.close().await.unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["short_url"], "MPXIy2");
    assert_eq!(first["original_url"], "http://ya.ru/");
    assert_eq!(first["user_id"], 1);
    assert!(first["uuid"].as_str().is_some_and(|u| !u.is_empty()));
    assert!(first.get("deleted").is_none());

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["deleted"], true);
}

#[tokio::test]
async fn test_ownership_and_noops_in_journal() {
    let (store, path, _dir) = open_temp().await;
    store
        .add(&Record::new("https://a.example/", "aaaaaa"), 1)
        .await
        .unwrap();
    // 新的归属写一行
    let _ = store
        .add(&Record::new("https://a.example/", "aaaaaa"), 2)
        .await;
    // 重复归属与删除他人短码不写
    let _ = store
        .add(&Record::new("https://a.example/", "aaaaaa"), 2)
        .await;
    store
        .soft_delete_many(&["aaaaaa".to_string()], 3)
        .await
        .unwrap();
    store.close().await.unwrap();

    let entries = journal_lines(&path);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].user_id, 2);
    assert_eq!(entries[1].short_url, "aaaaaa");
}

// =============================================================================
// 回放
// =============================================================================

#[tokio::test]
async fn test_replay_equivalence() {
    let (path, _dir) = temp_journal();

    let before = {
        let store = JournaledStore::open(&path, true).unwrap();
        store
            .add(&Record::new("https://a.example/", "aaaaaa"), 1)
            .await
            .unwrap();
        store
            .add_batch(
                &[
                    Record::new("https://b.example/", "bbbbbb"),
                    Record::new("https://c.example/", "cccccc"),
                ],
                1,
            )
            .await
            .unwrap();
        let _ = store
            .add(&Record::new("https://b.example/", "bbbbbb"), 2)
            .await;
        store
            .soft_delete_many(&["bbbbbb".to_string()], 1)
            .await
            .unwrap();

        let snapshot = (
            store.read_by_owner(1).await.unwrap(),
            store.read_by_owner(2).await.unwrap(),
            store.stats().await.unwrap(),
        );
        store.close().await.unwrap();
        snapshot
    };

    let reopened = JournaledStore::open(&path, true).unwrap();
    let after = (
        reopened.read_by_owner(1).await.unwrap(),
        reopened.read_by_owner(2).await.unwrap(),
        reopened.stats().await.unwrap(),
    );

    assert_eq!(before, after);
    assert!(reopened.is_deleted_for("bbbbbb", 1).await.unwrap());
    assert_eq!(reopened.replay_report().skipped, 0);
}

#[tokio::test]
async fn test_replay_skips_torn_final_line() {
    let (path, _dir) = temp_journal();
    {
        let store = JournaledStore::open(&path, false).unwrap();
        store
            .add(&Record::new("https://a.example/", "aaaaaa"), 1)
            .await
            .unwrap();
        store.close().await.unwrap();
    }

    // 模拟写到一半崩溃
    let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(br#"{"uuid":"x","short_url":"bbb"#).unwrap();
    drop(file);

    let store = JournaledStore::open(&path, false).unwrap();
    assert!(store.replay_report().torn_tail);
    assert!(store.read("aaaaaa").await.is_ok());

    // 残行被截断，后续追加从新行开始
    store
        .add(&Record::new("https://b.example/", "bbbbbb"), 1)
        .await
        .unwrap();
    store.close().await.unwrap();
    assert_eq!(journal_lines(&path).len(), 2);
}

#[tokio::test]
async fn test_replay_rejects_malformed_line() {
    let (path, _dir) = temp_journal();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        "{\"uuid\":\"u\",\"short_url\":\"a\",\"original_url\":\"https://a/\",\"user_id\":1}\nnot json\n",
    )
    .unwrap();

    let err = JournaledStore::open(&path, false).err().unwrap();
    assert!(matches!(err, ShortenerError::Serialization(_)));
}

#[tokio::test]
async fn test_replay_tolerates_colliding_line() {
    let (path, _dir) = temp_journal();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let lines = [
        JournalEntry::registration(1, "same00", "https://a.example/"),
        JournalEntry::registration(2, "same00", "https://b.example/"),
    ]
    .iter()
    .map(|e| serde_json::to_string(e).unwrap() + "\n")
    .collect::<String>();
    fs::write(&path, lines).unwrap();

    let store = JournaledStore::open(&path, false).unwrap();
    let report = store.replay_report();
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        store.read("same00").await.unwrap().original_url,
        "https://a.example/"
    );
    assert!(store.read_by_owner(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("a").join("b").join("journal.jsonl");

    let store = JournaledStore::open(&path, false).unwrap();
    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
    assert_eq!(store.backend_name(), "journal");
}

fn batch_line(entry: JournalEntry, batch: &str, size: usize) -> String {
    let sealed = JournalEntry {
        batch: Some(batch.to_string()),
        batch_size: Some(size),
        ..entry
    };
    serde_json::to_string(&sealed).unwrap() + "\n"
}

#[tokio::test]
async fn test_batch_lines_share_marker() {
    let (store, path, _dir) = open_temp().await;
    store
        .add_batch(
            &[
                Record::new("https://a.example/", "aaaaaa"),
                Record::new("https://b.example/", "bbbbbb"),
            ],
            1,
        )
        .await
        .unwrap();
    store.close().await.unwrap();

    let entries = journal_lines(&path);
    assert_eq!(entries.len(), 2);
    assert!(entries[0].batch.is_some());
    assert_eq!(entries[0].batch, entries[1].batch);
    assert_eq!(entries[0].batch_size, Some(2));
}

#[tokio::test]
async fn test_replay_discards_incomplete_batch() {
    let (path, _dir) = temp_journal();
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    // 崩溃发生在三行批次写完第一行之后
    let single = serde_json::to_string(&JournalEntry::registration(1, "aaaaaa", "https://a.example/"))
        .unwrap()
        + "\n";
    let partial = batch_line(
        JournalEntry::registration(1, "bbbbbb", "https://b.example/"),
        "b1",
        3,
    );
    fs::write(&path, format!("{}{}", single, partial)).unwrap();

    let store = JournaledStore::open(&path, false).unwrap();
    assert!(store.replay_report().torn_tail);
    assert!(store.read("aaaaaa").await.is_ok());
    assert!(store.read("bbbbbb").await.is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), single);

    store
        .add(&Record::new("https://c.example/", "cccccc"), 1)
        .await
        .unwrap();
    store.close().await.unwrap();

    let reopened = JournaledStore::open(&path, false).unwrap();
    assert!(!reopened.replay_report().torn_tail);
    assert_eq!(reopened.stats().await.unwrap().total_urls, 2);
}

#[tokio::test]
async fn test_replay_rejects_interrupted_batch_mid_file() {
    let (path, _dir) = temp_journal();
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    let content = batch_line(
        JournalEntry::registration(1, "aaaaaa", "https://a.example/"),
        "b1",
        2,
    ) + &serde_json::to_string(&JournalEntry::registration(1, "cccccc", "https://c.example/"))
        .unwrap()
        + "\n";
    fs::write(&path, content).unwrap();

    let err = JournaledStore::open(&path, false).err().unwrap();
    assert!(matches!(err, ShortenerError::Serialization(_)));
}
