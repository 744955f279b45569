//! 各存储后端共用的契约测试
//!
//! 每个函数都假定传入的是一个空存储。

#![allow(dead_code)]

use shortener::errors::ShortenerError;
use shortener::storage::{Record, RecordStore, Stats};

pub fn record(url: &str, alias: &str) -> Record {
    Record::new(url, alias)
}

fn aliases(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.alias.as_str()).collect()
}

pub async fn dedup_across_owners(store: &dyn RecordStore) {
    store
        .add(&record("http://ya.ru/", "MPXIy2"), 1)
        .await
        .unwrap();

    let err = store
        .add(&record("http://ya.ru/", "other1"), 2)
        .await
        .unwrap_err();
    assert_eq!(err, ShortenerError::already_exists("MPXIy2"));

    assert_eq!(aliases(&store.read_by_owner(1).await.unwrap()), ["MPXIy2"]);
    assert_eq!(aliases(&store.read_by_owner(2).await.unwrap()), ["MPXIy2"]);
    assert!(store.read("other1").await.is_err());
    assert_eq!(
        store.stats().await.unwrap(),
        Stats {
            total_urls: 1,
            total_users: 2
        }
    );
}

pub async fn same_owner_readd_is_idempotent(store: &dyn RecordStore) {
    store
        .add(&record("https://a.example/", "aaaaaa"), 1)
        .await
        .unwrap();
    let err = store
        .add(&record("https://a.example/", "aaaaaa"), 1)
        .await
        .unwrap_err();

    assert_eq!(err.existing_alias(), Some("aaaaaa"));
    assert_eq!(store.read_by_owner(1).await.unwrap().len(), 1);
}

pub async fn alias_collision_writes_nothing(store: &dyn RecordStore) {
    store
        .add(&record("https://a.example/", "shared"), 1)
        .await
        .unwrap();

    let err = store
        .add(&record("https://b.example/", "shared"), 2)
        .await
        .unwrap_err();
    assert_eq!(err, ShortenerError::alias_collision("shared"));

    assert!(matches!(
        store.read_by_original_url("https://b.example/").await,
        Err(ShortenerError::NotFound(_))
    ));
    assert!(store.read_by_owner(2).await.unwrap().is_empty());
    assert_eq!(
        store.read("shared").await.unwrap().original_url,
        "https://a.example/"
    );
}

pub async fn reads_of_missing_keys(store: &dyn RecordStore) {
    assert!(matches!(
        store.read("nope00").await,
        Err(ShortenerError::NotFound(_))
    ));
    assert!(matches!(
        store.read_by_original_url("https://missing.example/").await,
        Err(ShortenerError::NotFound(_))
    ));
    assert!(store.read_by_owner(42).await.unwrap().is_empty());
    assert!(!store.is_deleted_for("nope00", 42).await.unwrap());
    assert_eq!(store.stats().await.unwrap(), Stats::default());
}

pub async fn soft_delete_is_owner_scoped(store: &dyn RecordStore) {
    store
        .add(&record("https://a.example/", "aaaaaa"), 1)
        .await
        .unwrap();
    store
        .add(&record("https://b.example/", "bbbbbb"), 1)
        .await
        .unwrap();
    let _ = store.add(&record("https://a.example/", "aaaaaa"), 2).await;

    store
        .soft_delete_many(&["aaaaaa".to_string(), "unknown".to_string()], 1)
        .await
        .unwrap();

    let owned = store.read_by_owner(1).await.unwrap();
    let a = owned.iter().find(|r| r.alias == "aaaaaa").unwrap();
    let b = owned.iter().find(|r| r.alias == "bbbbbb").unwrap();
    assert!(a.deleted);
    assert!(!b.deleted);

    // 不物理删除，其他用户不受影响
    let record = store.read("aaaaaa").await.unwrap();
    assert!(!record.deleted);
    assert!(store.is_deleted_for("aaaaaa", 1).await.unwrap());
    assert!(!store.is_deleted_for("aaaaaa", 2).await.unwrap());
    assert!(!store.read_by_owner(2).await.unwrap()[0].deleted);
    assert_eq!(store.stats().await.unwrap().total_urls, 2);
}

pub async fn foreign_delete_is_ignored(store: &dyn RecordStore) {
    store
        .add(&record("https://a.example/", "aaaaaa"), 1)
        .await
        .unwrap();

    store
        .soft_delete_many(&["aaaaaa".to_string()], 2)
        .await
        .unwrap();

    assert!(!store.is_deleted_for("aaaaaa", 1).await.unwrap());
    assert!(!store.read_by_owner(1).await.unwrap()[0].deleted);
    assert!(store.read_by_owner(2).await.unwrap().is_empty());
}

pub async fn batch_accepts_existing_urls(store: &dyn RecordStore) {
    store
        .add(&record("https://a.example/", "aaaaaa"), 1)
        .await
        .unwrap();

    store
        .add_batch(
            &[
                record("https://a.example/", "aaaaaa"),
                record("https://b.example/", "bbbbbb"),
                record("https://c.example/", "cccccc"),
            ],
            2,
        )
        .await
        .unwrap();

    let mut owned = aliases(&store.read_by_owner(2).await.unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    owned.sort();
    assert_eq!(owned, ["aaaaaa", "bbbbbb", "cccccc"]);
    assert_eq!(
        store
            .read_by_original_url("https://c.example/")
            .await
            .unwrap()
            .alias,
        "cccccc"
    );
    assert_eq!(store.stats().await.unwrap().total_urls, 3);
}

pub async fn batch_is_all_or_nothing(store: &dyn RecordStore) {
    store
        .add(&record("https://taken.example/", "taken0"), 1)
        .await
        .unwrap();

    let err = store
        .add_batch(
            &[
                record("https://b.example/", "bbbbbb"),
                record("https://c.example/", "taken0"),
                record("https://d.example/", "dddddd"),
            ],
            2,
        )
        .await
        .unwrap_err();
    assert_eq!(err, ShortenerError::alias_collision("taken0"));

    assert!(store.read("bbbbbb").await.is_err());
    assert!(store.read("dddddd").await.is_err());
    assert!(store.read_by_owner(2).await.unwrap().is_empty());
    assert_eq!(
        store.stats().await.unwrap(),
        Stats {
            total_urls: 1,
            total_users: 1
        }
    );
}

pub async fn close_is_idempotent(store: &dyn RecordStore) {
    store.close().await.unwrap();
    store.close().await.unwrap();
}
