use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use linksnip_core::{LinkRecord, PageRequest, ShortCode};
use linksnip_storage::{ReadRepository, Repository, SqliteRepository, StorageError};
use tempfile::TempDir;
use tokio::sync::Barrier;

struct Fixture {
    dir: TempDir,
    repo: SqliteRepository,
}

impl Fixture {
    async fn start() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let repo = SqliteRepository::open(dir.path().join("links.db"))
            .await
            .expect("open sqlite");
        Self { dir, repo }
    }
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn record(c: &str, url: &str, expires_at: Option<Timestamp>) -> LinkRecord {
    LinkRecord {
        code: code(c),
        target_url: url.to_string(),
        is_custom: true,
        created_at: Timestamp::now(),
        expires_at,
        click_count: 0,
    }
}

#[tokio::test]
async fn put_and_get_live_record() {
    let fixture = Fixture::start().await;
    let rec = record("abc123", "https://example.com", None);

    fixture.repo.put_if_absent(rec.clone()).await.unwrap();

    let got = fixture.repo.get(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(got.code, rec.code);
    assert_eq!(got.target_url, "https://example.com");
    assert!(got.is_custom);
    assert_eq!(got.expires_at, None);
    assert_eq!(got.click_count, 0);
    assert_eq!(
        got.created_at.as_millisecond(),
        rec.created_at.as_millisecond()
    );
}

#[tokio::test]
async fn put_conflicts_when_code_is_live() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .put_if_absent(record("abc123", "https://one.example", None))
        .await
        .unwrap();

    let err = fixture
        .repo
        .put_if_absent(record("abc123", "https://two.example", None))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
    let got = fixture.repo.get(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(got.target_url, "https://one.example");
}

#[tokio::test]
async fn codes_are_case_sensitive() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .put_if_absent(record("AbC", "https://upper.example", None))
        .await
        .unwrap();
    fixture
        .repo
        .put_if_absent(record("abc", "https://lower.example", None))
        .await
        .unwrap();

    let got = fixture.repo.get(&code("abc")).await.unwrap().unwrap();
    assert_eq!(got.target_url, "https://lower.example");
}

#[tokio::test]
async fn expired_record_is_hidden_and_reclaimable() {
    let fixture = Fixture::start().await;
    let expired = Timestamp::now() - SignedDuration::from_secs(1);

    fixture
        .repo
        .put_if_absent(record("expired", "https://old.example", Some(expired)))
        .await
        .unwrap();

    assert!(fixture.repo.get(&code("expired")).await.unwrap().is_none());
    assert!(!fixture.repo.exists(&code("expired")).await.unwrap());

    fixture
        .repo
        .put_if_absent(record("expired", "https://new.example", None))
        .await
        .unwrap();

    let got = fixture.repo.get(&code("expired")).await.unwrap().unwrap();
    assert_eq!(got.target_url, "https://new.example");
    assert_eq!(got.expires_at, None);
}

#[tokio::test]
async fn delete_removes_record() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .put_if_absent(record("to-delete", "https://example.com", None))
        .await
        .unwrap();

    assert!(fixture.repo.delete(&code("to-delete")).await.unwrap());
    assert!(!fixture.repo.delete(&code("to-delete")).await.unwrap());
    assert!(fixture.repo.get(&code("to-delete")).await.unwrap().is_none());
}

#[tokio::test]
async fn expire_hides_record() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .put_if_absent(record("short-lived", "https://example.com", None))
        .await
        .unwrap();

    assert!(fixture.repo.expire(&code("short-lived")).await.unwrap());
    assert!(!fixture.repo.expire(&code("short-lived")).await.unwrap());
    assert!(fixture.repo.get(&code("short-lived")).await.unwrap().is_none());
}

#[tokio::test]
async fn record_click_increments_and_returns_record() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .put_if_absent(record("clicked", "https://example.com", None))
        .await
        .unwrap();

    let first = fixture
        .repo
        .record_click(&code("clicked"))
        .await
        .unwrap()
        .unwrap();
    let second = fixture
        .repo
        .record_click(&code("clicked"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.click_count, 1);
    assert_eq!(second.click_count, 2);
    assert_eq!(second.target_url, "https://example.com");
    assert!(fixture
        .repo
        .record_click(&code("missing"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn list_pages_through_live_records() {
    let fixture = Fixture::start().await;
    let base = Timestamp::now();

    for i in 0..5i64 {
        let mut rec = record(&format!("code-{i}"), "https://example.com", None);
        rec.created_at = base + SignedDuration::from_secs(i);
        fixture.repo.put_if_absent(rec).await.unwrap();
    }
    let expired = Timestamp::now() - SignedDuration::from_secs(1);
    fixture
        .repo
        .put_if_absent(record("gone", "https://example.com", Some(expired)))
        .await
        .unwrap();

    let page = fixture
        .repo
        .list(PageRequest::new(1, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.pages, 3);
    let codes: Vec<&str> = page.items.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["code-4", "code-3"]);

    let last = fixture
        .repo
        .list(PageRequest::new(3, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].code.as_str(), "code-0");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_puts_for_same_code_have_one_winner() {
    let fixture = Fixture::start().await;
    let repo = Arc::new(fixture.repo.clone());
    let barrier = Arc::new(Barrier::new(8));
    let mut handles = vec![];

    for i in 0..8u64 {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let rec = record("shared", &format!("https://example{i}.com"), None);
            barrier.wait().await;
            repo.put_if_absent(rec).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => wins += 1,
            Err(StorageError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(wins, 1);
    let page = repo.list(PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn records_survive_reopening_the_database() {
    let fixture = Fixture::start().await;
    let path = fixture.dir.path().join("links.db");

    fixture
        .repo
        .put_if_absent(record("durable", "https://example.com/keep", None))
        .await
        .unwrap();
    fixture.repo.record_click(&code("durable")).await.unwrap();
    fixture.repo.close().await;

    let reopened = SqliteRepository::open(&path).await.unwrap();
    let got = reopened.get(&code("durable")).await.unwrap().unwrap();
    assert_eq!(got.target_url, "https://example.com/keep");
    assert_eq!(got.click_count, 1);
}
