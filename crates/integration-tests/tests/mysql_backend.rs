//! MySQL Backend Tests
//!
//! Run only where a server is available:
//! `CONVEYOR_TEST_MYSQL_DSN=mysql://user:pw@localhost/conveyor_test`.
//! Each test wipes the configuration tables of that database first.

use std::time::Duration;

use conveyor_core::domain::Queue;
use conveyor_core::error::AppError;
use conveyor_infra_sql::{SqlBackend, SqlStore};
use conveyor_repository::{new_repositories, Repositories, RepositoryConfig};
use tokio::sync::Mutex;

// Tests share one database
static DB_LOCK: Mutex<()> = Mutex::const_new(());

fn mysql_dsn() -> Option<String> {
    match std::env::var("CONVEYOR_TEST_MYSQL_DSN") {
        Ok(dsn) if !dsn.trim().is_empty() => Some(dsn),
        _ => {
            eprintln!("CONVEYOR_TEST_MYSQL_DSN not set, skipping MySQL test");
            None
        }
    }
}

/// Apply the MySQL schema and empty every configuration table
async fn reset(dsn: &str) {
    let admin = SqlStore::connect(SqlBackend::MySql, dsn, 2).await.unwrap();
    for table in ["routing", "queue_throttle", "queue", "config_revision"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(admin.pool())
            .await
            .unwrap();
    }
}

async fn open(dsn: &str) -> Repositories {
    new_repositories(&RepositoryConfig::mysql(dsn)).await.unwrap()
}

/// Queue and routing lifecycle end to end on MySQL
#[tokio::test]
async fn test_mysql_queue_and_routing_lifecycle() {
    let Some(dsn) = mysql_dsn() else { return };
    let _db = DB_LOCK.lock().await;
    reset(&dsn).await;
    let repos = open(&dsn).await;

    let default = Queue::new("default", Duration::from_secs(1), 10);
    assert!(repos.queue.add(&default).await.unwrap());
    assert!(!repos.queue.add(&default).await.unwrap());
    assert_eq!(repos.queue.revision().await.unwrap(), 1);

    let throttled = default.clone().with_throttle(12.5, 30);
    assert!(repos.queue.add(&throttled).await.unwrap());
    assert_eq!(repos.queue.find_by_name("default").await.unwrap(), throttled);
    assert_eq!(repos.queue.revision().await.unwrap(), 2);

    assert!(repos.routing.add("email", "default").await.unwrap());
    assert!(!repos.routing.add("email", "default").await.unwrap());
    assert_eq!(
        repos
            .routing
            .find_queue_name_by_job_category("email")
            .as_deref(),
        Some("default")
    );
    assert_eq!(repos.routing.revision().await.unwrap(), 1);

    repos.queue.delete_by_name("default").await.unwrap();
    assert!(matches!(
        repos.queue.find_by_name("default").await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert_eq!(repos.queue.revision().await.unwrap(), 3);

    let err = repos.routing.add("email", "default").await.unwrap_err();
    assert!(matches!(err, AppError::QueueNotFound { .. }));
    assert_eq!(repos.routing.revision().await.unwrap(), 1);

    repos.routing.delete_by_job_category("email").await.unwrap();
    assert_eq!(repos.routing.find_queue_name_by_job_category("email"), None);
    assert_eq!(repos.routing.revision().await.unwrap(), 2);
}

/// Two handles adding the same new category at once: last write wins
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mysql_two_handles_same_category() {
    let Some(dsn) = mysql_dsn() else { return };
    let _db = DB_LOCK.lock().await;
    reset(&dsn).await;

    let first = open(&dsn).await;
    let second = open(&dsn).await;
    for name in ["q1", "q2"] {
        first
            .queue
            .add(&Queue::new(name, Duration::from_secs(1), 1))
            .await
            .unwrap();
    }
    // The routing revision row exists from here on
    assert!(first.routing.add("warmup", "q1").await.unwrap());
    let mut changes = 1;

    for round in 0..20 {
        let category = format!("shared-{}", round);
        let a = {
            let routing = first.routing.clone();
            let category = category.clone();
            tokio::spawn(async move { routing.add(&category, "q1").await })
        };
        let b = {
            let routing = second.routing.clone();
            let category = category.clone();
            tokio::spawn(async move { routing.add(&category, "q2").await })
        };

        for result in [a.await.unwrap(), b.await.unwrap()] {
            match result {
                Ok(true) => changes += 1,
                Ok(false) => {}
                Err(e) => panic!("concurrent add of {} failed: {}", category, e),
            }
        }
    }

    assert_eq!(first.routing.revision().await.unwrap(), changes);

    let all = second.routing.find_all().await.unwrap();
    assert_eq!(all.len(), 21);
    assert!(all
        .iter()
        .all(|r| r.queue_name == "q1" || r.queue_name == "q2"));
}
