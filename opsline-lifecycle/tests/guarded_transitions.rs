//! Guarded transition integration tests

use async_trait::async_trait;
use opsline_lifecycle::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Store whose first read is answered before a competing writer commits.
struct RacingStore {
    inner: InMemoryStatusStore,
    raced: AtomicBool,
    competitor_state: &'static str,
}

#[async_trait]
impl StatusStore for RacingStore {
    async fn current_status(&self, kind: &EntityKind, entity_id: &str) -> Result<Option<String>> {
        let current = self.inner.current_status(kind, entity_id).await?;
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.inner
                .insert(kind.clone(), entity_id, self.competitor_state);
        }
        Ok(current)
    }

    async fn compare_and_set(
        &self,
        kind: &EntityKind,
        entity_id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool> {
        self.inner.compare_and_set(kind, entity_id, expected, new).await
    }
}

#[tokio::test]
async fn test_lost_race_is_a_conflict() {
    let inner = InMemoryStatusStore::new();
    inner.insert("order", "o-7", "pending");
    let store = Arc::new(RacingStore {
        inner,
        raced: AtomicBool::new(false),
        competitor_state: "cancelled",
    });

    let guard = TransitionGuard::new(Arc::new(TransitionTable::standard()), store.clone());
    let kind = EntityKind::new("order");

    let err = guard.apply(&kind, "o-7", "confirmed").await.unwrap_err();
    assert_eq!(
        err,
        LifecycleError::Conflict {
            kind: "order".to_string(),
            entity_id: "o-7".to_string(),
            expected: "pending".to_string(),
        }
    );
    assert_eq!(store.inner.get(&kind, "o-7").as_deref(), Some("cancelled"));

    // A retry sees the committed state and is validated against it
    let err = guard.apply(&kind, "o-7", "confirmed").await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Rejected { reason: RejectReason::UnknownState, .. }
    ));
}

#[tokio::test]
async fn test_concurrent_requests_only_one_wins() {
    let store = Arc::new(InMemoryStatusStore::new());
    store.insert("invoice", "inv-1", "sent");
    let guard = TransitionGuard::new(Arc::new(TransitionTable::standard()), store.clone());

    let tasks: Vec<_> = ["paid", "void"]
        .into_iter()
        .map(|target| {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .apply(&EntityKind::new("invoice"), "inv-1", target)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);

    // The loser either raced the commit or was validated against the new state
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        loser,
        LifecycleError::Conflict { .. } | LifecycleError::Rejected { .. }
    ));

    let stored = store.get(&EntityKind::new("invoice"), "inv-1").unwrap();
    assert_eq!(stored, winners[0].to);
}

#[tokio::test]
async fn test_table_loaded_from_file() {
    let dir = std::env::temp_dir().join(format!("opsline-lifecycle-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tables.toml");
    std::fs::write(
        &path,
        "[order]\npending = [\"confirmed\", \"on_hold\"]\non_hold = [\"pending\"]\n",
    )
    .unwrap();

    let table = TransitionTable::standard().merge(TransitionTable::load(&path).unwrap());
    assert!(validate(&table, "order", "pending", "on_hold").is_allowed());
    assert_eq!(
        validate(&table, "order", "confirmed", "processing").reason(),
        Some(RejectReason::UnknownState)
    );
    assert!(validate(&table, "repair", "received", "diagnosing").is_allowed());

    std::fs::remove_dir_all(&dir).ok();
}
