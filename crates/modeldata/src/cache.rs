//! # Collection Cache
//!
//! [`CollectionCache`] holds the in-memory replica of one named collection and
//! keeps it equal to what the [`StorageGateway`] last confirmed.
//!
//! ## Replica Rules
//!
//! - `load` replaces the replica with what storage returns. On failure the
//!   replica becomes **empty**, not whatever was there before.
//! - `create`/`update`/`delete` compute a *candidate* sequence from the current
//!   replica, hand the whole candidate to the gateway, and swap it in only
//!   after the gateway confirms. A failed write leaves the replica untouched.
//! - `update`/`delete` validate the index first; an out-of-bounds index never
//!   reaches the gateway.
//! - `reset` clears the replica without touching storage.
//!
//! No operation returns an error. Every failure, including a panicking
//! gateway, is converted into an [`Outcome`] on the [`StatusTracker`] and a
//! `false` return value.
//!
//! ## Writers
//!
//! The cache assumes a single session owns each collection. There is no
//! version token: the gateway always receives a full replacement.
//!
//! With [`WritePolicy::LastWriteWins`] overlapping mutating calls are not
//! ordered. Each computes its candidate from the replica as it was when the
//! call started, and whichever write settles last determines both the stored
//! and the cached state. With [`WritePolicy::Serialized`] mutating calls queue
//! on an async mutex and each one sees the result of the previous.

use crate::error::{failure_message, ModelDataError, Result};
use crate::record::Record;
use crate::status::{BusyGuard, OperationKind, Outcome, StatusSnapshot, StatusTracker};
use crate::store::{FsGateway, StorageGateway};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Overlapping writes are not ordered; the last to settle wins.
    #[default]
    LastWriteWins,
    /// Mutating calls queue and run one at a time.
    Serialized,
}

impl WritePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            WritePolicy::LastWriteWins => "last-write-wins",
            WritePolicy::Serialized => "serialized",
        }
    }
}

impl std::fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritePolicy {
    type Err = ModelDataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "last_write_wins" | "lww" => Ok(WritePolicy::LastWriteWins),
            "serialized" | "serialised" => Ok(WritePolicy::Serialized),
            other => Err(ModelDataError::Config(format!(
                "Unknown write policy '{}' (expected last-write-wins or serialized)",
                other
            ))),
        }
    }
}

struct Replica {
    name: Option<String>,
    records: Arc<[Record]>,
}

impl Default for Replica {
    fn default() -> Self {
        Self {
            name: None,
            records: Vec::<Record>::new().into(),
        }
    }
}

/// In-memory replica of one named collection, synchronized with a gateway.
pub struct CollectionCache<G: StorageGateway> {
    gateway: G,
    replica: RwLock<Replica>,
    status: StatusTracker,
    policy: WritePolicy,
    write_queue: Mutex<()>,
}

impl CollectionCache<FsGateway> {
    /// Build a cache over the filesystem gateway described by `config`.
    pub fn from_config(config: &crate::config::ModelDataConfig) -> Result<Self> {
        Ok(Self::new(config.fs_gateway()?).with_write_policy(config.write_policy()))
    }
}

impl<G: StorageGateway> CollectionCache<G> {
    /// Create a cache with an empty replica.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            replica: RwLock::new(Replica::default()),
            status: StatusTracker::new(),
            policy: WritePolicy::default(),
            write_queue: Mutex::new(()),
        }
    }

    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.subscribe()
    }

    /// Read-only snapshot of the replica.
    pub fn records(&self) -> Arc<[Record]> {
        self.replica.read().records.clone()
    }

    pub fn get(&self, index: usize) -> Option<Record> {
        self.replica.read().records.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.replica.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the collection the replica belongs to.
    /// `None` before the first load, after `reset`, and after a failed load.
    pub fn name(&self) -> Option<String> {
        self.replica.read().name.clone()
    }

    /// Fetch `name` from storage and replace the replica with it.
    /// On failure the replica is cleared. Returns whether the load succeeded.
    pub async fn load(&self, name: &str) -> bool {
        let op = OperationKind::Load;
        let busy = self.status.begin(op);
        tracing::debug!(collection = name, "loading collection");

        match self.call_gateway(op, name, self.gateway.read_collection(name)).await {
            Ok(records) => {
                let count = records.len();
                self.swap(name, records);
                tracing::debug!(collection = name, records = count, "collection loaded");
                busy.complete(Outcome::success(op.success_message()));
                true
            }
            Err(err) => {
                *self.replica.write() = Replica::default();
                self.fail(busy, name, &err);
                false
            }
        }
    }

    /// Append `record` and persist the result.
    pub async fn create(&self, name: &str, record: Record) -> bool {
        self.mutate(OperationKind::Create, name, move |current| {
            let mut candidate = current.to_vec();
            candidate.push(record);
            Ok(candidate)
        })
        .await
    }

    /// Replace the record at `index` and persist the result.
    /// Negative or out-of-range indexes fail without a storage call.
    pub async fn update<I: TryInto<usize>>(&self, name: &str, index: I, record: Record) -> bool {
        let index = index.try_into().ok();
        self.mutate(OperationKind::Update, name, move |current| {
            let index = checked_index(index, current.len())?;
            let mut candidate = current.to_vec();
            candidate[index] = record;
            Ok(candidate)
        })
        .await
    }

    /// Remove the record at `index` and persist the result. Later records
    /// shift down by one. Negative or out-of-range indexes fail without a
    /// storage call.
    pub async fn delete<I: TryInto<usize>>(&self, name: &str, index: I) -> bool {
        let index = index.try_into().ok();
        self.mutate(OperationKind::Delete, name, move |current| {
            let index = checked_index(index, current.len())?;
            let mut candidate = current.to_vec();
            candidate.remove(index);
            Ok(candidate)
        })
        .await
    }

    /// Clear the replica. Never touches storage.
    pub fn reset(&self) {
        *self.replica.write() = Replica::default();
        self.status.record(
            OperationKind::Reset,
            Outcome::success(OperationKind::Reset.success_message()),
        );
    }

    async fn mutate<F>(&self, op: OperationKind, name: &str, build: F) -> bool
    where
        F: FnOnce(&[Record]) -> Result<Vec<Record>>,
    {
        debug_assert!(op.is_mutation(), "{} does not write", op);
        // begun before queueing, so a call waiting its turn already reads busy
        let busy = self.status.begin(op);
        let _queued = match self.policy {
            WritePolicy::Serialized => Some(self.write_queue.lock().await),
            WritePolicy::LastWriteWins => None,
        };

        let (current, held) = {
            let replica = self.replica.read();
            (replica.records.clone(), replica.name.clone())
        };
        if let Some(held) = held.filter(|held| held != name) {
            tracing::warn!(
                operation = op.as_str(),
                collection = name,
                held = held.as_str(),
                "writing a collection other than the one loaded"
            );
        }

        let candidate = match build(&current) {
            Ok(candidate) => candidate,
            Err(err) => {
                self.fail(busy, name, &err);
                return false;
            }
        };

        tracing::debug!(
            operation = op.as_str(),
            collection = name,
            records = candidate.len(),
            "writing collection"
        );
        match self
            .call_gateway(op, name, self.gateway.write_collection(name, &candidate))
            .await
        {
            Ok(()) => {
                self.swap(name, candidate);
                busy.complete(Outcome::success(op.success_message()));
                true
            }
            Err(err) => {
                self.fail(busy, name, &err);
                false
            }
        }
    }

    /// Await a gateway call, turning a panic inside it into a storage error.
    async fn call_gateway<T>(
        &self,
        op: OperationKind,
        name: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let reason = failure_message(&*payload);
                tracing::error!(
                    operation = op.as_str(),
                    collection = name,
                    reason = reason.as_str(),
                    "storage gateway panicked"
                );
                Err(if op == OperationKind::Load {
                    ModelDataError::read(name, reason)
                } else {
                    ModelDataError::write(name, reason)
                })
            }
        }
    }

    fn swap(&self, name: &str, records: Vec<Record>) {
        *self.replica.write() = Replica {
            name: Some(name.to_string()),
            records: records.into(),
        };
    }

    fn fail(&self, busy: BusyGuard<'_>, name: &str, err: &ModelDataError) {
        let op = busy.operation();
        let message = failure_message(err);
        tracing::warn!(
            operation = op.as_str(),
            collection = name,
            error = %err,
            "{}",
            op.failure_headline()
        );
        busy.complete(Outcome::failure(message));
    }
}

fn checked_index(index: Option<usize>, len: usize) -> Result<usize> {
    match index {
        Some(i) if i < len => Ok(i),
        _ => Err(ModelDataError::Validation { index, len }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Phase;
    use crate::store::MemGateway;
    use crate::test_utils::seeded_gateway;
    use serde_json::json;

    fn rec(name: &str) -> Record {
        json!({ "name": name }).as_object().cloned().unwrap()
    }

    fn names(cache: &CollectionCache<MemGateway>) -> Vec<String> {
        cache
            .records()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    async fn loaded(records: &[&str]) -> CollectionCache<MemGateway> {
        let gateway = MemGateway::new()
            .with_collection("items", records.iter().map(|n| rec(n)).collect());
        let cache = CollectionCache::new(gateway);
        assert!(cache.load("items").await);
        cache
    }

    #[tokio::test]
    async fn starts_empty_and_idle() {
        let cache = CollectionCache::new(MemGateway::new());
        assert!(cache.is_empty());
        assert_eq!(cache.name(), None);
        assert!(!cache.is_busy());
        assert_eq!(cache.status().snapshot().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn load_replaces_replica() {
        let cache = loaded(&["a", "b"]).await;
        assert_eq!(names(&cache), vec!["a", "b"]);
        assert_eq!(cache.name().as_deref(), Some("items"));
        assert_eq!(
            cache.status().last_outcome(),
            Some(Outcome::success("Data loaded successfully"))
        );
    }

    #[tokio::test]
    async fn load_failure_resets_to_empty() {
        let cache = loaded(&["a", "b"]).await;
        cache.gateway().set_simulate_read_error(true);

        assert!(!cache.load("items").await);
        assert!(cache.is_empty());
        assert_eq!(cache.name(), None);
        assert_eq!(
            cache.status().last_outcome(),
            Some(Outcome::failure("Simulated read error"))
        );
        assert_eq!(cache.status().snapshot().phase, Phase::Failed);
    }

    #[tokio::test]
    async fn load_failure_for_other_collection_drops_previous() {
        let cache = loaded(&["a"]).await;
        assert!(!cache.load("missing").await);
        assert!(cache.is_empty());
        assert_eq!(
            cache.status().last_outcome().unwrap().message(),
            "Collection not found"
        );
    }

    #[tokio::test]
    async fn create_appends() {
        let cache = loaded(&["a", "b"]).await;
        assert!(cache.create("items", rec("r")).await);
        assert_eq!(names(&cache), vec!["a", "b", "r"]);
        assert_eq!(cache.gateway().stored("items").unwrap().len(), 3);
        assert_eq!(
            cache.status().last_outcome(),
            Some(Outcome::success("Item created successfully"))
        );
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let cache = loaded(&["a", "b", "c"]).await;
        assert!(cache.update("items", 1, rec("r2")).await);
        assert_eq!(names(&cache), vec!["a", "r2", "c"]);
        assert_eq!(
            cache.gateway().stored("items").unwrap(),
            vec![rec("a"), rec("r2"), rec("c")]
        );
    }

    #[tokio::test]
    async fn delete_removes_and_shifts() {
        let cache = loaded(&["a", "b", "c"]).await;
        assert!(cache.delete("items", 1).await);
        assert_eq!(names(&cache), vec!["a", "c"]);
        assert_eq!(cache.get(1), Some(rec("c")));
    }

    #[tokio::test]
    async fn failed_writes_leave_replica_untouched() {
        let cache = loaded(&["a", "b", "c"]).await;
        let before = cache.records();
        cache.gateway().set_simulate_write_error(true);

        assert!(!cache.create("items", rec("x")).await);
        assert_eq!(cache.records(), before);
        assert!(!cache.update("items", 0, rec("x")).await);
        assert_eq!(cache.records(), before);
        assert!(!cache.delete("items", 2).await);
        assert_eq!(cache.records(), before);

        assert_eq!(
            cache.status().last_outcome(),
            Some(Outcome::failure("Simulated write error"))
        );
        assert_eq!(cache.gateway().stored("items").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn out_of_bounds_index_never_reaches_storage() {
        let cache = loaded(&["a", "b", "c"]).await;
        let before = cache.records();
        let calls = cache.gateway().call_count();

        assert!(!cache.update("items", 3, rec("x")).await);
        assert!(!cache.update("items", -1, rec("x")).await);
        assert!(!cache.delete("items", 3).await);
        assert!(!cache.delete("items", -1).await);
        assert!(!cache.delete("items", usize::MAX).await);

        assert_eq!(cache.gateway().call_count(), calls);
        assert_eq!(cache.records(), before);
        assert_eq!(
            cache.status().last_outcome(),
            Some(Outcome::failure("Invalid index"))
        );
        assert!(!cache.is_busy());
    }

    #[tokio::test]
    async fn bounds_apply_to_empty_replica() {
        let cache = CollectionCache::new(MemGateway::new());
        assert!(!cache.update("items", 0, rec("x")).await);
        assert!(!cache.delete("items", 0).await);
        assert_eq!(cache.gateway().call_count(), 0);
    }

    #[tokio::test]
    async fn reset_is_idempotent_and_local() {
        let cache = loaded(&["a", "b"]).await;
        let calls = cache.gateway().call_count();

        cache.reset();
        assert!(cache.is_empty());
        cache.reset();
        assert!(cache.is_empty());
        assert_eq!(cache.name(), None);

        assert_eq!(cache.gateway().call_count(), calls);
        assert_eq!(cache.status().snapshot().operation, Some(OperationKind::Reset));
    }

    #[tokio::test]
    async fn panicking_gateway_is_contained() {
        let cache = loaded(&["a"]).await;
        cache.gateway().set_simulate_panic(true);

        assert!(!cache.create("items", rec("b")).await);
        assert_eq!(names(&cache), vec!["a"]);
        assert_eq!(
            cache.status().last_outcome(),
            Some(Outcome::failure("simulated gateway panic"))
        );

        assert!(!cache.load("items").await);
        assert!(cache.is_empty());
        assert!(!cache.is_busy());
    }

    #[tokio::test]
    async fn create_without_load_starts_from_empty_replica() {
        let cache = CollectionCache::new(MemGateway::new());
        assert!(cache.create("events", rec("e1")).await);
        assert_eq!(cache.name().as_deref(), Some("events"));
        assert_eq!(cache.gateway().stored("events"), Some(vec![rec("e1")]));
    }

    #[tokio::test]
    async fn successful_write_moves_replica_to_written_name() {
        let cache = loaded(&["a"]).await;
        assert!(cache.create("archive", rec("b")).await);
        assert_eq!(cache.name().as_deref(), Some("archive"));
        assert_eq!(cache.gateway().stored("archive").unwrap().len(), 2);
        assert_eq!(cache.gateway().stored("items").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn busy_while_gateway_call_is_pending() {
        let cache = loaded(&["a"]).await;
        cache
            .gateway()
            .push_write_delay(std::time::Duration::from_millis(30));
        let mut rx = cache.subscribe();

        let write = cache.create("items", rec("b"));
        let watch = async {
            rx.changed().await.unwrap();
            let busy = rx.borrow_and_update().busy;
            busy
        };
        let (created, saw_busy) = tokio::join!(write, watch);

        assert!(created);
        assert!(saw_busy);
        assert!(!cache.is_busy());
        assert_eq!(cache.status().snapshot().phase, Phase::Succeeded);
    }

    #[tokio::test]
    async fn abandoned_write_does_not_leave_cache_busy() {
        let cache = loaded(&["a"]).await;
        cache
            .gateway()
            .push_write_delay(std::time::Duration::from_millis(200));

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            cache.create("items", rec("b")),
        )
        .await;
        assert!(abandoned.is_err());

        let snapshot = cache.status().snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.phase, Phase::Succeeded);
        assert_eq!(
            snapshot.outcome,
            Some(Outcome::success("Data loaded successfully"))
        );
        assert_eq!(names(&cache), vec!["a"]);

        assert!(cache.load("items").await);
        let snapshot = cache.status().snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.phase, Phase::Succeeded);
    }

    #[tokio::test]
    async fn abandoned_queued_write_does_not_leave_cache_busy() {
        let cache = CollectionCache::new(seeded_gateway("items", 1))
            .with_write_policy(WritePolicy::Serialized);
        assert!(cache.load("items").await);
        cache
            .gateway()
            .push_write_delay(std::time::Duration::from_millis(50));

        // the second call gives up while still waiting for the queue
        let (first, second) = tokio::join!(
            cache.create("items", rec("first")),
            tokio::time::timeout(
                std::time::Duration::from_millis(10),
                cache.create("items", rec("second")),
            )
        );
        assert!(first);
        assert!(second.is_err());

        assert!(!cache.is_busy());
        assert_eq!(cache.status().snapshot().phase, Phase::Succeeded);
        assert_eq!(names(&cache), vec!["Item 1", "first"]);
        assert_eq!(cache.gateway().write_count(), 1);
    }

    #[tokio::test]
    async fn overlapping_writes_last_settled_wins() {
        let cache = CollectionCache::new(seeded_gateway("items", 1));
        assert!(cache.load("items").await);
        cache
            .gateway()
            .push_write_delay(std::time::Duration::from_millis(50));

        // the slow write starts first but settles last
        let (slow, fast) = tokio::join!(
            cache.create("items", rec("slow")),
            cache.create("items", rec("fast"))
        );
        assert!(slow && fast);

        assert_eq!(names(&cache), vec!["Item 1", "slow"]);
        assert_eq!(
            cache.gateway().stored("items").unwrap(),
            cache.records().to_vec()
        );
        assert!(!cache.is_busy());
    }

    #[tokio::test]
    async fn serialized_writes_observe_each_other() {
        let cache = CollectionCache::new(seeded_gateway("items", 1))
            .with_write_policy(WritePolicy::Serialized);
        assert!(cache.load("items").await);
        cache
            .gateway()
            .push_write_delay(std::time::Duration::from_millis(50));

        let (slow, fast) = tokio::join!(
            cache.create("items", rec("slow")),
            cache.create("items", rec("fast"))
        );
        assert!(slow && fast);

        assert_eq!(names(&cache), vec!["Item 1", "slow", "fast"]);
        assert_eq!(cache.gateway().stored("items").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn serialized_delete_validates_against_latest_replica() {
        let cache = CollectionCache::new(seeded_gateway("items", 2))
            .with_write_policy(WritePolicy::Serialized);
        assert!(cache.load("items").await);
        cache
            .gateway()
            .push_write_delay(std::time::Duration::from_millis(30));

        // both target the last index; the second sees only one record left
        let (first, second) = tokio::join!(cache.delete("items", 1), cache.delete("items", 1));
        assert!(first);
        assert!(!second);
        assert_eq!(names(&cache), vec!["Item 1"]);
        assert_eq!(
            cache.status().last_outcome(),
            Some(Outcome::failure("Invalid index"))
        );
    }

    #[test]
    fn write_policy_parsing() {
        assert_eq!(
            "last-write-wins".parse::<WritePolicy>().unwrap(),
            WritePolicy::LastWriteWins
        );
        assert_eq!(
            " Serialized ".parse::<WritePolicy>().unwrap(),
            WritePolicy::Serialized
        );
        assert!("queued".parse::<WritePolicy>().is_err());
        assert_eq!(WritePolicy::Serialized.to_string(), "serialized");
    }

    #[test]
    fn checked_index_bounds() {
        assert_eq!(checked_index(Some(0), 1).unwrap(), 0);
        assert!(matches!(
            checked_index(Some(1), 1),
            Err(ModelDataError::Validation {
                index: Some(1),
                len: 1
            })
        ));
        assert!(matches!(
            checked_index(None, 5),
            Err(ModelDataError::Validation { index: None, len: 5 })
        ));
    }
}
