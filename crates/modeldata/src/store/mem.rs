use super::gateway::StorageGateway;
use crate::error::{ModelDataError, Result};
use crate::record::Record;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory storage gateway for testing.
///
/// Besides holding collections, it can simulate read/write failures and
/// panics, delay individual writes, and counts every call so tests can assert
/// that an operation never reached storage.
#[derive(Default)]
pub struct MemGateway {
    collections: Mutex<HashMap<String, Vec<Record>>>,
    simulate_read_error: AtomicBool,
    simulate_write_error: AtomicBool,
    simulate_panic: AtomicBool,
    write_delays: Mutex<VecDeque<Duration>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection without counting it as a write.
    pub fn with_collection(self, name: &str, records: Vec<Record>) -> Self {
        self.collections.lock().insert(name.to_string(), records);
        self
    }

    /// Enable read error simulation for testing error handling.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.store(simulate, Ordering::SeqCst);
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Make every call panic instead of returning.
    pub fn set_simulate_panic(&self, simulate: bool) {
        self.simulate_panic.store(simulate, Ordering::SeqCst);
    }

    /// Queue a delay for the next write. Delays are consumed one per write,
    /// in order; writes with no queued delay settle immediately.
    pub fn push_write_delay(&self, delay: Duration) {
        self.write_delays.lock().push_back(delay);
    }

    /// What storage currently holds for `name`, bypassing the call counters.
    pub fn stored(&self, name: &str) -> Option<Vec<Record>> {
        self.collections.lock().get(name).cloned()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.read_count() + self.write_count()
    }
}

#[async_trait]
impl StorageGateway for MemGateway {
    async fn read_collection(&self, name: &str) -> Result<Vec<Record>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.simulate_panic.load(Ordering::SeqCst) {
            panic!("simulated gateway panic");
        }
        if self.simulate_read_error.load(Ordering::SeqCst) {
            return Err(ModelDataError::read(name, "Simulated read error"));
        }
        self.collections
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| ModelDataError::read(name, "Collection not found"))
    }

    async fn write_collection(&self, name: &str, records: &[Record]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let delay = self.write_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.simulate_panic.load(Ordering::SeqCst) {
            panic!("simulated gateway panic");
        }
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(ModelDataError::write(name, "Simulated write error"));
        }
        self.collections
            .lock()
            .insert(name.to_string(), records.to_vec());
        Ok(())
    }
}
