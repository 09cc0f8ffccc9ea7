use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::entities::{AuditEntry, GuestPatch, GuestRecord, GuestRole, RsvpStatus};
use crate::domain::ports::{AuditLog, Clock, GuestFeed, GuestStore, StorageCache};

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_millis(&self) -> u64 {
        self.0
    }
}

// Quick way to build a full guest record in tests.
pub(crate) fn test_guest(code: &str, names: &[&str]) -> GuestRecord {
    GuestRecord {
        code: code.to_string(),
        guest_names: names.iter().map(|name| name.to_string()).collect(),
        household_id: None,
        household_count: names.len().max(1) as u32,
        contact: String::new(),
        rsvp_status: RsvpStatus::Pending,
        notes: String::new(),
        additional_guests: 0,
        last_updated: None,
        role: GuestRole::Guest,
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct StoreFailures {
    pub get: bool,
    pub set: bool,
    pub update: bool,
    pub delete: bool,
}

// Guest store fake that records every call and mimics the adapters' key
// normalisation (documents live under the lowercase code).
#[derive(Clone)]
pub(crate) struct RecordingGuestStore {
    guests: Arc<Mutex<HashMap<String, GuestRecord>>>,
    ops: Arc<Mutex<Vec<String>>>,
    failures: StoreFailures,
    feed: broadcast::Sender<GuestFeed>,
}

impl RecordingGuestStore {
    pub(crate) fn new() -> Self {
        let (feed, _) = broadcast::channel(16);
        Self {
            guests: Arc::new(Mutex::new(HashMap::new())),
            ops: Arc::new(Mutex::new(Vec::new())),
            failures: StoreFailures::default(),
            feed,
        }
    }

    pub(crate) fn with_failures(mut self, failures: StoreFailures) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_guest(&self, code: &str, record: GuestRecord) {
        let mut guard = self.guests.lock().expect("guests mutex poisoned");
        guard.insert(code.to_lowercase(), record);
    }

    pub(crate) fn get_test_guest(&self, code: &str) -> Option<GuestRecord> {
        let guard = self.guests.lock().expect("guests mutex poisoned");
        guard.get(&code.to_lowercase()).cloned()
    }

    pub(crate) fn ops(&self) -> Vec<String> {
        self.ops.lock().expect("ops mutex poisoned").clone()
    }

    pub(crate) fn guest_count(&self) -> usize {
        self.guests.lock().expect("guests mutex poisoned").len()
    }

    pub(crate) fn publish(&self, event: GuestFeed) {
        let _ = self.feed.send(event);
    }

    fn record_op(&self, op: String) {
        self.ops.lock().expect("ops mutex poisoned").push(op);
    }
}

#[async_trait]
impl GuestStore for RecordingGuestStore {
    async fn get(&self, code: &str) -> Result<Option<GuestRecord>, String> {
        let key = code.to_lowercase();
        self.record_op(format!("get {}", key));
        if self.failures.get {
            return Err("get failed".to_string());
        }

        let guard = self.guests.lock().expect("guests mutex poisoned");
        Ok(guard.get(&key).cloned())
    }

    async fn set(&self, code: &str, record: GuestRecord) -> Result<(), String> {
        let key = code.to_lowercase();
        self.record_op(format!("set {}", key));
        if self.failures.set {
            return Err("set failed".to_string());
        }

        let mut guard = self.guests.lock().expect("guests mutex poisoned");
        guard.insert(key, record);
        Ok(())
    }

    async fn update(&self, code: &str, patch: GuestPatch) -> Result<(), String> {
        let key = code.to_lowercase();
        self.record_op(format!("update {}", key));
        if self.failures.update {
            return Err("update failed".to_string());
        }

        let mut guard = self.guests.lock().expect("guests mutex poisoned");
        match guard.get_mut(&key) {
            Some(record) => {
                patch.apply(record);
                Ok(())
            }
            None => Err("document missing".to_string()),
        }
    }

    async fn delete(&self, code: &str) -> Result<bool, String> {
        let key = code.to_lowercase();
        self.record_op(format!("delete {}", key));
        if self.failures.delete {
            return Err("delete failed".to_string());
        }

        let mut guard = self.guests.lock().expect("guests mutex poisoned");
        Ok(guard.remove(&key).is_some())
    }

    fn subscribe(&self) -> broadcast::Receiver<GuestFeed> {
        self.feed.subscribe()
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct CacheFailures {
    pub load: bool,
    pub save: bool,
    pub remove: bool,
}

// Storage cache fake backed by a plain map.
#[derive(Clone)]
pub(crate) struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
    failures: CacheFailures,
}

impl MemoryCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            failures: CacheFailures::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: CacheFailures) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn blob(&self, key: &str) -> Option<String> {
        let guard = self.entries.lock().expect("cache mutex poisoned");
        guard.get(key).cloned()
    }

    pub(crate) fn put_blob(&self, key: &str, value: &str) {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(key.to_string(), value.to_string());
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }
}

#[async_trait]
impl StorageCache for MemoryCache {
    async fn load(&self, key: &str) -> Result<Option<String>, String> {
        if self.failures.load {
            return Err("load failed".to_string());
        }

        let guard = self.entries.lock().expect("cache mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), String> {
        if self.failures.save {
            return Err("save failed".to_string());
        }

        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        if self.failures.remove {
            return Err("remove failed".to_string());
        }

        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.remove(key);
        Ok(())
    }
}

// Audit log fake that records appended entries.
#[derive(Clone)]
pub(crate) struct RecordingAudit {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    should_fail: bool,
}

impl RecordingAudit {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            should_fail: true,
        }
    }

    pub(crate) fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }
}

#[async_trait]
impl AuditLog for RecordingAudit {
    async fn append(&self, entry: AuditEntry) -> Result<(), String> {
        if self.should_fail {
            return Err("append failed".to_string());
        }

        let mut guard = self.entries.lock().expect("audit mutex poisoned");
        guard.push(entry);
        Ok(())
    }
}
