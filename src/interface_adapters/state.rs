use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use url::Url;

use crate::domain::directory::LocalGuestDirectory;
use crate::domain::entities::{
    AdminSession, AuditEntry, GuestPatch, GuestRecord, GuestbookEntry, Prediction,
};
use crate::domain::ports::{
    AuditLog, Clock, GuestFeed, GuestStore, GuestbookStore, PredictionBoard, StorageCache,
};
use crate::use_cases::registry::GuestRegistry;

// Application state shared by every handler. Ports are trait objects so the
// same state works over Postgres-backed and in-memory adapters. The guest
// store is optional; without one the bundled directory serves lookups.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<GuestRegistry>>,
    pub guest_store: Option<Arc<dyn GuestStore>>,
    pub cache: Arc<dyn StorageCache>,
    pub audit: Arc<dyn AuditLog>,
    pub guestbook: Arc<dyn GuestbookStore>,
    pub predictions: Arc<dyn PredictionBoard>,
    pub admin_sessions: Arc<Mutex<HashMap<String, AdminSession>>>,
    pub directory: Arc<LocalGuestDirectory>,
    pub admin_passcode: String,
    pub admin_session_ttl_seconds: u64,
    pub public_origin: Url,
    pub event_title: String,
}

// In-memory guest store adapter. Documents live under the lowercase code
// and every change pushes a full snapshot to subscribers.
#[derive(Clone)]
pub struct InMemoryGuestStore {
    guests: Arc<Mutex<HashMap<String, GuestRecord>>>,
    feed: broadcast::Sender<GuestFeed>,
}

impl InMemoryGuestStore {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(32);
        Self {
            guests: Arc::new(Mutex::new(HashMap::new())),
            feed,
        }
    }

    async fn publish_snapshot(&self) {
        let records: Vec<GuestRecord> = {
            let guard = self.guests.lock().await;
            guard
                .iter()
                .map(|(key, record)| fill_code(record.clone(), key))
                .collect()
        };
        let _ = self.feed.send(GuestFeed::Snapshot(records));
    }
}

impl Default for InMemoryGuestStore {
    fn default() -> Self {
        Self::new()
    }
}

// Documents written by older tooling may miss their own code field.
fn fill_code(mut record: GuestRecord, key: &str) -> GuestRecord {
    if record.code.trim().is_empty() {
        record.code = key.to_uppercase();
    }
    record
}

#[async_trait]
impl GuestStore for InMemoryGuestStore {
    async fn get(&self, code: &str) -> Result<Option<GuestRecord>, String> {
        let key = code.to_lowercase();
        let guard = self.guests.lock().await;
        Ok(guard.get(&key).map(|record| fill_code(record.clone(), &key)))
    }

    async fn set(&self, code: &str, record: GuestRecord) -> Result<(), String> {
        {
            let mut guard = self.guests.lock().await;
            guard.insert(code.to_lowercase(), record);
        }
        self.publish_snapshot().await;
        Ok(())
    }

    async fn update(&self, code: &str, patch: GuestPatch) -> Result<(), String> {
        {
            let mut guard = self.guests.lock().await;
            let record = guard
                .get_mut(&code.to_lowercase())
                .ok_or_else(|| "document missing".to_string())?;
            patch.apply(record);
        }
        self.publish_snapshot().await;
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<bool, String> {
        let removed = {
            let mut guard = self.guests.lock().await;
            guard.remove(&code.to_lowercase()).is_some()
        };
        if removed {
            self.publish_snapshot().await;
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<GuestFeed> {
        self.feed.subscribe()
    }
}

// In-memory storage cache adapter for running without a data directory.
#[derive(Clone, Default)]
pub struct MemoryStorageCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorageCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageCache for MemoryStorageCache {
    async fn load(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), String> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// In-memory audit log adapter.
#[derive(Clone, Default)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<(), String> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

// In-memory guestbook adapter.
#[derive(Clone, Default)]
pub struct MemoryGuestbook {
    entries: Arc<Mutex<Vec<GuestbookEntry>>>,
}

impl MemoryGuestbook {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuestbookStore for MemoryGuestbook {
    async fn add(&self, entry: GuestbookEntry) -> Result<(), String> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<GuestbookEntry>, String> {
        Ok(self.entries.lock().await.clone())
    }
}

// In-memory prediction board adapter.
#[derive(Clone, Default)]
pub struct MemoryPredictionBoard {
    predictions: Arc<Mutex<Vec<Prediction>>>,
}

impl MemoryPredictionBoard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionBoard for MemoryPredictionBoard {
    async fn add(&self, prediction: Prediction) -> Result<(), String> {
        self.predictions.lock().await.push(prediction);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Prediction>, String> {
        Ok(self.predictions.lock().await.clone())
    }

    async fn like(&self, id: &str) -> Result<Option<u32>, String> {
        let mut guard = self.predictions.lock().await;
        match guard.iter_mut().find(|prediction| prediction.id == id) {
            Some(prediction) => {
                prediction.likes += 1;
                Ok(Some(prediction.likes))
            }
            None => Ok(None),
        }
    }
}

// System clock adapter used by the use cases.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
