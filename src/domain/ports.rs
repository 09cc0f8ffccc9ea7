use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::entities::{AuditEntry, GuestPatch, GuestRecord, GuestbookEntry, Prediction};

// Event pushed to subscribers after every guest store change. A snapshot
// always carries the full collection; `Interrupted` reports a broken feed.
#[derive(Clone, Debug)]
pub enum GuestFeed {
    Snapshot(Vec<GuestRecord>),
    Interrupted,
}

// Port for the remote guest document store. Codes are stored under their
// lowercase form; adapters normalise the key themselves.
#[async_trait]
pub trait GuestStore: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<GuestRecord>, String>;
    async fn set(&self, code: &str, record: GuestRecord) -> Result<(), String>;
    // Partial merge into an existing document; fails when the document is absent.
    async fn update(&self, code: &str, patch: GuestPatch) -> Result<(), String>;
    async fn delete(&self, code: &str) -> Result<bool, String>;
    fn subscribe(&self) -> broadcast::Receiver<GuestFeed>;
}

// Port for durable key/value storage of JSON blobs (session and mirror state).
#[async_trait]
pub trait StorageCache: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, String>;
    async fn save(&self, key: &str, value: &str) -> Result<(), String>;
    async fn remove(&self, key: &str) -> Result<(), String>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> u64;
}

// Port for the best-effort admin action log.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<(), String>;
}

// Port for guestbook persistence. `list` carries no ordering guarantee.
#[async_trait]
pub trait GuestbookStore: Send + Sync {
    async fn add(&self, entry: GuestbookEntry) -> Result<(), String>;
    async fn list(&self) -> Result<Vec<GuestbookEntry>, String>;
}

// Port for prediction persistence. `like` returns the new tally, or None
// when the id is unknown.
#[async_trait]
pub trait PredictionBoard: Send + Sync {
    async fn add(&self, prediction: Prediction) -> Result<(), String>;
    async fn list(&self) -> Result<Vec<Prediction>, String>;
    async fn like(&self, id: &str) -> Result<Option<u32>, String>;
}

// Shared handles satisfy the ports so state can hold trait objects.
#[async_trait]
impl<T> GuestStore for Arc<T>
where
    T: GuestStore + ?Sized,
{
    async fn get(&self, code: &str) -> Result<Option<GuestRecord>, String> {
        self.as_ref().get(code).await
    }

    async fn set(&self, code: &str, record: GuestRecord) -> Result<(), String> {
        self.as_ref().set(code, record).await
    }

    async fn update(&self, code: &str, patch: GuestPatch) -> Result<(), String> {
        self.as_ref().update(code, patch).await
    }

    async fn delete(&self, code: &str) -> Result<bool, String> {
        self.as_ref().delete(code).await
    }

    fn subscribe(&self) -> broadcast::Receiver<GuestFeed> {
        self.as_ref().subscribe()
    }
}

#[async_trait]
impl<T> StorageCache for Arc<T>
where
    T: StorageCache + ?Sized,
{
    async fn load(&self, key: &str) -> Result<Option<String>, String> {
        self.as_ref().load(key).await
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), String> {
        self.as_ref().save(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        self.as_ref().remove(key).await
    }
}

impl<T> Clock for Arc<T>
where
    T: Clock + ?Sized,
{
    fn now_epoch_millis(&self) -> u64 {
        self.as_ref().now_epoch_millis()
    }
}

#[async_trait]
impl<T> AuditLog for Arc<T>
where
    T: AuditLog + ?Sized,
{
    async fn append(&self, entry: AuditEntry) -> Result<(), String> {
        self.as_ref().append(entry).await
    }
}

#[async_trait]
impl<T> GuestbookStore for Arc<T>
where
    T: GuestbookStore + ?Sized,
{
    async fn add(&self, entry: GuestbookEntry) -> Result<(), String> {
        self.as_ref().add(entry).await
    }

    async fn list(&self) -> Result<Vec<GuestbookEntry>, String> {
        self.as_ref().list().await
    }
}

#[async_trait]
impl<T> PredictionBoard for Arc<T>
where
    T: PredictionBoard + ?Sized,
{
    async fn add(&self, prediction: Prediction) -> Result<(), String> {
        self.as_ref().add(prediction).await
    }

    async fn list(&self) -> Result<Vec<Prediction>, String> {
        self.as_ref().list().await
    }

    async fn like(&self, id: &str) -> Result<Option<u32>, String> {
        self.as_ref().like(id).await
    }
}
