use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::directory::LocalGuestDirectory;
use crate::domain::entities::{GuestPatch, GuestRecord, GuestSession, RsvpStatus};
use crate::domain::errors::SessionError;
use crate::domain::ports::{Clock, GuestStore, StorageCache};

// Guest-facing copy surfaced with session errors.
pub const EMPTY_CODE_MESSAGE: &str = "Please enter an invite code.";
pub const UNKNOWN_CODE_MESSAGE: &str = "We could not find that invite code.";
pub const LOOKUP_FAILED_MESSAGE: &str = "Something went wrong. Please try again.";
pub const RSVP_FAILED_MESSAGE: &str = "We could not save your response. Please try again.";

// Free-form answers collected alongside an RSVP.
#[derive(Clone, Debug, Default)]
pub struct RsvpDetails {
    pub notes: Option<String>,
    pub additional_guests: Option<u32>,
    pub contact: Option<String>,
}

#[derive(Default)]
struct SessionState {
    session: Option<GuestSession>,
    last_error: Option<String>,
}

// Guest session manager with injected dependencies. The store handle is
// optional; the bundled directory answers lookups the store cannot.
pub struct SessionManager<S, C, K> {
    store: Option<S>,
    cache: C,
    clock: K,
    directory: Arc<LocalGuestDirectory>,
    storage_key: String,
    state: Mutex<SessionState>,
    // Monotonic ticket; only the latest lookup may commit its result.
    lookup_ticket: AtomicU64,
}

impl<S, C, K> SessionManager<S, C, K>
where
    S: GuestStore,
    C: StorageCache,
    K: Clock,
{
    pub fn new(
        store: Option<S>,
        cache: C,
        clock: K,
        directory: Arc<LocalGuestDirectory>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            directory,
            storage_key: storage_key.into(),
            state: Mutex::new(SessionState::default()),
            lookup_ticket: AtomicU64::new(0),
        }
    }

    // Rehydrate the session from its persisted blob, if any.
    pub async fn restore(&self) -> Option<GuestRecord> {
        let blob = match self.cache.load(&self.storage_key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "failed to load persisted session");
                return None;
            }
        };

        let session: GuestSession = match serde_json::from_str(&blob) {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "failed to parse persisted session");
                return None;
            }
        };
        if session.invite_code.trim().is_empty() {
            return None;
        }

        let guest = session.guest.clone();
        let mut state = self.state.lock().await;
        state.session = Some(session);
        Some(guest)
    }

    // Resolve an invite code: remote store first, bundled directory on a
    // store miss. A store error is surfaced as-is and never falls back.
    pub async fn lookup(&self, raw_code: &str) -> Result<GuestRecord, SessionError> {
        let trimmed = raw_code.trim();
        if trimmed.is_empty() {
            let mut state = self.state.lock().await;
            state.last_error = Some(EMPTY_CODE_MESSAGE.to_string());
            return Err(SessionError::EmptyCode);
        }

        let normalized = trimmed.to_lowercase();
        let ticket = self.lookup_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let remote = match &self.store {
            Some(store) => match store.get(&normalized).await {
                Ok(found) => found,
                Err(err) => {
                    warn!(error = %err, code = %normalized, "guest store lookup failed");
                    return self
                        .commit_error(ticket, LOOKUP_FAILED_MESSAGE, SessionError::StoreFailure)
                        .await;
                }
            },
            None => None,
        };

        let resolved = remote.or_else(|| self.directory.find(&normalized));
        let Some(mut guest) = resolved else {
            return self
                .commit_error(ticket, UNKNOWN_CODE_MESSAGE, SessionError::UnknownCode)
                .await;
        };

        hydrate(&mut guest, &normalized, self.clock.now_epoch_millis());

        let mut state = self.state.lock().await;
        if self.lookup_ticket.load(Ordering::SeqCst) != ticket {
            return Err(SessionError::Superseded);
        }
        let session = GuestSession {
            invite_code: normalized,
            guest: guest.clone(),
        };
        state.session = Some(session.clone());
        state.last_error = None;
        // Persist inside the critical section so a newer lookup cannot land
        // between the commit and the write.
        self.persist(Some(&session)).await;

        Ok(guest)
    }

    // Merge the RSVP into the session optimistically, then write through to
    // the store. A store failure restores the pre-update snapshot.
    pub async fn update_rsvp(
        &self,
        status: RsvpStatus,
        details: RsvpDetails,
    ) -> Result<GuestRecord, SessionError> {
        let (invite_code, snapshot, merged, patch) = {
            let mut state = self.state.lock().await;
            let Some(snapshot) = state.session.clone() else {
                return Err(SessionError::NoActiveSession);
            };

            let patch = GuestPatch {
                rsvp_status: Some(status),
                notes: details.notes.clone(),
                contact: details.contact.clone(),
                additional_guests: details.additional_guests,
                last_updated: Some(self.clock.now_epoch_millis()),
            };

            let mut merged = snapshot.guest.clone();
            patch.apply(&mut merged);

            let next = GuestSession {
                invite_code: snapshot.invite_code.clone(),
                guest: merged.clone(),
            };
            state.session = Some(next.clone());
            state.last_error = None;
            self.persist(Some(&next)).await;

            (snapshot.invite_code.clone(), snapshot, merged, patch)
        };

        if let Some(store) = &self.store {
            if let Err(err) = store.update(&invite_code, patch).await {
                warn!(error = %err, code = %invite_code, "rsvp write-through failed, rolling back");
                let mut state = self.state.lock().await;
                state.session = Some(snapshot.clone());
                state.last_error = Some(RSVP_FAILED_MESSAGE.to_string());
                self.persist(Some(&snapshot)).await;
                return Err(SessionError::StoreFailure);
            }
        }

        Ok(merged)
    }

    // Drop the session and its persisted blob.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.session = None;
        state.last_error = None;
        self.persist(None).await;
    }

    pub async fn current(&self) -> Option<GuestSession> {
        self.state.lock().await.session.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    async fn commit_error(
        &self,
        ticket: u64,
        message: &str,
        error: SessionError,
    ) -> Result<GuestRecord, SessionError> {
        let mut state = self.state.lock().await;
        if self.lookup_ticket.load(Ordering::SeqCst) != ticket {
            return Err(SessionError::Superseded);
        }
        state.last_error = Some(message.to_string());
        Err(error)
    }

    // Cache trouble never fails the session operation.
    async fn persist(&self, session: Option<&GuestSession>) {
        let result = match session {
            Some(session) => match serde_json::to_string(session) {
                Ok(blob) => self.cache.save(&self.storage_key, &blob).await,
                Err(err) => {
                    warn!(error = %err, "failed to serialise session");
                    return;
                }
            },
            None => self.cache.remove(&self.storage_key).await,
        };

        if let Err(err) = result {
            warn!(error = %err, "failed to persist session state");
        }
    }
}

// Fill store-side gaps and stamp the access time before handing the record out.
fn hydrate(guest: &mut GuestRecord, code: &str, now: u64) {
    guest.code = code.to_uppercase();
    if guest.household_count == 0 {
        guest.household_count = guest.guest_names.len().max(1) as u32;
    }
    guest.last_updated = Some(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{
        test_guest, CacheFailures, FixedClock, MemoryCache, RecordingGuestStore, StoreFailures,
    };
    use async_trait::async_trait;
    use crate::domain::ports::GuestFeed;
    use tokio::sync::{broadcast, Notify, Semaphore};

    const NOW: u64 = 1_760_000_000_000;
    const KEY: &str = "invite-session:test";

    fn manager_with(
        store: Option<RecordingGuestStore>,
        cache: MemoryCache,
        directory: LocalGuestDirectory,
    ) -> SessionManager<RecordingGuestStore, MemoryCache, FixedClock> {
        SessionManager::new(store, cache, FixedClock(NOW), Arc::new(directory), KEY)
    }

    #[tokio::test]
    async fn when_code_is_empty_then_lookup_reports_empty_code() {
        let cache = MemoryCache::new();
        let manager = manager_with(None, cache.clone(), LocalGuestDirectory::bundled());

        let result = manager.lookup("").await;

        assert!(matches!(result, Err(SessionError::EmptyCode)));
        assert_eq!(manager.last_error().await.as_deref(), Some(EMPTY_CODE_MESSAGE));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn when_code_is_whitespace_then_lookup_reports_empty_code() {
        let manager = manager_with(None, MemoryCache::new(), LocalGuestDirectory::bundled());

        let result = manager.lookup("   ").await;

        assert!(matches!(result, Err(SessionError::EmptyCode)));
    }

    #[tokio::test]
    async fn when_store_has_the_code_then_remote_guest_wins_over_directory() {
        let store = RecordingGuestStore::new();
        // Same code exists in the bundled directory under another household.
        store.insert_test_guest("ayes0001", test_guest("AYES0001", &["Remote Household"]));
        let cache = MemoryCache::new();
        let manager = manager_with(Some(store), cache.clone(), LocalGuestDirectory::bundled());

        let guest = manager
            .lookup("AYES0001")
            .await
            .expect("expected remote lookup to succeed");

        assert_eq!(guest.primary_guest(), "Remote Household");
        assert_eq!(guest.code, "AYES0001");
        assert_eq!(guest.last_updated, Some(NOW));

        let blob = cache.blob(KEY).expect("expected persisted session");
        let session: GuestSession = serde_json::from_str(&blob).expect("expected session json");
        assert_eq!(session.invite_code, "ayes0001");
        assert_eq!(session.guest.primary_guest(), "Remote Household");
    }

    #[tokio::test]
    async fn when_store_misses_then_directory_answers() {
        let store = RecordingGuestStore::new();
        let manager = manager_with(Some(store.clone()), MemoryCache::new(), LocalGuestDirectory::bundled());

        let guest = manager
            .lookup("  AyEs0001 ")
            .await
            .expect("expected directory fallback to succeed");

        assert_eq!(guest.primary_guest(), "Ayesha Khan");
        assert_eq!(guest.code, "AYES0001");
        assert_eq!(store.ops(), vec!["get ayes0001".to_string()]);
    }

    #[tokio::test]
    async fn when_no_store_is_configured_then_directory_serves_the_lookup() {
        let manager = manager_with(None, MemoryCache::new(), LocalGuestDirectory::bundled());

        let guest = manager
            .lookup("noor0002")
            .await
            .expect("expected directory lookup to succeed");

        assert_eq!(guest.primary_guest(), "Noor Rahman");
    }

    #[tokio::test]
    async fn when_store_fails_then_no_directory_fallback_happens() {
        let store = RecordingGuestStore::new().with_failures(StoreFailures {
            get: true,
            ..Default::default()
        });
        let cache = MemoryCache::new();
        // The bundled directory knows this code, but a failing store must not
        // be papered over with stale local data.
        let manager = manager_with(Some(store), cache.clone(), LocalGuestDirectory::bundled());

        let result = manager.lookup("AYES0001").await;

        assert!(matches!(result, Err(SessionError::StoreFailure)));
        assert_eq!(
            manager.last_error().await.as_deref(),
            Some(LOOKUP_FAILED_MESSAGE)
        );
        assert_eq!(cache.len(), 0);
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn when_code_is_unknown_everywhere_then_lookup_reports_unknown_code() {
        let store = RecordingGuestStore::new();
        let manager = manager_with(Some(store), MemoryCache::new(), LocalGuestDirectory::bundled());

        let result = manager.lookup("NOPE9999").await;

        assert!(matches!(result, Err(SessionError::UnknownCode)));
        assert_eq!(
            manager.last_error().await.as_deref(),
            Some(UNKNOWN_CODE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn when_lookup_succeeds_then_a_fresh_manager_can_restore_the_session() {
        let cache = MemoryCache::new();
        let manager = manager_with(None, cache.clone(), LocalGuestDirectory::bundled());
        manager
            .lookup("zara0004")
            .await
            .expect("expected lookup to succeed");

        let rebuilt = manager_with(None, cache, LocalGuestDirectory::bundled());
        let restored = rebuilt.restore().await.expect("expected restored session");

        assert_eq!(restored.code, "ZARA0004");
        let session = rebuilt.current().await.expect("expected current session");
        assert_eq!(session.invite_code, "zara0004");
    }

    #[tokio::test]
    async fn when_restore_finds_a_corrupt_blob_then_session_stays_empty() {
        let cache = MemoryCache::new();
        cache.put_blob(KEY, "not json at all");
        let manager = manager_with(None, cache, LocalGuestDirectory::bundled());

        assert!(manager.restore().await.is_none());
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn when_hydrating_then_zero_household_count_defaults_to_name_count() {
        let store = RecordingGuestStore::new();
        let mut partial = test_guest("DUO0001", &["One", "Two"]);
        partial.household_count = 0;
        store.insert_test_guest("duo0001", partial);
        let manager = manager_with(Some(store), MemoryCache::new(), LocalGuestDirectory::empty());

        let guest = manager
            .lookup("DUO0001")
            .await
            .expect("expected lookup to succeed");

        assert_eq!(guest.household_count, 2);
    }

    #[tokio::test]
    async fn when_rsvp_updates_without_session_then_returns_no_active_session() {
        let manager = manager_with(None, MemoryCache::new(), LocalGuestDirectory::bundled());

        let result = manager
            .update_rsvp(RsvpStatus::Confirmed, RsvpDetails::default())
            .await;

        assert!(matches!(result, Err(SessionError::NoActiveSession)));
    }

    #[tokio::test]
    async fn when_rsvp_updates_then_fields_merge_and_cache_follows() {
        let store = RecordingGuestStore::new();
        store.insert_test_guest("ayes0001", test_guest("AYES0001", &["Ayesha Khan", "Bilal Khan"]));
        let cache = MemoryCache::new();
        let manager = manager_with(Some(store.clone()), cache.clone(), LocalGuestDirectory::empty());
        manager
            .lookup("ayes0001")
            .await
            .expect("expected lookup to succeed");

        let guest = manager
            .update_rsvp(
                RsvpStatus::Confirmed,
                RsvpDetails {
                    notes: Some("Can't wait!".to_string()),
                    additional_guests: Some(2),
                    contact: None,
                },
            )
            .await
            .expect("expected rsvp update to succeed");

        assert_eq!(guest.rsvp_status, RsvpStatus::Confirmed);
        assert_eq!(guest.notes, "Can't wait!");
        assert_eq!(guest.additional_guests, 2);
        assert_eq!(guest.last_updated, Some(NOW));

        let blob = cache.blob(KEY).expect("expected persisted session");
        let session: GuestSession = serde_json::from_str(&blob).expect("expected session json");
        assert_eq!(session.guest.rsvp_status, RsvpStatus::Confirmed);
        assert_eq!(session.guest.notes, "Can't wait!");

        // Write-through reached the store document as well.
        let stored = store.get_test_guest("ayes0001").expect("expected stored doc");
        assert_eq!(stored.rsvp_status, RsvpStatus::Confirmed);
    }

    #[tokio::test]
    async fn when_rsvp_write_through_fails_then_state_and_cache_roll_back() {
        let store = RecordingGuestStore::new().with_failures(StoreFailures {
            update: true,
            ..Default::default()
        });
        store.insert_test_guest("ayes0001", test_guest("AYES0001", &["Ayesha Khan"]));
        let cache = MemoryCache::new();
        let manager = manager_with(Some(store), cache.clone(), LocalGuestDirectory::empty());
        let before = manager
            .lookup("ayes0001")
            .await
            .expect("expected lookup to succeed");

        let result = manager
            .update_rsvp(
                RsvpStatus::Confirmed,
                RsvpDetails {
                    notes: Some("Can't wait!".to_string()),
                    additional_guests: None,
                    contact: None,
                },
            )
            .await;

        assert!(matches!(result, Err(SessionError::StoreFailure)));
        assert_eq!(
            manager.last_error().await.as_deref(),
            Some(RSVP_FAILED_MESSAGE)
        );

        let session = manager.current().await.expect("expected session to survive");
        assert_eq!(session.guest.rsvp_status, before.rsvp_status);
        assert_eq!(session.guest.notes, before.notes);

        let blob = cache.blob(KEY).expect("expected persisted session");
        let persisted: GuestSession = serde_json::from_str(&blob).expect("expected session json");
        assert_eq!(persisted.guest.rsvp_status, RsvpStatus::Pending);
        assert_eq!(persisted.guest.notes, "");
    }

    #[tokio::test]
    async fn when_no_store_is_configured_then_rsvp_commits_locally() {
        let cache = MemoryCache::new();
        let manager = manager_with(None, cache.clone(), LocalGuestDirectory::bundled());
        manager
            .lookup("zara0004")
            .await
            .expect("expected lookup to succeed");

        let guest = manager
            .update_rsvp(RsvpStatus::Declined, RsvpDetails::default())
            .await
            .expect("expected local rsvp to succeed");

        assert_eq!(guest.rsvp_status, RsvpStatus::Declined);
        let blob = cache.blob(KEY).expect("expected persisted session");
        assert!(blob.contains("declined"));
    }

    #[tokio::test]
    async fn when_rsvp_is_retried_with_identical_details_then_result_is_stable() {
        let store = RecordingGuestStore::new();
        store.insert_test_guest("ayes0001", test_guest("AYES0001", &["Ayesha Khan"]));
        let manager = manager_with(Some(store), MemoryCache::new(), LocalGuestDirectory::empty());
        manager
            .lookup("ayes0001")
            .await
            .expect("expected lookup to succeed");
        let details = RsvpDetails {
            notes: Some("same".to_string()),
            additional_guests: Some(1),
            contact: None,
        };

        let first = manager
            .update_rsvp(RsvpStatus::Confirmed, details.clone())
            .await
            .expect("expected first rsvp to succeed");
        let second = manager
            .update_rsvp(RsvpStatus::Confirmed, details)
            .await
            .expect("expected retried rsvp to succeed");

        assert_eq!(first.rsvp_status, second.rsvp_status);
        assert_eq!(first.notes, second.notes);
        assert_eq!(first.additional_guests, second.additional_guests);
        assert_eq!(first.last_updated, second.last_updated);
    }

    #[tokio::test]
    async fn when_cache_save_fails_then_lookup_still_succeeds() {
        let cache = MemoryCache::new().with_failures(CacheFailures {
            save: true,
            ..Default::default()
        });
        let manager = manager_with(None, cache, LocalGuestDirectory::bundled());

        let guest = manager
            .lookup("ayes0001")
            .await
            .expect("expected lookup to survive a cache failure");

        assert_eq!(guest.code, "AYES0001");
        assert!(manager.current().await.is_some());
    }

    #[tokio::test]
    async fn when_clear_runs_then_session_and_cache_entry_are_gone() {
        let cache = MemoryCache::new();
        let manager = manager_with(None, cache.clone(), LocalGuestDirectory::bundled());
        manager
            .lookup("ayes0001")
            .await
            .expect("expected lookup to succeed");

        manager.clear().await;

        assert!(manager.current().await.is_none());
        assert!(manager.last_error().await.is_none());
        assert!(cache.blob(KEY).is_none());
    }

    // Store whose get() blocks on a gate for one chosen code, so tests can
    // interleave two lookups deterministically.
    #[derive(Clone)]
    struct GatedStore {
        inner: RecordingGuestStore,
        gate: Arc<Semaphore>,
        entered: Arc<Notify>,
        slow_code: String,
    }

    #[async_trait]
    impl GuestStore for GatedStore {
        async fn get(&self, code: &str) -> Result<Option<GuestRecord>, String> {
            if code == self.slow_code {
                self.entered.notify_one();
                let _ = self
                    .gate
                    .acquire()
                    .await
                    .map_err(|_| "gate closed".to_string())?;
            }
            self.inner.get(code).await
        }

        async fn set(&self, code: &str, record: GuestRecord) -> Result<(), String> {
            self.inner.set(code, record).await
        }

        async fn update(&self, code: &str, patch: GuestPatch) -> Result<(), String> {
            self.inner.update(code, patch).await
        }

        async fn delete(&self, code: &str) -> Result<bool, String> {
            self.inner.delete(code).await
        }

        fn subscribe(&self) -> broadcast::Receiver<GuestFeed> {
            self.inner.subscribe()
        }
    }

    #[tokio::test]
    async fn when_a_newer_lookup_finishes_first_then_the_stale_one_is_superseded() {
        let inner = RecordingGuestStore::new();
        inner.insert_test_guest("slow0001", test_guest("SLOW0001", &["Slow Family"]));
        inner.insert_test_guest("fast0002", test_guest("FAST0002", &["Fast Family"]));
        let gate = Arc::new(Semaphore::new(0));
        let entered = Arc::new(Notify::new());
        let store = GatedStore {
            inner,
            gate: gate.clone(),
            entered: entered.clone(),
            slow_code: "slow0001".to_string(),
        };
        let cache = MemoryCache::new();
        let manager = Arc::new(SessionManager::new(
            Some(store),
            cache.clone(),
            FixedClock(NOW),
            Arc::new(LocalGuestDirectory::empty()),
            KEY,
        ));

        let slow = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.lookup("SLOW0001").await })
        };
        // Wait until the slow lookup holds its ticket and sits in the store.
        entered.notified().await;

        let fast = manager
            .lookup("FAST0002")
            .await
            .expect("expected newer lookup to succeed");
        assert_eq!(fast.code, "FAST0002");

        gate.add_permits(1);
        let stale = slow.await.expect("expected task to join");
        assert!(matches!(stale, Err(SessionError::Superseded)));

        let session = manager.current().await.expect("expected committed session");
        assert_eq!(session.invite_code, "fast0002");
        let blob = cache.blob(KEY).expect("expected persisted session");
        assert!(blob.contains("FAST0002"));
    }
}
