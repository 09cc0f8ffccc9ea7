use std::sync::Arc;

use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::domain::codes::{compute_invite_code, next_household_id};
use crate::domain::directory::LocalGuestDirectory;
use crate::domain::entities::{AuditEntry, GuestPatch, GuestRecord, GuestRole, RsvpStatus};
use crate::domain::errors::RegistryError;
use crate::domain::ports::{AuditLog, Clock, GuestFeed, GuestStore, StorageCache};
use crate::domain::share::{share_content, ShareContent};
use crate::use_cases::registry::{normalize_guest, GuestRegistry, RegistryStats};

// Cache key for the locally mirrored registry.
pub const ADMIN_MIRROR_KEY: &str = "admin-guests";

// Admin-entered guest fields. A None keeps the existing value on update and
// falls back to a default on add.
#[derive(Clone, Debug, Default)]
pub struct GuestPayload {
    pub code: Option<String>,
    pub guest_names: Vec<String>,
    pub household_id: Option<String>,
    pub household_count: Option<u32>,
    pub contact: Option<String>,
    pub notes: Option<String>,
    pub rsvp_status: Option<RsvpStatus>,
    pub role: Option<GuestRole>,
}

// Admin guest management with injected dependencies. The registry is the
// source of truth for reads; the store and the mirror are written
// best-effort after every local mutation.
pub struct AdminGuestsUseCase<S, C, K, A> {
    pub registry: Arc<Mutex<GuestRegistry>>,
    pub store: Option<S>,
    pub cache: C,
    pub clock: K,
    pub audit: A,
}

impl<S, C, K, A> AdminGuestsUseCase<S, C, K, A>
where
    S: GuestStore,
    C: StorageCache,
    K: Clock,
    A: AuditLog,
{
    // Seed the registry from the persisted mirror, falling back to the
    // bundled directory when the mirror is absent, empty or unreadable.
    pub async fn bootstrap(&self, directory: &LocalGuestDirectory) {
        let mirrored = match self.cache.load(ADMIN_MIRROR_KEY).await {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<GuestRecord>>(&blob) {
                Ok(entries) if !entries.is_empty() => Some(entries),
                Ok(_) => None,
                Err(err) => {
                    warn!(error = %err, "failed to parse guest mirror, reseeding");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to load guest mirror, reseeding");
                None
            }
        };

        let entries = mirrored.unwrap_or_else(|| directory.records().to_vec());
        self.registry.lock().await.seed(entries);
    }

    pub async fn add_guest(&self, payload: GuestPayload) -> Result<GuestRecord, RegistryError> {
        let (guest, entries) = {
            let mut registry = self.registry.lock().await;
            let guest = build_guest_record(
                &payload,
                registry.entries(),
                None,
                self.clock.now_epoch_millis(),
            )?;
            let label = format!("Added {}", guest.primary_guest());
            let stored = registry.insert(guest, label);
            (stored, registry.entries().to_vec())
        };

        self.persist_mirror(&entries).await;
        if let Some(store) = &self.store {
            if let Err(err) = store.set(&guest.code, guest.clone()).await {
                warn!(error = %err, code = %guest.code, "guest store write failed");
            }
        }
        self.log_action(
            "guest:add",
            json!({ "code": guest.code, "name": guest.primary_guest() }),
        )
        .await;
        Ok(guest)
    }

    pub async fn update_guest(
        &self,
        code: &str,
        payload: GuestPayload,
    ) -> Result<GuestRecord, RegistryError> {
        let (previous_code, guest, entries) = {
            let mut registry = self.registry.lock().await;
            let Some(existing) = registry.find(code).cloned() else {
                return Err(RegistryError::UnknownCode);
            };
            let guest = build_guest_record(
                &payload,
                registry.entries(),
                Some(&existing),
                self.clock.now_epoch_millis(),
            )?;
            let label = format!("Updated {}", guest.primary_guest());
            let stored = registry
                .replace(&existing.code, guest, label)
                .ok_or(RegistryError::UnknownCode)?;
            (existing.code, stored, registry.entries().to_vec())
        };

        self.persist_mirror(&entries).await;
        if let Some(store) = &self.store {
            if let Err(err) = store.set(&guest.code, guest.clone()).await {
                warn!(error = %err, code = %guest.code, "guest store write failed");
            }
            // Remove the old document only after the new one is in place.
            if !previous_code.eq_ignore_ascii_case(&guest.code) {
                if let Err(err) = store.delete(&previous_code).await {
                    warn!(error = %err, code = %previous_code, "stale guest document removal failed");
                }
            }
        }
        self.log_action(
            "guest:update",
            json!({ "from": previous_code, "to": guest.code, "name": guest.primary_guest() }),
        )
        .await;
        Ok(guest)
    }

    pub async fn delete_guest(&self, code: &str) -> Result<GuestRecord, RegistryError> {
        let (removed, entries) = {
            let mut registry = self.registry.lock().await;
            let Some(existing) = registry.find(code).cloned() else {
                return Err(RegistryError::UnknownCode);
            };
            let label = format!("Removed {}", existing.primary_guest());
            let removed = registry
                .remove(&existing.code, label)
                .ok_or(RegistryError::UnknownCode)?;
            (removed, registry.entries().to_vec())
        };

        self.persist_mirror(&entries).await;
        if let Some(store) = &self.store {
            if let Err(err) = store.delete(&removed.code).await {
                warn!(error = %err, code = %removed.code, "guest store delete failed");
            }
        }
        self.log_action(
            "guest:delete",
            json!({ "code": removed.code, "name": removed.primary_guest() }),
        )
        .await;
        Ok(removed)
    }

    pub async fn set_rsvp_status(
        &self,
        code: &str,
        status: RsvpStatus,
    ) -> Result<GuestRecord, RegistryError> {
        let now = self.clock.now_epoch_millis();
        let (guest, entries) = {
            let mut registry = self.registry.lock().await;
            let Some(existing) = registry.find(code).cloned() else {
                return Err(RegistryError::UnknownCode);
            };
            let label = format!("Status for {}", existing.primary_guest());
            let updated = registry
                .set_status(&existing.code, status, now, label)
                .ok_or(RegistryError::UnknownCode)?;
            (updated, registry.entries().to_vec())
        };

        self.persist_mirror(&entries).await;
        if let Some(store) = &self.store {
            let patch = GuestPatch {
                rsvp_status: Some(status),
                last_updated: Some(now),
                ..GuestPatch::default()
            };
            if let Err(err) = store.update(&guest.code, patch).await {
                warn!(error = %err, code = %guest.code, "guest store status update failed");
            }
        }
        self.log_action("guest:rsvp", json!({ "code": guest.code, "status": status }))
            .await;
        Ok(guest)
    }

    // Revert the most recent change. Returns its label, or None when the
    // undo history is empty.
    pub async fn undo(&self) -> Option<String> {
        let (label, entries) = {
            let mut registry = self.registry.lock().await;
            let label = registry.undo()?;
            (label, registry.entries().to_vec())
        };

        self.persist_mirror(&entries).await;
        self.log_action("guest:undo", json!({ "label": label })).await;
        Some(label)
    }

    pub async fn list(&self, query: &str, status: Option<RsvpStatus>) -> Vec<GuestRecord> {
        self.registry.lock().await.filter(query, status)
    }

    pub async fn stats(&self) -> RegistryStats {
        self.registry.lock().await.stats()
    }

    pub async fn share(
        &self,
        code: &str,
        origin: &Url,
        event_title: &str,
    ) -> Result<ShareContent, RegistryError> {
        let registry = self.registry.lock().await;
        let guest = registry.find(code).ok_or(RegistryError::UnknownCode)?;
        Ok(share_content(origin, event_title, guest))
    }

    // Follow the store's change feed until it closes. Every snapshot lands
    // in the registry through the stamp-guarded merge.
    pub async fn run_sync(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let mut feed = store.subscribe();
        loop {
            match feed.recv().await {
                Ok(GuestFeed::Snapshot(records)) => {
                    let entries = {
                        let mut registry = self.registry.lock().await;
                        registry.apply_snapshot(records);
                        registry.entries().to_vec()
                    };
                    self.persist_mirror(&entries).await;
                }
                Ok(GuestFeed::Interrupted) => {
                    warn!("guest feed interrupted, keeping local entries");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "guest feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn persist_mirror(&self, entries: &[GuestRecord]) {
        match serde_json::to_string(entries) {
            Ok(blob) => {
                if let Err(err) = self.cache.save(ADMIN_MIRROR_KEY, &blob).await {
                    warn!(error = %err, "failed to persist guest mirror");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialise guest mirror"),
        }
    }

    async fn log_action(&self, action: &str, meta: serde_json::Value) {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            meta,
            created_at: self.clock.now_epoch_millis(),
        };
        if let Err(err) = self.audit.append(entry).await {
            warn!(error = %err, "failed to append audit entry");
        }
    }
}

// Validate and assemble a full record from the payload. `existing` carries
// the stored record on update so omitted fields survive the rebuild.
fn build_guest_record(
    payload: &GuestPayload,
    entries: &[GuestRecord],
    existing: Option<&GuestRecord>,
    now: u64,
) -> Result<GuestRecord, RegistryError> {
    let names: Vec<String> = payload
        .guest_names
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return Err(RegistryError::MissingGuestName);
    }

    let contact = match &payload.contact {
        Some(contact) => contact.trim().to_string(),
        None => existing.map(|guest| guest.contact.clone()).unwrap_or_default(),
    };
    if !validate_contact(&contact) {
        return Err(RegistryError::InvalidContact);
    }

    let preferred = payload
        .code
        .as_deref()
        .or(existing.map(|guest| guest.code.as_str()));
    let code = compute_invite_code(
        entries,
        &names[0],
        names.get(1).map(String::as_str).unwrap_or_default(),
        preferred,
        existing.map(|guest| guest.code.as_str()),
    );

    let household_id = payload
        .household_id
        .as_deref()
        .map(str::trim)
        .filter(|household_id| !household_id.is_empty())
        .map(str::to_uppercase)
        .or_else(|| existing.and_then(|guest| guest.household_id.clone()))
        .or_else(|| Some(next_household_id(entries)));

    let notes = match &payload.notes {
        Some(notes) => notes.trim().to_string(),
        None => existing.map(|guest| guest.notes.clone()).unwrap_or_default(),
    };

    let record = GuestRecord {
        code,
        guest_names: names,
        household_id,
        household_count: payload
            .household_count
            .or(existing.map(|guest| guest.household_count))
            .unwrap_or(0),
        contact,
        rsvp_status: payload
            .rsvp_status
            .or(existing.map(|guest| guest.rsvp_status))
            .unwrap_or_default(),
        notes,
        additional_guests: existing.map(|guest| guest.additional_guests).unwrap_or(0),
        last_updated: Some(now),
        role: payload
            .role
            .or(existing.map(|guest| guest.role))
            .unwrap_or_default(),
    };
    Ok(normalize_guest(record))
}

// Accepts an empty contact, a phone number or a plain email shape.
fn validate_contact(contact: &str) -> bool {
    let trimmed = contact.trim();
    if trimmed.is_empty() {
        return true;
    }
    is_phone(trimmed) || is_email(trimmed)
}

// Optional leading +, then at least seven digits, spaces or dashes.
fn is_phone(value: &str) -> bool {
    let rest = value.strip_prefix('+').unwrap_or(value);
    rest.chars().count() >= 7
        && rest
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == ' ' || ch == '-')
}

// local@host.tail with a non-empty local part and a tail of at least two
// characters after the first dot in the domain.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tail)) => !host.is_empty() && tail.chars().count() >= 2,
        None => false,
    }
}
