use std::collections::VecDeque;

use crate::domain::entities::{GuestRecord, RsvpStatus};

const UNDO_DEPTH: usize = 10;

// Canonical form shared by every write path: uppercase code, trimmed names
// with empties dropped, household count covering at least the named guests.
pub fn normalize_guest(mut guest: GuestRecord) -> GuestRecord {
    guest.code = guest.code.trim().to_uppercase();
    guest.guest_names = guest
        .guest_names
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    guest.household_id = guest.household_id.as_deref().and_then(|household_id| {
        let trimmed = household_id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_uppercase())
        }
    });
    let named = guest.guest_names.len() as u32;
    guest.household_count = guest.household_count.max(named).max(1);
    guest
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: u64,
    pub confirmed: u64,
    pub pending: u64,
    pub declined: u64,
    pub expected_attendees: u64,
}

struct UndoEntry {
    label: String,
    snapshot: Vec<GuestRecord>,
}

// In-memory guest collection kept sorted by primary guest name. Mutations
// snapshot the previous collection onto a bounded undo stack; undo history
// never leaves this process.
#[derive(Default)]
pub struct GuestRegistry {
    entries: Vec<GuestRecord>,
    undo_stack: VecDeque<UndoEntry>,
}

impl GuestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Replace the whole collection without recording an undo step.
    pub fn seed(&mut self, entries: Vec<GuestRecord>) {
        self.entries = entries.into_iter().map(normalize_guest).collect();
        self.sort();
    }

    pub fn entries(&self) -> &[GuestRecord] {
        &self.entries
    }

    pub fn find(&self, code: &str) -> Option<&GuestRecord> {
        self.entries
            .iter()
            .find(|guest| guest.code.eq_ignore_ascii_case(code))
    }

    pub fn insert(&mut self, record: GuestRecord, label: impl Into<String>) -> GuestRecord {
        self.push_undo(label);
        let guest = normalize_guest(record);
        self.entries.push(guest.clone());
        self.sort();
        guest
    }

    // Swap the record stored under `existing_code` for `record`. Returns the
    // stored form, or None when the code is unknown.
    pub fn replace(
        &mut self,
        existing_code: &str,
        record: GuestRecord,
        label: impl Into<String>,
    ) -> Option<GuestRecord> {
        let position = self.position(existing_code)?;
        self.push_undo(label);
        let guest = normalize_guest(record);
        self.entries[position] = guest.clone();
        self.sort();
        Some(guest)
    }

    pub fn remove(&mut self, code: &str, label: impl Into<String>) -> Option<GuestRecord> {
        let position = self.position(code)?;
        self.push_undo(label);
        Some(self.entries.remove(position))
    }

    pub fn set_status(
        &mut self,
        code: &str,
        status: RsvpStatus,
        now: u64,
        label: impl Into<String>,
    ) -> Option<GuestRecord> {
        let position = self.position(code)?;
        self.push_undo(label);
        let guest = &mut self.entries[position];
        guest.rsvp_status = status;
        guest.last_updated = Some(now);
        Some(guest.clone())
    }

    // Restore the most recent snapshot. Returns the label of the reverted
    // change, or None when there is nothing to undo.
    pub fn undo(&mut self) -> Option<String> {
        let entry = self.undo_stack.pop_front()?;
        self.entries = entry.snapshot;
        Some(entry.label)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    // Merge a full remote snapshot. A local record survives its remote
    // counterpart only with a strictly newer stamp; local-only records
    // survive only when newer than everything the snapshot carries.
    pub fn apply_snapshot(&mut self, incoming: Vec<GuestRecord>) {
        let incoming: Vec<GuestRecord> = incoming.into_iter().map(normalize_guest).collect();
        let newest_remote = incoming.iter().filter_map(|guest| guest.last_updated).max();

        let mut merged: Vec<GuestRecord> = incoming
            .iter()
            .map(|remote| match self.find(&remote.code) {
                Some(local) if local.last_updated > remote.last_updated => local.clone(),
                _ => remote.clone(),
            })
            .collect();

        for local in &self.entries {
            let known = incoming
                .iter()
                .any(|remote| remote.code.eq_ignore_ascii_case(&local.code));
            if !known && local.last_updated > newest_remote {
                merged.push(local.clone());
            }
        }

        self.entries = merged;
        self.sort();
    }

    pub fn filter(&self, query: &str, status: Option<RsvpStatus>) -> Vec<GuestRecord> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|guest| status.map_or(true, |wanted| guest.rsvp_status == wanted))
            .filter(|guest| needle.is_empty() || haystack(guest).contains(&needle))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.entries.len() as u64,
            ..RegistryStats::default()
        };
        for guest in &self.entries {
            match guest.rsvp_status {
                RsvpStatus::Confirmed => {
                    stats.confirmed += 1;
                    stats.expected_attendees +=
                        u64::from(guest.household_count) + u64::from(guest.additional_guests);
                }
                RsvpStatus::Pending => stats.pending += 1,
                RsvpStatus::Declined => stats.declined += 1,
            }
        }
        stats
    }

    fn push_undo(&mut self, label: impl Into<String>) {
        self.undo_stack.push_front(UndoEntry {
            label: label.into(),
            snapshot: self.entries.clone(),
        });
        self.undo_stack.truncate(UNDO_DEPTH);
    }

    fn position(&self, code: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|guest| guest.code.eq_ignore_ascii_case(code))
    }

    fn sort(&mut self) {
        self.entries
            .sort_by_cached_key(|guest| guest.primary_guest().to_lowercase());
    }
}

fn haystack(guest: &GuestRecord) -> String {
    let mut parts: Vec<&str> = guest.guest_names.iter().map(String::as_str).collect();
    parts.push(&guest.code);
    parts.push(&guest.contact);
    parts.push(&guest.notes);
    parts.join(" ").to_lowercase()
}
