use crate::domain::entities::{GuestRecord, GuestRole, RsvpStatus};

// Invite directory bundled with the build. Lookups always try the remote
// store first; this list only answers when the store has no document for
// the code, or when no store is configured at all.
#[derive(Clone, Debug)]
pub struct LocalGuestDirectory {
    entries: Vec<GuestRecord>,
}

impl LocalGuestDirectory {
    pub fn new(entries: Vec<GuestRecord>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    // The shipped guest list used until an admin takes over the registry.
    pub fn bundled() -> Self {
        Self::new(vec![
            seed("AYES0001", &["Ayesha Khan", "Bilal Khan"], "H001", 2),
            seed("NOOR0002", &["Noor Rahman"], "H002", 1),
            seed("IMRA0003", &["Imran Patel", "Sana Patel"], "H003", 3),
            seed("ZARA0004", &["Zara Ahmed"], "H004", 1),
            seed("FARH0005", &["Farhan Malik", "Hana Malik"], "H005", 2),
        ])
    }

    // Case-insensitive point lookup by invite code.
    pub fn find(&self, code: &str) -> Option<GuestRecord> {
        self.entries
            .iter()
            .find(|entry| entry.code.eq_ignore_ascii_case(code))
            .cloned()
    }

    pub fn records(&self) -> &[GuestRecord] {
        &self.entries
    }
}

fn seed(code: &str, names: &[&str], household_id: &str, household_count: u32) -> GuestRecord {
    GuestRecord {
        code: code.to_string(),
        guest_names: names.iter().map(|name| name.to_string()).collect(),
        household_id: Some(household_id.to_string()),
        household_count,
        contact: String::new(),
        rsvp_status: RsvpStatus::Pending,
        notes: String::new(),
        additional_guests: 0,
        last_updated: None,
        role: GuestRole::Guest,
    }
}
