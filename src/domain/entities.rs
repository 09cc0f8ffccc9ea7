use serde::{Deserialize, Serialize};
use serde_json::Value;

// RSVP state for an invited household.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Pending,
    Confirmed,
    Declined,
}

impl Default for RsvpStatus {
    fn default() -> Self {
        RsvpStatus::Pending
    }
}

impl RsvpStatus {
    // Parse the lowercase wire name; None for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RsvpStatus::Pending),
            "confirmed" => Some(RsvpStatus::Confirmed),
            "declined" => Some(RsvpStatus::Declined),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Pending => "pending",
            RsvpStatus::Confirmed => "confirmed",
            RsvpStatus::Declined => "declined",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestRole {
    Guest,
    Admin,
}

impl Default for GuestRole {
    fn default() -> Self {
        GuestRole::Guest
    }
}

// One invited household, keyed by its invite code.
// Store documents may omit fields; defaults keep partial records loadable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuestRecord {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub guest_names: Vec<String>,
    #[serde(default)]
    pub household_id: Option<String>,
    #[serde(default)]
    pub household_count: u32,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub rsvp_status: RsvpStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub additional_guests: u32,
    #[serde(default)]
    pub last_updated: Option<u64>,
    #[serde(default)]
    pub role: GuestRole,
}

impl GuestRecord {
    // First name in the list is the primary contact for the household.
    pub fn primary_guest(&self) -> &str {
        self.guest_names.first().map(String::as_str).unwrap_or("")
    }

    pub fn partner_name(&self) -> Option<&str> {
        self.guest_names.get(1).map(String::as_str)
    }
}

// Partial update applied to a guest document. Absent fields stay untouched.
#[derive(Clone, Debug, Default)]
pub struct GuestPatch {
    pub rsvp_status: Option<RsvpStatus>,
    pub notes: Option<String>,
    pub contact: Option<String>,
    pub additional_guests: Option<u32>,
    pub last_updated: Option<u64>,
}

impl GuestPatch {
    pub fn apply(&self, record: &mut GuestRecord) {
        if let Some(status) = self.rsvp_status {
            record.rsvp_status = status;
        }
        if let Some(notes) = &self.notes {
            record.notes = notes.clone();
        }
        if let Some(contact) = &self.contact {
            record.contact = contact.clone();
        }
        if let Some(additional) = self.additional_guests {
            record.additional_guests = additional;
        }
        if let Some(stamp) = self.last_updated {
            record.last_updated = Some(stamp);
        }
    }
}

// Active guest session persisted between visits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuestSession {
    pub invite_code: String,
    pub guest: GuestRecord,
}

// Message left on the public guestbook wall.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuestbookEntry {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub author: Option<String>,
    pub created_at: u64,
}

// Guest-submitted prediction with a like tally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub likes: u32,
    pub created_at: u64,
}

// Best-effort record of an admin action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub meta: Value,
    pub created_at: u64,
}

// Admin session record held in memory against its token.
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub expires_at: u64,
}
