use url::Url;

use crate::domain::entities::GuestRecord;

// Invite link plus the ready-to-paste share message for one household.
#[derive(Clone, Debug)]
pub struct ShareContent {
    pub link: String,
    pub message: String,
}

// Public invite link carrying the code as a query parameter.
pub fn invite_link(origin: &Url, code: &str) -> String {
    let mut link = origin.clone();
    link.set_path("/");
    link.set_fragment(None);
    link.query_pairs_mut()
        .clear()
        .append_pair("code", &code.to_uppercase());
    link.to_string()
}

pub fn share_content(origin: &Url, event_title: &str, guest: &GuestRecord) -> ShareContent {
    let link = invite_link(origin, &guest.code);
    let message = format!(
        "Dear {},\nYou are warmly invited to {}. Use your invite code {} to unlock the experience: {}",
        guest.primary_guest(),
        event_title,
        guest.code.to_uppercase(),
        link
    );

    ShareContent { link, message }
}
