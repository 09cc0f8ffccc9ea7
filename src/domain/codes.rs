use std::collections::HashSet;

use crate::domain::entities::GuestRecord;

// Prefix used when neither guest name contributes any letters.
pub const DEFAULT_CODE_PREFIX: &str = "GUES";

// Pick an invite code for a household. A preferred code wins verbatim
// (upper-cased) when unused; otherwise the code is a four-letter prefix from
// the primary name plus a four-digit counter advanced past collisions.
// `exclude_code` frees a guest's current code while editing that guest.
pub fn compute_invite_code(
    existing: &[GuestRecord],
    primary_name: &str,
    partner_name: &str,
    preferred_code: Option<&str>,
    exclude_code: Option<&str>,
) -> String {
    let mut used: HashSet<String> = existing
        .iter()
        .filter(|guest| !guest.code.is_empty())
        .map(|guest| guest.code.to_uppercase())
        .collect();
    if let Some(exclude) = exclude_code {
        used.remove(&exclude.to_uppercase());
    }

    if let Some(preferred) = preferred_code {
        let candidate = preferred.trim().to_uppercase();
        if !candidate.is_empty() && !used.contains(&candidate) {
            return candidate;
        }
    }

    let prefix = code_prefix(primary_name, partner_name);

    // Seed the counter from the registry size so fresh codes grow with it.
    let mut counter = existing.len() + 1;
    let mut candidate = format!("{}{:04}", prefix, counter);
    while used.contains(&candidate) {
        counter += 1;
        candidate = format!("{}{:04}", prefix, counter);
    }

    candidate
}

// Next free household id: highest `H<digits>` suffix plus one, zero-padded.
pub fn next_household_id(existing: &[GuestRecord]) -> String {
    let highest = existing
        .iter()
        .filter_map(|guest| guest.household_id.as_deref())
        .filter_map(parse_household_number)
        .max()
        .unwrap_or(0);

    format!("H{:03}", highest + 1)
}

fn code_prefix(primary_name: &str, partner_name: &str) -> String {
    let primary_letters = letters_only(primary_name);
    let base = if primary_letters.is_empty() {
        letters_only(partner_name)
    } else {
        primary_letters
    };
    let base = if base.is_empty() {
        DEFAULT_CODE_PREFIX.to_string()
    } else {
        base
    };

    let mut prefix: String = base.chars().take(4).collect();
    while prefix.len() < 4 {
        prefix.push('A');
    }
    prefix
}

fn letters_only(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// First `H` (either case) followed by digits, anywhere in the id.
fn parse_household_number(value: &str) -> Option<u64> {
    let chars: Vec<char> = value.chars().collect();
    for (index, c) in chars.iter().enumerate() {
        if !c.eq_ignore_ascii_case(&'h') {
            continue;
        }
        let digits: String = chars[index + 1..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return digits.parse().ok();
        }
    }
    None
}
