//! Write-authorization policy for the venue store.
//!
//! # Responsibility
//! - Hold the allow-list of externally writable venue fields as data.
//! - Answer insert/update/remove permission questions for a caller.
//!
//! # Invariants
//! - Raw inserts are never permitted; creation flows through the create
//!   method, which validates content the raw path would not.
//! - The allow-list is the single source of truth for the generic update
//!   surface; no other code decides field writability.

use crate::model::identity::UserId;
use crate::model::venue::Venue;

/// Venue fields writable through the generic update path, by wire name.
///
/// Everything else, `owner` and `is_public` included, is immutable from the
/// outside once the venue exists.
pub const WRITABLE_VENUE_FIELDS: &[&str] = &["title", "description", "x", "y"];

/// Returns whether the named field is on the writable allow-list.
pub fn is_writable_field(name: &str) -> bool {
    WRITABLE_VENUE_FIELDS.contains(&name)
}

/// Raw inserts into the store are always rejected.
pub fn can_insert() -> bool {
    false
}

/// Whether `caller` may apply a generic field update to `venue`.
///
/// Requires ownership and that every requested field name is on the
/// allow-list. The value itself is deliberately not validated here; the
/// generic path is permissive by design, unlike creation.
pub fn can_update<S: AsRef<str>>(caller: Option<&UserId>, venue: &Venue, fields: &[S]) -> bool {
    let Some(user) = caller else {
        return false;
    };
    if *user != venue.owner {
        return false;
    }
    fields.iter().all(|name| is_writable_field(name.as_ref()))
}

/// Whether `caller` may remove `venue`.
///
/// Only the owner may remove a venue, and only while nobody has said yes.
pub fn can_remove(caller: Option<&UserId>, venue: &Venue) -> bool {
    match caller {
        Some(user) => *user == venue.owner && venue.attending() == 0,
        None => false,
    }
}
