//! Core domain logic for Venuebook.
//! This crate is the single source of truth for venue/RSVP business
//! invariants: who may see, change, respond to and remove a venue.

pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod policy;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::identity::{Caller, UserId};
pub use model::venue::{
    GeoPoint, Rsvp, RsvpEntry, Venue, VenueId, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS,
};
pub use notify::{EmailMessage, InviteEmailConfig, LogMailer, Mailer, MailerError, NullMailer};
pub use repo::contact_repo::{ContactDirectory, SqliteContactDirectory};
pub use repo::venue_repo::{
    FieldUpdate, FieldValue, RepoError, RepoResult, SqliteVenueRepository, VenueListQuery,
    VenueRepository,
};
pub use service::venue_service::{
    CreateVenueRequest, MethodError, MethodResult, VenueService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
