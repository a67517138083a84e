//! Venue method surface: create, invite, rsvp, field update, delete, reads.
//!
//! # Responsibility
//! - Validate requests and map refusals to the (code, message) error pairs
//!   callers observe.
//! - Trigger the best-effort invite notification on actual state changes.
//!
//! # Invariants
//! - Validation order inside each method is observable behavior and must
//!   not be reordered (an unauthenticated create with a missing title
//!   reports the missing parameter, not the auth failure).
//! - Authorization is decided by the policy table plus the repository's
//!   in-statement guards; this layer never invents its own field rules.
//! - Notification failures are logged and swallowed, never surfaced.

use crate::model::identity::{Caller, UserId};
use crate::model::venue::{
    GeoPoint, Rsvp, Venue, VenueId, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS,
};
use crate::notify::{invite_email, InviteEmailConfig, Mailer};
use crate::policy;
use crate::repo::contact_repo::ContactDirectory;
use crate::repo::venue_repo::{FieldUpdate, RepoError, VenueListQuery, VenueRepository};
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_REQUIRED_PARAMETER: &str = "Required parameter missing";
pub const MSG_TITLE_TOO_LONG: &str = "Title too long";
pub const MSG_DESCRIPTION_TOO_LONG: &str = "Description too long";
pub const MSG_LOGIN_REQUIRED: &str = "You must be logged in";
pub const MSG_LOGIN_REQUIRED_RSVP: &str = "You must be logged in to RSVP";
pub const MSG_INVALID_RSVP: &str = "Invalid RSVP";
pub const MSG_NO_SUCH_VENUE: &str = "No such venue";
pub const MSG_VENUE_IS_PUBLIC: &str = "That venue is public. No need to invite people.";
pub const MSG_ACCESS_DENIED: &str = "Access denied";

pub type MethodResult<T> = Result<T, MethodError>;

/// Request-time error surfaced to callers as a (numeric code, message) pair.
///
/// The first four variants are expected, caller-recoverable refusals; the
/// `Storage` variant carries infrastructure faults and is never used for
/// request validation.
#[derive(Debug)]
pub enum MethodError {
    BadRequest(&'static str),
    Forbidden(&'static str),
    NotFound(&'static str),
    PayloadTooLarge(&'static str),
    Storage(RepoError),
}

impl MethodError {
    /// Numeric code reported alongside the message.
    pub fn code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::Storage(_) => 500,
        }
    }
}

impl Display for MethodError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::PayloadTooLarge(message) => write!(f, "{} {message}", self.code()),
            Self::Storage(err) => write!(f, "500 {err}"),
        }
    }
}

impl Error for MethodError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MethodError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Inputs for venue creation.
///
/// `title` and `description` stay optional so "parameter missing" remains
/// representable after transport decoding; the method folds missing and
/// empty into the same refusal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateVenueRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: GeoPoint,
    pub is_public: bool,
}

/// Use-case service exposing the guarded venue operations.
pub struct VenueService<R, D, M>
where
    R: VenueRepository,
    D: ContactDirectory,
    M: Mailer,
{
    repo: R,
    directory: D,
    mailer: M,
    email_config: InviteEmailConfig,
}

impl<R, D, M> VenueService<R, D, M>
where
    R: VenueRepository,
    D: ContactDirectory,
    M: Mailer,
{
    pub fn new(repo: R, directory: D, mailer: M) -> Self {
        Self {
            repo,
            directory,
            mailer,
            email_config: InviteEmailConfig::default(),
        }
    }

    /// Replaces the invite-email sender/link configuration.
    pub fn with_email_config(mut self, email_config: InviteEmailConfig) -> Self {
        self.email_config = email_config;
        self
    }

    /// Creates a venue owned by the caller and returns its fresh id.
    ///
    /// Checks run in a fixed order: required parameters, title length,
    /// description length, then authentication. Lengths are counted in
    /// characters; 100/1000 succeed, 101/1001 fail.
    pub fn create_venue(
        &self,
        caller: &Caller,
        request: &CreateVenueRequest,
    ) -> MethodResult<VenueId> {
        let title = request.title.as_deref().unwrap_or("");
        let description = request.description.as_deref().unwrap_or("");

        if title.is_empty() || description.is_empty() {
            return Err(MethodError::BadRequest(MSG_REQUIRED_PARAMETER));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(MethodError::PayloadTooLarge(MSG_TITLE_TOO_LONG));
        }
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(MethodError::PayloadTooLarge(MSG_DESCRIPTION_TOO_LONG));
        }
        let Some(owner) = caller.user_id() else {
            return Err(MethodError::Forbidden(MSG_LOGIN_REQUIRED));
        };

        let venue = Venue::new(owner, title, description, request.location, request.is_public);
        let id = self.repo.create_venue(&venue)?;
        Ok(id)
    }

    /// Invites `target` to a private venue owned by the caller.
    ///
    /// Idempotent set-add: repeats change nothing and send nothing. A venue
    /// that is missing or not owned by the caller answers with the same
    /// not-found refusal, so callers cannot probe which venues exist.
    pub fn invite(&self, caller: &Caller, venue_id: VenueId, target: &UserId) -> MethodResult<()> {
        let Some(venue) = self.repo.get_venue(venue_id)? else {
            return Err(MethodError::NotFound(MSG_NO_SUCH_VENUE));
        };
        let Some(inviter) = caller.user_id().filter(|id| *id == venue.owner) else {
            return Err(MethodError::NotFound(MSG_NO_SUCH_VENUE));
        };
        if venue.is_public {
            return Err(MethodError::BadRequest(MSG_VENUE_IS_PUBLIC));
        }

        let added = self.repo.add_invite(venue_id, target, &inviter)?;
        if added {
            self.notify_invited(&venue, &inviter, target);
        }
        Ok(())
    }

    /// Records the caller's attendance response for a venue.
    ///
    /// Upsert keyed by caller identity: an existing entry changes its
    /// response in place and keeps its position; otherwise one entry is
    /// appended. Private venues answer not-found to outsiders, hiding
    /// their existence.
    pub fn rsvp(&self, caller: &Caller, venue_id: VenueId, response: &str) -> MethodResult<()> {
        let Some(user) = caller.user_id() else {
            return Err(MethodError::Forbidden(MSG_LOGIN_REQUIRED_RSVP));
        };
        let Some(response) = Rsvp::parse(response) else {
            return Err(MethodError::BadRequest(MSG_INVALID_RSVP));
        };
        let Some(venue) = self.repo.get_venue(venue_id)? else {
            return Err(MethodError::NotFound(MSG_NO_SUCH_VENUE));
        };
        if !venue.is_visible_to(Some(&user)) {
            return Err(MethodError::NotFound(MSG_NO_SUCH_VENUE));
        }

        // The repository re-checks visibility inside the write statement;
        // zero rows means the venue vanished or turned invisible since the
        // read above.
        let applied = self.repo.upsert_rsvp(venue_id, &user, response)?;
        if !applied {
            return Err(MethodError::NotFound(MSG_NO_SUCH_VENUE));
        }
        Ok(())
    }

    /// Applies a generic field update to a venue owned by the caller.
    ///
    /// Writable fields are exactly the policy allow-list; anything else is
    /// refused even for the owner. Values are deliberately not validated on
    /// this path, unlike creation.
    pub fn update_venue_fields(
        &self,
        caller: &Caller,
        venue_id: VenueId,
        updates: &[FieldUpdate],
    ) -> MethodResult<()> {
        let Some(venue) = self.repo.get_venue(venue_id)? else {
            return Err(MethodError::NotFound(MSG_NO_SUCH_VENUE));
        };
        let Some(user) = caller.user_id() else {
            return Err(MethodError::Forbidden(MSG_ACCESS_DENIED));
        };
        let names: Vec<&str> = updates.iter().map(|update| update.name.as_str()).collect();
        if !policy::can_update(Some(&user), &venue, &names) {
            return Err(MethodError::Forbidden(MSG_ACCESS_DENIED));
        }

        let changed = self.repo.update_fields(venue_id, &user, updates)?;
        if !changed {
            return Err(self.refusal_after_lost_write(venue_id)?);
        }
        Ok(())
    }

    /// Deletes a venue owned by the caller, unless anyone is attending.
    pub fn delete_venue(&self, caller: &Caller, venue_id: VenueId) -> MethodResult<()> {
        let Some(venue) = self.repo.get_venue(venue_id)? else {
            return Err(MethodError::NotFound(MSG_NO_SUCH_VENUE));
        };
        let Some(user) = caller.user_id() else {
            return Err(MethodError::Forbidden(MSG_ACCESS_DENIED));
        };
        if !policy::can_remove(Some(&user), &venue) {
            return Err(MethodError::Forbidden(MSG_ACCESS_DENIED));
        }

        let removed = self.repo.delete_venue(venue_id, &user)?;
        if !removed {
            return Err(self.refusal_after_lost_write(venue_id)?);
        }
        Ok(())
    }

    /// Fetches one venue. Reads are unrestricted.
    pub fn get_venue(&self, venue_id: VenueId) -> MethodResult<Option<Venue>> {
        Ok(self.repo.get_venue(venue_id)?)
    }

    /// Lists venues. Reads are unrestricted.
    pub fn list_venues(&self, query: &VenueListQuery) -> MethodResult<Vec<Venue>> {
        Ok(self.repo.list_venues(query)?)
    }

    /// Classifies a guarded write that matched zero rows after its
    /// precondition read passed: the venue either vanished or its state
    /// moved so the guard no longer holds.
    fn refusal_after_lost_write(&self, venue_id: VenueId) -> MethodResult<MethodError> {
        match self.repo.get_venue(venue_id)? {
            None => Ok(MethodError::NotFound(MSG_NO_SUCH_VENUE)),
            Some(_) => Ok(MethodError::Forbidden(MSG_ACCESS_DENIED)),
        }
    }

    fn notify_invited(&self, venue: &Venue, inviter: &UserId, target: &UserId) {
        let to = match self.directory.contact_email(target) {
            Ok(Some(email)) => email,
            Ok(None) => return,
            Err(err) => {
                warn!(
                    "event=invite_email module=service status=skipped venue_id={} error={err}",
                    venue.id
                );
                return;
            }
        };
        let reply_to = match self.directory.contact_email(inviter) {
            Ok(email) => email,
            Err(err) => {
                warn!(
                    "event=invite_email module=service status=degraded venue_id={} error={err}",
                    venue.id
                );
                None
            }
        };

        let message = invite_email(&self.email_config, &venue.title, to, reply_to);
        if let Err(err) = self.mailer.send(&message) {
            warn!(
                "event=invite_email module=service status=error venue_id={} error={err}",
                venue.id
            );
        }
    }
}
