//! Venue domain model.
//!
//! # Responsibility
//! - Define the canonical venue record with owner, content and visibility.
//! - Provide helpers for attendance counting and visibility checks.
//!
//! # Invariants
//! - `id` is stable and never reused for another venue.
//! - `owner` never changes after creation.
//! - `rsvps` contains at most one entry per user identifier.

use crate::model::identity::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for every venue record.
pub type VenueId = Uuid;

/// Maximum accepted title length, in characters.
pub const MAX_TITLE_CHARS: usize = 100;
/// Maximum accepted description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Point location of a venue.
///
/// Coordinates are intended to fall in `[0, 1]` (normalized map space) but
/// that range is not enforced anywhere; callers own the interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

/// Attendance response a user can record for a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rsvp {
    Yes,
    No,
    Maybe,
}

impl Rsvp {
    /// Stable wire/storage string for this response.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Maybe => "maybe",
        }
    }

    /// Parses a wire string into a response.
    ///
    /// Returns `None` for anything outside `yes|no|maybe`; the method layer
    /// maps that to its own invalid-input error.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "maybe" => Some(Self::Maybe),
            _ => None,
        }
    }
}

/// One user's recorded response within a venue's rsvp sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpEntry {
    pub user: UserId,
    pub response: Rsvp,
}

/// Canonical venue record.
///
/// `invited` is meaningful only when `is_public` is false. `rsvps` keeps
/// insertion order; updating an existing response preserves its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Stable global ID assigned at creation.
    pub id: VenueId,
    /// Creating user; immutable for the venue lifetime.
    pub owner: UserId,
    pub location: GeoPoint,
    pub title: String,
    pub description: String,
    /// Fixed at creation; no operation updates it.
    pub is_public: bool,
    /// Users granted visibility of a private venue.
    pub invited: BTreeSet<UserId>,
    /// Attendance responses in insertion order, one entry per user.
    pub rsvps: Vec<RsvpEntry>,
}

impl Venue {
    /// Creates a new venue with a generated stable ID and empty invite and
    /// rsvp state.
    pub fn new(
        owner: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        location: GeoPoint,
        is_public: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            location,
            title: title.into(),
            description: description.into(),
            is_public,
            invited: BTreeSet::new(),
            rsvps: Vec::new(),
        }
    }

    /// Number of "yes" responses currently recorded.
    pub fn attending(&self) -> usize {
        self.rsvps
            .iter()
            .filter(|entry| entry.response == Rsvp::Yes)
            .count()
    }

    /// Returns this user's recorded response, if any.
    pub fn rsvp_of(&self, user: &UserId) -> Option<Rsvp> {
        self.rsvps
            .iter()
            .find(|entry| entry.user == *user)
            .map(|entry| entry.response)
    }

    /// Whether the given user may see (and respond to) this venue.
    ///
    /// Public venues are visible to everyone, including anonymous readers.
    /// Private venues are visible to the owner and invited users only.
    pub fn is_visible_to(&self, user: Option<&UserId>) -> bool {
        if self.is_public {
            return true;
        }
        match user {
            Some(id) => self.owner == *id || self.invited.contains(id),
            None => false,
        }
    }
}
