//! Domain model for venues and attendance responses.
//!
//! # Responsibility
//! - Define the canonical venue record and its identity types.
//! - Keep content limits and visibility rules in one place.
//!
//! # Invariants
//! - Every venue is identified by a stable `VenueId`.
//! - `rsvps` holds at most one entry per user; storage enforces the key.

pub mod identity;
pub mod venue;
