//! Persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide the venue store and contact directory over SQLite.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Guarded mutations re-verify authorization predicates inside the SQL
//!   statement itself, never trusting a prior read.

pub mod contact_repo;
pub mod venue_repo;
