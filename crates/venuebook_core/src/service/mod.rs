//! Guarded method surface over the venue store.
//!
//! # Responsibility
//! - Orchestrate repository calls into the externally callable operations.
//! - Own the request-time error taxonomy surfaced to callers.

pub mod venue_service;
