//! Domain model for stored chart rankings.
//!
//! # Responsibility
//! - Define canonical data structures used by fetch, storage and service.
//!
//! # Invariants
//! - Entries are immutable once fetched; a new day produces new rows.

pub mod chart_entry;
