//! `nodefleet` Core Library
//!
//! Shared functionality for `nodefleet` components:
//! - `SQLite` pool creation (file-backed and in-memory)
//! - Database error classification
//! - Tracing/logging initialisation

pub mod db;
pub mod tracing_init;

pub use db::{DatabaseError, unix_timestamp};
