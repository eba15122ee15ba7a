//! nodefleet control plane.
//!
//! Keeps the inventory of sites and the nodes installed at them, the
//! configuration versions authored for each node, and deployments that roll
//! a configuration version out. Nodes authenticate with a per-node secret
//! and check in periodically to learn which configuration they should run.

pub mod api;
pub mod auth;
pub mod checkin;
pub mod config;
pub mod deployment;
pub mod pagination;
pub mod storage;
