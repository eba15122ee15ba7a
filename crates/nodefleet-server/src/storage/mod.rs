//! `SQLite` storage for the nodefleet control plane.
//!
//! Five tables: sites, nodes, config versions, deployments and node
//! check-ins. Parent links cascade on delete at the engine level, so a delete
//! never fans out by hand.

mod db;
mod models;
mod queries_check_ins;
mod queries_config_versions;
mod queries_deployments;
mod queries_nodes;
mod queries_sites;


pub use db::{DatabaseError, Store, Tx, TxFuture, TxMode};
pub use models::*;
