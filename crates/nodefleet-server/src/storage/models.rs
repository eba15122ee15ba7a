//! Row types for nodefleet storage.
//!
//! Timestamps are Unix seconds assigned by the store at write time.

use crate::deployment::DeploymentStatus;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub create_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Node {
    pub id: i64,
    pub hostname: String,
    pub site_id: i64,
    /// SHA-256 of the node secret. The secret itself is never stored.
    pub secret_hash: Vec<u8>,
    pub create_time: i64,
}

/// Config version metadata. The payload bytes are read separately through
/// [`Tx::get_config_version_payload`](super::Tx::get_config_version_payload).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ConfigVersion {
    pub id: i64,
    pub node_id: i64,
    pub description: Option<String>,
    /// Payload length in bytes.
    pub payload_size: i64,
    pub create_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Deployment {
    pub id: i64,
    pub config_version_id: i64,
    #[sqlx(try_from = "String")]
    pub status: DeploymentStatus,
    pub start_time: i64,
    /// Set iff `status` is terminal.
    pub finished_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct NodeCheckIn {
    pub id: i64,
    pub node_id: i64,
    pub check_in_time: i64,
    pub current_deployment_id: Option<i64>,
    pub installing_deployment_id: Option<i64>,
    pub installing_deployment_error: Option<String>,
    pub installing_deployment_attempts: Option<i64>,
}

/// A node's active deployment together with the config version it installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDeployment {
    pub deployment: Deployment,
    pub config_version: ConfigVersion,
}

/// Parameters for [`Tx::create_node`](super::Tx::create_node).
#[derive(Debug, Clone, Copy)]
pub struct NewNode<'a> {
    pub hostname: &'a str,
    pub site_id: i64,
    pub secret_hash: &'a [u8],
}

/// Parameters for [`Tx::update_node`](super::Tx::update_node).
///
/// `site_id: None` keeps the node at its current site.
#[derive(Debug, Clone, Copy)]
pub struct NodeUpdate<'a> {
    pub hostname: &'a str,
    pub site_id: Option<i64>,
}

/// Parameters for [`Tx::create_config_version`](super::Tx::create_config_version).
#[derive(Debug, Clone, Copy)]
pub struct NewConfigVersion<'a> {
    pub node_id: i64,
    pub description: Option<&'a str>,
    pub payload: &'a [u8],
}

/// Parameters for [`Tx::create_node_check_in`](super::Tx::create_node_check_in).
///
/// Only `node_id` is required; the install-reporting fields are optional.
#[derive(Debug, Clone, Default)]
pub struct NewNodeCheckIn {
    pub node_id: i64,
    pub current_deployment_id: Option<i64>,
    pub installing_deployment_id: Option<i64>,
    pub installing_deployment_error: Option<String>,
    pub installing_deployment_attempts: Option<i64>,
}

impl NewNodeCheckIn {
    pub fn for_node(node_id: i64) -> Self {
        Self {
            node_id,
            ..Self::default()
        }
    }
}

/// Filter for deployment listing and counting.
///
/// Exactly one filter applies; node and config version filters are never
/// intersected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentFilter {
    #[default]
    All,
    /// Deployments whose config version belongs to this node.
    Node(i64),
    ConfigVersion(i64),
}
