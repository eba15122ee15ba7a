//! Node check-in protocol.
//!
//! A check-in runs as a single write transaction:
//!
//! 1. look up the node by the digest of its presented secret,
//! 2. record a check-in row for it,
//! 3. resolve the node's active deployment and that deployment's config
//!    version.
//!
//! Authentication failures of every kind collapse into
//! [`CheckInError::Unauthorized`] and leave no row behind. Repeated check-ins
//! are never deduplicated; each call appends to the node's history.

use tracing::debug;

use crate::auth::{AuthError, SecretHash, parse_bearer_secret};
use crate::storage::{ActiveDeployment, DatabaseError, NewNodeCheckIn, NodeCheckIn, Store, Tx};

/// Result of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    pub check_in: NodeCheckIn,
    pub active: Option<ActiveDeployment>,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Authenticate the `Authorization` header value and check the node in.
pub async fn check_in_with_header(
    store: &Store,
    authorization: Option<&str>,
) -> Result<CheckIn, CheckInError> {
    let secret_hash = parse_bearer_secret(authorization)?;
    check_in(store, secret_hash).await
}

/// Check in the node owning `secret_hash`.
pub async fn check_in(store: &Store, secret_hash: SecretHash) -> Result<CheckIn, CheckInError> {
    store
        .write(move |tx| Box::pin(async move { record_check_in(tx, &secret_hash).await }))
        .await
}

/// The check-in steps, run inside a caller-provided write transaction.
pub async fn record_check_in(
    tx: &mut Tx,
    secret_hash: &SecretHash,
) -> Result<CheckIn, CheckInError> {
    let node = tx
        .get_node_by_secret_hash(secret_hash.as_bytes())
        .await
        .map_err(|e| match e {
            DatabaseError::NotFound(_) => CheckInError::Unauthorized(AuthError::UnknownNode),
            other => CheckInError::Database(other),
        })?;

    let check_in = tx
        .create_node_check_in(&NewNodeCheckIn::for_node(node.id))
        .await?;
    let active = tx.get_active_deployment_with_config(node.id).await?;

    debug!(
        node_id = node.id,
        check_in_id = check_in.id,
        deployment_id = active.as_ref().map(|a| a.deployment.id),
        "Node checked in"
    );

    Ok(CheckIn { check_in, active })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::NodeSecret;
    use crate::deployment::DeploymentStatus;
    use crate::storage::{NewConfigVersion, NewNode};

    async fn store_with_node() -> (Store, i64, NodeSecret) {
        let store = Store::open_in_memory().await.unwrap();
        let secret = NodeSecret::generate();
        let hash = secret.hash();
        let node_id = store
            .write(move |tx| {
                Box::pin(async move {
                    let site = tx.create_site("plant").await?;
                    let node = tx
                        .create_node(NewNode {
                            hostname: "ahu-1",
                            site_id: site.id,
                            secret_hash: hash.as_bytes(),
                        })
                        .await?;
                    Ok::<_, DatabaseError>(node.id)
                })
            })
            .await
            .unwrap();
        (store, node_id, secret)
    }

    async fn check_in_count(store: &Store, node_id: i64) -> i64 {
        store
            .read(move |tx| Box::pin(async move { tx.count_node_check_ins(node_id).await }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn check_in_without_deployment_records_row() {
        let (store, node_id, secret) = store_with_node().await;
        let header = format!("Bearer {}", secret.to_token());

        let result = check_in_with_header(&store, Some(&header)).await.unwrap();
        assert_eq!(result.check_in.node_id, node_id);
        assert!(result.active.is_none());
        assert_eq!(check_in_count(&store, node_id).await, 1);

        let again = check_in(&store, secret.hash()).await.unwrap();
        assert!(again.check_in.id > result.check_in.id);
        assert_eq!(check_in_count(&store, node_id).await, 2);
    }

    #[tokio::test]
    async fn check_in_returns_active_deployment_and_payload() {
        let (store, node_id, secret) = store_with_node().await;
        let deployment_id = store
            .write(move |tx| {
                Box::pin(async move {
                    let cv = tx
                        .create_config_version(NewConfigVersion {
                            node_id,
                            description: None,
                            payload: &[0xDE, 0xAD],
                        })
                        .await?;
                    let d = tx.create_deployment(cv.id, DeploymentStatus::Pending).await?;
                    Ok::<_, DatabaseError>(d.id)
                })
            })
            .await
            .unwrap();

        let result = check_in(&store, secret.hash()).await.unwrap();
        let active = result.active.unwrap();
        assert_eq!(active.deployment.id, deployment_id);
        assert_eq!(active.deployment.status, DeploymentStatus::Pending);
        assert_eq!(active.config_version.payload_size, 2);

        let cv_id = active.config_version.id;
        let payload = store
            .read(move |tx| Box::pin(async move { tx.get_config_version_payload(cv_id).await }))
            .await
            .unwrap();
        assert_eq!(payload, vec![0xDE, 0xAD]);
    }

    #[tokio::test]
    async fn unknown_secret_is_unauthorized_and_writes_nothing() {
        let (store, node_id, _secret) = store_with_node().await;
        let stranger = NodeSecret::generate();
        let header = format!("Bearer {}", stranger.to_token());

        let err = check_in_with_header(&store, Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckInError::Unauthorized(AuthError::UnknownNode)
        ));

        for bad in [None, Some("Basic abc"), Some("Bearer "), Some("Bearer !!!")] {
            let err = check_in_with_header(&store, bad).await.unwrap_err();
            assert!(matches!(err, CheckInError::Unauthorized(_)), "{bad:?}");
        }
        assert_eq!(check_in_count(&store, node_id).await, 0);
    }
}
