//! Deployment queries.

use nodefleet_core::db::unix_timestamp;

use super::db::{DatabaseError, Tx};
use super::models::{ActiveDeployment, Deployment, DeploymentFilter};
use crate::deployment::DeploymentStatus;

impl Tx {
    /// Create a deployment of a config version in `status`.
    ///
    /// Callers resolve the status through
    /// [`status_for_create`](crate::deployment::status_for_create).
    pub async fn create_deployment(
        &mut self,
        config_version_id: i64,
        status: DeploymentStatus,
    ) -> Result<Deployment, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO deployments (config_version_id, status, start_time, finished_time) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(config_version_id)
        .bind(status.as_str())
        .bind(now)
        .bind(status.finished_time_at(now))
        .execute(self.writer("create_deployment")?)
        .await?;

        self.get_deployment(result.last_insert_rowid()).await
    }

    /// Get a deployment by ID.
    pub async fn get_deployment(&mut self, id: i64) -> Result<Deployment, DatabaseError> {
        sqlx::query_as::<_, Deployment>("SELECT * FROM deployments WHERE id = ?")
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Deployment {id}")))
    }

    /// List deployments with `id > after_id` matching `filter`.
    pub async fn list_deployments(
        &mut self,
        filter: DeploymentFilter,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Deployment>, DatabaseError> {
        let deployments = match filter {
            DeploymentFilter::All => {
                sqlx::query_as::<_, Deployment>(
                    "SELECT * FROM deployments WHERE id > ? ORDER BY id LIMIT ?",
                )
                .bind(after_id)
                .bind(limit)
                .fetch_all(self.conn())
                .await?
            }
            DeploymentFilter::ConfigVersion(config_version_id) => {
                sqlx::query_as::<_, Deployment>(
                    "SELECT * FROM deployments WHERE config_version_id = ? AND id > ? \
                     ORDER BY id LIMIT ?",
                )
                .bind(config_version_id)
                .bind(after_id)
                .bind(limit)
                .fetch_all(self.conn())
                .await?
            }
            DeploymentFilter::Node(node_id) => {
                sqlx::query_as::<_, Deployment>(
                    "SELECT d.* FROM deployments d \
                     JOIN config_versions cv ON cv.id = d.config_version_id \
                     WHERE cv.node_id = ? AND d.id > ? ORDER BY d.id LIMIT ?",
                )
                .bind(node_id)
                .bind(after_id)
                .bind(limit)
                .fetch_all(self.conn())
                .await?
            }
        };

        Ok(deployments)
    }

    /// Set a deployment's status.
    ///
    /// Any status is accepted. Terminal statuses stamp `finished_time` with
    /// the current time (replacing an earlier stamp); active statuses clear
    /// it. `start_time` is never touched.
    pub async fn update_deployment_status(
        &mut self,
        id: i64,
        status: DeploymentStatus,
    ) -> Result<Deployment, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query("UPDATE deployments SET status = ?, finished_time = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(status.finished_time_at(now))
            .bind(id)
            .execute(self.writer("update_deployment_status")?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Deployment {id}")));
        }
        self.get_deployment(id).await
    }

    /// Delete a deployment. Returns affected rows.
    pub async fn delete_deployment(&mut self, id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM deployments WHERE id = ?")
            .bind(id)
            .execute(self.writer("delete_deployment")?)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count deployments matching `filter`.
    pub async fn count_deployments(
        &mut self,
        filter: DeploymentFilter,
    ) -> Result<i64, DatabaseError> {
        let count: i64 = match filter {
            DeploymentFilter::All => {
                sqlx::query_scalar("SELECT COUNT(*) FROM deployments")
                    .fetch_one(self.conn())
                    .await?
            }
            DeploymentFilter::ConfigVersion(config_version_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM deployments WHERE config_version_id = ?")
                    .bind(config_version_id)
                    .fetch_one(self.conn())
                    .await?
            }
            DeploymentFilter::Node(node_id) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM deployments d \
                     JOIN config_versions cv ON cv.id = d.config_version_id \
                     WHERE cv.node_id = ?",
                )
                .bind(node_id)
                .fetch_one(self.conn())
                .await?
            }
        };

        Ok(count)
    }

    /// The node's most recently created deployment that is still active
    /// (see [`DeploymentStatus::is_active`]), if any.
    pub async fn get_active_deployment_for_node(
        &mut self,
        node_id: i64,
    ) -> Result<Option<Deployment>, DatabaseError> {
        let active: Vec<&'static str> = DeploymentStatus::active()
            .map(DeploymentStatus::as_str)
            .collect();
        let placeholders = vec!["?"; active.len()].join(", ");
        let sql = format!(
            "SELECT d.* FROM deployments d \
             JOIN config_versions cv ON cv.id = d.config_version_id \
             WHERE cv.node_id = ? AND d.status IN ({placeholders}) \
             ORDER BY d.id DESC LIMIT 1"
        );

        let mut query = sqlx::query_as::<_, Deployment>(&sql).bind(node_id);
        for status in active {
            query = query.bind(status);
        }
        let deployment = query.fetch_optional(self.conn()).await?;

        Ok(deployment)
    }

    /// [`get_active_deployment_for_node`](Self::get_active_deployment_for_node)
    /// together with the config version the deployment installs.
    pub async fn get_active_deployment_with_config(
        &mut self,
        node_id: i64,
    ) -> Result<Option<ActiveDeployment>, DatabaseError> {
        let Some(deployment) = self.get_active_deployment_for_node(node_id).await? else {
            return Ok(None);
        };
        let config_version = self.get_config_version(deployment.config_version_id).await?;

        Ok(Some(ActiveDeployment {
            deployment,
            config_version,
        }))
    }
}
