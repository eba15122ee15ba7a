//! Config version queries. Config versions are immutable once created.

use nodefleet_core::db::unix_timestamp;

use super::db::{DatabaseError, Tx};
use super::models::{ConfigVersion, NewConfigVersion};

impl Tx {
    /// Store a new config version for a node.
    pub async fn create_config_version(
        &mut self,
        params: NewConfigVersion<'_>,
    ) -> Result<ConfigVersion, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO config_versions (node_id, description, payload, create_time) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(params.node_id)
        .bind(params.description)
        .bind(params.payload)
        .bind(now)
        .execute(self.writer("create_config_version")?)
        .await?;

        self.get_config_version(result.last_insert_rowid()).await
    }

    /// Get a config version's metadata.
    pub async fn get_config_version(&mut self, id: i64) -> Result<ConfigVersion, DatabaseError> {
        sqlx::query_as::<_, ConfigVersion>(
            "SELECT id, node_id, description, length(payload) AS payload_size, create_time \
             FROM config_versions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.conn())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("ConfigVersion {id}")))
    }

    /// Get a config version's payload bytes.
    pub async fn get_config_version_payload(&mut self, id: i64) -> Result<Vec<u8>, DatabaseError> {
        sqlx::query_scalar::<_, Vec<u8>>("SELECT payload FROM config_versions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("ConfigVersion {id}")))
    }

    /// List config versions with `id > after_id`, optionally for one node.
    pub async fn list_config_versions(
        &mut self,
        node_id: Option<i64>,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ConfigVersion>, DatabaseError> {
        let versions = if let Some(node_id) = node_id {
            sqlx::query_as::<_, ConfigVersion>(
                "SELECT id, node_id, description, length(payload) AS payload_size, create_time \
                 FROM config_versions WHERE node_id = ? AND id > ? ORDER BY id LIMIT ?",
            )
            .bind(node_id)
            .bind(after_id)
            .bind(limit)
            .fetch_all(self.conn())
            .await?
        } else {
            sqlx::query_as::<_, ConfigVersion>(
                "SELECT id, node_id, description, length(payload) AS payload_size, create_time \
                 FROM config_versions WHERE id > ? ORDER BY id LIMIT ?",
            )
            .bind(after_id)
            .bind(limit)
            .fetch_all(self.conn())
            .await?
        };

        Ok(versions)
    }

    /// Delete a config version and its deployments. Returns affected rows.
    pub async fn delete_config_version(&mut self, id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM config_versions WHERE id = ?")
            .bind(id)
            .execute(self.writer("delete_config_version")?)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count config versions, optionally for one node.
    pub async fn count_config_versions(
        &mut self,
        node_id: Option<i64>,
    ) -> Result<i64, DatabaseError> {
        let count: i64 = if let Some(node_id) = node_id {
            sqlx::query_scalar("SELECT COUNT(*) FROM config_versions WHERE node_id = ?")
                .bind(node_id)
                .fetch_one(self.conn())
                .await?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM config_versions")
                .fetch_one(self.conn())
                .await?
        };

        Ok(count)
    }
}
