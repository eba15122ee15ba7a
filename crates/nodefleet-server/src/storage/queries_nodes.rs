//! Node queries.

use nodefleet_core::db::unix_timestamp;

use super::db::{DatabaseError, Tx};
use super::models::{NewNode, Node, NodeUpdate};

impl Tx {
    /// Create a node under an existing site.
    pub async fn create_node(&mut self, params: NewNode<'_>) -> Result<Node, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO nodes (hostname, site_id, secret_hash, create_time) VALUES (?, ?, ?, ?)",
        )
        .bind(params.hostname)
        .bind(params.site_id)
        .bind(params.secret_hash)
        .bind(now)
        .execute(self.writer("create_node")?)
        .await?;

        self.get_node(result.last_insert_rowid()).await
    }

    /// Get a node by ID.
    pub async fn get_node(&mut self, id: i64) -> Result<Node, DatabaseError> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Node {id}")))
    }

    /// Get the node whose secret digest equals `secret_hash`.
    ///
    /// The error message never echoes the digest.
    pub async fn get_node_by_secret_hash(
        &mut self,
        secret_hash: &[u8],
    ) -> Result<Node, DatabaseError> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE secret_hash = ?")
            .bind(secret_hash)
            .fetch_optional(self.conn())
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Node with secret hash".to_string()))
    }

    /// List nodes with `id > after_id`, optionally restricted to one site.
    pub async fn list_nodes(
        &mut self,
        site_id: Option<i64>,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Node>, DatabaseError> {
        let nodes = if let Some(site_id) = site_id {
            sqlx::query_as::<_, Node>(
                "SELECT * FROM nodes WHERE site_id = ? AND id > ? ORDER BY id LIMIT ?",
            )
            .bind(site_id)
            .bind(after_id)
            .bind(limit)
            .fetch_all(self.conn())
            .await?
        } else {
            sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id > ? ORDER BY id LIMIT ?")
                .bind(after_id)
                .bind(limit)
                .fetch_all(self.conn())
                .await?
        };

        Ok(nodes)
    }

    /// Change a node's hostname and, optionally, move it to another site.
    pub async fn update_node(
        &mut self,
        id: i64,
        params: NodeUpdate<'_>,
    ) -> Result<Node, DatabaseError> {
        let result =
            sqlx::query("UPDATE nodes SET hostname = ?, site_id = COALESCE(?, site_id) WHERE id = ?")
                .bind(params.hostname)
                .bind(params.site_id)
                .bind(id)
                .execute(self.writer("update_node")?)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Node {id}")));
        }
        self.get_node(id).await
    }

    /// Replace a node's secret digest. The previous secret stops matching.
    pub async fn update_node_secret_hash(
        &mut self,
        id: i64,
        secret_hash: &[u8],
    ) -> Result<Node, DatabaseError> {
        let result = sqlx::query("UPDATE nodes SET secret_hash = ? WHERE id = ?")
            .bind(secret_hash)
            .bind(id)
            .execute(self.writer("update_node_secret_hash")?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Node {id}")));
        }
        self.get_node(id).await
    }

    /// Delete a node together with its config versions, deployments and
    /// check-ins. Returns affected rows.
    pub async fn delete_node(&mut self, id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id)
            .execute(self.writer("delete_node")?)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count nodes, optionally restricted to one site.
    pub async fn count_nodes(&mut self, site_id: Option<i64>) -> Result<i64, DatabaseError> {
        let count: i64 = if let Some(site_id) = site_id {
            sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE site_id = ?")
                .bind(site_id)
                .fetch_one(self.conn())
                .await?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM nodes")
                .fetch_one(self.conn())
                .await?
        };

        Ok(count)
    }
}
