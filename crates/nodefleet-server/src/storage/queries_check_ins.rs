//! Node check-in history queries. Check-ins are immutable once recorded.

use nodefleet_core::db::unix_timestamp;

use super::db::{DatabaseError, Tx};
use super::models::{NewNodeCheckIn, NodeCheckIn};

impl Tx {
    /// Record a check-in, timestamped now.
    pub async fn create_node_check_in(
        &mut self,
        params: &NewNodeCheckIn,
    ) -> Result<NodeCheckIn, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO node_check_ins (node_id, check_in_time, current_deployment_id, \
             installing_deployment_id, installing_deployment_error, \
             installing_deployment_attempts) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(params.node_id)
        .bind(now)
        .bind(params.current_deployment_id)
        .bind(params.installing_deployment_id)
        .bind(params.installing_deployment_error.as_deref())
        .bind(params.installing_deployment_attempts)
        .execute(self.writer("create_node_check_in")?)
        .await?;

        self.get_node_check_in(result.last_insert_rowid()).await
    }

    /// Get a check-in by ID.
    pub async fn get_node_check_in(&mut self, id: i64) -> Result<NodeCheckIn, DatabaseError> {
        sqlx::query_as::<_, NodeCheckIn>("SELECT * FROM node_check_ins WHERE id = ?")
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("NodeCheckIn {id}")))
    }

    /// List a node's check-ins with `id > after_id`, oldest first.
    pub async fn list_node_check_ins(
        &mut self,
        node_id: i64,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<NodeCheckIn>, DatabaseError> {
        let check_ins = sqlx::query_as::<_, NodeCheckIn>(
            "SELECT * FROM node_check_ins WHERE node_id = ? AND id > ? ORDER BY id LIMIT ?",
        )
        .bind(node_id)
        .bind(after_id)
        .bind(limit)
        .fetch_all(self.conn())
        .await?;

        Ok(check_ins)
    }

    /// Delete a single check-in. Returns affected rows.
    pub async fn delete_node_check_in(&mut self, id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM node_check_ins WHERE id = ?")
            .bind(id)
            .execute(self.writer("delete_node_check_in")?)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count a node's check-ins.
    pub async fn count_node_check_ins(&mut self, node_id: i64) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM node_check_ins WHERE node_id = ?")
            .bind(node_id)
            .fetch_one(self.conn())
            .await?;

        Ok(count)
    }
}
