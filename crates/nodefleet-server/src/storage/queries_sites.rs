//! Site queries.

use nodefleet_core::db::unix_timestamp;

use super::db::{DatabaseError, Tx};
use super::models::Site;

impl Tx {
    /// Create a site.
    pub async fn create_site(&mut self, name: &str) -> Result<Site, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query("INSERT INTO sites (name, create_time) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(self.writer("create_site")?)
            .await?;

        self.get_site(result.last_insert_rowid()).await
    }

    /// Get a site by ID.
    pub async fn get_site(&mut self, id: i64) -> Result<Site, DatabaseError> {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = ?")
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Site {id}")))
    }

    /// List sites with `id > after_id` in ascending id order.
    pub async fn list_sites(
        &mut self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<Site>, DatabaseError> {
        let sites =
            sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id > ? ORDER BY id LIMIT ?")
                .bind(after_id)
                .bind(limit)
                .fetch_all(self.conn())
                .await?;

        Ok(sites)
    }

    /// Rename a site.
    pub async fn update_site(&mut self, id: i64, name: &str) -> Result<Site, DatabaseError> {
        let result = sqlx::query("UPDATE sites SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.writer("update_site")?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Site {id}")));
        }
        self.get_site(id).await
    }

    /// Delete a site together with everything it owns. Returns affected rows.
    pub async fn delete_site(&mut self, id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM sites WHERE id = ?")
            .bind(id)
            .execute(self.writer("delete_site")?)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count all sites.
    pub async fn count_sites(&mut self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sites")
            .fetch_one(self.conn())
            .await?;

        Ok(count)
    }
}
