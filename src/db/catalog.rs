//! Distinct release and platform values present on issues.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::entity::issue;
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Releases seen on at least one issue, ascending.
    pub async fn distinct_releases(&self) -> AppResult<Vec<String>> {
        self.distinct_values(issue::Column::Release).await
    }

    /// Platform codes seen on at least one issue, ascending.
    pub async fn distinct_platforms(&self) -> AppResult<Vec<String>> {
        self.distinct_values(issue::Column::Platform).await
    }

    async fn distinct_values(&self, column: issue::Column) -> AppResult<Vec<String>> {
        issue::Entity::find()
            .select_only()
            .column(column)
            .distinct()
            .filter(column.is_not_null())
            .order_by_asc(column)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list distinct values: {}", e)))
    }
}
