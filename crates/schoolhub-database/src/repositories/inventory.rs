//! Inventory repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::inventory::{
    InventoryItem, NewInventoryItem, NewStockMovement, StockMovement,
};

use crate::error::db_err;
use crate::store::InventoryStore;

/// Repository for `inventory_items` and `inventory_movements`.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    /// Create a new inventory repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    async fn create_item(&self, input: &NewInventoryItem) -> AppResult<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(
            "INSERT INTO inventory_items \
             (id, school_id, name, name_bn, category, unit, quantity, reorder_level, location) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.school_id)
        .bind(&input.name)
        .bind(&input.name_bn)
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.quantity)
        .bind(input.reorder_level)
        .bind(&input.location)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create inventory item"))
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<InventoryItem>> {
        sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find inventory item"))
    }

    async fn list_items(
        &self,
        school_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<InventoryItem>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE school_id = $1")
                .bind(school_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("Failed to count inventory items"))?;

        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE school_id = $1 \
             ORDER BY name LIMIT $2 OFFSET $3",
        )
        .bind(school_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list inventory items"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn record_movement(
        &self,
        input: &NewStockMovement,
    ) -> AppResult<(InventoryItem, StockMovement)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin stock movement"))?;

        let updated = sqlx::query_as::<_, InventoryItem>(
            "UPDATE inventory_items SET quantity = quantity + $2, updated_at = NOW() \
             WHERE id = $1 AND quantity + $2 >= 0 RETURNING *",
        )
        .bind(input.item_id)
        .bind(input.delta)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to update stock"))?;

        let Some(item) = updated else {
            let current: Option<i32> =
                sqlx::query_scalar("SELECT quantity FROM inventory_items WHERE id = $1")
                    .bind(input.item_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_err("Failed to load inventory item"))?;
            return Err(match current {
                None => AppError::not_found(format!("Inventory item {} not found", input.item_id)),
                Some(quantity) => AppError::validation(format!(
                    "Insufficient stock: requested {}, available {quantity}",
                    -input.delta
                )),
            });
        };

        let movement = sqlx::query_as::<_, StockMovement>(
            "INSERT INTO inventory_movements (id, item_id, delta, reason, quantity_after, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(item.id)
        .bind(input.delta)
        .bind(&input.reason)
        .bind(item.quantity)
        .bind(input.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to log stock movement"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit stock movement"))?;
        Ok((item, movement))
    }

    async fn list_movements(
        &self,
        item_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<StockMovement>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory_movements WHERE item_id = $1")
                .bind(item_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("Failed to count stock movements"))?;

        let items = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM inventory_movements WHERE item_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(item_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list stock movements"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn count_low_stock(&self, school_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_items WHERE school_id = $1 AND quantity <= reorder_level",
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count low-stock items"))
    }
}
