//! Inventory items and stock movements.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::error::AppError;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_database::store::InventoryStore;
use schoolhub_entity::inventory::{InventoryItem, NewInventoryItem, NewStockMovement, StockMovement};

use crate::context::RequestContext;

/// Manages a school's inventory.
#[derive(Clone)]
pub struct InventoryService {
    inventory: Arc<dyn InventoryStore>,
}

impl std::fmt::Debug for InventoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryService").finish_non_exhaustive()
    }
}

impl InventoryService {
    /// Creates a new inventory service.
    pub fn new(inventory: Arc<dyn InventoryStore>) -> Self {
        Self { inventory }
    }

    /// Items of a school, by name.
    pub async fn list_items(
        &self,
        ctx: &RequestContext,
        school_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<PageResponse<InventoryItem>, AppError> {
        ctx.require(SystemPermission::RecordsView)?;
        let school_id = ctx.resolve_school(school_id)?;
        self.inventory.list_items(school_id, page.normalized()).await
    }

    /// Add an item.
    pub async fn create_item(
        &self,
        ctx: &RequestContext,
        input: NewInventoryItem,
    ) -> Result<InventoryItem, AppError> {
        ctx.require(SystemPermission::RecordsManage)?;
        ctx.require_school(input.school_id)?;
        if input.name.trim().is_empty() || input.unit.trim().is_empty() {
            return Err(AppError::validation("name and unit are required"));
        }
        let item = self.inventory.create_item(&input).await?;
        info!(item_id = %item.id, quantity = item.quantity, "Inventory item added");
        Ok(item)
    }

    /// Apply a signed stock change. Stock never goes below zero.
    pub async fn record_movement(
        &self,
        ctx: &RequestContext,
        item_id: Uuid,
        delta: i32,
        reason: &str,
    ) -> Result<(InventoryItem, StockMovement), AppError> {
        ctx.require(SystemPermission::RecordsManage)?;
        if delta == 0 {
            return Err(AppError::validation("delta must not be zero"));
        }
        if reason.trim().is_empty() {
            return Err(AppError::validation("reason is required"));
        }
        self.owned_item(ctx, item_id).await?;

        let (item, movement) = self
            .inventory
            .record_movement(&NewStockMovement {
                item_id,
                delta,
                reason: reason.trim().to_string(),
                created_by: Some(ctx.user_id),
            })
            .await?;
        info!(item_id = %item_id, delta, quantity = item.quantity, "Stock moved");
        if item.is_low_stock() {
            warn!(item_id = %item_id, quantity = item.quantity, reorder_level = item.reorder_level, "Item at or below reorder level");
        }
        Ok((item, movement))
    }

    /// Movement history of an item, newest first.
    pub async fn list_movements(
        &self,
        ctx: &RequestContext,
        item_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<StockMovement>, AppError> {
        ctx.require(SystemPermission::RecordsView)?;
        self.owned_item(ctx, item_id).await?;
        self.inventory.list_movements(item_id, page.normalized()).await
    }

    async fn owned_item(&self, ctx: &RequestContext, item_id: Uuid) -> Result<InventoryItem, AppError> {
        self.inventory
            .find_item(item_id)
            .await?
            .filter(|i| ctx.viewer().can_access_school(i.school_id))
            .ok_or_else(|| AppError::not_found(format!("Inventory item {item_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::ErrorKind;
    use schoolhub_database::MemoryStore;
    use schoolhub_entity::user::UserRole;

    #[tokio::test]
    async fn test_movements_track_quantity() {
        let svc = InventoryService::new(Arc::new(MemoryStore::new()));
        let school = Uuid::new_v4();
        let teacher = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(school));
        let item = svc
            .create_item(
                &teacher,
                NewInventoryItem {
                    school_id: school,
                    name: "Chalk".into(),
                    name_bn: Some("চক".into()),
                    category: Some("stationery".into()),
                    unit: "box".into(),
                    quantity: 10,
                    reorder_level: 3,
                    location: None,
                },
            )
            .await
            .unwrap();

        let (after, movement) = svc.record_movement(&teacher, item.id, -8, "issued").await.unwrap();
        assert_eq!(after.quantity, 2);
        assert_eq!(movement.quantity_after, 2);
        assert!(after.is_low_stock());

        let err = svc.record_movement(&teacher, item.id, -3, "issued").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let history = svc
            .list_movements(&teacher, item.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(history.total_items, 1);

        let outsider = RequestContext::new(Uuid::new_v4(), UserRole::Teacher, Some(Uuid::new_v4()));
        let err = svc.record_movement(&outsider, item.id, 1, "restock").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
