//! Wires every service from the stores and configuration.

use std::sync::Arc;

use chrono::Duration;

use schoolhub_core::config::AppConfig;
use schoolhub_database::Stores;

use crate::credit::CreditService;
use crate::dashboard::DashboardService;
use crate::document::{ArtifactStore, DocumentService, RefundReconciler};
use crate::notification::{NotificationHub, NotificationService};
use crate::school::{InventoryService, LibraryService, RosterService};
use crate::user::UserService;

/// All application services, cheap to clone.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    /// User accounts.
    pub users: UserService,
    /// Credit ledger.
    pub credits: CreditService,
    /// Notifications and realtime hub.
    pub notifications: NotificationService,
    /// Templates and document generation.
    pub documents: DocumentService,
    /// Students and teachers.
    pub roster: RosterService,
    /// Library.
    pub library: LibraryService,
    /// Inventory.
    pub inventory: InventoryService,
    /// Dashboard figures.
    pub dashboard: DashboardService,
    /// Reconciler settings.
    stale_after: Duration,
    batch_size: i64,
}

impl ServiceRegistry {
    /// Build the services over `stores`.
    pub fn new(stores: &Stores, config: &AppConfig, artifacts: Arc<dyn ArtifactStore>) -> Self {
        let notifications = NotificationService::new(
            stores.notifications.clone(),
            NotificationHub::new(config.notifications.channel_capacity),
        );
        let credits = CreditService::new(
            stores.ledger.clone(),
            notifications.clone(),
            config.credits.clone(),
        );
        let documents = DocumentService::new(
            stores.documents.clone(),
            credits.clone(),
            notifications.clone(),
            artifacts,
        );

        Self {
            users: UserService::new(stores.users.clone(), config.credits.initial_grant),
            roster: RosterService::new(stores.roster.clone()),
            library: LibraryService::new(stores.library.clone()),
            inventory: InventoryService::new(stores.inventory.clone()),
            dashboard: DashboardService::new(
                stores.roster.clone(),
                stores.library.clone(),
                stores.inventory.clone(),
                stores.documents.clone(),
            ),
            credits,
            notifications,
            documents,
            stale_after: Duration::minutes(config.worker.stale_pending_minutes),
            batch_size: config.worker.reconcile_batch_size,
        }
    }

    /// A reconciler over this registry's document service.
    pub fn reconciler(&self) -> RefundReconciler {
        RefundReconciler::new(self.documents.clone(), self.stale_after, self.batch_size)
    }
}
