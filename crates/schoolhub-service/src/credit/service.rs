//! Credit ledger use cases: balance, debit, top-up, bonus, refund.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use schoolhub_auth::rbac::SystemPermission;
use schoolhub_core::config::credits::{CreditsConfig, MAX_CREDIT_AMOUNT};
use schoolhub_core::error::{AppError, ErrorKind};
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_database::store::LedgerStore;
use schoolhub_entity::credit::{
    BalanceStatus, CreditBalance, CreditTransaction, LedgerMovement, NewPayment, PaymentMethod,
    TopUpOutcome, TransactionKind,
};
use schoolhub_entity::notification::{
    NewNotification, NotificationCategory, NotificationPriority, NotificationType,
};

use super::audit::LedgerAudit;
use crate::context::RequestContext;
use crate::notification::NotificationService;

/// Orchestrates the ledger store and the credit notifications.
#[derive(Clone)]
pub struct CreditService {
    ledger: Arc<dyn LedgerStore>,
    notifications: NotificationService,
    config: CreditsConfig,
}

impl std::fmt::Debug for CreditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditService")
            .field("config", &self.config)
            .finish()
    }
}

fn require_amount(amount: i64) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::validation(format!(
            "amount must be a positive integer, got {amount}"
        )));
    }
    if amount > MAX_CREDIT_AMOUNT {
        return Err(AppError::validation(format!(
            "amount must not exceed {MAX_CREDIT_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}

fn require_reason(reason: &str) -> Result<(), AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::validation("reason is required"));
    }
    Ok(())
}

impl CreditService {
    /// Creates a new credit service.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        notifications: NotificationService,
        config: CreditsConfig,
    ) -> Self {
        Self {
            ledger,
            notifications,
            config,
        }
    }

    /// Ledger settings in effect.
    pub fn config(&self) -> &CreditsConfig {
        &self.config
    }

    /// The caller's balance, or another user's for admins.
    pub async fn get_balance(
        &self,
        ctx: &RequestContext,
        user_id: Option<Uuid>,
    ) -> Result<CreditBalance, AppError> {
        let target = self.target_user(ctx, user_id)?;
        self.balance_of(target).await
    }

    /// A user's balance. Missing rows are `NotFound`, never synthesized.
    pub async fn balance_of(&self, user_id: Uuid) -> Result<CreditBalance, AppError> {
        self.ledger
            .find_balance(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No credit balance for user {user_id}")))
    }

    /// Debit the caller's own credits.
    pub async fn deduct(
        &self,
        ctx: &RequestContext,
        amount: i64,
        reason: &str,
        reference: Option<&str>,
    ) -> Result<LedgerMovement, AppError> {
        ctx.require(SystemPermission::CreditSpend)?;
        require_amount(amount)?;
        require_reason(reason)?;

        let movement = self
            .ledger
            .debit(ctx.user_id, amount, reason.trim(), reference)
            .await?;
        info!(
            user_id = %ctx.user_id,
            amount,
            balance_after = movement.balance.current_credits,
            "Credits debited"
        );
        self.warn_if_low(&movement, amount).await;
        Ok(movement)
    }

    /// Apply a payment. Replaying the same external transaction id returns
    /// [`TopUpOutcome::Duplicate`] and credits nothing.
    pub async fn top_up(
        &self,
        user_id: Uuid,
        amount: i64,
        method: PaymentMethod,
        external_transaction_id: &str,
    ) -> Result<TopUpOutcome, AppError> {
        require_amount(amount)?;
        let external_transaction_id = external_transaction_id.trim();
        if external_transaction_id.is_empty() {
            return Err(AppError::validation("transactionId is required"));
        }

        let payment = NewPayment {
            user_id,
            amount,
            currency: self.config.currency.clone(),
            method,
            external_transaction_id: external_transaction_id.to_string(),
            credits: self.config.credits_for(amount)?,
        };
        let reason = format!("Top-up via {method} ({amount} {})", self.config.currency);
        let outcome = self.ledger.top_up(&payment, &reason).await?;

        match &outcome {
            TopUpOutcome::Credited { payment, movement } => {
                info!(
                    user_id = %user_id,
                    external_transaction_id,
                    credits = payment.credits_awarded,
                    balance_after = movement.balance.current_credits,
                    "Top-up credited"
                );
                self.notifications
                    .notify_best_effort(
                        NewNotification::direct(
                            user_id,
                            NotificationType::Success,
                            NotificationCategory::Finance,
                            "Credits added",
                            format!(
                                "{} credits were added to your balance. New balance: {}.",
                                payment.credits_awarded, movement.balance.current_credits
                            ),
                        )
                        .with_bengali(
                            "ক্রেডিট যোগ হয়েছে",
                            format!(
                                "আপনার ব্যালেন্সে {} ক্রেডিট যোগ হয়েছে।",
                                payment.credits_awarded
                            ),
                        ),
                    )
                    .await;
            }
            TopUpOutcome::Duplicate { payment } => {
                info!(
                    user_id = %user_id,
                    external_transaction_id,
                    payment_id = %payment.id,
                    "Duplicate top-up ignored"
                );
            }
        }
        Ok(outcome)
    }

    /// Grant bonus credits (admin).
    pub async fn grant_bonus(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<LedgerMovement, AppError> {
        ctx.require(SystemPermission::CreditGrant)?;
        require_amount(amount)?;
        require_reason(reason)?;

        let movement = self
            .ledger
            .credit(user_id, amount, TransactionKind::Bonus, reason.trim(), None)
            .await?;
        info!(
            user_id = %user_id,
            amount,
            granted_by = %ctx.user_id,
            "Bonus credits granted"
        );
        self.notifications
            .notify_best_effort(NewNotification::direct(
                user_id,
                NotificationType::Success,
                NotificationCategory::Finance,
                "Bonus credits",
                format!("You received {amount} bonus credits: {}", reason.trim()),
            ))
            .await;
        Ok(movement)
    }

    /// Compensating credit, idempotent per `reference`.
    ///
    /// A second call with the same reference returns the first refund
    /// instead of crediting again.
    pub async fn refund(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
        reference: &str,
    ) -> Result<CreditTransaction, AppError> {
        require_amount(amount)?;
        require_reason(reason)?;

        match self
            .ledger
            .credit(user_id, amount, TransactionKind::Refund, reason, Some(reference))
            .await
        {
            Ok(movement) => {
                info!(user_id = %user_id, amount, reference, "Credits refunded");
                Ok(movement.transaction)
            }
            Err(err) if err.kind == ErrorKind::Conflict => {
                match self.ledger.find_refund(reference).await? {
                    Some(existing) => {
                        debug!(reference, transaction_id = %existing.id, "Refund already applied");
                        Ok(existing)
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Transaction history, newest first.
    pub async fn list_transactions(
        &self,
        ctx: &RequestContext,
        user_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<PageResponse<CreditTransaction>, AppError> {
        let target = self.target_user(ctx, user_id)?;
        self.ledger
            .list_transactions(target, page.normalized())
            .await
    }

    /// Suspend or reactivate a balance (admin).
    pub async fn set_status(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        status: BalanceStatus,
    ) -> Result<CreditBalance, AppError> {
        ctx.require(SystemPermission::CreditManage)?;
        let balance = self.ledger.set_balance_status(user_id, status).await?;
        info!(user_id = %user_id, status = %status, "Credit balance status changed");
        Ok(balance)
    }

    /// Compare the transaction log against the balance row.
    pub async fn audit(&self, user_id: Uuid) -> Result<LedgerAudit, AppError> {
        let balance = self.balance_of(user_id).await?;
        let logged = self.ledger.transaction_sum(user_id).await?;
        let audit = LedgerAudit::new(&balance, logged);
        if !audit.is_consistent() {
            warn!(
                user_id = %user_id,
                logged_sum = audit.logged_sum,
                expected = audit.expected_sum,
                "Ledger drift detected"
            );
        }
        Ok(audit)
    }

    fn target_user(&self, ctx: &RequestContext, user_id: Option<Uuid>) -> Result<Uuid, AppError> {
        match user_id {
            Some(id) if id != ctx.user_id => {
                ctx.require(SystemPermission::CreditViewAny)?;
                Ok(id)
            }
            _ => Ok(ctx.user_id),
        }
    }

    async fn warn_if_low(&self, movement: &LedgerMovement, debited: i64) {
        let threshold = self.config.low_balance_threshold;
        let after = movement.balance.current_credits;
        if after >= threshold || after + debited < threshold {
            return;
        }
        self.notifications
            .notify_best_effort(
                NewNotification::direct(
                    movement.balance.user_id,
                    NotificationType::Warning,
                    NotificationCategory::Finance,
                    "Low credit balance",
                    format!("Only {after} credits remain. Top up to keep generating documents."),
                )
                .with_priority(NotificationPriority::High),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationHub;
    use schoolhub_database::MemoryStore;
    use schoolhub_database::store::UserStore;
    use schoolhub_entity::user::{CreateUser, UserRole};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: CreditService,
        notifications: NotificationService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let notifications = NotificationService::new(store.clone(), NotificationHub::new(8));
        let service = CreditService::new(
            store.clone(),
            notifications.clone(),
            CreditsConfig::default(),
        );
        Fixture {
            store,
            service,
            notifications,
        }
    }

    async fn member(store: &MemoryStore, credits: i64) -> RequestContext {
        let (user, _) = store
            .create_user(
                &CreateUser {
                    id: None,
                    email: format!("{}@school.test", Uuid::new_v4()),
                    full_name: "Member".into(),
                    full_name_bn: None,
                    role: UserRole::Teacher,
                    school_id: None,
                },
                credits,
            )
            .await
            .unwrap();
        RequestContext::new(user.id, user.role, None)
    }

    #[tokio::test]
    async fn test_concurrent_deducts_exactly_one_wins() {
        let f = fixture();
        let ctx = member(&f.store, 10).await;

        let (a, b) = tokio::join!(
            f.service.deduct(&ctx, 6, "ID card", None),
            f.service.deduct(&ctx, 6, "ID card", None)
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(e) if e.kind == ErrorKind::InsufficientCredits
        )));
        assert_eq!(f.service.balance_of(ctx.user_id).await.unwrap().current_credits, 4);
    }

    #[tokio::test]
    async fn test_deduct_rejects_bad_input() {
        let f = fixture();
        let ctx = member(&f.store, 10).await;
        for (amount, reason) in [(0, "x"), (-3, "x"), (2, "   ")] {
            let err = f.service.deduct(&ctx, amount, reason, None).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_missing_balance_is_not_found() {
        let f = fixture();
        let ctx = RequestContext::new(Uuid::new_v4(), UserRole::Student, None);
        let err = f.service.get_balance(&ctx, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_top_up_credits_once_and_notifies() {
        let f = fixture();
        let ctx = member(&f.store, 0).await;

        let first = f
            .service
            .top_up(ctx.user_id, 100, PaymentMethod::Bkash, "BK-1001")
            .await
            .unwrap();
        let replay = f
            .service
            .top_up(ctx.user_id, 100, PaymentMethod::Bkash, "BK-1001")
            .await
            .unwrap();

        assert!(replay.is_duplicate());
        assert_eq!(first.payment().id, replay.payment().id);
        assert_eq!(f.service.balance_of(ctx.user_id).await.unwrap().current_credits, 100);
        let history = f
            .service
            .list_transactions(&ctx, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(history.total_items, 1);
        assert_eq!(history.items[0].kind, TransactionKind::TopUp);
        assert_eq!(f.notifications.unread_count(&ctx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_oversized_amounts_are_rejected() {
        let f = fixture();
        let ctx = member(&f.store, 100).await;
        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, None);

        for amount in [MAX_CREDIT_AMOUNT + 1, i64::MAX] {
            let err = f
                .service
                .top_up(ctx.user_id, amount, PaymentMethod::Bkash, "BIG-1")
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            let err = f
                .service
                .grant_bonus(&admin, ctx.user_id, amount, "prize")
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            let err = f.service.deduct(&ctx, amount, "x", None).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        assert_eq!(f.service.balance_of(ctx.user_id).await.unwrap().current_credits, 100);
    }

    #[tokio::test]
    async fn test_top_up_rate_overflow_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let notifications = NotificationService::new(store.clone(), NotificationHub::new(8));
        let service = CreditService::new(
            store.clone(),
            notifications,
            CreditsConfig {
                credits_per_currency_unit: i64::MAX / 10,
                ..CreditsConfig::default()
            },
        );
        let ctx = member(&store, 0).await;

        let err = service
            .top_up(ctx.user_id, 100, PaymentMethod::Card, "CARD-9")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(service.balance_of(ctx.user_id).await.unwrap().current_credits, 0);
    }

    #[tokio::test]
    async fn test_transaction_id_of_another_user_conflicts() {
        let f = fixture();
        let owner = member(&f.store, 0).await;
        let other = member(&f.store, 100).await;

        f.service
            .top_up(owner.user_id, 500, PaymentMethod::Bkash, "TX-1")
            .await
            .unwrap();
        let err = f
            .service
            .top_up(other.user_id, 10, PaymentMethod::Bkash, "TX-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(!err.message.contains(&owner.user_id.to_string()));

        let err = f
            .service
            .top_up(owner.user_id, 50, PaymentMethod::Bkash, "TX-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        assert_eq!(f.service.balance_of(owner.user_id).await.unwrap().current_credits, 500);
        assert_eq!(f.service.balance_of(other.user_id).await.unwrap().current_credits, 100);
    }

    #[tokio::test]
    async fn test_refund_is_idempotent_per_reference() {
        let f = fixture();
        let ctx = member(&f.store, 10).await;
        f.service.deduct(&ctx, 5, "certificate", Some("document:1")).await.unwrap();

        let first = f
            .service
            .refund(ctx.user_id, 5, "generation failed", "document:1")
            .await
            .unwrap();
        let second = f
            .service
            .refund(ctx.user_id, 5, "generation failed", "document:1")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let balance = f.service.balance_of(ctx.user_id).await.unwrap();
        assert_eq!(balance.current_credits, 10);
        assert_eq!(balance.used_credits, 0);
    }

    #[tokio::test]
    async fn test_ledger_identity_after_mixed_operations() {
        let f = fixture();
        let ctx = member(&f.store, 20).await;
        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, None);

        f.service.deduct(&ctx, 7, "admit card", None).await.unwrap();
        f.service
            .top_up(ctx.user_id, 30, PaymentMethod::Nagad, "NG-7")
            .await
            .unwrap();
        f.service.grant_bonus(&admin, ctx.user_id, 5, "welcome").await.unwrap();
        f.service
            .refund(ctx.user_id, 7, "reprint", "document:9")
            .await
            .unwrap();
        let _ = f.service.deduct(&ctx, 500, "too much", None).await;

        let audit = f.service.audit(ctx.user_id).await.unwrap();
        assert!(audit.is_consistent());
        assert_eq!(audit.logged_sum, 35);
        let balance = f.service.balance_of(ctx.user_id).await.unwrap();
        assert_eq!(balance.current_credits, 55);
        assert_eq!(balance.bonus_credits, 5);
    }

    #[tokio::test]
    async fn test_only_admin_reads_other_balances() {
        let f = fixture();
        let owner = member(&f.store, 10).await;
        let peer = member(&f.store, 10).await;
        let err = f
            .service
            .get_balance(&peer, Some(owner.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, None);
        let balance = f.service.get_balance(&admin, Some(owner.user_id)).await.unwrap();
        assert_eq!(balance.user_id, owner.user_id);
    }

    #[tokio::test]
    async fn test_suspended_balance_cannot_spend() {
        let f = fixture();
        let ctx = member(&f.store, 10).await;
        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, None);
        f.service
            .set_status(&admin, ctx.user_id, BalanceStatus::Suspended)
            .await
            .unwrap();
        let err = f.service.deduct(&ctx, 1, "x", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_crossing_threshold_sends_low_balance_notice() {
        let f = fixture();
        let ctx = member(&f.store, 12).await;
        f.service.deduct(&ctx, 4, "id card", None).await.unwrap();
        assert_eq!(f.notifications.unread_count(&ctx).await.unwrap(), 1);
        f.service.deduct(&ctx, 1, "id card", None).await.unwrap();
        assert_eq!(f.notifications.unread_count(&ctx).await.unwrap(), 1);
    }
}
