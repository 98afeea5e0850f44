//! Credit ledger repository implementation.
//!
//! Every write runs inside one database transaction. Debits are a single
//! conditional `UPDATE ... WHERE current_credits >= $amount`, so the row
//! lock taken by the update serializes concurrent writers and a balance
//! can never be overdrawn.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::pagination::{PageRequest, PageResponse};
use schoolhub_entity::credit::{
    BalanceStatus, CreditBalance, CreditPayment, CreditTransaction, LedgerMovement, NewPayment,
    TopUpOutcome, TransactionKind,
};

use crate::error::db_err;
use crate::store::LedgerStore;

/// Repository for `credit_balances`, `credit_transactions` and
/// `credit_payments`.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Create a new ledger repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insert the balance row unless it exists, returning the current row.
pub(crate) async fn open_account_in(
    conn: &mut PgConnection,
    user_id: Uuid,
    initial_grant: i64,
) -> AppResult<CreditBalance> {
    let inserted = sqlx::query_as::<_, CreditBalance>(
        "INSERT INTO credit_balances (user_id, current_credits, initial_credits) \
         VALUES ($1, $2, $2) ON CONFLICT (user_id) DO NOTHING RETURNING *",
    )
    .bind(user_id)
    .bind(initial_grant)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err("Failed to open credit account"))?;

    match inserted {
        Some(balance) => Ok(balance),
        None => sqlx::query_as::<_, CreditBalance>(
            "SELECT * FROM credit_balances WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err("Failed to load credit account")),
    }
}

async fn insert_transaction(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    kind: TransactionKind,
    reason: &str,
    reference: Option<&str>,
    balance_after: i64,
) -> AppResult<CreditTransaction> {
    sqlx::query_as::<_, CreditTransaction>(
        "INSERT INTO credit_transactions (id, user_id, amount, kind, reason, reference, balance_after) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(amount)
    .bind(kind)
    .bind(reason)
    .bind(reference)
    .bind(balance_after)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_err("Failed to append credit transaction"))
}

/// Conditional debit on an open connection or transaction.
pub(crate) async fn debit_in(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    reference: Option<&str>,
) -> AppResult<LedgerMovement> {
    let updated = sqlx::query_as::<_, CreditBalance>(
        "UPDATE credit_balances \
         SET current_credits = current_credits - $2, \
             used_credits = used_credits + $2, \
             updated_at = NOW() \
         WHERE user_id = $1 AND status = 'active' AND current_credits >= $2 \
         RETURNING *",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err("Failed to debit credits"))?;

    let Some(balance) = updated else {
        let existing = sqlx::query_as::<_, CreditBalance>(
            "SELECT * FROM credit_balances WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("Failed to load credit balance"))?;

        return Err(match existing {
            None => AppError::not_found(format!("No credit balance for user {user_id}")),
            Some(b) if b.status == BalanceStatus::Suspended => {
                AppError::forbidden(format!("Credit balance for user {user_id} is suspended"))
            }
            Some(b) => AppError::insufficient_credits(amount, b.current_credits),
        });
    };

    let transaction = insert_transaction(
        conn,
        user_id,
        -amount,
        TransactionKind::Debit,
        reason,
        reference,
        balance.current_credits,
    )
    .await?;
    Ok(LedgerMovement {
        transaction,
        balance,
    })
}

/// Credit (top-up, bonus or refund) on an open connection or transaction.
pub(crate) async fn credit_in(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    kind: TransactionKind,
    reason: &str,
    reference: Option<&str>,
) -> AppResult<LedgerMovement> {
    let updated = sqlx::query_as::<_, CreditBalance>(
        "UPDATE credit_balances \
         SET current_credits = current_credits + $2, \
             bonus_credits = bonus_credits + CASE WHEN $3 = 'bonus' THEN $2 ELSE 0 END, \
             used_credits = CASE WHEN $3 = 'refund' THEN GREATEST(used_credits - $2, 0) ELSE used_credits END, \
             updated_at = NOW() \
         WHERE user_id = $1 \
         RETURNING *",
    )
    .bind(user_id)
    .bind(amount)
    .bind(kind.as_str())
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err("Failed to credit balance"))?
    .ok_or_else(|| AppError::not_found(format!("No credit balance for user {user_id}")))?;

    let transaction = insert_transaction(
        conn,
        user_id,
        amount,
        kind,
        reason,
        reference,
        updated.current_credits,
    )
    .await?;
    Ok(LedgerMovement {
        transaction,
        balance: updated,
    })
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn open_account(&self, user_id: Uuid, initial_grant: i64) -> AppResult<CreditBalance> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_err("Failed to acquire connection"))?;
        open_account_in(&mut conn, user_id, initial_grant).await
    }

    async fn find_balance(&self, user_id: Uuid) -> AppResult<Option<CreditBalance>> {
        sqlx::query_as::<_, CreditBalance>("SELECT * FROM credit_balances WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to fetch credit balance"))
    }

    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin debit"))?;
        let movement = debit_in(&mut tx, user_id, amount, reason, reference).await?;
        tx.commit().await.map_err(db_err("Failed to commit debit"))?;
        Ok(movement)
    }

    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: TransactionKind,
        reason: &str,
        reference: Option<&str>,
    ) -> AppResult<LedgerMovement> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin credit"))?;
        let movement = credit_in(&mut tx, user_id, amount, kind, reason, reference).await?;
        tx.commit().await.map_err(db_err("Failed to commit credit"))?;
        Ok(movement)
    }

    async fn top_up(&self, payment: &NewPayment, reason: &str) -> AppResult<TopUpOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin top-up"))?;

        let has_balance: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM credit_balances WHERE user_id = $1)",
        )
        .bind(payment.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to check credit balance"))?;
        if !has_balance {
            return Err(AppError::not_found(format!(
                "No credit balance for user {}",
                payment.user_id
            )));
        }

        let inserted = sqlx::query_as::<_, CreditPayment>(
            "INSERT INTO credit_payments \
             (id, user_id, amount, currency, method, external_transaction_id, credits_awarded) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (external_transaction_id) DO NOTHING RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.method)
        .bind(&payment.external_transaction_id)
        .bind(payment.credits)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to record payment"))?;

        let Some(recorded) = inserted else {
            let original = sqlx::query_as::<_, CreditPayment>(
                "SELECT * FROM credit_payments WHERE external_transaction_id = $1",
            )
            .bind(&payment.external_transaction_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("Failed to load recorded payment"))?;
            let outcome = payment.replay(original)?;
            tx.commit()
                .await
                .map_err(db_err("Failed to commit top-up"))?;
            return Ok(outcome);
        };

        let movement = credit_in(
            &mut tx,
            payment.user_id,
            payment.credits,
            TransactionKind::TopUp,
            reason,
            Some(&payment.external_transaction_id),
        )
        .await?;

        let recorded = sqlx::query_as::<_, CreditPayment>(
            "UPDATE credit_payments SET transaction_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(recorded.id)
        .bind(movement.transaction.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to link payment to transaction"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit top-up"))?;
        Ok(TopUpOutcome::Credited {
            payment: recorded,
            movement,
        })
    }

    async fn find_refund(&self, reference: &str) -> AppResult<Option<CreditTransaction>> {
        sqlx::query_as::<_, CreditTransaction>(
            "SELECT * FROM credit_transactions WHERE kind = 'refund' AND reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to look up refund"))
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<CreditTransaction>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM credit_transactions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("Failed to count transactions"))?;

        let items = sqlx::query_as::<_, CreditTransaction>(
            "SELECT * FROM credit_transactions WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list transactions"))?;

        Ok(PageResponse::new(items, page, total))
    }

    async fn transaction_sum(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM credit_transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to sum transactions"))
    }

    async fn set_balance_status(
        &self,
        user_id: Uuid,
        status: BalanceStatus,
    ) -> AppResult<CreditBalance> {
        sqlx::query_as::<_, CreditBalance>(
            "UPDATE credit_balances SET status = $2, updated_at = NOW() \
             WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update balance status"))?
        .ok_or_else(|| AppError::not_found(format!("No credit balance for user {user_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_entity::credit::PaymentMethod;
    use schoolhub_entity::user::{CreateUser, UserRole};

    use crate::repositories::UserRepository;
    use crate::store::UserStore;

    async fn user_with(pool: &PgPool, credits: i64) -> Uuid {
        let users = UserRepository::new(pool.clone());
        let (user, _) = users
            .create_user(
                &CreateUser {
                    id: None,
                    email: format!("{}@school.test", Uuid::new_v4()),
                    full_name: "Test User".into(),
                    full_name_bn: None,
                    role: UserRole::Teacher,
                    school_id: None,
                },
                credits,
            )
            .await
            .unwrap();
        user.id
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn concurrent_debits_never_overdraw(pool: PgPool) {
        let user = user_with(&pool, 10).await;
        let repo = LedgerRepository::new(pool.clone());

        let (a, b) = tokio::join!(
            repo.debit(user, 6, "id card", None),
            repo.debit(user, 6, "id card", None)
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

        let balance = repo.find_balance(user).await.unwrap().unwrap();
        assert_eq!(balance.current_credits, 4);
        assert_eq!(repo.transaction_sum(user).await.unwrap(), -6);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn top_up_is_idempotent(pool: PgPool) {
        let user = user_with(&pool, 0).await;
        let repo = LedgerRepository::new(pool.clone());
        let payment = NewPayment {
            user_id: user,
            amount: 100,
            currency: "BDT".into(),
            method: PaymentMethod::Bkash,
            external_transaction_id: "BK-1".into(),
            credits: 100,
        };

        assert!(!repo.top_up(&payment, "top-up").await.unwrap().is_duplicate());
        assert!(repo.top_up(&payment, "top-up").await.unwrap().is_duplicate());

        let balance = repo.find_balance(user).await.unwrap().unwrap();
        assert_eq!(balance.current_credits, 100);
        let log = repo
            .list_transactions(user, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(log.total_items, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn second_refund_for_reference_conflicts(pool: PgPool) {
        let user = user_with(&pool, 10).await;
        let repo = LedgerRepository::new(pool.clone());
        repo.debit(user, 5, "certificate", Some("document:x"))
            .await
            .unwrap();

        repo.credit(user, 5, TransactionKind::Refund, "refund", Some("document:x"))
            .await
            .unwrap();
        let err = repo
            .credit(user, 5, TransactionKind::Refund, "refund", Some("document:x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, schoolhub_core::ErrorKind::Conflict);
        assert_eq!(
            repo.find_balance(user).await.unwrap().unwrap().current_credits,
            10
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn overflowing_credit_is_rejected(pool: PgPool) {
        let user = user_with(&pool, i64::MAX - 5).await;
        let repo = LedgerRepository::new(pool.clone());

        let err = repo
            .credit(user, 10, TransactionKind::Bonus, "bonus", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, schoolhub_core::ErrorKind::Validation);
        assert_eq!(
            repo.find_balance(user).await.unwrap().unwrap().current_credits,
            i64::MAX - 5
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn reused_transaction_id_for_other_user_conflicts(pool: PgPool) {
        let first = user_with(&pool, 0).await;
        let second = user_with(&pool, 0).await;
        let repo = LedgerRepository::new(pool.clone());
        let payment = NewPayment {
            user_id: first,
            amount: 500,
            currency: "BDT".into(),
            method: PaymentMethod::Bkash,
            external_transaction_id: "TX-1".into(),
            credits: 500,
        };
        repo.top_up(&payment, "top-up").await.unwrap();

        let err = repo
            .top_up(
                &NewPayment {
                    user_id: second,
                    amount: 10,
                    ..payment.clone()
                },
                "top-up",
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, schoolhub_core::ErrorKind::Conflict);
        assert_eq!(
            repo.find_balance(second).await.unwrap().unwrap().current_credits,
            0
        );
    }
}
