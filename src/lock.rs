use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, Statement,
    TransactionTrait, Value,
};

use crate::config::AdvisoryLockStrategy;
use crate::error::NestedSetError;

/// Transaction wrapper that serialises tree writers for its whole lifetime.
///
/// Advisory locks are a PostgreSQL feature; on other backends the guard is a
/// plain transaction. The lock is transaction-scoped
/// (`pg_advisory_xact_lock`), so the database releases it at commit or
/// rollback and no explicit unlock statement is issued.
pub struct TransactionGuard {
    txn: Option<DatabaseTransaction>,
}

impl TransactionGuard {
    pub async fn begin(
        strategy: &AdvisoryLockStrategy,
        db: &DatabaseConnection,
    ) -> Result<Self, NestedSetError> {
        let txn = db.begin().await?;

        if db.get_database_backend() == DbBackend::Postgres {
            if let Some(key) = strategy.key() {
                if let Err(err) = acquire_lock(&txn, key.as_str()).await {
                    let _ = txn.rollback().await;
                    return Err(err);
                }
            }
        }

        Ok(Self { txn: Some(txn) })
    }

    pub fn connection(&self) -> &DatabaseTransaction {
        self.txn.as_ref().expect("transaction already consumed")
    }

    pub async fn commit(mut self) -> Result<(), NestedSetError> {
        if let Some(txn) = self.txn.take() {
            txn.commit().await?;
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), NestedSetError> {
        if let Some(txn) = self.txn.take() {
            txn.rollback().await?;
        }
        Ok(())
    }
}

async fn acquire_lock(txn: &DatabaseTransaction, key: &str) -> Result<(), NestedSetError> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1), 0)",
        [Value::from(key)],
    ))
    .await?;
    Ok(())
}
