//! Transaction boundaries for multi-statement repository operations.
//!
//! A status change and its inventory update must commit or roll back
//! together; [`TransactionContext`] is the unit they share.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::shared::error::AppError;

/// Transaction context that wraps a SQLx transaction.
///
/// Dropping the context without calling [`commit`](Self::commit) rolls the
/// transaction back.
pub struct TransactionContext {
    tx: Transaction<'static, Postgres>,
}

impl TransactionContext {
    /// Begin a new transaction on `pool`.
    pub async fn begin(pool: &PgPool) -> Result<Self, AppError> {
        let tx = pool.begin().await.map_err(AppError::Database)?;
        Ok(Self { tx })
    }

    /// Connection to run queries inside the transaction.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Commit the transaction.
    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await.map_err(AppError::Database)
    }
}
