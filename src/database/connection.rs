use futures::future::BoxFuture;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth::AuthPrincipal;
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::sql::SqlStatement;
use crate::error::ApiError;

/// One transaction bound to one request.
///
/// Exactly one of `commit` or `rollback` is expected before `release`. A
/// connection dropped while its transaction is still open is rolled back.
pub struct DbConnection {
    tx: Option<Transaction<'static, Postgres>>,
    system_user_id: Option<i32>,
    request_id: Uuid,
}

impl DbConnection {
    /// Begin a transaction and bind it to the principal's system user, if any.
    ///
    /// The id is also published to the session as `restoration.system_user_id`
    /// so column defaults and audit triggers can attribute the change.
    pub async fn open(pool: &PgPool, principal: Option<&AuthPrincipal>) -> Result<Self, SqlError> {
        let mut tx = pool.begin().await.origin("DbConnection->open")?;
        let request_id = Uuid::new_v4();
        let system_user_id = principal.and_then(|p| p.system_user_id);

        if let Some(id) = system_user_id {
            let mut stmt = SqlStatement::new("SELECT set_config('restoration.system_user_id', ");
            stmt.push_bind(id.to_string()).push_sql(", true)");
            stmt.execute(&mut *tx).await.origin("DbConnection->open")?;
        }

        debug!(%request_id, ?system_user_id, "Opened database connection");

        Ok(Self {
            tx: Some(tx),
            system_user_id,
            request_id,
        })
    }

    /// No transaction behind it; every statement fails with `ConnectionClosed`.
    #[cfg(test)]
    pub(crate) fn detached(system_user_id: Option<i32>) -> Self {
        Self {
            tx: None,
            system_user_id,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn system_user_id(&self) -> Option<i32> {
        self.system_user_id
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Re-bind after the current user was registered mid-request.
    pub async fn set_system_user_id(&mut self, system_user_id: i32) -> Result<(), SqlError> {
        let mut stmt = SqlStatement::new("SELECT set_config('restoration.system_user_id', ");
        stmt.push_bind(system_user_id.to_string()).push_sql(", true)");
        self.execute(&stmt).await.origin("DbConnection->set_system_user_id")?;
        self.system_user_id = Some(system_user_id);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    pub async fn execute(&mut self, stmt: &SqlStatement) -> Result<u64, SqlError> {
        let tx = self.tx.as_mut().ok_or(SqlError::ConnectionClosed)?;
        stmt.execute(&mut **tx).await
    }

    pub async fn fetch_all<T>(&mut self, stmt: &SqlStatement) -> Result<Vec<T>, SqlError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let tx = self.tx.as_mut().ok_or(SqlError::ConnectionClosed)?;
        stmt.fetch_all(&mut **tx).await
    }

    pub async fn fetch_optional<T>(&mut self, stmt: &SqlStatement) -> Result<Option<T>, SqlError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let tx = self.tx.as_mut().ok_or(SqlError::ConnectionClosed)?;
        stmt.fetch_optional(&mut **tx).await
    }

    /// Fetch exactly one row; an empty result is an `UnexpectedResult`.
    pub async fn fetch_one<T>(&mut self, stmt: &SqlStatement, message: &str) -> Result<T, SqlError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.fetch_optional(stmt)
            .await?
            .ok_or_else(|| SqlError::UnexpectedResult {
                message: message.to_string(),
                trail: vec![],
            })
    }

    pub async fn commit(&mut self) -> Result<(), SqlError> {
        let tx = self.tx.take().ok_or(SqlError::ConnectionClosed)?;
        tx.commit().await.origin("DbConnection->commit")?;
        debug!(request_id = %self.request_id, "Committed transaction");
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), SqlError> {
        let tx = self.tx.take().ok_or(SqlError::ConnectionClosed)?;
        tx.rollback().await.origin("DbConnection->rollback")?;
        debug!(request_id = %self.request_id, "Rolled back transaction");
        Ok(())
    }

    /// Return the connection to the pool.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for DbConnection {
    fn drop(&mut self) {
        if self.tx.is_some() {
            // sqlx rolls the transaction back when it is dropped
            warn!(
                request_id = %self.request_id,
                "Connection released without commit or rollback; rolling back"
            );
        }
    }
}

/// Run `f` inside one request transaction: commit on `Ok`, roll back on
/// `Err`, release on every path.
pub async fn with_transaction<T, F>(pool: &PgPool, principal: Option<&AuthPrincipal>, f: F) -> Result<T, ApiError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut DbConnection) -> BoxFuture<'c, Result<T, ApiError>> + Send,
{
    let mut conn = DbConnection::open(pool, principal).await?;

    match f(&mut conn).await {
        Ok(value) => {
            conn.commit().await?;
            conn.release();
            Ok(value)
        }
        Err(err) => {
            error!(request_id = %conn.request_id(), status = err.status_code(), "Request failed: {}", err);
            if let Err(rollback_err) = conn.rollback().await {
                error!(request_id = %conn.request_id(), "Rollback failed: {}", rollback_err);
            }
            conn.release();
            Err(err)
        }
    }
}
