pub mod connection;
pub mod error;
pub mod manager;
pub mod models;
pub mod repository;
pub mod sql;

pub use connection::{with_transaction, DbConnection};
pub use error::{SqlError, SqlResultExt};
pub use manager::{DatabaseError, DatabaseManager};
pub use sql::{SqlStatement, SqlValue};
