//! PostgreSQL access: connection pool, health ping and schema bootstrap

pub mod connection;
pub mod error;

pub use connection::{Database, DatabaseConfig};
pub use error::{DbError, Result};
