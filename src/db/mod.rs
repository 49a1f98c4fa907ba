//! Database layer: pool, schema, and user queries for PostgreSQL.

mod pool;
mod users;

pub use pool::{create_pool, ensure_schema, DbPool};
pub use users::*;
