//! Persistence gateway over the relational store.
//!
//! Row-level semantics matter here: price tables are upserted by pair,
//! indicator rows are update-only (a missing row is a logged no-op), and
//! config timestamps are update-only. Writers never take locks — concurrent
//! invocations race with last-write-wins.

mod market;
mod signals;
mod system;

pub use system::UpdateAges;

use sqlx::SqlitePool;

/// Cloneable handle to the data store, shared by jobs and the API.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// In-memory database with migrations applied. Single connection — each
    /// new `:memory:` connection would otherwise be a fresh empty database.
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }
}
