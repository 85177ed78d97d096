//! Postgres-backed repositories.
//!
//! Each record kind lives in its own table (`key`, `version`, `body` JSONB).
//! Updates are a single `UPDATE ... WHERE version = $expected`, so two writers
//! holding the same version cannot both succeed even across processes.
//!
//! Scoped listings become `body->>'field' = $n` predicates, matching the
//! expression indexes in the migration.
//!
//! The [`Repository`] trait is synchronous. Calls bridge into the ambient tokio
//! runtime with `block_in_place`, which needs the multi-threaded runtime.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use gymops_core::ExpectedVersion;
use gymops_inventory::{Alert, Item, Movement, StockEntry};
use gymops_replenishment::InternalOrder;

use super::{OrderNumberSequence, Record, Repository, RepositoryError, Scope, Stores};

const SCHEMA: &str = include_str!("../../migrations/0001_inventory.sql");

fn backend(err: impl core::fmt::Display) -> RepositoryError {
    RepositoryError::Backend(err.to_string())
}

fn block_on<F: Future>(future: F) -> Result<F::Output, RepositoryError> {
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|e| backend(format!("no tokio runtime available: {e}")))?;
    Ok(tokio::task::block_in_place(|| handle.block_on(future)))
}

fn decode<V: Record>(row: &sqlx::postgres::PgRow) -> Result<V, RepositoryError> {
    let body: serde_json::Value = row.try_get("body").map_err(backend)?;
    serde_json::from_value(body).map_err(backend)
}

fn to_db_version(version: u64) -> Result<i64, RepositoryError> {
    i64::try_from(version).map_err(backend)
}

/// A unique index other than the primary key (one open alert per stock key)
/// surfaces as `Duplicate`, like a key collision.
fn write_error(kind: &'static str, key: &str, err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Duplicate {
            kind,
            key: key.to_string(),
        },
        _ => backend(err),
    }
}

/// `body->>'field'`. Field names are inlined so the planner can match
/// expression indexes, hence the identifier check.
fn json_field(name: &str) -> Result<String, RepositoryError> {
    let plain = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if !plain {
        return Err(backend(format!("invalid scope field {name:?}")));
    }
    Ok(format!("body->>'{name}'"))
}

/// `SELECT` over `table` restricted by `scope`, plus the values to bind in order.
fn scoped_select(table: &str, scope: &Scope) -> Result<(String, Vec<String>), RepositoryError> {
    let mut sql = format!("SELECT body FROM {table}");
    let mut binds = Vec::with_capacity(scope.clauses().len());
    for (i, clause) in scope.clauses().iter().enumerate() {
        let placeholder = i + 1;
        let alternatives = clause
            .fields
            .iter()
            .map(|f| json_field(f).map(|expr| format!("{expr} = ${placeholder}")))
            .collect::<Result<Vec<_>, _>>()?;
        sql.push_str(if i == 0 { " WHERE (" } else { " AND (" });
        sql.push_str(&alternatives.join(" OR "));
        sql.push(')');
        binds.push(clause.value.clone());
    }
    sql.push_str(" ORDER BY seq");
    Ok((sql, binds))
}

pub struct PostgresRepository<V> {
    pool: Arc<PgPool>,
    _value: PhantomData<fn() -> V>,
}

impl<V> PostgresRepository<V> {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _value: PhantomData,
        }
    }
}

impl<V: Record> Repository<V> for PostgresRepository<V> {
    #[instrument(skip(self), fields(kind = V::KIND, operation))]
    fn get(&self, key: &V::Key) -> Result<Option<V>, RepositoryError> {
        Span::current().record("operation", "get");
        let sql = format!("SELECT body FROM {} WHERE key = $1", V::KIND);
        let row = block_on(
            sqlx::query(&sql)
                .bind(key.to_string())
                .fetch_optional(&*self.pool),
        )?
        .map_err(backend)?;

        row.as_ref().map(decode::<V>).transpose()
    }

    #[instrument(skip(self, filter), fields(kind = V::KIND))]
    fn list_scoped(&self, scope: &Scope, filter: &dyn Fn(&V) -> bool) -> Result<Vec<V>, RepositoryError> {
        let (sql, binds) = scoped_select(V::KIND, scope)?;
        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value.as_str());
        }
        let rows = block_on(query.fetch_all(&*self.pool))?.map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let value = decode::<V>(row)?;
            if filter(&value) {
                out.push(value);
            }
        }
        Ok(out)
    }

    #[instrument(skip(self, value), fields(kind = V::KIND, key = %value.key()))]
    fn insert(&self, value: V) -> Result<(), RepositoryError> {
        let key = value.key().to_string();
        let body = serde_json::to_value(&value).map_err(backend)?;
        let sql = format!(
            "INSERT INTO {} (key, version, body) VALUES ($1, $2, $3) ON CONFLICT (key) DO NOTHING",
            V::KIND
        );

        let result = block_on(
            sqlx::query(&sql)
                .bind(&key)
                .bind(to_db_version(value.version())?)
                .bind(body)
                .execute(&*self.pool),
        )?
        .map_err(|e| write_error(V::KIND, &key, e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Duplicate { kind: V::KIND, key });
        }
        Ok(())
    }

    #[instrument(skip(self, value), fields(kind = V::KIND, key = %value.key()))]
    fn update(&self, value: V, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        let key = value.key().to_string();
        let body = serde_json::to_value(&value).map_err(backend)?;
        let expected_db = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(to_db_version(v)?),
        };
        let sql = format!(
            "UPDATE {} SET version = $2, body = $3 WHERE key = $1 AND ($4::BIGINT IS NULL OR version = $4)",
            V::KIND
        );

        let pool = self.pool.clone();
        let new_version = to_db_version(value.version())?;
        let (updated, current) = block_on(async move {
            let result = sqlx::query(&sql)
                .bind(&key)
                .bind(new_version)
                .bind(body)
                .bind(expected_db)
                .execute(&*pool)
                .await?;
            if result.rows_affected() > 0 {
                return Ok::<_, sqlx::Error>((true, None));
            }
            let current: Option<i64> =
                sqlx::query_scalar(&format!("SELECT version FROM {} WHERE key = $1", V::KIND))
                    .bind(&key)
                    .fetch_optional(&*pool)
                    .await?;
            Ok((false, current))
        })?
        .map_err(|e| write_error(V::KIND, &value.key().to_string(), e))?;

        if updated {
            return Ok(());
        }
        let key = value.key().to_string();
        match current {
            None => Err(RepositoryError::Missing { kind: V::KIND, key }),
            Some(actual) => Err(RepositoryError::Conflict {
                kind: V::KIND,
                key,
                expected,
                actual: u64::try_from(actual).unwrap_or_default(),
            }),
        }
    }
}

/// Order numbers from the `order_number_seq` database sequence.
pub struct PostgresOrderSequence {
    pool: Arc<PgPool>,
}

impl PostgresOrderSequence {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

impl OrderNumberSequence for PostgresOrderSequence {
    fn next_value(&self) -> Result<u64, RepositoryError> {
        let value: i64 = block_on(
            sqlx::query_scalar("SELECT nextval('order_number_seq')").fetch_one(&*self.pool),
        )?
        .map_err(backend)?;
        u64::try_from(value).map_err(backend)
    }
}

/// Connection pool plus schema setup for the Postgres backend.
#[derive(Clone)]
pub struct PostgresStores {
    pool: Arc<PgPool>,
}

impl PostgresStores {
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(backend)?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Create tables and the order sequence if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    pub fn stores(&self) -> Stores {
        Stores {
            items: Arc::new(PostgresRepository::<Item>::new(self.pool.clone())),
            stock: Arc::new(PostgresRepository::<StockEntry>::new(self.pool.clone())),
            movements: Arc::new(PostgresRepository::<Movement>::new(self.pool.clone())),
            alerts: Arc::new(PostgresRepository::<Alert>::new(self.pool.clone())),
            orders: Arc::new(PostgresRepository::<InternalOrder>::new(self.pool.clone())),
            order_numbers: Arc::new(PostgresOrderSequence::new(self.pool.clone())),
        }
    }
}
