//! Postgres-backed store implementation.
//!
//! Runtime-checked queries with explicit binds; every transition commit runs
//! inside one SQL transaction so a crash mid-update cannot desynchronize a
//! record from its audit trail. The engine is synchronous and strictly
//! sequential, so this store bridges into sqlx with a current-thread tokio
//! runtime rather than exposing an async surface.
//!
//! Expected schema: see `migrations/0001_init.sql` in this crate.

use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::debug;

use basketflow_baskets::{BasketConfig, BasketKey, BasketSurface};
use basketflow_core::{BasketId, CompanyId, CustomerId, RepId};
use basketflow_customers::{
    CustomerRecord, CustomerTransition, InitialAssignment, ReturnLogEntry, TransitionLogEntry,
};

use super::{ConfigStore, CustomerStore, StoreError};

/// Postgres store for the rule catalog, customer records and audit logs.
pub struct PostgresStore {
    pool: PgPool,
    rt: tokio::runtime::Runtime,
}

impl PostgresStore {
    /// Connect with a small pool; the engine never issues concurrent queries.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let pool = rt
            .block_on(
                PgPoolOptions::new()
                    .max_connections(2)
                    .connect(database_url),
            )
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool, rt })
    }
}

fn map_sqlx(operation: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Connection(format!("{operation}: {e}"))
        }
        other => StoreError::Query(format!("{operation}: {other}")),
    }
}

fn parse_surface(value: &str) -> Result<BasketSurface, StoreError> {
    match value {
        "dashboard" => Ok(BasketSurface::Dashboard),
        "distribution" => Ok(BasketSurface::Distribution),
        other => Err(StoreError::Query(format!("unknown basket surface '{other}'"))),
    }
}

fn config_from_row(row: &PgRow) -> Result<BasketConfig, StoreError> {
    let surface: String = row
        .try_get("surface")
        .map_err(|e| StoreError::Query(e.to_string()))?;
    let get_err = |e: sqlx::Error| StoreError::Query(e.to_string());
    Ok(BasketConfig {
        id: BasketId::new(row.try_get::<i64, _>("id").map_err(get_err)?),
        key: BasketKey::from(row.try_get::<String, _>("basket_key").map_err(get_err)?),
        name: row.try_get("basket_name").map_err(get_err)?,
        surface: parse_surface(&surface)?,
        min_days_since_order: row.try_get("min_days_since_order").map_err(get_err)?,
        max_days_since_order: row.try_get("max_days_since_order").map_err(get_err)?,
        on_fail_basket_key: row
            .try_get::<Option<String>, _>("on_fail_basket_key")
            .map_err(get_err)?
            .map(BasketKey::from),
        on_fail_reevaluate: row.try_get("on_fail_reevaluate").map_err(get_err)?,
        fail_after_days: row.try_get("fail_after_days").map_err(get_err)?,
        max_distribution_count: row
            .try_get::<Option<i32>, _>("max_distribution_count")
            .map_err(get_err)?
            .map(|v| v.max(0) as u32),
        on_max_dist_basket_key: row
            .try_get::<Option<String>, _>("on_max_dist_basket_key")
            .map_err(get_err)?
            .map(BasketKey::from),
        hold_days_before_redistribute: row
            .try_get("hold_days_before_redistribute")
            .map_err(get_err)?,
        display_order: row.try_get("display_order").map_err(get_err)?,
        is_active: row.try_get("is_active").map_err(get_err)?,
    })
}

fn customer_from_row(row: &PgRow) -> Result<CustomerRecord, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::Query(e.to_string());
    Ok(CustomerRecord {
        id: CustomerId::new(row.try_get::<i64, _>("id").map_err(get_err)?),
        company_id: CompanyId::new(row.try_get::<i64, _>("company_id").map_err(get_err)?),
        first_name: row.try_get("first_name").map_err(get_err)?,
        last_name: row.try_get("last_name").map_err(get_err)?,
        current_basket_key: row
            .try_get::<Option<String>, _>("current_basket_key")
            .map_err(get_err)?
            .map(BasketKey::from),
        basket_entered_date: row.try_get("basket_entered_date").map_err(get_err)?,
        distribution_count: row
            .try_get::<i32, _>("distribution_count")
            .map_err(get_err)?
            .max(0) as u32,
        assigned_to: row
            .try_get::<Option<i64>, _>("assigned_to")
            .map_err(get_err)?
            .map(RepId::new),
        hold_until_date: row.try_get("hold_until_date").map_err(get_err)?,
        last_order_date: row.try_get("last_order_date").map_err(get_err)?,
        order_count: row.try_get::<i32, _>("order_count").map_err(get_err)?.max(0) as u32,
    })
}

const CUSTOMER_COLUMNS: &str = "id, company_id, first_name, last_name, current_basket_key, \
     basket_entered_date, distribution_count, assigned_to, hold_until_date, \
     last_order_date, order_count";

impl ConfigStore for PostgresStore {
    fn load_active(&self) -> Result<Vec<BasketConfig>, StoreError> {
        let rows = self
            .rt
            .block_on(
                sqlx::query(
                    "SELECT id, basket_key, basket_name, surface, min_days_since_order, \
                     max_days_since_order, on_fail_basket_key, on_fail_reevaluate, \
                     fail_after_days, max_distribution_count, on_max_dist_basket_key, \
                     hold_days_before_redistribute, display_order, is_active \
                     FROM basket_config WHERE is_active ORDER BY display_order, id",
                )
                .fetch_all(&self.pool),
            )
            .map_err(|e| map_sqlx("load_active", e))?;

        debug!(configs = rows.len(), "loaded basket catalog");
        rows.iter().map(config_from_row).collect()
    }
}

impl CustomerStore for PostgresStore {
    fn find_overdue(
        &self,
        company: CompanyId,
        basket_key: &BasketKey,
        fail_after_days: i64,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<CustomerRecord>, StoreError> {
        let cutoff = now - Duration::days(fail_after_days);
        let limit = limit.map_or(i64::MAX, |l| l as i64);
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE company_id = $1 \
               AND current_basket_key = $2 \
               AND basket_entered_date IS NOT NULL \
               AND basket_entered_date <= $3 \
               AND (hold_until_date IS NULL OR hold_until_date <= $4) \
             ORDER BY id LIMIT $5",
        );
        let rows = self
            .rt
            .block_on(
                sqlx::query(&sql)
                    .bind(company.get())
                    .bind(basket_key.as_str())
                    .bind(cutoff)
                    .bind(now)
                    .bind(limit)
                    .fetch_all(&self.pool),
            )
            .map_err(|e| map_sqlx("find_overdue", e))?;

        debug!(basket = %basket_key, matched = rows.len(), "overdue query");
        rows.iter().map(customer_from_row).collect()
    }

    fn find_unbasketed(
        &self,
        company: CompanyId,
        known_keys: &[BasketKey],
        limit: Option<usize>,
    ) -> Result<Vec<CustomerRecord>, StoreError> {
        let keys: Vec<String> = known_keys.iter().map(|k| k.as_str().to_string()).collect();
        let limit = limit.map_or(i64::MAX, |l| l as i64);
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE company_id = $1 \
               AND (current_basket_key IS NULL OR NOT (current_basket_key = ANY($2))) \
             ORDER BY id LIMIT $3",
        );
        let rows = self
            .rt
            .block_on(
                sqlx::query(&sql)
                    .bind(company.get())
                    .bind(&keys)
                    .bind(limit)
                    .fetch_all(&self.pool),
            )
            .map_err(|e| map_sqlx("find_unbasketed", e))?;

        rows.iter().map(customer_from_row).collect()
    }

    fn get(&self, id: CustomerId) -> Result<Option<CustomerRecord>, StoreError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = self
            .rt
            .block_on(sqlx::query(&sql).bind(id.get()).fetch_optional(&self.pool))
            .map_err(|e| map_sqlx("get", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    fn commit_transition(
        &self,
        transition: &CustomerTransition,
        transition_log: &TransitionLogEntry,
        return_log: &ReturnLogEntry,
    ) -> Result<(), StoreError> {
        self.rt.block_on(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;

            let updated = sqlx::query(
                "UPDATE customers SET \
                     current_basket_key = $1, \
                     basket_entered_date = $2, \
                     assigned_to = NULL, \
                     hold_until_date = $3, \
                     distribution_count = distribution_count + 1 \
                 WHERE id = $4",
            )
            .bind(transition.to_basket_key.as_str())
            .bind(transition.entered_at)
            .bind(transition.hold_until)
            .bind(transition.customer_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("commit_transition/update", e))?;

            if updated.rows_affected() == 0 {
                return Err(StoreError::CustomerNotFound(transition.customer_id));
            }

            insert_transition_log(&mut tx, transition_log).await?;

            sqlx::query(
                "INSERT INTO basket_return_log \
                     (id, customer_id, previous_assigned_to, reason, \
                      days_since_last_order, batch_date, recorded_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(return_log.id.0)
            .bind(return_log.customer_id.get())
            .bind(return_log.previous_assigned_to.map(RepId::get))
            .bind(&return_log.reason)
            .bind(return_log.days_since_last_order)
            .bind(return_log.batch_date)
            .bind(return_log.recorded_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("commit_transition/return_log", e))?;

            tx.commit()
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))
        })
    }

    fn commit_assignment(
        &self,
        assignment: &InitialAssignment,
        transition_log: &TransitionLogEntry,
    ) -> Result<(), StoreError> {
        self.rt.block_on(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;

            let updated = sqlx::query(
                "UPDATE customers SET \
                     current_basket_key = $1, \
                     basket_entered_date = COALESCE(basket_entered_date, $2) \
                 WHERE id = $3",
            )
            .bind(assignment.to_basket_key.as_str())
            .bind(assignment.assigned_at)
            .bind(assignment.customer_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("commit_assignment/update", e))?;

            if updated.rows_affected() == 0 {
                return Err(StoreError::CustomerNotFound(assignment.customer_id));
            }

            insert_transition_log(&mut tx, transition_log).await?;

            tx.commit()
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))
        })
    }
}

async fn insert_transition_log(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: &TransitionLogEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO basket_transition_log \
             (id, customer_id, from_basket_key, to_basket_key, transition_type, \
              reason, note, triggered_by, recorded_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(entry.id.0)
    .bind(entry.customer_id.get())
    .bind(entry.from_basket_key.as_ref().map(|k| k.as_str()))
    .bind(entry.to_basket_key.as_str())
    .bind(entry.transition_type.to_string())
    .bind(&entry.reason)
    .bind(&entry.note)
    .bind(entry.triggered_by.map(RepId::get))
    .bind(entry.recorded_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx("transition_log", e))?;
    Ok(())
}
