//! Persistent pools backed by SQLite.
//!
//! One table per source id, populated on first use. The `drawn_at` stamp is
//! durable, so a row drawn in one run stays excluded in the next run until
//! the pool is exhausted and reset. Single writer only: the
//! exhausted/reset/retry sequence is not transactional.

use std::rc::Rc;

use rand::{Rng, RngCore};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use tracing::{debug, info};

use crate::sheet_engine::{
    error::{Result, SheetError},
    number::{Decimal, Value},
    pool::{
        constraint::sql_value, next_stamp, ColumnKind, DrawConstraint, DrawResult, Pool,
        PoolLayout, PoolRow,
    },
    sources::SourceKind,
};

pub struct SqlitePool {
    conn: Rc<Connection>,
    name: String,
    table: String,
    layout: PoolLayout,
    last_stamp: i64,
}

impl SqlitePool {
    pub fn open(conn: Rc<Connection>, source_id: &str, kind: &SourceKind) -> Result<Self> {
        if source_id.is_empty()
            || !source_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SheetError::UnknownSource(source_id.to_string()));
        }
        let layout = kind.layout();
        let table = format!("pool_{source_id}");

        let value_columns: Vec<&str> = layout.columns.iter().map(|c| c.name).collect();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY,
                {cols},
                coprime INTEGER NOT NULL DEFAULT 0,
                suits_for_deci1 INTEGER NOT NULL DEFAULT 0,
                suits_for_deci2 INTEGER NOT NULL DEFAULT 0,
                lock_class INTEGER,
                locked INTEGER NOT NULL DEFAULT 0,
                drawn_at INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_drawn ON {table}(drawn_at);",
            cols = value_columns.join(", "),
        ))?;

        let mut pool = SqlitePool {
            conn,
            name: source_id.to_string(),
            table,
            layout,
            last_stamp: 0,
        };

        let count: i64 = pool
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", pool.table), [], |r| r.get(0))?;
        if count == 0 {
            pool.populate(kind.rows())?;
        }
        pool.last_stamp = pool.conn.query_row(
            &format!("SELECT COALESCE(MAX(drawn_at), 0) FROM {}", pool.table),
            [],
            |r| r.get(0),
        )?;
        Ok(pool)
    }

    fn populate(&self, rows: Vec<PoolRow>) -> Result<()> {
        let cols: Vec<&str> = self.layout.columns.iter().map(|c| c.name).collect();
        let marks = vec!["?"; cols.len() + 5].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}, coprime, suits_for_deci1, suits_for_deci2, lock_class, id) \
             VALUES ({marks})",
            self.table,
            cols.join(", "),
        );
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in &rows {
                let mut values: Vec<SqlValue> = row.values.iter().map(sql_value).collect();
                values.push(SqlValue::Integer(row.coprime as i64));
                values.push(SqlValue::Integer(row.suits_for_deci1 as i64));
                values.push(SqlValue::Integer(row.suits_for_deci2 as i64));
                values.push(row.lock_class.map_or(SqlValue::Null, SqlValue::Integer));
                values.push(SqlValue::Integer(row.key));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        info!(pool = %self.name, rows = rows.len(), "populated pool table");
        Ok(())
    }

    fn read_row(&self, r: &Row<'_>) -> rusqlite::Result<PoolRow> {
        let mut values = Vec::with_capacity(self.layout.columns.len());
        for (i, column) in self.layout.columns.iter().enumerate() {
            let idx = i + 1;
            values.push(match column.kind {
                ColumnKind::Int => Value::Int(r.get(idx)?),
                ColumnKind::Decimal(places) => Value::Decimal(Decimal::from_f64(r.get(idx)?, places)),
                ColumnKind::Text => Value::Text(r.get(idx)?),
            });
        }
        let n = self.layout.columns.len();
        Ok(PoolRow {
            key: r.get(0)?,
            values,
            coprime: r.get::<_, i64>(n + 1)? != 0,
            suits_for_deci1: r.get::<_, i64>(n + 2)? != 0,
            suits_for_deci2: r.get::<_, i64>(n + 3)? != 0,
            lock_class: r.get(n + 4)?,
        })
    }

    /// Rows not drawn in the current pass.
    pub fn remaining(&self) -> Result<i64> {
        Ok(self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE drawn_at = 0", self.table),
            [],
            |r| r.get(0),
        )?)
    }
}

impl Pool for SqlitePool {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &PoolLayout {
        &self.layout
    }

    fn find(&mut self, constraint: &DrawConstraint, rng: &mut dyn RngCore) -> Result<DrawResult> {
        let (predicate, mut params) = constraint.to_sql(&self.layout);
        let filter = format!("drawn_at = 0 AND locked = 0 AND ({predicate})");

        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE {filter}", self.table),
            params_from_iter(params.iter()),
            |r| r.get(0),
        )?;
        if count == 0 {
            return Ok(DrawResult::Exhausted);
        }

        let offset = rng.gen_range(0..count);
        params.push(SqlValue::Integer(offset));
        let cols: Vec<&str> = self.layout.columns.iter().map(|c| c.name).collect();
        let sql = format!(
            "SELECT id, {}, coprime, suits_for_deci1, suits_for_deci2, lock_class \
             FROM {} WHERE {filter} ORDER BY id LIMIT 1 OFFSET ?",
            cols.join(", "),
            self.table,
        );
        let row = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |r| self.read_row(r))?;
        Ok(DrawResult::Found(row))
    }

    fn mark_drawn(&mut self, row: &PoolRow, lock: bool) -> Result<()> {
        let stamp = next_stamp(&mut self.last_stamp);
        self.conn.execute(
            &format!("UPDATE {} SET drawn_at = ?1 WHERE id = ?2", self.table),
            params![stamp, row.key],
        )?;
        if let (true, Some(class)) = (lock, row.lock_class) {
            self.conn.execute(
                &format!("UPDATE {} SET locked = 1 WHERE lock_class = ?1", self.table),
                params![class],
            )?;
        }
        Ok(())
    }

    fn reset(&mut self, _rng: &mut dyn RngCore) -> Result<()> {
        let cleared = self
            .conn
            .execute(&format!("UPDATE {} SET drawn_at = 0, locked = 0", self.table), [])?;
        debug!(pool = %self.name, rows = cleared, "reset pool table");
        Ok(())
    }
}
