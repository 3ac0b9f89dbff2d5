//! Draw engine: named pools of value tuples sampled without replacement.
//!
//! ## Module overview
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | `constraint` | `DrawConstraint`: predicate both backings evaluate (memory) or translate (SQL) |
//! | `memory`     | In-process pool: shuffled rows consumed round-robin, reshuffled on reset |
//! | `sqlite`     | Persistent pool: one table per source, draw stamps survive across runs |
//!
//! Every draw goes through [`draw`]: query, and when nothing qualifies reset
//! the whole pool and query exactly once more. A second empty answer means
//! the constraint is infeasible for the pool's full content.

pub mod constraint;
pub mod memory;
pub mod sqlite;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use rand::RngCore;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::sheet_engine::{
    config::{BackingKind, EngineConfig},
    error::{Result, SheetError},
    number::{Drawn, Value},
    sources::SourceKind,
};

pub use constraint::{DrawConstraint, EitherIn, FieldBound, Shape};
pub use memory::MemoryPool;
pub use sqlite::SqlitePool;

// ---------------------------------------------------------------------------
// Rows and layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    /// Decimal column holding at most this many decimal places.
    Decimal(u32),
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Value columns of a pool, in tuple order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLayout {
    pub columns: Vec<Column>,
}

impl PoolLayout {
    pub fn new(columns: &[(&'static str, ColumnKind)]) -> Self {
        PoolLayout {
            columns: columns.iter().map(|&(name, kind)| Column { name, kind }).collect(),
        }
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == field)
    }
}

/// One candidate tuple plus the precomputed flags constraints may ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRow {
    /// Identifying key within the pool.
    pub key: i64,
    pub values: Vec<Value>,
    pub coprime: bool,
    pub suits_for_deci1: bool,
    pub suits_for_deci2: bool,
    /// Rows sharing a lock class are locked together (equal products).
    pub lock_class: Option<i64>,
}

impl PoolRow {
    pub fn new(key: i64, values: Vec<Value>) -> Self {
        PoolRow {
            key,
            values,
            coprime: false,
            suits_for_deci1: false,
            suits_for_deci2: false,
            lock_class: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pool contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawResult {
    Found(PoolRow),
    Exhausted,
}

pub trait Pool {
    fn name(&self) -> &str;

    fn layout(&self) -> &PoolLayout;

    /// Pick one row that is neither drawn in the current pass nor locked and
    /// that satisfies `constraint`. Does not mark it.
    fn find(&mut self, constraint: &DrawConstraint, rng: &mut dyn RngCore) -> Result<DrawResult>;

    /// Stamp `row` as drawn; with `lock` set, lock its whole lock class.
    fn mark_drawn(&mut self, row: &PoolRow, lock: bool) -> Result<()>;

    /// Clear every draw stamp and lock of the pool.
    fn reset(&mut self, rng: &mut dyn RngCore) -> Result<()>;
}

/// First row matching `constraint`, falling back to the same constraint
/// without its last-draw exclusion.
fn find_relaxing(
    pool: &mut dyn Pool, constraint: &DrawConstraint, rng: &mut dyn RngCore,
) -> Result<DrawResult> {
    match pool.find(constraint, rng)? {
        DrawResult::Exhausted if !constraint.recent.is_empty() => {
            debug!(pool = pool.name(), "no row avoids the last draw, dropping that exclusion");
            pool.find(&constraint.without_recent(), rng)
        }
        found => Ok(found),
    }
}

/// Draw one tuple: attempt, reset on exhaustion, attempt once more.
///
/// Each attempt first honours the last-draw exclusion and only drops it
/// when no row of the current pass fits otherwise.
pub fn draw(
    pool: &mut dyn Pool, constraint: &DrawConstraint, rng: &mut dyn RngCore,
) -> Result<Drawn> {
    constraint.validate(pool.layout(), pool.name())?;

    let row = match find_relaxing(pool, constraint, rng)? {
        DrawResult::Found(row) => row,
        DrawResult::Exhausted => {
            debug!(pool = pool.name(), "no candidate left, resetting pool");
            pool.reset(rng)?;
            match find_relaxing(pool, constraint, rng)? {
                DrawResult::Found(row) => row,
                DrawResult::Exhausted => {
                    return Err(SheetError::Infeasible {
                        pool: pool.name().to_string(),
                        constraint: format!("{constraint:?}"),
                    })
                }
            }
        }
    };

    pool.mark_drawn(&row, constraint.lock_equal_products)?;
    debug!(pool = pool.name(), key = row.key, "drew row");
    Ok(Drawn::from_values(row.values))
}

/// Strictly increasing draw stamp, 0 being reserved for "never drawn".
pub(crate) fn next_stamp(last: &mut i64) -> i64 {
    let now = chrono::Utc::now().timestamp_micros();
    let stamp = now.max(*last + 1);
    *last = stamp;
    stamp
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub enum Backing {
    Memory,
    Sqlite(Rc<Connection>),
}

/// Lazily creates one pool per concrete source id.
pub struct PoolRegistry {
    backing: Backing,
    pools: HashMap<String, Box<dyn Pool>>,
}

impl PoolRegistry {
    pub fn in_memory() -> Self {
        PoolRegistry { backing: Backing::Memory, pools: HashMap::new() }
    }

    pub fn sqlite(conn: Connection) -> Self {
        PoolRegistry { backing: Backing::Sqlite(Rc::new(conn)), pools: HashMap::new() }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened pool database");
        Ok(Self::sqlite(conn))
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        match (config.backing, &config.database_path) {
            (BackingKind::Memory, _) => Ok(Self::in_memory()),
            (BackingKind::Sqlite, Some(path)) => Self::open(path),
            (BackingKind::Sqlite, None) => Ok(Self::sqlite(Connection::open_in_memory()?)),
        }
    }

    /// Draw from the pool behind `source_id`, creating it on first use.
    pub fn next(
        &mut self, source_id: &str, constraint: &DrawConstraint, rng: &mut dyn RngCore,
    ) -> Result<Drawn> {
        let pool = match self.pools.entry(source_id.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(build_pool(&self.backing, source_id, rng)?),
        };
        draw(pool.as_mut(), constraint, rng)
    }

    pub fn reset_all(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        for pool in self.pools.values_mut() {
            pool.reset(rng)?;
        }
        Ok(())
    }

    pub fn is_loaded(&self, source_id: &str) -> bool {
        self.pools.contains_key(source_id)
    }
}

fn build_pool(backing: &Backing, source_id: &str, rng: &mut dyn RngCore) -> Result<Box<dyn Pool>> {
    let kind = SourceKind::classify(source_id)?;
    if kind == SourceKind::Sentinel {
        return Err(SheetError::UnknownSource(source_id.to_string()));
    }
    Ok(match backing {
        Backing::Memory => Box::new(MemoryPool::new(source_id, kind.layout(), kind.rows(), rng)),
        Backing::Sqlite(conn) => Box::new(SqlitePool::open(Rc::clone(conn), source_id, &kind)?),
    })
}
