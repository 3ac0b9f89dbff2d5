use rand::{Rng, RngCore};

use crate::sheet_engine::{
    error::Result,
    pool::{next_stamp, DrawConstraint, DrawResult, Pool, PoolLayout, PoolRow},
};

/// In-process pool: rows are shuffled once and dealt round-robin from a
/// cursor, skipping rows already drawn in this pass or locked.
pub struct MemoryPool {
    name: String,
    layout: PoolLayout,
    rows: Vec<PoolRow>,
    order: Vec<usize>,
    cursor: usize,
    drawn_at: Vec<i64>,
    locked: Vec<bool>,
    last_stamp: i64,
}

impl MemoryPool {
    /// Build the pool and shuffle it with `rng`. Row keys are rewritten to
    /// their index.
    pub fn new(
        name: &str, layout: PoolLayout, rows: Vec<PoolRow>, rng: &mut dyn RngCore,
    ) -> Self {
        let rows: Vec<PoolRow> = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                row.key = i as i64;
                row
            })
            .collect();
        let n = rows.len();
        let mut pool = MemoryPool {
            name: name.to_string(),
            layout,
            rows,
            order: (0..n).collect(),
            cursor: 0,
            drawn_at: vec![0; n],
            locked: vec![false; n],
            last_stamp: 0,
        };
        pool.shuffle(rng);
        pool
    }

    // Fisher-Yates shuffle
    fn shuffle(&mut self, rng: &mut dyn RngCore) {
        for i in (1..self.order.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.order.swap(i, j);
        }
        self.cursor = 0;
    }

    /// Rows not drawn in the current pass.
    pub fn remaining(&self) -> usize {
        self.drawn_at.iter().filter(|&&stamp| stamp == 0).count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Pool for MemoryPool {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &PoolLayout {
        &self.layout
    }

    fn find(&mut self, constraint: &DrawConstraint, _rng: &mut dyn RngCore) -> Result<DrawResult> {
        let n = self.order.len();
        for step in 0..n {
            let idx = self.order[(self.cursor + step) % n];
            if self.drawn_at[idx] != 0 || self.locked[idx] {
                continue;
            }
            if constraint.matches(&self.layout, &self.rows[idx]) {
                self.cursor = (self.cursor + step + 1) % n;
                return Ok(DrawResult::Found(self.rows[idx].clone()));
            }
        }
        Ok(DrawResult::Exhausted)
    }

    fn mark_drawn(&mut self, row: &PoolRow, lock: bool) -> Result<()> {
        let stamp = next_stamp(&mut self.last_stamp);
        if let Some(slot) = self.drawn_at.get_mut(row.key as usize) {
            *slot = stamp;
        }
        if let (true, Some(class)) = (lock, row.lock_class) {
            for (i, r) in self.rows.iter().enumerate() {
                if r.lock_class == Some(class) {
                    self.locked[i] = true;
                }
            }
        }
        Ok(())
    }

    fn reset(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.drawn_at.iter_mut().for_each(|stamp| *stamp = 0);
        self.locked.iter_mut().for_each(|l| *l = false);
        self.shuffle(rng);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_engine::number::Value;
    use crate::sheet_engine::pool::draw;
    use crate::sheet_engine::sources::SourceKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(tag: &str, rng: &mut StdRng) -> MemoryPool {
        let kind = SourceKind::classify(tag).unwrap();
        MemoryPool::new(tag, kind.layout(), kind.rows(), rng)
    }

    #[test]
    fn keys_are_unique_after_build() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = pool("intpairs_2to9", &mut rng);
        let mut keys: Vec<i64> = p.rows.iter().map(|r| r.key).collect();
        keys.dedup();
        assert_eq!(keys.len(), p.len());
    }

    #[test]
    fn every_draw_consumes_one_row() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut p = pool("intpairs_2to9", &mut rng);
        let total = p.remaining();
        draw(&mut p, &DrawConstraint::default(), &mut rng).unwrap();
        draw(&mut p, &DrawConstraint::default(), &mut rng).unwrap();
        assert_eq!(p.remaining(), total - 2);
    }

    #[test]
    fn locking_excludes_equal_products() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = pool("intpairs_2to9", &mut rng);
        let mut c = DrawConstraint::default()
            .pin("nb1", Value::Int(2))
            .pin("nb2", Value::Int(6));
        c.lock_equal_products = true;
        draw(&mut p, &c, &mut rng).unwrap();
        // 3 x 4 has the same product as 2 x 6 and is now locked.
        let twin = DrawConstraint::default()
            .pin("nb1", Value::Int(3))
            .pin("nb2", Value::Int(4));
        assert_eq!(p.find(&twin, &mut rng).unwrap(), DrawResult::Exhausted);
        p.reset(&mut rng).unwrap();
        assert!(matches!(p.find(&twin, &mut rng).unwrap(), DrawResult::Found(_)));
    }

    #[test]
    fn empty_pool_is_exhausted() {
        let mut rng = StdRng::seed_from_u64(0);
        let kind = SourceKind::classify("intpairs_2to9").unwrap();
        let mut p = MemoryPool::new("empty", kind.layout(), Vec::new(), &mut rng);
        assert!(p.is_empty());
        assert_eq!(p.find(&DrawConstraint::default(), &mut rng).unwrap(), DrawResult::Exhausted);
    }
}
