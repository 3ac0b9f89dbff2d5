//! Cycle tracking for symbolic subkinds and symbolic number sources.
//!
//! A symbolic name stands for a menu of concrete names. Each time it is
//! unpacked, one member not yet used in the current cycle is drawn; once
//! every member has been used the cycle starts over with the full menu.
//! The tracker is owned by the sheet context, so cycles span the exercises
//! of one sheet and never leak into the next generation run.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct UnpackTracker {
    used: HashMap<String, HashSet<String>>,
}

impl UnpackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one member of `menu` that has not been used in `cycle` yet.
    ///
    /// Returns `None` only for an empty menu.
    pub fn unpack<R: Rng + ?Sized>(
        &mut self, cycle: &str, menu: &[&str], rng: &mut R,
    ) -> Option<String> {
        let used = self.used.entry(cycle.to_string()).or_default();
        let mut remaining: Vec<&str> = menu
            .iter()
            .copied()
            .filter(|m| !used.contains(*m))
            .collect();
        if remaining.is_empty() {
            used.clear();
            remaining = menu.to_vec();
        }
        let pick = *remaining.choose(rng)?;
        used.insert(pick.to_string());
        Some(pick.to_string())
    }

    /// Record a concrete member requested directly, without drawing.
    pub fn mark_used(&mut self, cycle: &str, member: &str) {
        self.used
            .entry(cycle.to_string())
            .or_default()
            .insert(member.to_string());
    }

    pub fn used_in(&self, cycle: &str) -> usize {
        self.used.get(cycle).map_or(0, HashSet::len)
    }
}
