//! Owns the reference graph, the parent-set index, and the value cache; the
//! sole mediator of graph mutation and cache invalidation.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::cell::CellValue;
use crate::graph::ReferenceGraph;
use crate::position::Position;

#[derive(Debug, Default)]
pub struct DependencyManager {
    graph: ReferenceGraph,
    /// Exact parent set backing each committed cell's edges, used to diff
    /// edges on update.
    parents: BTreeMap<Position, Vec<Position>>,
    /// `None`/absent means invalidated; present means memoized. Lives behind
    /// a `RefCell` so that evaluation (conceptually a `&self` read) can still
    /// memoize. No multi-thread synchronization is needed: this process is
    /// single-threaded cooperative, so a cell is never evaluated re-entrantly
    /// from two call stacks at once.
    cache: RefCell<BTreeMap<Position, CellValue>>,
}

impl DependencyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a brand-new vertex's parent set. Returns `false` (state
    /// unchanged) if doing so would create a cycle.
    pub fn try_add_new_vertex(&mut self, v: Position, parents: Vec<Position>) -> bool {
        if parents.is_empty() {
            self.parents.insert(v, parents);
            return true;
        }

        let mut candidate = self.graph.clone();
        for &p in &parents {
            candidate.add_edge(p, v);
        }

        if candidate.is_cyclic() {
            return false;
        }

        self.graph.swap(&mut candidate);
        self.parents.insert(v, parents);
        true
    }

    /// Replaces an existing vertex's parent set, diffing against the
    /// previously committed one. On success, invalidates the cache of every
    /// transitive dependent of `v` (including `v` itself). Returns `false`
    /// (state unchanged) if the new parent set would create a cycle.
    pub fn try_update_vertex(&mut self, v: Position, parents: Vec<Position>) -> bool {
        let previous = self.parents.get(&v).cloned().unwrap_or_default();

        let mut candidate = self.graph.clone();
        for &p in &previous {
            candidate.remove_edge(p, v);
        }
        for &p in &parents {
            candidate.add_edge(p, v);
        }

        if candidate.is_cyclic() {
            return false;
        }

        self.graph.swap(&mut candidate);
        self.invalidate(v);
        self.parents.insert(v, parents);
        true
    }

    pub fn is_cached(&self, p: Position) -> bool {
        self.cache.borrow().contains_key(&p)
    }

    /// Returns the cached value. Panics if `p` is not cached; callers must
    /// guard with [`is_cached`](Self::is_cached).
    pub fn get_cached(&self, p: Position) -> CellValue {
        self.cache
            .borrow()
            .get(&p)
            .cloned()
            .expect("get_cached called without a prior is_cached check")
    }

    pub fn put_cache(&self, p: Position, value: CellValue) {
        self.cache.borrow_mut().insert(p, value);
    }

    /// Walks the downstream transitive closure from `v` (every cell that
    /// references `v` directly or transitively, per the graph's parent->child
    /// edge direction) and evicts each from the cache.
    pub fn invalidate(&self, v: Position) {
        let mut cache = self.cache.borrow_mut();
        self.graph.dfs(v, |x| {
            cache.remove(&x);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn add_new_vertex_with_no_parents_always_succeeds() {
        let mut m = DependencyManager::new();
        assert!(m.try_add_new_vertex(pos(0, 0), vec![]));
    }

    #[test]
    fn add_new_vertex_rejects_self_cycle() {
        let mut m = DependencyManager::new();
        assert!(!m.try_add_new_vertex(pos(0, 0), vec![pos(0, 0)]));
        assert!(!m.is_cached(pos(0, 0)));
    }

    #[test]
    fn invalidate_clears_transitive_dependents() {
        let mut m = DependencyManager::new();
        assert!(m.try_add_new_vertex(pos(0, 0), vec![])); // A1
        assert!(m.try_add_new_vertex(pos(0, 1), vec![pos(0, 0)])); // A2 = f(A1)
        assert!(m.try_add_new_vertex(pos(0, 2), vec![pos(0, 1)])); // A3 = f(A2)

        m.put_cache(pos(0, 0), CellValue::Number(1.0));
        m.put_cache(pos(0, 1), CellValue::Number(2.0));
        m.put_cache(pos(0, 2), CellValue::Number(3.0));

        // update A1's parents (still none) triggers invalidation from A1 downstream.
        assert!(m.try_update_vertex(pos(0, 0), vec![]));

        assert!(!m.is_cached(pos(0, 0)));
        assert!(!m.is_cached(pos(0, 1)));
        assert!(!m.is_cached(pos(0, 2)));
    }

    #[test]
    fn invalidate_does_not_touch_unrelated_cells() {
        let mut m = DependencyManager::new();
        assert!(m.try_add_new_vertex(pos(0, 0), vec![]));
        assert!(m.try_add_new_vertex(pos(1, 0), vec![]));

        m.put_cache(pos(0, 0), CellValue::Number(1.0));
        m.put_cache(pos(1, 0), CellValue::Number(2.0));

        m.invalidate(pos(0, 0));

        assert!(!m.is_cached(pos(0, 0)));
        assert!(m.is_cached(pos(1, 0)));
    }

    #[test]
    fn rejected_update_leaves_cache_and_parents_untouched() {
        let mut m = DependencyManager::new();
        assert!(m.try_add_new_vertex(pos(0, 0), vec![pos(0, 1)])); // A1 = f(B1)
        assert!(m.try_add_new_vertex(pos(0, 1), vec![])); // B1
        m.put_cache(pos(0, 1), CellValue::Number(7.0));

        // B1 = f(A1) would close the cycle A1 -> B1 -> A1.
        assert!(!m.try_update_vertex(pos(0, 1), vec![pos(0, 0)]));
        assert!(m.is_cached(pos(0, 1)));
    }
}
