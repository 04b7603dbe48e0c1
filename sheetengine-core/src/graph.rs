//! The reference graph: a directed graph over cell [`Position`]s, mutated
//! exclusively through a copy+swap discipline so that a proposed edit can be
//! checked for cycles before it is ever made visible.
//!
//! Edges point `parent -> child`, where "child's formula references parent."
//! This direction is load-bearing: a depth-first walk starting at a changed
//! cell reaches exactly the cells whose cached value might depend on it
//! (see [`ReferenceGraph::dfs`] and `manager::DependencyManager::invalidate`).

use std::collections::{BTreeMap, BTreeSet};

use crate::position::Position;

#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    children_of: BTreeMap<Position, BTreeSet<Position>>,
    vertices: BTreeSet<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge `parent -> child`, registering both endpoints as
    /// vertices. Idempotent.
    pub fn add_edge(&mut self, parent: Position, child: Position) {
        self.vertices.insert(parent);
        self.vertices.insert(child);
        self.children_of.entry(parent).or_default().insert(child);
    }

    /// Removes the edge `parent -> child` if present. Vertices are retained
    /// even if this was their last edge.
    pub fn remove_edge(&mut self, parent: Position, child: Position) {
        if let Some(children) = self.children_of.get_mut(&parent) {
            children.remove(&child);
        }
    }

    /// Exchanges the contents of two graphs.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Visits every vertex reachable from `start` (including `start` itself)
    /// exactly once, pre-order along outgoing edges.
    pub fn dfs(&self, start: Position, mut visit: impl FnMut(Position)) {
        let mut visited = BTreeSet::new();
        self.dfs_rec(start, &mut visited, &mut visit);
    }

    fn dfs_rec(
        &self,
        vertex: Position,
        visited: &mut BTreeSet<Position>,
        visit: &mut impl FnMut(Position),
    ) {
        if !visited.insert(vertex) {
            return;
        }
        visit(vertex);
        if let Some(children) = self.children_of.get(&vertex) {
            for &child in children {
                self.dfs_rec(child, visited, visit);
            }
        }
    }

    /// `true` iff the graph contains a cycle, checked via white/gray/black
    /// coloring DFS over every vertex (so disconnected components are all
    /// covered, not just those reachable from one root).
    pub fn is_cyclic(&self) -> bool {
        let mut colors: BTreeMap<Position, Color> =
            self.vertices.iter().map(|&v| (v, Color::White)).collect();

        for &vertex in &self.vertices {
            if colors[&vertex] == Color::White && self.is_cyclic_from(vertex, &mut colors) {
                return true;
            }
        }
        false
    }

    fn is_cyclic_from(&self, vertex: Position, colors: &mut BTreeMap<Position, Color>) -> bool {
        colors.insert(vertex, Color::Gray);

        if let Some(children) = self.children_of.get(&vertex) {
            for &child in children {
                match colors.get(&child).copied().unwrap_or(Color::White) {
                    Color::Gray => return true,
                    Color::White => {
                        if self.is_cyclic_from(child, colors) {
                            return true;
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        colors.insert(vertex, Color::Black);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn add_edge_is_idempotent() {
        let mut g = ReferenceGraph::new();
        g.add_edge(pos(0, 0), pos(0, 1));
        g.add_edge(pos(0, 0), pos(0, 1));
        let mut seen = vec![];
        g.dfs(pos(0, 0), |v| seen.push(v));
        assert_eq!(seen, vec![pos(0, 0), pos(0, 1)]);
    }

    #[test]
    fn remove_edge_no_op_when_absent() {
        let mut g = ReferenceGraph::new();
        g.remove_edge(pos(0, 0), pos(0, 1));
        assert!(!g.is_cyclic());
    }

    #[test]
    fn detects_direct_cycle() {
        let mut g = ReferenceGraph::new();
        g.add_edge(pos(0, 0), pos(0, 1));
        g.add_edge(pos(0, 1), pos(0, 0));
        assert!(g.is_cyclic());
    }

    #[test]
    fn detects_longer_cycle() {
        let mut g = ReferenceGraph::new();
        g.add_edge(pos(0, 0), pos(0, 1));
        g.add_edge(pos(0, 1), pos(0, 2));
        g.add_edge(pos(0, 2), pos(0, 0));
        assert!(g.is_cyclic());
    }

    #[test]
    fn acyclic_dag_is_not_cyclic() {
        let mut g = ReferenceGraph::new();
        g.add_edge(pos(0, 0), pos(0, 1));
        g.add_edge(pos(0, 0), pos(0, 2));
        g.add_edge(pos(0, 1), pos(0, 3));
        g.add_edge(pos(0, 2), pos(0, 3));
        assert!(!g.is_cyclic());
    }

    #[test]
    fn dfs_visits_each_vertex_once_on_diamond() {
        let mut g = ReferenceGraph::new();
        g.add_edge(pos(0, 0), pos(0, 1));
        g.add_edge(pos(0, 0), pos(0, 2));
        g.add_edge(pos(0, 1), pos(0, 3));
        g.add_edge(pos(0, 2), pos(0, 3));

        let mut seen = vec![];
        g.dfs(pos(0, 0), |v| seen.push(v));
        assert_eq!(seen.len(), 4);
        assert!(seen.contains(&pos(0, 3)));
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut a = ReferenceGraph::new();
        a.add_edge(pos(0, 0), pos(0, 1));
        let mut b = ReferenceGraph::new();
        b.add_edge(pos(1, 0), pos(1, 1));

        a.swap(&mut b);

        let mut seen_a = vec![];
        a.dfs(pos(1, 0), |v| seen_a.push(v));
        assert_eq!(seen_a, vec![pos(1, 0), pos(1, 1)]);

        let mut seen_b = vec![];
        b.dfs(pos(0, 0), |v| seen_b.push(v));
        assert_eq!(seen_b, vec![pos(0, 0), pos(0, 1)]);
    }
}
