//! Incremental union-find over graph vertex ids

use std::cmp::Ordering;

/// Disjoint sets with path compression and union by rank. Elements are
/// appended one at a time as vertices enter the graph.
#[derive(Debug, Clone, Default)]
pub struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<usize>,
    num_components: usize,
}

impl DisjointSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new singleton set and return its element id
    pub fn make_set(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        self.num_components += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    /// Merge the sets of `x` and `y`; false if they were already merged
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return false;
        }
        match self.rank[root_x].cmp(&self.rank[root_y]) {
            Ordering::Less => self.parent[root_x] = root_y,
            Ordering::Greater => self.parent[root_y] = root_x,
            Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
        self.num_components -= 1;
        true
    }

    pub fn same_component(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }

    pub fn components(&self) -> usize {
        self.num_components
    }

    pub fn clear(&mut self) {
        self.parent.clear();
        self.rank.clear();
        self.num_components = 0;
    }
}
