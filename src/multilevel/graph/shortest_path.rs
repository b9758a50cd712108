//! Dijkstra and A* over a [`Roadmap`]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use super::roadmap::Roadmap;

/// Priority queue item, ordered for a min-heap on `cost`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueItem {
    cost: OrderedFloat<f64>,
    index: usize,
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single source shortest path tree
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub source: usize,
    pub distance: Vec<f64>,
    pub predecessor: Vec<Option<usize>>,
}

impl ShortestPaths {
    /// Vertex sequence from the source to `target`, if reached
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.distance[target].is_finite() {
            return None;
        }
        let mut path = vec![target];
        let mut v = target;
        while let Some(p) = self.predecessor[v] {
            path.push(p);
            v = p;
        }
        path.reverse();
        Some(path)
    }
}

/// Dijkstra from `source`. Vertices farther than `cutoff` are left at
/// infinite distance.
pub fn dijkstra(graph: &Roadmap, source: usize, cutoff: f64) -> ShortestPaths {
    let n = graph.num_vertices();
    let mut distance = vec![f64::INFINITY; n];
    let mut predecessor = vec![None; n];
    let mut heap = BinaryHeap::new();
    distance[source] = 0.0;
    heap.push(QueueItem {
        cost: OrderedFloat(0.0),
        index: source,
    });

    while let Some(QueueItem { cost, index }) = heap.pop() {
        if cost.0 > distance[index] {
            continue;
        }
        for edge in graph.neighbors(index) {
            let next = cost.0 + edge.weight;
            if next <= cutoff && next < distance[edge.target] {
                distance[edge.target] = next;
                predecessor[edge.target] = Some(index);
                heap.push(QueueItem {
                    cost: OrderedFloat(next),
                    index: edge.target,
                });
            }
        }
    }

    ShortestPaths {
        source,
        distance,
        predecessor,
    }
}

/// A* from `start` to `goal` with an admissible `heuristic`.
/// Returns the vertex sequence and its length.
pub fn astar<H>(graph: &Roadmap, start: usize, goal: usize, heuristic: H) -> Option<(Vec<usize>, f64)>
where
    H: Fn(usize) -> f64,
{
    let n = graph.num_vertices();
    let mut g_score = vec![f64::INFINITY; n];
    let mut came_from = vec![None; n];
    let mut closed = vec![false; n];
    let mut heap = BinaryHeap::new();
    g_score[start] = 0.0;
    heap.push(QueueItem {
        cost: OrderedFloat(heuristic(start)),
        index: start,
    });

    while let Some(QueueItem { index, .. }) = heap.pop() {
        if index == goal {
            let mut path = vec![goal];
            let mut v = goal;
            while let Some(p) = came_from[v] {
                path.push(p);
                v = p;
            }
            path.reverse();
            return Some((path, g_score[goal]));
        }
        if closed[index] {
            continue;
        }
        closed[index] = true;
        for edge in graph.neighbors(index) {
            let tentative = g_score[index] + edge.weight;
            if tentative < g_score[edge.target] {
                g_score[edge.target] = tentative;
                came_from[edge.target] = Some(index);
                heap.push(QueueItem {
                    cost: OrderedFloat(tentative + heuristic(edge.target)),
                    index: edge.target,
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::State;
    use crate::multilevel::graph::roadmap::Configuration;

    fn diamond() -> Roadmap {
        // 0 -1- 1 -1- 3, 0 -1- 2 -5- 3, 4 isolated
        let mut g = Roadmap::new();
        for i in 0..5 {
            g.add_vertex(Configuration::new(State::from_vec(vec![i as f64])));
        }
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 3, 1.0);
        g.add_edge(0, 2, 1.0);
        g.add_edge(2, 3, 5.0);
        g
    }

    #[test]
    fn test_dijkstra_distances() {
        let g = diamond();
        let sp = dijkstra(&g, 0, f64::INFINITY);
        assert_eq!(sp.distance[3], 2.0);
        assert_eq!(sp.path_to(3), Some(vec![0, 1, 3]));
        assert_eq!(sp.path_to(4), None);
    }

    #[test]
    fn test_dijkstra_cutoff() {
        let g = diamond();
        let sp = dijkstra(&g, 0, 1.5);
        assert_eq!(sp.distance[1], 1.0);
        assert!(sp.distance[3].is_infinite());
    }

    #[test]
    fn test_astar_matches_dijkstra() {
        let g = diamond();
        let (path, length) = astar(&g, 0, 3, |_| 0.0).unwrap();
        assert_eq!(path, vec![0, 1, 3]);
        assert_eq!(length, 2.0);
        assert!(astar(&g, 0, 4, |_| 0.0).is_none());
    }
}
