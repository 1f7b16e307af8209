use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::math;
use super::spot::SpotId;

/// An accepted link between two objects, weighted by its realized cost.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub source: SpotId,
    pub target: SpotId,
    pub weight: f64,
}

impl Edge {
    /// Endpoints with the smaller id first.
    pub fn key(&self) -> (SpotId, SpotId) {
        edge_key(self.source, self.target)
    }
}

fn edge_key(a: SpotId, b: SpotId) -> (SpotId, SpotId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Undirected weighted graph of objects (vertices) and accepted links (edges).
///
/// Vertices are keyed by object identity, so the edge set does not depend on
/// the order in which links were inserted.
#[derive(Clone, Debug, Default)]
pub struct TrajectoryGraph {
    adjacency: BTreeMap<SpotId, Vec<SpotId>>,
    edge_index: HashMap<(SpotId, SpotId), usize>,
    edges: Vec<Edge>,
}

impl TrajectoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the vertex already exists.
    pub fn add_vertex(&mut self, id: SpotId) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        self.adjacency.insert(id, Vec::new());
        true
    }

    /// Adds an undirected edge, creating missing endpoints. Self loops and
    /// repeated edges are refused and return `false`.
    pub fn add_edge(&mut self, source: SpotId, target: SpotId, weight: f64) -> bool {
        let key = edge_key(source, target);
        if source == target || self.edge_index.contains_key(&key) {
            return false;
        }
        self.adjacency.entry(source).or_default().push(target);
        self.adjacency.entry(target).or_default().push(source);
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            weight,
        });
        true
    }

    pub fn contains_vertex(&self, id: SpotId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn contains_edge(&self, a: SpotId, b: SpotId) -> bool {
        self.edge_index.contains_key(&edge_key(a, b))
    }

    pub fn edge_weight(&self, a: SpotId, b: SpotId) -> Option<f64> {
        self.edge_index
            .get(&edge_key(a, b))
            .map(|&at| self.edges[at].weight)
    }

    pub fn neighbors(&self, id: SpotId) -> &[SpotId] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, id: SpotId) -> usize {
        self.neighbors(id).len()
    }

    /// Vertex ids, ascending.
    pub fn vertices(&self) -> impl Iterator<Item = SpotId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges normalized to `source < target` and sorted by endpoints.
    pub fn sorted_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .edges
            .iter()
            .map(|e| {
                let (source, target) = e.key();
                Edge {
                    source,
                    target,
                    weight: e.weight,
                }
            })
            .collect();
        edges.sort_by_key(|e| (e.source, e.target));
        edges
    }

    /// Connected components, each sorted by id, ordered by smallest id.
    /// Isolated vertices form singleton components.
    pub fn connected_components(&self) -> Vec<Vec<SpotId>> {
        let ids: Vec<SpotId> = self.vertices().collect();
        let position: HashMap<SpotId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut parent: Vec<usize> = (0..ids.len()).collect();
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (position.get(&edge.source), position.get(&edge.target)) {
                math::union(&mut parent, a, b);
            }
        }

        let entries: Vec<(usize, SpotId)> = ids.iter().copied().enumerate().collect();
        math::collect_groups(&mut parent, &entries)
    }
}
