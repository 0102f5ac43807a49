//! Community detection over the thought graph.
//!
//! The default detector is a seeded multi-level Louvain run on the undirected
//! projection of the graph. Bridge thoughts are the nodes with the highest
//! betweenness centrality on the directed graph, with `1 / strength` as the
//! edge distance.

use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::graph::ThoughtGraph;
use crate::error::ClusteringError;

#[cfg(test)]
#[path = "community_tests.rs"]
mod community_tests;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Number of bridge thoughts reported per run.
pub const DEFAULT_BRIDGE_COUNT: usize = 3;

/// Stop a Louvain level once modularity improves by less than this.
const MIN_MODULARITY_GAIN: f64 = 1e-7;

/// Gains and distances closer than this are treated as equal.
const EPSILON: f64 = 1e-12;

/// One node's cluster label, as reported in the pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    pub thought_id: String,
    pub cluster_id: usize,
}

/// Cluster label per node, indexed by insertion position.
///
/// Labels are `0..cluster_count` and numbered in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    labels: Vec<usize>,
    cluster_count: usize,
}

impl Partition {
    /// Build from arbitrary labels, renumbering by first appearance.
    pub fn from_labels(raw: &[usize]) -> Self {
        let mut renumbered: HashMap<usize, usize> = HashMap::new();
        let labels = raw
            .iter()
            .map(|label| {
                let next = renumbered.len();
                *renumbered.entry(*label).or_insert(next)
            })
            .collect();
        Self {
            labels,
            cluster_count: renumbered.len(),
        }
    }

    /// Every node in cluster 0.
    pub fn single(node_count: usize) -> Self {
        Self::from_labels(&vec![0; node_count])
    }

    /// Every node in its own cluster.
    pub fn singletons(node_count: usize) -> Self {
        Self::from_labels(&(0..node_count).collect::<Vec<_>>())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn cluster_of(&self, node: usize) -> Option<usize> {
        self.labels.get(node).copied()
    }

    /// Members of every cluster, by ascending cluster id.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.cluster_count];
        for (node, label) in self.labels.iter().enumerate() {
            clusters[*label].push(node);
        }
        clusters
    }

    /// Pair each thought of `graph` with its cluster.
    pub fn assignments(&self, graph: &ThoughtGraph) -> Vec<ClusterAssignment> {
        graph
            .thoughts()
            .zip(&self.labels)
            .map(|(thought, label)| ClusterAssignment {
                thought_id: thought.id().to_string(),
                cluster_id: *label,
            })
            .collect()
    }
}

/// Partitions a thought graph into clusters.
pub trait CommunityDetector: Send + Sync {
    /// Backend name, as used in configuration.
    fn name(&self) -> &'static str;

    fn partition(&self, graph: &ThoughtGraph) -> Result<Partition, ClusteringError>;
}

/// Resolve a detector by backend name.
pub fn detector_for(backend: &str, seed: u64) -> Result<Arc<dyn CommunityDetector>, ClusteringError> {
    match backend.trim().to_lowercase().as_str() {
        "louvain" => Ok(Arc::new(LouvainDetector::new(seed))),
        "single" => Ok(Arc::new(SingleClusterDetector)),
        other => Err(ClusteringError::Unavailable {
            backend: other.to_string(),
        }),
    }
}

/// Puts every thought into cluster 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleClusterDetector;

impl CommunityDetector for SingleClusterDetector {
    fn name(&self) -> &'static str {
        "single"
    }

    fn partition(&self, graph: &ThoughtGraph) -> Result<Partition, ClusteringError> {
        Ok(Partition::single(graph.node_count()))
    }
}

/// Seeded multi-level Louvain modularity optimisation.
#[derive(Debug, Clone, Copy)]
pub struct LouvainDetector {
    seed: u64,
    max_levels: usize,
}

impl LouvainDetector {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_levels: 32,
        }
    }

    /// Cap the number of aggregation levels
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels.max(1);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for LouvainDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl CommunityDetector for LouvainDetector {
    fn name(&self) -> &'static str {
        "louvain"
    }

    fn partition(&self, graph: &ThoughtGraph) -> Result<Partition, ClusteringError> {
        let node_count = graph.node_count();
        let edges = graph.undirected_edges();

        for &(a, b, weight) in &edges {
            if !weight.is_finite() || weight <= 0.0 {
                let id = |ix: usize| {
                    graph
                        .thoughts()
                        .nth(ix)
                        .map(|t| t.id().to_string())
                        .unwrap_or_default()
                };
                return Err(ClusteringError::InvalidWeight {
                    from: id(a),
                    to: id(b),
                    weight,
                });
            }
        }

        if edges.is_empty() {
            return Ok(Partition::singletons(node_count));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut current = WeightedGraph::from_edges(node_count, &edges);
        let mut membership: Vec<usize> = (0..node_count).collect();
        let mut modularity = current.modularity(&(0..node_count).collect::<Vec<_>>());

        for level in 0..self.max_levels {
            let communities = current.one_level(&mut rng);
            let new_modularity = current.modularity(&communities);
            if level > 0 && new_modularity - modularity < MIN_MODULARITY_GAIN {
                break;
            }

            let communities = renumber(&communities);
            for label in membership.iter_mut() {
                *label = communities[*label];
            }
            debug!(
                level,
                clusters = communities.iter().max().map_or(0, |m| m + 1),
                modularity = new_modularity,
                "Louvain level complete"
            );

            modularity = new_modularity;
            current = current.induced(&communities);
        }

        Ok(Partition::from_labels(&membership))
    }
}

/// Newman modularity of `partition` on the undirected projection of `graph`.
pub fn modularity(graph: &ThoughtGraph, partition: &Partition) -> f64 {
    WeightedGraph::from_edges(graph.node_count(), &graph.undirected_edges())
        .modularity(partition.labels())
}

fn renumber(labels: &[usize]) -> Vec<usize> {
    Partition::from_labels(labels).labels
}

/// Undirected weighted graph used by Louvain. Self loops carry the internal
/// weight of aggregated communities.
#[derive(Debug, Clone)]
struct WeightedGraph {
    adjacency: Vec<BTreeMap<usize, f64>>,
    loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight: f64,
}

impl WeightedGraph {
    fn from_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut adjacency = vec![BTreeMap::new(); node_count];
        let mut loops = vec![0.0; node_count];
        for &(a, b, w) in edges {
            if a == b {
                loops[a] += w;
            } else {
                *adjacency[a].entry(b).or_insert(0.0) += w;
                *adjacency[b].entry(a).or_insert(0.0) += w;
            }
        }

        let degrees: Vec<f64> = (0..node_count)
            .map(|n| adjacency[n].values().sum::<f64>() + 2.0 * loops[n])
            .collect();
        let total_weight = degrees.iter().sum::<f64>() / 2.0;

        Self {
            adjacency,
            loops,
            degrees,
            total_weight,
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    fn modularity(&self, communities: &[usize]) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let size = communities.iter().max().map_or(0, |m| m + 1);
        let mut internal = vec![0.0; size];
        let mut totals = vec![0.0; size];

        for node in 0..self.node_count() {
            let c = communities[node];
            totals[c] += self.degrees[node];
            internal[c] += self.loops[node];
            for (&neighbour, &w) in &self.adjacency[node] {
                if neighbour > node && communities[neighbour] == c {
                    internal[c] += w;
                }
            }
        }

        let m = self.total_weight;
        internal
            .iter()
            .zip(&totals)
            .map(|(inside, total)| inside / m - (total / (2.0 * m)).powi(2))
            .sum()
    }

    /// Weight from `node` into each neighbouring community, self loop excluded.
    fn neighbour_weights(&self, node: usize, communities: &[usize]) -> BTreeMap<usize, f64> {
        let mut weights = BTreeMap::new();
        for (&neighbour, &w) in &self.adjacency[node] {
            *weights.entry(communities[neighbour]).or_insert(0.0) += w;
        }
        weights
    }

    /// Local moving phase: move nodes between communities until a full pass
    /// no longer improves modularity. Returns the community of each node.
    fn one_level(&self, rng: &mut StdRng) -> Vec<usize> {
        let n = self.node_count();
        let m2 = 2.0 * self.total_weight;
        let mut communities: Vec<usize> = (0..n).collect();
        let mut totals = self.degrees.clone();
        let mut order: Vec<usize> = (0..n).collect();

        let mut current = self.modularity(&communities);
        loop {
            let mut moved = false;
            order.shuffle(rng);

            for &node in &order {
                let own = communities[node];
                let degree = self.degrees[node];
                let neighbours = self.neighbour_weights(node, &communities);
                let own_weight = neighbours.get(&own).copied().unwrap_or(0.0);

                totals[own] -= degree;
                let remove_cost = -own_weight + totals[own] * degree / m2;

                let mut best = own;
                let mut best_gain = 0.0;
                for (&community, &weight) in &neighbours {
                    let gain = remove_cost + weight - totals[community] * degree / m2;
                    if gain > best_gain + EPSILON {
                        best_gain = gain;
                        best = community;
                    }
                }

                totals[best] += degree;
                communities[node] = best;
                if best != own {
                    moved = true;
                }
            }

            let next = self.modularity(&communities);
            if !moved || next - current < MIN_MODULARITY_GAIN {
                break;
            }
            current = next;
        }

        communities
    }

    /// Collapse each community into one node. `communities` must be
    /// renumbered to `0..k`.
    fn induced(&self, communities: &[usize]) -> Self {
        let size = communities.iter().max().map_or(0, |m| m + 1);
        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();

        for node in 0..self.node_count() {
            let c = communities[node];
            if self.loops[node] > 0.0 {
                *weights.entry((c, c)).or_insert(0.0) += self.loops[node];
            }
            for (&neighbour, &w) in &self.adjacency[node] {
                if neighbour > node {
                    let d = communities[neighbour];
                    *weights.entry((c.min(d), c.max(d))).or_insert(0.0) += w;
                }
            }
        }

        let edges: Vec<(usize, usize, f64)> = weights.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        Self::from_edges(size, &edges)
    }
}

// ============================================================================
// Betweenness centrality
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    sequence: usize,
    pred: usize,
    node: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so that BinaryHeap pops the closest candidate first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Normalised betweenness centrality of every node, by insertion position.
///
/// Brandes' algorithm with Dijkstra on the directed graph, edge distance
/// `1 / strength`. Scaled by `1 / ((n-1)(n-2))` when `n > 2`.
pub fn betweenness_centrality(graph: &ThoughtGraph) -> Vec<f64> {
    let g = graph.inner();
    let n = g.node_count();
    let mut centrality = vec![0.0; n];

    let adjacency: Vec<Vec<(usize, f64)>> = g
        .node_indices()
        .map(|ix| {
            g.edges(ix)
                .filter(|e| e.weight().strength > 0)
                .map(|e| (e.target().index(), 1.0 / e.weight().weight()))
                .collect()
        })
        .collect();

    for source in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut settled = vec![false; n];
        let mut tentative: Vec<Option<f64>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        let mut sequence = 0;

        sigma[source] = 1.0;
        tentative[source] = Some(0.0);
        heap.push(Candidate {
            distance: 0.0,
            sequence,
            pred: source,
            node: source,
        });

        while let Some(Candidate {
            distance,
            pred,
            node,
            ..
        }) = heap.pop()
        {
            if settled[node] {
                continue;
            }
            if node != source {
                sigma[node] += sigma[pred];
            }
            stack.push(node);
            settled[node] = true;

            for &(next, length) in &adjacency[node] {
                if settled[next] {
                    continue;
                }
                let candidate = distance + length;
                match tentative[next] {
                    Some(known) if (candidate - known).abs() <= EPSILON => {
                        sigma[next] += sigma[node];
                        preds[next].push(node);
                    }
                    Some(known) if candidate > known => {}
                    _ => {
                        tentative[next] = Some(candidate);
                        sigma[next] = 0.0;
                        preds[next] = vec![node];
                        sequence += 1;
                        heap.push(Candidate {
                            distance: candidate,
                            sequence,
                            pred: node,
                            node: next,
                        });
                    }
                }
            }
        }

        let mut delta = vec![0.0; n];
        while let Some(w) = stack.pop() {
            let coefficient = (1.0 + delta[w]) / sigma[w];
            for &v in &preds[w] {
                delta[v] += sigma[v] * coefficient;
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for c in centrality.iter_mut() {
            *c *= scale;
        }
    }
    centrality
}

/// Ids of the `k` most central thoughts. Ties keep insertion order.
pub fn bridge_thoughts(graph: &ThoughtGraph, k: usize) -> Vec<String> {
    let centrality = betweenness_centrality(graph);
    let mut ranked: Vec<(usize, i64)> = centrality
        .iter()
        .enumerate()
        .map(|(ix, c)| (ix, (c * 1e9).round() as i64))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let thoughts: Vec<&str> = graph.thoughts().map(|t| t.id()).collect();
    ranked
        .into_iter()
        .take(k)
        .map(|(ix, _)| thoughts[ix].to_string())
        .collect()
}
