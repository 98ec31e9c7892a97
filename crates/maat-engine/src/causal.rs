use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use maat_types::Hypothesis;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;

/// Optional gate on a hypothesis' causal structure.
pub trait CausalFilter: Send {
    /// Whether a hypothesis linking `inputs` to `target` may be tested.
    fn allow(&self, inputs: &[String], target: &str) -> bool;

    /// Learn from the terminal outcome of a tested hypothesis.
    fn record_outcome(&mut self, hypothesis: &Hypothesis, accepted: bool);

    /// The learned graph, for filters that keep one.
    fn graph(&self) -> Option<&CausalGraph> {
        None
    }
}

/// Summary of a causal graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CausalStats {
    pub nodes: usize,
    pub edges: usize,
    pub blocked_edges: usize,
    pub avg_weight: f64,
    pub max_weight: f64,
    pub min_weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct EdgeRecord {
    source: String,
    target: String,
    weight: f64,
}

#[derive(Serialize, Deserialize)]
struct GraphFile {
    nodes: Vec<String>,
    edges: Vec<EdgeRecord>,
    blocked: Vec<(String, String)>,
}

/// Weighted DAG over signal names. Edges closing a cycle are refused and
/// remembered as blocked.
#[derive(Clone, Debug)]
pub struct CausalGraph {
    nodes: BTreeSet<String>,
    edges: BTreeMap<(String, String), f64>,
    blocked: BTreeSet<(String, String)>,
    reinforce: f64,
    weaken: f64,
}

impl Default for CausalGraph {
    fn default() -> Self {
        Self {
            nodes: BTreeSet::new(),
            edges: BTreeMap::new(),
            blocked: BTreeSet::new(),
            reinforce: 0.1,
            weaken: 0.05,
        }
    }
}

impl CausalGraph {
    /// Initial weight for an edge first seen through an outcome.
    pub const DEFAULT_WEIGHT: f64 = 0.5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_learning_rates(mut self, reinforce: f64, weaken: f64) -> Self {
        self.reinforce = reinforce;
        self.weaken = weaken;
        self
    }

    pub fn add_node(&mut self, name: impl Into<String>) {
        self.nodes.insert(name.into());
    }

    /// Add or update `source -> target`. Returns false, and blocks the
    /// edge, when it would create a cycle. Weights are clamped to [0, 1].
    pub fn add_edge(&mut self, source: &str, target: &str, weight: f64) -> bool {
        self.add_node(source);
        self.add_node(target);
        if self.would_create_cycle(source, target) {
            debug!(source, target, "Causal edge blocked: would create cycle");
            self.blocked.insert((source.to_string(), target.to_string()));
            return false;
        }
        self.edges
            .insert((source.to_string(), target.to_string()), weight.clamp(0.0, 1.0));
        true
    }

    pub fn weight(&self, source: &str, target: &str) -> Option<f64> {
        self.edges
            .get(&(source.to_string(), target.to_string()))
            .copied()
    }

    pub fn is_blocked(&self, source: &str, target: &str) -> bool {
        self.blocked
            .contains(&(source.to_string(), target.to_string()))
    }

    /// Depth-first search from `target` looking for `source`.
    fn would_create_cycle(&self, source: &str, target: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![target.to_string()];
        while let Some(node) = stack.pop() {
            if node == source {
                return true;
            }
            if !visited.insert(node.clone()) {
                continue;
            }
            for (src, tgt) in self.edges.keys() {
                if *src == node && !visited.contains(tgt) {
                    stack.push(tgt.clone());
                }
            }
        }
        false
    }

    /// Drop edges lighter than `min_weight`; returns how many went.
    pub fn prune(&mut self, min_weight: f64) -> usize {
        let before = self.edges.len();
        self.edges.retain(|_, w| *w >= min_weight);
        before - self.edges.len()
    }

    /// Heaviest `k` edges, ties broken by name.
    pub fn top_edges(&self, k: usize) -> Vec<((String, String), f64)> {
        let mut edges: Vec<_> = self.edges.iter().map(|(e, w)| (e.clone(), *w)).collect();
        edges.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        edges.truncate(k);
        edges
    }

    pub fn stats(&self) -> CausalStats {
        let weights: Vec<f64> = self.edges.values().copied().collect();
        let (avg, max, min) = if weights.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                weights.iter().sum::<f64>() / weights.len() as f64,
                weights.iter().cloned().fold(f64::MIN, f64::max),
                weights.iter().cloned().fold(f64::MAX, f64::min),
            )
        };
        CausalStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            blocked_edges: self.blocked.len(),
            avg_weight: avg,
            max_weight: max,
            min_weight: min,
        }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        let file = GraphFile {
            nodes: self.nodes.iter().cloned().collect(),
            edges: self
                .edges
                .iter()
                .map(|((s, t), w)| EdgeRecord {
                    source: s.clone(),
                    target: t.clone(),
                    weight: *w,
                })
                .collect(),
            blocked: self.blocked.iter().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let file: GraphFile = serde_json::from_str(json)?;
        let mut graph = Self::new();
        graph.nodes = file.nodes.into_iter().collect();
        for e in file.edges {
            graph.nodes.insert(e.source.clone());
            graph.nodes.insert(e.target.clone());
            graph.edges.insert((e.source, e.target), e.weight.clamp(0.0, 1.0));
        }
        graph.blocked = file.blocked.into_iter().collect();
        Ok(graph)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a graph; a missing file yields an empty graph.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl CausalFilter for CausalGraph {
    fn graph(&self) -> Option<&CausalGraph> {
        Some(self)
    }

    fn allow(&self, inputs: &[String], target: &str) -> bool {
        if !self.nodes.contains(target) || inputs.iter().any(|i| !self.nodes.contains(i)) {
            return true;
        }
        inputs.iter().all(|input| {
            !self.is_blocked(input, target)
                && (self.weight(input, target).is_some() || !self.would_create_cycle(input, target))
        })
    }

    fn record_outcome(&mut self, hypothesis: &Hypothesis, accepted: bool) {
        let Some(link) = &hypothesis.causal else {
            return;
        };
        if link.inputs.is_empty() || link.target.is_empty() {
            return;
        }
        for input in &link.inputs {
            let current = self
                .weight(input, &link.target)
                .unwrap_or(Self::DEFAULT_WEIGHT);
            if accepted {
                self.add_edge(input, &link.target, (current + self.reinforce).min(1.0));
            } else {
                let next = (current - self.weaken).max(0.0);
                if next > 0.0 {
                    self.add_edge(input, &link.target, next);
                } else {
                    self.edges.remove(&(input.clone(), link.target.clone()));
                }
            }
        }
    }
}
