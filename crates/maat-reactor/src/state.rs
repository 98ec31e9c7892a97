//! Learned state carried between runs: the inner pair's causal graph and
//! threshold policy, each in its own file under a state directory.

use std::path::{Path, PathBuf};

use maat_engine::{CausalGraph, CausalStats, LearnedGatesConfig, LearnedGatesPolicy};
use maat_types::{GateThresholds, HemisphereKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ReactorConfig;
use crate::error::ReactorError;

pub const CAUSAL_GRAPH_FILE: &str = "causal_graph.json";
pub const CAUSAL_REPORT_FILE: &str = "causal_report.json";
pub const POLICY_FILE: &str = "policy.json";
pub const POLICY_REPORT_FILE: &str = "policy_report.json";

/// State restored into the inner pair. `None` parts are built fresh.
#[derive(Clone, Debug, Default)]
pub struct LoopState {
    pub causal: Option<CausalGraph>,
    pub policy: Option<LearnedGatesPolicy>,
}

impl LoopState {
    /// Load whatever the config enables from `dir`. Missing files start
    /// fresh; unreadable ones are errors.
    pub fn load(dir: impl AsRef<Path>, config: &ReactorConfig) -> Result<Self, ReactorError> {
        let dir = dir.as_ref();
        let causal = if config.causal.enabled {
            let graph = CausalGraph::load(dir.join(CAUSAL_GRAPH_FILE))?
                .with_learning_rates(config.causal.reinforce, config.causal.weaken);
            info!(edges = graph.stats().edges, "Causal graph loaded");
            Some(graph)
        } else {
            None
        };
        let policy = if config.policy.enabled {
            let policy = LearnedGatesPolicy::load_or_new(
                dir.join(POLICY_FILE),
                config.policy.learned.clone(),
            )?;
            info!(proposals = policy.proposals(), "Threshold policy loaded");
            Some(policy)
        } else {
            None
        };
        Ok(Self { causal, policy })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Summary written next to a saved causal graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CausalReport {
    pub pruned: usize,
    pub stats: CausalStats,
    pub top_edges: Vec<EdgeWeight>,
}

impl CausalReport {
    pub fn of(graph: &CausalGraph, pruned: usize, edges: usize) -> Self {
        Self {
            pruned,
            stats: graph.stats(),
            top_edges: graph
                .top_edges(edges)
                .into_iter()
                .map(|((source, target), weight)| EdgeWeight {
                    source,
                    target,
                    weight,
                })
                .collect(),
        }
    }
}

/// Summary written next to a saved policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub proposals: u64,
    pub exploratory: Option<GateThresholds>,
    pub conservative: Option<GateThresholds>,
    pub config: LearnedGatesConfig,
}

impl PolicyReport {
    pub fn of(policy: &LearnedGatesPolicy) -> Self {
        Self {
            proposals: policy.proposals(),
            exploratory: policy.thresholds_for(HemisphereKind::Exploratory),
            conservative: policy.thresholds_for(HemisphereKind::Conservative),
            config: policy.config().clone(),
        }
    }
}

/// Files written by a save, for the caller to report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SavedState {
    pub causal: Option<CausalReport>,
    pub policy: Option<PolicyReport>,
    pub files: Vec<PathBuf>,
}

/// Prune and save a graph plus its report.
pub(crate) fn save_causal(
    graph: &CausalGraph,
    dir: &Path,
    prune_below: f64,
    report_edges: usize,
    files: &mut Vec<PathBuf>,
) -> Result<CausalReport, ReactorError> {
    let mut graph = graph.clone();
    let pruned = graph.prune(prune_below);
    let path = dir.join(CAUSAL_GRAPH_FILE);
    graph.save(&path)?;
    files.push(path);

    let report = CausalReport::of(&graph, pruned, report_edges);
    let path = dir.join(CAUSAL_REPORT_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    files.push(path);
    Ok(report)
}

pub(crate) fn save_policy(
    policy: &LearnedGatesPolicy,
    dir: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<PolicyReport, ReactorError> {
    let path = dir.join(POLICY_FILE);
    policy.save(&path)?;
    files.push(path);

    let report = PolicyReport::of(policy);
    let path = dir.join(POLICY_REPORT_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    files.push(path);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maat_engine::CausalFilter;

    #[test]
    fn disabled_parts_are_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let state = LoopState::load(dir.path(), &ReactorConfig::default()).unwrap();
        assert!(state.causal.is_none());
        assert!(state.policy.is_none());
    }

    #[test]
    fn missing_files_start_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReactorConfig::default();
        config.causal.enabled = true;
        config.policy.enabled = true;
        let state = LoopState::load(dir.path(), &config).unwrap();
        assert_eq!(state.causal.unwrap().stats().edges, 0);
        assert_eq!(state.policy.unwrap().proposals(), 0);
    }

    #[test]
    fn saved_graph_is_pruned_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = CausalGraph::new();
        graph.add_edge("time", "x", 0.9);
        graph.add_edge("phase", "x", 0.01);
        assert!(graph.graph().is_some());

        let mut files = Vec::new();
        let report = save_causal(&graph, dir.path(), 0.05, 10, &mut files).unwrap();
        assert_eq!(report.pruned, 1);
        assert_eq!(report.top_edges.len(), 1);
        assert_eq!(report.top_edges[0].source, "time");
        assert_eq!(files.len(), 2);

        let mut config = ReactorConfig::default();
        config.causal.enabled = true;
        let state = LoopState::load(dir.path(), &config).unwrap();
        let restored = state.causal.unwrap();
        assert_eq!(restored.weight("time", "x"), Some(0.9));
        assert_eq!(restored.weight("phase", "x"), None);
    }

    #[test]
    fn corrupt_policy_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(POLICY_FILE), "{not json").unwrap();
        let mut config = ReactorConfig::default();
        config.policy.enabled = true;
        assert!(matches!(
            LoopState::load(dir.path(), &config),
            Err(ReactorError::Policy(_))
        ));
    }
}
