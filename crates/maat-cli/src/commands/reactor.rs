//! `maat reactor`: the recursive loop under the governor

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use maat_ledger::JsonlLedger;
use maat_reactor::{CycleStatus, LoopState, RecursiveLoop, ReactorConfig};

use crate::output;

#[derive(Args, Debug)]
pub struct ReactorArgs {
    /// Maximum number of cycles to run
    #[arg(long, default_value_t = 30)]
    pub cycles: u64,

    /// Feed seed (overrides the configuration)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for the ledgers and the run report
    #[arg(long, default_value = "out/reactor")]
    pub out: PathBuf,

    /// Use the stress preset, which drives the loop into SCRAM
    #[arg(long)]
    pub stress: bool,

    /// Learn thresholds; resumes from and saves policy.json in the output directory
    #[arg(long)]
    pub use_policy: bool,

    /// Filter hypotheses through a causal graph; resumes from and saves
    /// causal_graph.json in the output directory
    #[arg(long)]
    pub use_causal: bool,
}

pub fn execute(args: ReactorArgs, mut config: ReactorConfig) -> Result<()> {
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.policy.enabled |= args.use_policy;
    config.causal.enabled |= args.use_causal;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let open = |name: &str| {
        let path = args.out.join(name);
        JsonlLedger::open(&path).with_context(|| format!("failed to open {}", path.display()))
    };

    let state = LoopState::load(&args.out, &config)
        .with_context(|| format!("failed to load learned state from {}", args.out.display()))?;
    if let Some(graph) = &state.causal {
        output::print_info(&format!("causal graph: {} edges", graph.stats().edges));
    }
    if let Some(policy) = &state.policy {
        output::print_info(&format!("threshold policy: {} proposals", policy.proposals()));
    }
    let mut reactor = RecursiveLoop::with_state(
        config,
        Box::new(open("inner.jsonl")?),
        Box::new(open("outer.jsonl")?),
        state,
    )?;

    let mut summaries = Vec::new();
    for _ in 0..args.cycles {
        let report = reactor.run_cycle()?;
        if report.status == CycleStatus::Halted {
            break;
        }
        let summary = report.summary();
        println!(
            "cycle {:>3} {:<8} {}  {}  inner {}  outer {}",
            summary.cycle,
            output::status(summary.status),
            summary
                .telemetry
                .as_ref()
                .map(output::telemetry)
                .unwrap_or_default(),
            output::dampers(&summary.dampers),
            output::counts(&summary.inner_exploratory),
            output::counts(&summary.outer_exploratory),
        );
        summaries.push(summary);
        if let Some(reason) = &report.scram {
            output::print_warning(&format!("SCRAM at cycle {}: {}", report.cycle, reason));
            break;
        }
    }

    let report = reactor.report(summaries);
    let report_path = args.out.join("report.json");
    std::fs::write(&report_path, report.to_json()?)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    let saved = reactor
        .save_state(&args.out)
        .with_context(|| format!("failed to save learned state to {}", args.out.display()))?;
    if let Some(policy) = &saved.policy {
        if let Some(t) = policy.exploratory {
            output::print_info(&format!(
                "learned exploratory thresholds: bayes {} coherence {} mdl {}",
                t.bayes, t.coherence, t.mdl
            ));
        }
    }
    if let Some(causal) = &saved.causal {
        for edge in &causal.top_edges {
            output::print_info(&format!(
                "causal edge {} -> {} ({:.3})",
                edge.source, edge.target, edge.weight
            ));
        }
    }
    for file in &saved.files {
        output::print_info(&format!("saved {}", file.display()));
    }

    output::print_info(&format!(
        "health: vocabulary {}, simpson diversity {:.3}, learning rate {:.4}",
        report.health.vocabulary, report.health.simpson_diversity, report.health.learning_rate
    ));
    for alert in &report.health.alerts {
        output::print_warning(alert);
    }
    output::print_success(&format!(
        "{} cycles, report written to {}",
        report.totals.cycles,
        report_path.display()
    ));
    Ok(())
}
