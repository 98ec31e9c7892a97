//! `maat demo`: one hemisphere pair over the synthetic feed

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use maat_engine::{
    CycleControls, ExternalTextSource, FallbackSource, HypothesisSource, ProgrammaticSource,
    ScriptedText,
};
use maat_ledger::JsonlLedger;
use maat_reactor::{RecursiveLoop, ReactorConfig, SyntheticFeed};
use maat_types::HemisphereKind;

use crate::output;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Number of cycles to run
    #[arg(long, default_value_t = 20)]
    pub cycles: u64,

    /// Feed seed (overrides the configuration)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for the JSONL ledger
    #[arg(long, default_value = "out/demo")]
    pub out: PathBuf,

    /// File of scripted hypotheses, one response per line; the
    /// programmatic source covers empty responses
    #[arg(long)]
    pub script: Option<PathBuf>,
}

pub fn execute(args: DemoArgs, mut config: ReactorConfig) -> Result<()> {
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let ledger_path = args.out.join("demo.jsonl");
    let ledger = JsonlLedger::open(&ledger_path)
        .with_context(|| format!("failed to open {}", ledger_path.display()))?;

    let source: Box<dyn HypothesisSource> = match &args.script {
        Some(path) => {
            let script = ScriptedText::from_file(path)
                .with_context(|| format!("failed to read script {}", path.display()))?;
            Box::new(FallbackSource::new(Box::new(ExternalTextSource::new(Box::new(script)))))
        }
        None => Box::new(ProgrammaticSource::default()),
    };
    let mut pair =
        RecursiveLoop::build_pair_with_source("demo", &config, source, Box::new(ledger))?;
    let mut feed = SyntheticFeed::new(config.feed.clone());
    let controls = CycleControls::default()
        .with_max_hypotheses(config.engine.hypotheses_per_cycle)
        .with_window_len(config.engine.window_len);

    for _ in 0..args.cycles {
        let observation = feed.next_observation()?;
        let out = pair.run_cycle(&observation, &controls)?;
        println!(
            "cycle {:>3}  exploratory {}  conservative {}  blocked {}",
            out.cycle,
            output::counts(&out.counts(HemisphereKind::Exploratory)),
            output::counts(&out.counts(HemisphereKind::Conservative)),
            out.blocked.len()
        );
    }

    let stats = pair.stats();
    println!();
    println!("Hypotheses: {}", stats.hypotheses);
    println!("Callosum transfers: {}", stats.callosum_transfers);
    println!("Estimator failures: {}", stats.estimator_failures);
    output::print_success(&format!("Ledger written to {}", ledger_path.display()));
    Ok(())
}
