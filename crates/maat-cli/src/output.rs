//! Terminal formatting helpers

use colored::*;
use maat_engine::VerdictCounts;
use maat_reactor::{CycleStatus, DamperSet, Telemetry};

/// `accept/defer/reject` as a compact triple.
pub fn counts(c: &VerdictCounts) -> String {
    format!(
        "{}/{}/{}",
        c.accept.to_string().green(),
        c.defer.to_string().yellow(),
        c.reject.to_string().red()
    )
}

pub fn status(status: CycleStatus) -> ColoredString {
    match status {
        CycleStatus::Running => "RUNNING".green(),
        CycleStatus::Scrammed => "SCRAM".red().bold(),
        CycleStatus::Halted => "HALTED".dimmed(),
    }
}

pub fn telemetry(t: &Telemetry) -> String {
    format!(
        "crit={:.2} temp={:.2} press={:.2} real={:.2}",
        t.criticality, t.temperature, t.pressure, t.reality
    )
}

pub fn dampers(d: &DamperSet) -> String {
    format!(
        "rec={:.2} res={:.2} anc={:.2} sem={:.2}",
        d.recursion_damper.depth(),
        d.resource_governor.depth(),
        d.reality_anchor.depth(),
        d.semantic_filter.depth()
    )
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
