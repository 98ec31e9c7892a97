#![deny(unsafe_code)]
//! # maat-reactor
//!
//! The recursive loop. An inner [`HemispherePair`](maat_engine::HemispherePair)
//! judges an external feed; an outer pair judges an observation built from
//! the inner pair's receipts. After both have run, the [`Governor`] reads
//! the cycle's [`Telemetry`], moves its four dampers and checks the SCRAM
//! limits. A SCRAM forces every damper to full insertion and sets a latch
//! that is never cleared: later cycle requests return
//! [`CycleStatus::Halted`] and do nothing.
//!
//! ```text
//! feed ──► inner pair ──► receipts ──► meta observation ──► outer pair
//!                 ▲                                              │
//!                 └──── dampers ◄── governor ◄── telemetry ◄─────┘
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod governor;
pub mod health;
pub mod meta;
pub mod reactor;
pub mod state;
pub mod telemetry;

pub use config::{
    CausalConfig, EngineConfig, FeedConfig, GovernorConfig, PolicyConfig, ReactorConfig,
    TelemetryConfig,
};
pub use error::ReactorError;
pub use feed::SyntheticFeed;
pub use governor::{
    ControlRod, DamperAdjustment, DamperKind, DamperSet, Governor, ScramLimits, ScramReason,
};
pub use health::{HealthMonitor, HealthReport};
pub use meta::{meta_observation, meta_series, META_WINDOW};
pub use reactor::{CycleReport, CycleStatus, CycleSummary, RecursiveLoop, RunReport, RunTotals};
pub use state::{CausalReport, EdgeWeight, LoopState, PolicyReport, SavedState};
pub use telemetry::{RealityMetric, Telemetry, TelemetryTracker};
