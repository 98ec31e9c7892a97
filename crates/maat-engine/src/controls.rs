use serde::{Deserialize, Serialize};

/// Which hypotheses the grounding rule lets through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grounding {
    /// No grounding requirement.
    #[default]
    Off,
    /// Hypotheses must name the observations they derive from.
    RequireDerivation,
    /// As above, and the observation must come from the outside world.
    RequireExternal,
}

/// Per-cycle knobs a governor sets on a hemisphere pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleControls {
    /// Hypotheses requested from the source.
    pub max_hypotheses: usize,
    /// Trailing samples the estimators see; `None` for the whole series.
    pub window_len: Option<usize>,
    /// Attention below this is rejected before gating.
    pub min_attention: f64,
    pub grounding: Grounding,
}

impl Default for CycleControls {
    fn default() -> Self {
        Self {
            max_hypotheses: 3,
            window_len: None,
            min_attention: 0.0,
            grounding: Grounding::Off,
        }
    }
}

impl CycleControls {
    pub fn with_max_hypotheses(mut self, n: usize) -> Self {
        self.max_hypotheses = n;
        self
    }

    pub fn with_window_len(mut self, len: usize) -> Self {
        self.window_len = Some(len);
        self
    }

    pub fn with_min_attention(mut self, floor: f64) -> Self {
        self.min_attention = floor;
        self
    }

    pub fn with_grounding(mut self, grounding: Grounding) -> Self {
        self.grounding = grounding;
        self
    }

    /// Trailing slice of `series` the estimators should see.
    pub fn window<'a>(&self, series: &'a [f64]) -> &'a [f64] {
        match self.window_len {
            Some(len) if series.len() > len => &series[series.len() - len..],
            _ => series,
        }
    }
}
