use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;
use crate::hash::ContentHash;
use crate::observation::ObservationId;

/// Content-derived hypothesis identifier (`hyp_<16 hex>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HypothesisId(pub String);

impl fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two evaluation stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HemisphereKind {
    /// Looser thresholds; accepted hypotheses cross to the conservative side.
    Exploratory,
    /// Stricter thresholds; acceptance is terminal.
    Conservative,
}

impl HemisphereKind {
    /// Ledger slot name (`slot_R` / `slot_L`).
    pub fn slot(&self) -> &'static str {
        match self {
            HemisphereKind::Exploratory => "slot_R",
            HemisphereKind::Conservative => "slot_L",
        }
    }

    /// Short tag used in receipt notes.
    pub fn tag(&self) -> &'static str {
        match self {
            HemisphereKind::Exploratory => "R",
            HemisphereKind::Conservative => "L",
        }
    }

    /// The paired hemisphere.
    pub fn other(&self) -> HemisphereKind {
        match self {
            HemisphereKind::Exploratory => HemisphereKind::Conservative,
            HemisphereKind::Conservative => HemisphereKind::Exploratory,
        }
    }
}

impl fmt::Display for HemisphereKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HemisphereKind::Exploratory => write!(f, "exploratory"),
            HemisphereKind::Conservative => write!(f, "conservative"),
        }
    }
}

/// Causal inputs and target a claim is about, checked by a causal filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalLink {
    pub inputs: Vec<String>,
    pub target: String,
}

impl CausalLink {
    pub fn new(
        inputs: impl IntoIterator<Item = impl Into<String>>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            target: target.into(),
        }
    }
}

/// An immutable candidate explanation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: HypothesisId,
    pub claim: String,
    pub hemisphere: HemisphereKind,
    pub derived_from: Vec<ObservationId>,
    /// Position within the batch that produced it.
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causal: Option<CausalLink>,
}

#[derive(Serialize)]
struct HypothesisContent<'a> {
    claim: &'a str,
    hemisphere: HemisphereKind,
    derived_from: &'a [ObservationId],
    sequence: u32,
    causal: &'a Option<CausalLink>,
}

impl Hypothesis {
    /// Build a hypothesis; its id is derived from its content.
    pub fn new(
        claim: impl Into<String>,
        hemisphere: HemisphereKind,
        derived_from: Vec<ObservationId>,
        sequence: u32,
        causal: Option<CausalLink>,
    ) -> Result<Self, TypesError> {
        let claim = claim.into();
        let hash = ContentHash::of(&HypothesisContent {
            claim: &claim,
            hemisphere,
            derived_from: &derived_from,
            sequence,
            causal: &causal,
        })?;
        Ok(Self {
            id: HypothesisId(hash.short_id("hyp")),
            claim,
            hemisphere,
            derived_from,
            sequence,
            causal,
        })
    }

    pub fn is_derived(&self) -> bool {
        !self.derived_from.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> Vec<ObservationId> {
        vec![ObservationId("obs_0123456789abcdef".into())]
    }

    #[test]
    fn slots_and_tags() {
        assert_eq!(HemisphereKind::Exploratory.slot(), "slot_R");
        assert_eq!(HemisphereKind::Conservative.slot(), "slot_L");
        assert_eq!(HemisphereKind::Exploratory.tag(), "R");
        assert_eq!(HemisphereKind::Exploratory.other(), HemisphereKind::Conservative);
        assert_eq!(HemisphereKind::Conservative.to_string(), "conservative");
    }

    #[test]
    fn id_depends_on_sequence() {
        let a = Hypothesis::new("claim", HemisphereKind::Exploratory, obs(), 0, None).unwrap();
        let b = Hypothesis::new("claim", HemisphereKind::Exploratory, obs(), 1, None).unwrap();
        let c = Hypothesis::new("claim", HemisphereKind::Exploratory, obs(), 0, None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id, c.id);
        assert!(a.id.0.starts_with("hyp_"));
    }

    #[test]
    fn causal_link_is_optional_in_json() {
        let h = Hypothesis::new("claim", HemisphereKind::Exploratory, obs(), 0, None).unwrap();
        let json = serde_json::to_string(&h).unwrap();
        assert!(!json.contains("causal"));

        let linked = Hypothesis::new(
            "slope>0.1 implies trend",
            HemisphereKind::Exploratory,
            obs(),
            1,
            Some(CausalLink::new(["time"], "x")),
        )
        .unwrap();
        let json = serde_json::to_string(&linked).unwrap();
        let back: Hypothesis = serde_json::from_str(&json).unwrap();
        assert_eq!(back, linked);
        assert!(back.is_derived());
    }
}
