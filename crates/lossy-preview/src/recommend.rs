//! Tier recommendation policy.

use lossy_core::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tier counts as effective only above this reduction, in percent.
pub const EFFECTIVE_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub level: Tier,
    pub effective_levels: BTreeMap<Tier, bool>,
    pub reason: String,
}

pub fn is_effective(reduction: f64) -> bool {
    reduction > EFFECTIVE_THRESHOLD
}

/// Pick a tier from per-tier reductions. Missing tiers count as 0 %.
///
/// First match wins: aggressive above 50 %, moderate above 30 %, then
/// minimal, each only when effective. With nothing effective the answer is
/// moderate.
pub fn recommend(reductions: &BTreeMap<Tier, f64>) -> Recommendation {
    let reduction = |tier: Tier| reductions.get(&tier).copied().unwrap_or(0.0);
    let effective_levels: BTreeMap<Tier, bool> =
        Tier::ALL.into_iter().map(|tier| (tier, is_effective(reduction(tier)))).collect();
    let effective = |tier: Tier| effective_levels.get(&tier).copied().unwrap_or(false);

    let level = if reduction(Tier::Aggressive) > 50.0 && effective(Tier::Aggressive) {
        Tier::Aggressive
    } else if reduction(Tier::Moderate) > 30.0 && effective(Tier::Moderate) {
        Tier::Moderate
    } else if effective(Tier::Minimal) {
        Tier::Minimal
    } else {
        Tier::Moderate
    };

    Recommendation { level, reason: reason_for(reduction(level)).to_string(), effective_levels }
}

pub fn reason_for(reduction: f64) -> &'static str {
    if reduction > 70.0 {
        "Excellent compression potential with significant size reduction"
    } else if reduction > 50.0 {
        "Strong compression with good size reduction"
    } else if reduction > 30.0 {
        "Balanced compression preserving most content"
    } else if reduction > 10.0 {
        "Modest gains with minimal data loss"
    } else {
        "Limited compression opportunity for this file"
    }
}
