//! Ranking Engine
//!
//! Scores validated candidates with a goal-dependent weighted sum and orders
//! them best first. Equal scores keep their input order.

use serde::{Deserialize, Serialize};

use crate::core::build::stats::{
    elemental_resist_sum, stat, DPS, EFFECTIVE_HEALTH_POOL, MOVEMENT_SPEED,
};
use crate::core::build::{BuildGoal, StatMap, ValidatedCandidate, ValidationStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    /// Score multiplier for candidates whose stats came from the analytic
    /// fallback. `1.0` leaves them undiscounted.
    pub fallback_weight: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { fallback_weight: 1.0 }
    }
}

/// Goal-weighted score for a stat map. Missing stats count as zero.
pub fn score(goal: BuildGoal, stats: &StatMap) -> f64 {
    let dps = stat(stats, DPS);
    let ehp = stat(stats, EFFECTIVE_HEALTH_POOL);
    match goal {
        BuildGoal::BossKilling => 0.6 * dps + 0.3 * ehp + 0.1 * elemental_resist_sum(stats),
        BuildGoal::ClearSpeed => 0.5 * dps + 10.0 * stat(stats, MOVEMENT_SPEED) + 0.2 * ehp,
        _ => 0.4 * dps + 0.4 * ehp + 0.2 * elemental_resist_sum(stats),
    }
}

/// A candidate with its derived position and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    candidate: ValidatedCandidate,
    rank: usize,
    score: f64,
}

impl RankedCandidate {
    pub fn candidate(&self) -> &ValidatedCandidate {
        &self.candidate
    }

    pub fn into_candidate(self) -> ValidatedCandidate {
        self.candidate
    }

    /// 1-based position, best first.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn score_candidate(&self, goal: BuildGoal, candidate: &ValidatedCandidate) -> f64 {
        let base = score(goal, &candidate.computed_stats);
        if candidate.validation_status == ValidationStatus::Fallback {
            base * self.config.fallback_weight
        } else {
            base
        }
    }

    /// Order candidates by descending score. The sort is stable, so ties
    /// keep their relative input order.
    pub fn rank(&self, goal: BuildGoal, candidates: Vec<ValidatedCandidate>) -> Vec<RankedCandidate> {
        let mut scored: Vec<(f64, ValidatedCandidate)> = candidates
            .into_iter()
            .map(|c| (self.score_candidate(goal, &c), c))
            .collect();
        scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, candidate))| RankedCandidate {
                candidate,
                rank: i + 1,
                score,
            })
            .collect()
    }
}
