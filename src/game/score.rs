use std::collections::HashMap;

use crate::cards::Card;

use super::bonus::{self, Thresholds};

/// Weighting of the independent scoring terms. The defaults are tuned
/// game heuristics; score-based behavior depends on these literal
/// values.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Weights {
    pub traits: f64,
    pub merge: f64,
    pub fusion_sell: f64,
    pub disruption: f64,
    pub cost: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            traits: 2.0,
            merge: 2.0,
            fusion_sell: 3.0,
            disruption: 1.0,
            cost: 1.0,
        }
    }
}

/// Assumed pool count for a troop that has never been acquired: treat
/// unseen names as already common so untested picks are not overrated.
const UNSEEN_POOL_COUNT: u32 = 4;

/// Per-term breakdown of a candidate's score.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ScoreBreakdown {
    pub traits: f64,
    pub merge: f64,
    pub fusion_sell: f64,
    pub disruption: f64,
    pub budget: f64,
    pub families: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.traits + self.merge + self.fusion_sell + self.disruption + self.budget + self.families
    }
}

/// Shared-trait affinity with every troop already fielded, board and
/// bench alike.
fn trait_synergy(candidate: &Card, fielded: &[&Card], weights: &Weights) -> f64 {
    let mut score = 0.0;
    for family in &candidate.traits {
        let count = fielded.iter().filter(|c| c.traits.contains(family)).count();
        score += weights.traits * count as f64;
    }
    score
}

/// Flat bonus when the board already holds a copy of this name at any
/// level, putting a merge within reach.
fn merge_proximity(candidate: &Card, board: &[Card], weights: &Weights) -> f64 {
    if board.iter().any(|c| c.name == candidate.name) {
        weights.merge
    } else {
        0.0
    }
}

/// Flat bonus when a board copy matches name and level exactly: buying
/// enables an immediate merge-then-resell cycle with net elixir gain.
fn infinite_elixir(candidate: &Card, board: &[Card], weights: &Weights) -> f64 {
    if board
        .iter()
        .any(|c| c.matches(&candidate.name, candidate.level))
    {
        weights.fusion_sell
    } else {
        0.0
    }
}

/// Inverse of how often this name has already been taken from the
/// pool.
fn disruption(candidate: &Card, history: &HashMap<String, u32>, weights: &Weights) -> f64 {
    let seen = history
        .get(&candidate.name)
        .copied()
        .unwrap_or(UNSEEN_POOL_COUNT)
        .max(1);
    weights.disruption / seen as f64
}

/// Linear penalty on elixir cost.
fn budget(candidate: &Card, weights: &Weights) -> f64 {
    -weights.cost * candidate.cost as f64
}

/// Family-ladder potential: simulate adding the candidate to the
/// board's unique-name family counts and award a fixed bonus per family
/// according to where the new count lands on its ladder. A name already
/// fielded raises no count.
fn family_synergy(candidate: &Card, board: &[Card]) -> f64 {
    let mut counts = bonus::family_counts(board);
    if !board.iter().any(|c| c.name == candidate.name) {
        for &family in &candidate.traits {
            *counts.entry(family).or_insert(0) += 1;
        }
    }

    let mut score = 0.0;
    for (family, count) in counts {
        score += match family.thresholds() {
            Thresholds::DualTwoFour => match count {
                2 => 4.0,
                4 => 6.0,
                3 => 2.0,
                c if c > 4 => 1.0,
                _ => 0.0,
            },
            Thresholds::SingleAtThree => match count {
                3 => 5.0,
                2 => 3.0,
                c if c > 3 => 1.5,
                _ => 0.0,
            },
        };
    }
    score
}

/// Score a candidate acquisition against the current position.
pub fn score_candidate(
    candidate: &Card,
    board: &[Card],
    bench: &[Card],
    history: &HashMap<String, u32>,
    weights: &Weights,
) -> ScoreBreakdown {
    let fielded: Vec<&Card> = board.iter().chain(bench.iter()).collect();
    ScoreBreakdown {
        traits: trait_synergy(candidate, &fielded, weights),
        merge: merge_proximity(candidate, board, weights),
        fusion_sell: infinite_elixir(candidate, board, weights),
        disruption: disruption(candidate, history, weights),
        budget: budget(candidate, weights),
        families: family_synergy(candidate, board),
    }
}

/// Pick the best affordable candidate: strictly highest total score
/// wins, the earliest candidate wins ties, and nothing is recommended
/// when no candidate is affordable. Returns the winning index.
pub fn best_choice(scored: &[(u32, f64)], elixir: u32) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &(cost, total)) in scored.iter().enumerate() {
        if cost > elixir {
            continue;
        }
        if best.map(|(_, top)| total > top).unwrap_or(true) {
            best = Some((index, total));
        }
    }
    best.map(|(index, _)| index)
}
