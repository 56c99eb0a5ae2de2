//! Critical-moment detection: pick the plies worth a viewer's attention,
//! capped to a fraction of the game and returned in game order.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evaluation::{MoveClassification, PlyEvaluation};
use crate::phase::{detect_phase_transitions, GamePhase};

/// Winning/losing line in side-relative centipawns.
const WINNING_THRESHOLD: i32 = 200;
/// A roughly level evaluation for draw detection.
const LEVEL_THRESHOLD: i32 = 100;
const PHASE_TRANSITION_SCORE: u32 = 15;
const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalMomentType {
    ResultChange,
    MissedWin,
    MissedDraw,
    TurningPoint,
    BlunderRecovery,
    TacticalMoment,
    EvalSwing,
    PhaseTransition,
    /// Requires clock data this crate does not receive; declared for
    /// consumers that merge in their own timing signal.
    TimePressure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalMoment {
    pub ply_index: usize,
    pub moment_type: CriticalMomentType,
    /// 0 to 100.
    pub score: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CriticalMomentOptions {
    /// Fraction of the game's plies that may be flagged.
    pub max_critical_ratio: f64,
    pub min_score: u32,
}

impl Default for CriticalMomentOptions {
    fn default() -> Self {
        Self {
            max_critical_ratio: 0.25,
            min_score: 0,
        }
    }
}

/// Score every ply, merge in phase transitions, keep the best moments up
/// to the ratio cap, and return them in strictly ascending ply order.
pub fn detect_critical_moments(
    plies: &[PlyEvaluation],
    options: &CriticalMomentOptions,
) -> Vec<CriticalMoment> {
    if plies.is_empty() {
        return Vec::new();
    }

    let mut best_per_ply: BTreeMap<usize, CriticalMoment> = BTreeMap::new();
    let mut keep_best = |moment: CriticalMoment| match best_per_ply.get(&moment.ply_index) {
        Some(existing) if existing.score >= moment.score => {}
        _ => {
            best_per_ply.insert(moment.ply_index, moment);
        }
    };

    for (i, ply) in plies.iter().enumerate() {
        if let Some(moment) = score_ply(ply, i.checked_sub(1).map(|j| &plies[j]), options) {
            keep_best(moment);
        }
    }

    for transition in detect_phase_transitions(plies.len()) {
        if transition.phase == GamePhase::Opening {
            continue;
        }
        if PHASE_TRANSITION_SCORE <= options.min_score {
            continue;
        }
        let phase_name = match transition.phase {
            GamePhase::Opening => "opening",
            GamePhase::Middlegame => "middlegame",
            GamePhase::Endgame => "endgame",
        };
        keep_best(CriticalMoment {
            ply_index: transition.ply_index,
            moment_type: CriticalMomentType::PhaseTransition,
            score: PHASE_TRANSITION_SCORE,
            reason: format!("The game enters the {}", phase_name),
        });
    }

    let mut moments: Vec<CriticalMoment> = best_per_ply.into_values().collect();
    // Ratio cap: strongest moments win, chronological order on output.
    moments.sort_by_key(|m| (Reverse(m.score), m.ply_index));
    let mut cap = (options.max_critical_ratio * plies.len() as f64).floor() as usize;
    if cap == 0 && options.max_critical_ratio > 0.0 && !moments.is_empty() {
        // A game too short for the ratio still surfaces its best moment.
        cap = 1;
    }
    moments.truncate(cap);
    moments.sort_by_key(|m| m.ply_index);

    debug!(
        total_plies = plies.len(),
        moments = moments.len(),
        "critical moment detection finished"
    );
    moments
}

fn score_ply(
    ply: &PlyEvaluation,
    previous: Option<&PlyEvaluation>,
    options: &CriticalMomentOptions,
) -> Option<CriticalMoment> {
    let mut score = ply.classification.weight();

    let swing = ply.swing();
    score += match swing {
        s if s >= 300 => 30,
        s if s >= 200 => 20,
        s if s >= 100 => 10,
        _ => 0,
    };

    let before = ply.eval_before;
    let after = ply.mover_after();
    let recovered = previous
        .map(|p| p.classification == MoveClassification::Blunder)
        .unwrap_or(false)
        && after.abs() < LEVEL_THRESHOLD;

    let (moment_type, bonus, reason) = if before >= WINNING_THRESHOLD
        && after <= -WINNING_THRESHOLD
    {
        (
            CriticalMomentType::ResultChange,
            30,
            format!("A winning position became a losing one at ply {}", ply.ply_index),
        )
    } else if before >= WINNING_THRESHOLD && after < WINNING_THRESHOLD {
        (
            CriticalMomentType::MissedWin,
            25,
            format!("A winning advantage slipped away at ply {}", ply.ply_index),
        )
    } else if before.abs() < LEVEL_THRESHOLD && after <= -WINNING_THRESHOLD {
        (
            CriticalMomentType::MissedDraw,
            20,
            format!("A level position was thrown away at ply {}", ply.ply_index),
        )
    } else if before <= -LEVEL_THRESHOLD && after >= LEVEL_THRESHOLD {
        (
            CriticalMomentType::TurningPoint,
            20,
            format!("The evaluation turned around at ply {}", ply.ply_index),
        )
    } else if recovered {
        (
            CriticalMomentType::BlunderRecovery,
            15,
            format!("The previous blunder went unpunished at ply {}", ply.ply_index),
        )
    } else if ply.classification == MoveClassification::Brilliant {
        (
            CriticalMomentType::TacticalMoment,
            0,
            format!("A brilliant move at ply {}", ply.ply_index),
        )
    } else {
        (
            CriticalMomentType::EvalSwing,
            0,
            format!("The evaluation swung by {}cp at ply {}", swing, ply.ply_index),
        )
    };
    score += bonus;
    score = score.min(MAX_SCORE);

    if score <= options.min_score {
        return None;
    }
    Some(CriticalMoment {
        ply_index: ply.ply_index,
        moment_type,
        score,
        reason,
    })
}
