//! Game-phase estimation from ply counts alone. No board state needed:
//! the caller already has per-ply evaluations, and phase is a function of
//! how far into the game a ply sits.

use serde::{Deserialize, Serialize};

/// Plies before this index count as the opening in a normal-length game.
pub const OPENING_PLY_LIMIT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTransition {
    pub ply_index: usize,
    pub phase: GamePhase,
}

/// Phase of a single ply. The opening window is 30 plies, clamped to half
/// of a short game; the endgame begins once 80% of the game has elapsed
/// (85% for games under 40 plies), but never inside the opening window.
pub fn estimate_game_phase(ply_index: usize, total_plies: usize) -> GamePhase {
    if total_plies == 0 {
        return GamePhase::Opening;
    }
    let opening_end = OPENING_PLY_LIMIT.min(total_plies / 2).max(1);
    if ply_index < opening_end {
        return GamePhase::Opening;
    }
    let endgame_ratio = if total_plies < 40 { 0.85 } else { 0.8 };
    if ply_index as f64 / total_plies as f64 >= endgame_ratio {
        GamePhase::Endgame
    } else {
        GamePhase::Middlegame
    }
}

/// First ply of each phase actually entered, in order. Games shorter than
/// the opening window never leave the opening, so they report nothing.
pub fn detect_phase_transitions(total_plies: usize) -> Vec<PhaseTransition> {
    if total_plies < OPENING_PLY_LIMIT {
        return Vec::new();
    }
    let mut transitions = Vec::new();
    let mut current: Option<GamePhase> = None;
    for ply_index in 0..total_plies {
        let phase = estimate_game_phase(ply_index, total_plies);
        if current != Some(phase) {
            transitions.push(PhaseTransition { ply_index, phase });
            current = Some(phase);
        }
    }
    transitions
}
