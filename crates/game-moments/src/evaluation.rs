//! Input types: one evaluated ply as produced by an upstream engine pass.

use serde::{Deserialize, Serialize};

/// Engine-derived judgment of a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClassification {
    Brilliant,
    Excellent,
    Good,
    Book,
    Forced,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveClassification {
    /// Interestingness weight for critical-moment scoring. Mistakes and
    /// brilliancies are what a viewer wants to see; book and forced moves
    /// carry no signal.
    pub fn weight(self) -> u32 {
        match self {
            MoveClassification::Blunder => 40,
            MoveClassification::Brilliant => 35,
            MoveClassification::Mistake => 25,
            MoveClassification::Inaccuracy => 12,
            MoveClassification::Excellent => 8,
            MoveClassification::Good | MoveClassification::Book | MoveClassification::Forced => 0,
        }
    }
}

/// One ply of an evaluated game. Evaluations are side-to-move-relative
/// centipawns: `eval_before` is from the mover's view, `eval_after` from
/// the opponent's view once the move is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlyEvaluation {
    pub ply_index: usize,
    pub move_number: u32,
    pub is_white_move: bool,
    pub eval_before: i32,
    pub eval_after: i32,
    pub classification: MoveClassification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cp_loss: Option<u32>,
}

impl PlyEvaluation {
    /// Absolute swing from the mover's point of view across this ply.
    /// Both evals are side-to-move-relative, so the mover's after-move
    /// eval is `-eval_after`.
    pub fn swing(&self) -> i32 {
        (self.eval_after + self.eval_before).abs()
    }

    /// The mover's evaluation once the move is played.
    pub fn mover_after(&self) -> i32 {
        -self.eval_after
    }
}
