//! Game-moment analysis over a sequence of per-ply evaluations.
//!
//! Where `chess-themes` looks at one position, this crate looks at a whole
//! game: which phase each ply belongs to, which plies were critical enough
//! to deserve deeper annotation, how a move's centipawn loss should be
//! judged for a player of a given rating, and how wide an engine search a
//! ply deserves.

pub mod critical;
pub mod evaluation;
pub mod multipv;
pub mod phase;
pub mod thresholds;

pub use critical::{
    detect_critical_moments, CriticalMoment, CriticalMomentOptions, CriticalMomentType,
};
pub use evaluation::{MoveClassification, PlyEvaluation};
pub use multipv::{recommend_multipv, MultipvOptions, MultipvRecommendation};
pub use phase::{detect_phase_transitions, estimate_game_phase, GamePhase, PhaseTransition};
pub use thresholds::{
    classify_move, interpolated_thresholds, thresholds_for_rating, ClassificationThresholds,
    RATING_BANDS,
};
