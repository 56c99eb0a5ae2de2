/// Theme data model: the closed theme-id enum, severity/confidence orders,
/// and the immutable `DetectedTheme` value the detectors emit.

use chess::{Color, Square};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::Tier;
use crate::position::{LocatedPiece, Side};

/// Bumped whenever detector semantics change; cache invalidation for
/// [`ThemeArtifact`] keys on it.
pub const DETECTOR_VERSION: &str = "1.0.0";

/// Every theme the engine can report. Closed enum: adding a variant forces
/// every consuming match to be updated at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeId {
    // Tactical
    AbsolutePin,
    RelativePin,
    CrossPin,
    Fork,
    KnightFork,
    PawnFork,
    DoubleAttack,
    DoubleCheck,
    Skewer,
    DiscoveredAttack,
    DiscoveredCheck,
    Battery,
    OverloadedPiece,
    RemoveDefender,
    Deflection,
    Desperado,
    AdvancedPawn,
    PawnBreakthrough,
    Underpromotion,
    BackRankWeakness,
    FPawnWeakness,
    TrappedPiece,
    HangingPiece,
    GreekGift,
    Zwischenzug,
    Windmill,
    Sacrifice,
    DirectOpposition,
    DistantOpposition,
    DiagonalOpposition,
    Triangulation,
    Zugzwang,
    PotentialFork,
    PotentialDiscovery,
    // Structural
    IsolatedPawn,
    DoubledPawns,
    BackwardPawn,
    PassedPawn,
    PawnChain,
    PawnMajority,
    ConnectedPassedPawns,
    // Positional
    SpaceAdvantage,
    CentralControl,
    KingsideConvergence,
    QueensideConvergence,
    Outpost,
    OpenFile,
    BishopPair,
    KingActivity,
    // Dynamic
    Initiative,
    DevelopmentLead,
    ExposedKing,
    RookOnSeventh,
    PieceActivity,
    OppositeSideCastling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tactical,
    Structural,
    Positional,
    Dynamic,
}

impl ThemeId {
    pub fn category(self) -> Category {
        use ThemeId::*;
        match self {
            AbsolutePin | RelativePin | CrossPin | Fork | KnightFork | PawnFork | DoubleAttack
            | DoubleCheck | Skewer | DiscoveredAttack | DiscoveredCheck | Battery
            | OverloadedPiece | RemoveDefender | Deflection | Desperado | AdvancedPawn
            | PawnBreakthrough | Underpromotion | BackRankWeakness | FPawnWeakness
            | TrappedPiece | HangingPiece | GreekGift | Zwischenzug | Windmill | Sacrifice
            | DirectOpposition | DistantOpposition | DiagonalOpposition | Triangulation
            | Zugzwang | PotentialFork | PotentialDiscovery => Category::Tactical,
            IsolatedPawn | DoubledPawns | BackwardPawn | PassedPawn | PawnChain | PawnMajority
            | ConnectedPassedPawns => Category::Structural,
            SpaceAdvantage | CentralControl | KingsideConvergence | QueensideConvergence
            | Outpost | OpenFile | BishopPair | KingActivity => Category::Positional,
            Initiative | DevelopmentLead | ExposedKing | RookOnSeventh | PieceActivity
            | OppositeSideCastling => Category::Dynamic,
        }
    }

    pub fn display_name(self) -> &'static str {
        use ThemeId::*;
        match self {
            AbsolutePin => "Absolute Pin",
            RelativePin => "Relative Pin",
            CrossPin => "Cross Pin",
            Fork => "Fork",
            KnightFork => "Knight Fork",
            PawnFork => "Pawn Fork",
            DoubleAttack => "Double Attack",
            DoubleCheck => "Double Check",
            Skewer => "Skewer",
            DiscoveredAttack => "Discovered Attack",
            DiscoveredCheck => "Discovered Check",
            Battery => "Battery",
            OverloadedPiece => "Overloaded Piece",
            RemoveDefender => "Remove the Defender",
            Deflection => "Deflection",
            Desperado => "Desperado",
            AdvancedPawn => "Advanced Pawn",
            PawnBreakthrough => "Pawn Breakthrough",
            Underpromotion => "Underpromotion",
            BackRankWeakness => "Back Rank Weakness",
            FPawnWeakness => "f-Pawn Weakness",
            TrappedPiece => "Trapped Piece",
            HangingPiece => "Hanging Piece",
            GreekGift => "Greek Gift",
            Zwischenzug => "Zwischenzug",
            Windmill => "Windmill",
            Sacrifice => "Sacrifice",
            DirectOpposition => "Direct Opposition",
            DistantOpposition => "Distant Opposition",
            DiagonalOpposition => "Diagonal Opposition",
            Triangulation => "Triangulation",
            Zugzwang => "Zugzwang",
            PotentialFork => "Potential Fork",
            PotentialDiscovery => "Potential Discovery",
            IsolatedPawn => "Isolated Pawn",
            DoubledPawns => "Doubled Pawns",
            BackwardPawn => "Backward Pawn",
            PassedPawn => "Passed Pawn",
            PawnChain => "Pawn Chain",
            PawnMajority => "Pawn Majority",
            ConnectedPassedPawns => "Connected Passed Pawns",
            SpaceAdvantage => "Space Advantage",
            CentralControl => "Central Control",
            KingsideConvergence => "Kingside Convergence",
            QueensideConvergence => "Queenside Convergence",
            Outpost => "Outpost",
            OpenFile => "Open File",
            BishopPair => "Bishop Pair",
            KingActivity => "King Activity",
            Initiative => "Initiative",
            DevelopmentLead => "Development Lead",
            ExposedKing => "Exposed King",
            RookOnSeventh => "Rook on the Seventh",
            PieceActivity => "Piece Activity",
            OppositeSideCastling => "Opposite-Side Castling",
        }
    }
}

/// Fixed total order: critical < significant < moderate < minor, so an
/// ascending sort puts the most severe themes first. Tactical detectors use
/// the 3-level subset; endgame and positional detectors may use `Moderate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Significant,
    Moderate,
    Minor,
}

/// Fixed total order: high < medium < low, matching the sort in the
/// aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Continuous 0-1 rendering for consumers that want a score.
    pub fn score(self) -> f64 {
        match self {
            Confidence::High => 0.9,
            Confidence::Medium => 0.6,
            Confidence::Low => 0.3,
        }
    }
}

/// One detected theme. A value type created fresh per call: all required
/// fields arrive through [`DetectedTheme::new`] and the consuming `with_*`
/// builders; nothing is mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedTheme {
    pub theme: ThemeId,
    pub name: String,
    pub category: Category,
    pub beneficiary: Side,
    pub severity: Severity,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub squares: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pieces: Vec<LocatedPiece>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_at_stake: Option<u32>,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_explanation: Option<String>,
}

impl DetectedTheme {
    pub fn new(
        theme: ThemeId,
        beneficiary: Color,
        severity: Severity,
        confidence: Confidence,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            theme,
            name: theme.display_name().to_string(),
            category: theme.category(),
            beneficiary: beneficiary.into(),
            severity,
            confidence,
            squares: Vec::new(),
            pieces: Vec::new(),
            material_at_stake: None,
            explanation: explanation.into(),
            detailed_explanation: None,
        }
    }

    pub fn with_squares(mut self, squares: &[Square]) -> Self {
        self.squares = squares.iter().map(|sq| sq.to_string()).collect();
        self
    }

    pub fn with_pieces(mut self, pieces: Vec<LocatedPiece>) -> Self {
        self.pieces = pieces;
        self
    }

    /// Material at stake in centipawns. Negative estimates are clamped to
    /// zero rather than emitted.
    pub fn with_material_at_stake(mut self, centipawns: i32) -> Self {
        self.material_at_stake = Some(centipawns.max(0) as u32);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detailed_explanation = Some(detail.into());
        self
    }
}

/// The persistence-boundary record a caching layer stores per position.
/// Immutable once constructed; invalidation keys on
/// `(position_key, tier, detector_version)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeArtifact {
    pub position_key: String,
    pub tier: Tier,
    pub detected: Vec<DetectedTheme>,
    pub detector_version: String,
    pub detection_time_ms: u64,
    pub created_at: DateTime<Utc>,
}
