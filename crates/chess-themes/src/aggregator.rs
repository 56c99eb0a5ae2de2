//! Fan-out, ranking and deduplication. `detect` runs the detectors a tier
//! selects, sorts the results best-first, and drops repeats of the same
//! theme anchored on the same square.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::position::{Position, ThemeError};
use crate::theme::{DetectedTheme, ThemeArtifact, ThemeId, DETECTOR_VERSION};
use crate::{dynamics, positional, structure};
use crate::tactics::{defenders, endgame, forks, line_geometry, pawns, pins, special, weakness};

/// How much work to spend on a position. Shallow covers the handful of
/// patterns cheap enough for bulk scans; full adds the detectors that
/// simulate moves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Shallow,
    #[default]
    Standard,
    Full,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DetectOptions {
    pub tier: Tier,
}

/// Run every detector the tier enables and return the ranked, deduplicated
/// list. Pure: identical input yields the identical list.
pub fn detect(pos: &Position, opts: &DetectOptions) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    themes.extend(pins::detect_pins(pos));
    themes.extend(forks::detect_forks(pos));
    themes.extend(line_geometry::detect_batteries(pos));
    themes.extend(weakness::detect_static_weaknesses(pos));

    if opts.tier >= Tier::Standard {
        themes.extend(line_geometry::detect_skewers(pos));
        themes.extend(line_geometry::detect_discoveries(pos));
        themes.extend(defenders::detect_overloaded_pieces(pos));
        themes.extend(defenders::detect_remove_defender(pos));
        themes.extend(defenders::detect_desperado(pos));
        themes.extend(pawns::detect_advanced_pawns(pos));
        themes.extend(pawns::detect_breakthrough(pos));
        themes.extend(special::detect_greek_gift(pos));
        themes.extend(special::detect_windmill(pos));
        themes.extend(weakness::detect_trapped_pieces(pos));
        themes.extend(endgame::detect_opposition(pos));
        themes.extend(endgame::detect_triangulation(pos));
        themes.extend(endgame::detect_zugzwang(pos));
        themes.extend(structure::detect_structure(pos));
        themes.extend(positional::detect_positional(pos));
        themes.extend(dynamics::detect_dynamics(pos));
    }

    if opts.tier >= Tier::Full {
        themes.extend(forks::detect_potential_forks(pos));
        themes.extend(line_geometry::detect_potential_discoveries(pos));
        themes.extend(defenders::detect_deflection(pos));
        themes.extend(pawns::detect_underpromotion(pos));
        themes.extend(special::detect_zwischenzug(pos));
        themes.extend(special::detect_sacrifices(pos));
    }

    rank_and_dedup(themes, opts.tier)
}

fn rank_and_dedup(mut themes: Vec<DetectedTheme>, tier: Tier) -> Vec<DetectedTheme> {
    // Stable sort keeps detector order for exact ties, which keeps the
    // output deterministic across runs.
    themes.sort_by_key(|t| {
        (
            t.severity,
            t.confidence,
            Reverse(t.material_at_stake.unwrap_or(0)),
        )
    });

    let mut seen: HashSet<(ThemeId, Option<String>)> = HashSet::new();
    themes.retain(|t| seen.insert((t.theme, t.squares.first().cloned())));

    debug!(tier = ?tier, count = themes.len(), "theme detection finished");
    themes
}

/// Parse, detect, and wrap the result in the cacheable artifact form. The
/// FEN doubles as the position key.
pub fn detect_with_artifact(fen: &str, opts: &DetectOptions) -> Result<ThemeArtifact, ThemeError> {
    let pos = Position::from_fen(fen)?;
    let start = Instant::now();
    let detected = detect(&pos, opts);
    Ok(ThemeArtifact {
        position_key: fen.to_string(),
        tier: opts.tier,
        detected,
        detector_version: DETECTOR_VERSION.to_string(),
        detection_time_ms: start.elapsed().as_millis() as u64,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{Category, Severity};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_starting_position_is_quiet() {
        let pos = Position::from_fen(START_FEN).unwrap();
        let themes = detect(&pos, &DetectOptions::default());
        assert!(themes.is_empty());
    }

    #[test]
    fn test_tactical_themes_stay_in_the_three_level_severity_subset() {
        // Moderate belongs to the endgame and positional detectors.
        let fens = [
            "r3k3/ppNp1ppp/8/8/8/8/PPP2PPP/R3K2R b KQq - 0 1",
            "n6R/8/1P6/2P5/8/8/8/k6K b - - 0 1",
            "4r1k1/8/2p5/3p4/8/8/5PPP/3R2K1 w - - 0 1",
            "6k1/8/1b6/8/8/8/5PPP/6K1 w - - 0 1",
        ];
        for fen in fens {
            let pos = Position::from_fen(fen).unwrap();
            for theme in detect(&pos, &DetectOptions { tier: Tier::Full }) {
                let endgame_theme = matches!(
                    theme.theme,
                    ThemeId::DirectOpposition
                        | ThemeId::DistantOpposition
                        | ThemeId::DiagonalOpposition
                        | ThemeId::Triangulation
                        | ThemeId::Zugzwang
                );
                if theme.category == Category::Tactical && !endgame_theme {
                    assert_ne!(theme.severity, Severity::Moderate, "{fen}: {:?}", theme.theme);
                }
            }
        }
    }

    #[test]
    fn test_output_is_sorted_by_severity() {
        let pos =
            Position::from_fen("r3k3/ppNp1ppp/8/8/8/8/PPP2PPP/R3K2R b KQq - 0 1").unwrap();
        let themes = detect(&pos, &DetectOptions { tier: Tier::Full });
        assert!(!themes.is_empty());
        for pair in themes.windows(2) {
            assert!(pair[0].severity <= pair[1].severity);
        }
        assert_eq!(themes[0].severity, Severity::Critical);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let pos =
            Position::from_fen("r3k3/ppNp1ppp/8/8/8/8/PPP2PPP/R3K2R b KQq - 0 1").unwrap();
        let opts = DetectOptions { tier: Tier::Full };
        assert_eq!(detect(&pos, &opts), detect(&pos, &opts));
    }

    #[test]
    fn test_no_duplicate_theme_anchor_pairs() {
        let pos = Position::from_fen("3k2r1/8/8/3b4/8/8/B6K/3R4 w - - 0 1").unwrap();
        let themes = detect(&pos, &DetectOptions { tier: Tier::Full });
        let mut keys = HashSet::new();
        for t in &themes {
            assert!(keys.insert((t.theme, t.squares.first().cloned())));
        }
    }

    #[test]
    fn test_shallow_tier_skips_simulation_detectors() {
        let pos =
            Position::from_fen("r3k3/ppNp1ppp/8/8/8/8/PPP2PPP/R3K2R b KQq - 0 1").unwrap();
        let themes = detect(&pos, &DetectOptions { tier: Tier::Shallow });
        assert!(themes
            .iter()
            .all(|t| !matches!(t.theme, ThemeId::PotentialFork | ThemeId::PotentialDiscovery)));
    }

    #[test]
    fn test_artifact_round_trip() {
        let artifact =
            detect_with_artifact(START_FEN, &DetectOptions::default()).expect("valid fen");
        assert_eq!(artifact.position_key, START_FEN);
        assert_eq!(artifact.detector_version, DETECTOR_VERSION);
        assert_eq!(artifact.tier, Tier::Standard);
        assert!(artifact.detected.is_empty());
    }

    #[test]
    fn test_invalid_fen_is_an_error() {
        let err = detect_with_artifact("not a fen", &DetectOptions::default());
        assert!(matches!(err, Err(ThemeError::InvalidFen(_))));
    }
}
