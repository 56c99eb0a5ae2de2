/// Pawn tactics: far-advanced runners, breakthrough majorities, and
/// promotion tricks.

use std::collections::HashSet;

use chess::{ChessMove, Color, Piece, Rank, Square};

use crate::geometry::{file_index, rank_index};
use crate::position::Position;
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

/// A pawn on the sixth rank is a serious threat, on the seventh it is
/// one square from a new queen.
pub fn detect_advanced_pawns(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.pieces_of(color) {
            if piece != Piece::Pawn {
                continue;
            }
            let rank = rank_index(sq);
            let steps_home = match color {
                Color::White => rank,
                Color::Black => 7 - rank,
            };
            let (severity, explanation) = match steps_home {
                6 => (
                    Severity::Critical,
                    format!("The pawn on {} is one step from promotion", sq),
                ),
                5 => (
                    Severity::Significant,
                    format!("The pawn on {} is two steps from promotion", sq),
                ),
                _ => continue,
            };
            let mut theme = DetectedTheme::new(
                ThemeId::AdvancedPawn,
                color,
                severity,
                Confidence::High,
                explanation,
            )
            .with_squares(&[sq]);
            if severity == Severity::Critical {
                // Promotion converts a pawn into a queen, net 800.
                theme = theme.with_material_at_stake(800);
            }
            themes.push(theme);
        }
    }

    themes
}

/// A connected pawn duo past the midpoint, backed by a local file majority,
/// can usually force a passer through.
pub fn detect_breakthrough(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let pawns: Vec<Square> = pos
            .pieces_of(color)
            .into_iter()
            .filter(|&(_, p)| p == Piece::Pawn)
            .map(|(sq, _)| sq)
            .filter(|&sq| match color {
                Color::White => rank_index(sq) >= 4,
                Color::Black => rank_index(sq) <= 3,
            })
            .collect();

        for &sq in &pawns {
            let file = file_index(sq);
            let connected = pawns.iter().any(|&other| {
                other != sq
                    && file_index(other).abs_diff(file) == 1
                    && rank_index(other).abs_diff(rank_index(sq)) <= 1
            });
            if !connected {
                continue;
            }
            if !local_majority(pos, color, file) {
                continue;
            }
            themes.push(
                DetectedTheme::new(
                    ThemeId::PawnBreakthrough,
                    color,
                    Severity::Significant,
                    Confidence::Medium,
                    format!("The advanced pawns around {} can break through", sq),
                )
                .with_squares(&[sq]),
            );
            // One report per side is enough.
            break;
        }
    }

    themes
}

/// More friendly than enemy pawns on the file and its neighbors.
fn local_majority(pos: &Position, color: Color, file: usize) -> bool {
    let lo = file.saturating_sub(1);
    let hi = (file + 1).min(7);
    let count = |c: Color| {
        pos.pieces_of(c)
            .into_iter()
            .filter(|&(sq, p)| p == Piece::Pawn && (lo..=hi).contains(&file_index(sq)))
            .count()
    };
    count(color) > count(!color)
}

/// Full-tier detector: a legal knight promotion that gives check. Queening
/// would be the reflex, so the knight is worth pointing out.
pub fn detect_underpromotion(pos: &Position) -> Vec<DetectedTheme> {
    let mover = pos.turn();
    let promo_rank = match mover {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    };
    let mut themes = Vec::new();
    // One report per pawn; the move list repeats each promotion square
    // once per promotion piece.
    let mut reported: HashSet<Square> = HashSet::new();

    for mv in pos.legal_moves() {
        if mv.get_dest().get_rank() != promo_rank {
            continue;
        }
        let source = mv.get_source();
        if reported.contains(&source) {
            continue;
        }
        let Some((Piece::Pawn, _)) = pos.piece_at(source) else { continue };
        let knight_promo = ChessMove::new(source, mv.get_dest(), Some(Piece::Knight));
        let Some(next) = pos.try_move(knight_promo) else { continue };
        if !next.is_check() {
            continue;
        }
        reported.insert(source);
        themes.push(
            DetectedTheme::new(
                ThemeId::Underpromotion,
                mover,
                Severity::Significant,
                Confidence::High,
                format!(
                    "Promoting on {} to a knight gives check",
                    knight_promo.get_dest()
                ),
            )
            .with_squares(&[source, knight_promo.get_dest()]),
        );
    }

    themes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seventh_rank_pawn_is_critical() {
        let pos = Position::from_fen("4k3/3P4/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_advanced_pawns(&pos);
        let pawn = themes
            .iter()
            .find(|t| t.theme == ThemeId::AdvancedPawn)
            .expect("advanced pawn detected");
        assert_eq!(pawn.severity, Severity::Critical);
        assert_eq!(pawn.material_at_stake, Some(800));
    }

    #[test]
    fn test_sixth_rank_pawn_is_significant() {
        let pos = Position::from_fen("4k3/8/3P4/8/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_advanced_pawns(&pos);
        assert_eq!(themes[0].severity, Severity::Significant);
    }

    #[test]
    fn test_breakthrough_needs_majority() {
        // Three white pawns against two black on the kingside, duo on the
        // fifth rank
        let pos = Position::from_fen("4k3/8/5p2/5PP1/6P1/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_breakthrough(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::PawnBreakthrough && t.beneficiary.name() == "White"));
    }

    #[test]
    fn test_knight_underpromotion_with_check() {
        // d8=N+ forks... gives check to the b7 king
        let pos = Position::from_fen("8/1k1P4/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_underpromotion(&pos);
        assert!(themes.iter().any(|t| t.theme == ThemeId::Underpromotion));
    }

    #[test]
    fn test_every_checking_underpromotion_is_reported() {
        // Both b8=N+ and f8=N+ hit the d7 king; each pawn gets its own
        // report, and only one per pawn.
        let pos = Position::from_fen("8/1P1k1P2/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_underpromotion(&pos);
        assert_eq!(themes.len(), 2);
        let sources: Vec<&str> = themes.iter().map(|t| t.squares[0].as_str()).collect();
        assert!(sources.contains(&"b7"));
        assert!(sources.contains(&"f7"));
    }
}
