/// Fork family: forks and double attacks from a single piece, double check
/// as a first-class special case, and simulated one-move fork threats.

use chess::{Color, Piece, Square};

use crate::pieces::{king_value, piece_name, MINOR_VALUE};
use crate::position::{LocatedPiece, Position};
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

pub fn detect_forks(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    themes.extend(detect_double_check(pos));

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.pieces_of(color) {
            if let Some(theme) = fork_at(pos, sq, piece, color) {
                themes.push(theme);
            }
        }
    }

    themes
}

/// A fork only counts if the forking square is not itself a bad spot and
/// there are at least two targets, the cheapest worth a minor piece or more
/// or the king among them. A knight hitting king and pawn is still a fork.
fn fork_at(pos: &Position, sq: Square, piece: Piece, color: Color) -> Option<DetectedTheme> {
    let targets = pos.attacked_enemy_pieces(sq);
    let royal = targets.iter().any(|&(_, p)| p == Piece::King);
    let min_value = targets.iter().map(|&(_, p)| king_value(p)).min().unwrap_or(0);

    if targets.len() >= 2 && (royal || min_value >= MINOR_VALUE) {
        if pos.is_in_bad_spot(sq) {
            return None;
        }
        return Some(fork_theme(pos, sq, piece, color, &targets));
    }

    // Two hanging cheap targets still make a double attack, not a fork.
    let hanging: Vec<(Square, Piece)> = targets
        .iter()
        .copied()
        .filter(|&(tsq, p)| p != Piece::King && pos.is_hanging(tsq, !color))
        .collect();
    if hanging.len() >= 2 && !pos.is_in_bad_spot(sq) {
        let min_value = hanging.iter().map(|&(_, p)| king_value(p)).min().unwrap_or(0);
        let mut squares = vec![sq];
        squares.extend(hanging.iter().map(|&(tsq, _)| tsq));
        return Some(
            DetectedTheme::new(
                ThemeId::DoubleAttack,
                color,
                Severity::Minor,
                Confidence::Medium,
                format!(
                    "The {} on {} attacks {} loose pieces at once",
                    piece_name(piece),
                    sq,
                    hanging.len()
                ),
            )
            .with_squares(&squares)
            .with_material_at_stake(min_value),
        );
    }

    None
}

fn fork_theme(
    pos: &Position,
    sq: Square,
    piece: Piece,
    color: Color,
    targets: &[(Square, Piece)],
) -> DetectedTheme {
    let theme = match piece {
        Piece::Knight => ThemeId::KnightFork,
        Piece::Pawn => ThemeId::PawnFork,
        _ => ThemeId::Fork,
    };
    let royal = targets.iter().any(|&(_, p)| p == Piece::King);
    let severity = if royal {
        Severity::Critical
    } else {
        Severity::Significant
    };
    let confidence = match piece {
        Piece::Knight | Piece::Pawn => Confidence::High,
        _ => Confidence::Medium,
    };

    // The attacker wins at worst the cheaper of the two best targets; with
    // the king among them, the best non-royal piece cannot be saved.
    let mut values: Vec<i32> = targets
        .iter()
        .filter(|&&(_, p)| p != Piece::King)
        .map(|&(_, p)| king_value(p))
        .collect();
    values.sort_unstable_by(|a, b| b.cmp(a));
    let material = if royal {
        values.first().copied().unwrap_or(0)
    } else {
        values.get(1).copied().unwrap_or(0)
    };

    let mut squares = vec![sq];
    squares.extend(targets.iter().map(|&(tsq, _)| tsq));
    let pieces: Vec<LocatedPiece> = squares.iter().filter_map(|&s| pos.located(s)).collect();
    let target_list = targets
        .iter()
        .map(|&(tsq, p)| format!("the {} on {}", piece_name(p), tsq))
        .collect::<Vec<_>>()
        .join(" and ");

    DetectedTheme::new(
        theme,
        color,
        severity,
        confidence,
        format!("The {} on {} forks {}", piece_name(piece), sq, target_list),
    )
    .with_squares(&squares)
    .with_pieces(pieces)
    .with_material_at_stake(material)
}

/// Double check: ≥2 simultaneous checkers. Always critical; the king must
/// move, so no material is directly at stake.
fn detect_double_check(pos: &Position) -> Vec<DetectedTheme> {
    if pos.checker_count() < 2 {
        return Vec::new();
    }
    let defender = pos.turn();
    let checker_squares: Vec<Square> = (*pos.board().checkers()).collect();
    let mut squares = checker_squares.clone();
    squares.push(pos.king_square(defender));

    vec![DetectedTheme::new(
        ThemeId::DoubleCheck,
        !defender,
        Severity::Critical,
        Confidence::High,
        format!(
            "{} is in double check; only a king move escapes",
            crate::position::Side::from(defender).name()
        ),
    )
    .with_squares(&squares)
    .with_material_at_stake(0)]
}

/// Full-tier detector: simulate every legal move and report landing squares
/// that would fork two or more valuable targets.
pub fn detect_potential_forks(pos: &Position) -> Vec<DetectedTheme> {
    let mover = pos.turn();
    let mut themes = Vec::new();

    for mv in pos.legal_moves() {
        let Some(next) = pos.try_move(mv) else { continue };
        let dest = mv.get_dest();
        let Some((piece, _)) = next.piece_at(dest) else { continue };
        if piece == Piece::King {
            continue;
        }
        if next.is_in_bad_spot(dest) {
            continue;
        }
        let valuable: Vec<(Square, Piece)> = next
            .attacked_enemy_pieces(dest)
            .into_iter()
            .filter(|&(_, p)| king_value(p) >= MINOR_VALUE)
            .collect();
        if valuable.len() < 2 {
            continue;
        }
        let mut squares = vec![dest];
        squares.extend(valuable.iter().map(|&(tsq, _)| tsq));
        themes.push(
            DetectedTheme::new(
                ThemeId::PotentialFork,
                mover,
                Severity::Significant,
                Confidence::Medium,
                format!(
                    "{} to {} would fork {} pieces",
                    piece_name(piece),
                    dest,
                    valuable.len()
                ),
            )
            .with_squares(&squares),
        );
    }

    themes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knight_fork_on_royal_targets() {
        // White knight on c7 forks the e8 king and the a8 rook
        let pos =
            Position::from_fen("r3k3/ppNp1ppp/8/8/8/8/PPP2PPP/R3K2R b KQq - 0 1").unwrap();
        let themes = detect_forks(&pos);
        let fork = themes
            .iter()
            .find(|t| matches!(t.theme, ThemeId::KnightFork | ThemeId::Fork))
            .expect("fork detected");
        assert_eq!(fork.theme, ThemeId::KnightFork);
        assert_eq!(fork.severity, Severity::Critical);
        assert_eq!(fork.material_at_stake, Some(500));
    }

    #[test]
    fn test_royal_fork_counts_a_pawn_target() {
        // White knight on d6 forks the e8 king and the b7 pawn; the royal
        // target carries the fork even though the pawn is sub-minor.
        let pos = Position::from_fen("4k3/1p4pp/3N4/8/8/8/6PP/6K1 b - - 0 1").unwrap();
        let themes = detect_forks(&pos);
        let fork = themes
            .iter()
            .find(|t| matches!(t.theme, ThemeId::KnightFork | ThemeId::Fork))
            .expect("king plus pawn is still a fork");
        assert_eq!(fork.theme, ThemeId::KnightFork);
        assert_eq!(fork.severity, Severity::Critical);
        assert_eq!(fork.material_at_stake, Some(100));
    }

    #[test]
    fn test_no_forks_in_starting_position() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(detect_forks(&pos).is_empty());
    }

    #[test]
    fn test_fork_from_bad_square_skipped() {
        // The knight forks king and rook from c7, but the b8 rook guards c7...
        // place a black rook on b7 commanding c7 instead
        let pos =
            Position::from_fen("r3k3/prNp1ppp/8/8/8/8/PPP2PPP/R3K2R b KQq - 0 1").unwrap();
        let themes = detect_forks(&pos);
        assert!(themes
            .iter()
            .all(|t| !matches!(t.theme, ThemeId::KnightFork | ThemeId::Fork)));
    }

    #[test]
    fn test_double_check_reported() {
        // Rook e1 and knight d6 both give check to the e8 king
        let pos = Position::from_fen("4k3/8/3N4/8/8/8/8/4R2K b - - 0 1").unwrap();
        assert_eq!(pos.checker_count(), 2);
        let themes = detect_forks(&pos);
        let dc = themes
            .iter()
            .find(|t| t.theme == ThemeId::DoubleCheck)
            .expect("double check detected");
        assert_eq!(dc.severity, Severity::Critical);
        assert_eq!(dc.material_at_stake, Some(0));
    }
}
