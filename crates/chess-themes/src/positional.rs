//! Positional detectors: slower-burning advantages read off attack maps
//! and piece placement rather than immediate tactics.

use chess::{Color, Piece, Square, ALL_SQUARES};

use crate::geometry::{file_index, king_distance, rank_index, square_at};
use crate::position::Position;
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

const CENTER: [(usize, usize); 4] = [(3, 3), (4, 3), (3, 4), (4, 4)];
const EXTENDED_CENTER: [(usize, usize); 12] = [
    (2, 2),
    (3, 2),
    (4, 2),
    (5, 2),
    (2, 3),
    (5, 3),
    (2, 4),
    (5, 4),
    (2, 5),
    (3, 5),
    (4, 5),
    (5, 5),
];

pub fn detect_positional(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    themes.extend(space_advantage(pos));
    themes.extend(central_control(pos));
    themes.extend(wing_convergence(pos));
    themes.extend(outposts(pos));
    themes.extend(open_files(pos));
    themes.extend(bishop_pair(pos));
    themes.extend(king_activity(pos));
    themes
}

/// Squares controlled in the opponent's half, plus credit for pawns that
/// have crossed the frontier.
fn space_score(pos: &Position, color: Color) -> i32 {
    let in_enemy_half = |sq: Square| match color {
        Color::White => rank_index(sq) >= 4,
        Color::Black => rank_index(sq) <= 3,
    };
    let controlled = ALL_SQUARES
        .iter()
        .filter(|&&sq| in_enemy_half(sq) && pos.is_attacked(sq, color))
        .count() as i32;
    let pawns_across = pos
        .pieces_of(color)
        .into_iter()
        .filter(|&(sq, p)| p == Piece::Pawn && in_enemy_half(sq))
        .count() as i32;
    controlled + 2 * pawns_across
}

fn space_advantage(pos: &Position) -> Option<DetectedTheme> {
    let white = space_score(pos, Color::White);
    let black = space_score(pos, Color::Black);
    let diff = (white - black).abs();
    if diff < 5 {
        return None;
    }
    let leader = if white > black { Color::White } else { Color::Black };
    let severity = if diff >= 10 {
        Severity::Significant
    } else {
        Severity::Moderate
    };
    Some(
        DetectedTheme::new(
            ThemeId::SpaceAdvantage,
            leader,
            severity,
            Confidence::Medium,
            format!(
                "{} controls far more territory in the opposing half",
                crate::position::Side::from(leader).name()
            ),
        ),
    )
}

fn central_control(pos: &Position) -> Option<DetectedTheme> {
    let weight_for = |color: Color| {
        let core: i32 = CENTER
            .iter()
            .map(|&(f, r)| pos.attackers(square_at(f, r), color).popcnt() as i32)
            .sum();
        let ring: i32 = EXTENDED_CENTER
            .iter()
            .map(|&(f, r)| pos.attackers(square_at(f, r), color).popcnt() as i32)
            .sum();
        2 * core + ring
    };
    let white = weight_for(Color::White);
    let black = weight_for(Color::Black);
    let diff = (white - black).abs();
    if diff < 4 {
        return None;
    }
    let leader = if white > black { Color::White } else { Color::Black };
    Some(
        DetectedTheme::new(
            ThemeId::CentralControl,
            leader,
            Severity::Moderate,
            Confidence::Medium,
            format!(
                "{} has the firmer grip on the central squares",
                crate::position::Side::from(leader).name()
            ),
        ),
    )
}

/// Several pieces aimed at one wing of the opponent's back two ranks.
fn wing_convergence(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let ranks = match color {
            Color::White => [6usize, 7],
            Color::Black => [0, 1],
        };
        for (theme, files) in [
            (ThemeId::KingsideConvergence, [5usize, 6, 7]),
            (ThemeId::QueensideConvergence, [0, 1, 2]),
        ] {
            let mut squares = Vec::new();
            let mut total = 0u32;
            let mut pressured = 0;
            for &r in &ranks {
                for &f in &files {
                    let sq = square_at(f, r);
                    let n = pos.attackers(sq, color).popcnt();
                    total += n;
                    if n >= 2 {
                        pressured += 1;
                        squares.push(sq);
                    }
                }
            }
            if pressured < 3 || total < 6 {
                continue;
            }
            themes.push(
                DetectedTheme::new(
                    theme,
                    color,
                    Severity::Significant,
                    Confidence::Medium,
                    format!(
                        "{} pieces converge on the {}",
                        crate::position::Side::from(color).name(),
                        if theme == ThemeId::KingsideConvergence {
                            "kingside"
                        } else {
                            "queenside"
                        }
                    ),
                )
                .with_squares(&squares),
            );
        }
    }

    themes
}

/// A pawn-protected minor that no enemy pawn can ever evict.
fn outposts(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.pieces_of(color) {
            if !matches!(piece, Piece::Knight | Piece::Bishop) {
                continue;
            }
            let in_enemy_territory = match color {
                Color::White => rank_index(sq) >= 4,
                Color::Black => rank_index(sq) <= 3,
            };
            if !in_enemy_territory {
                continue;
            }
            let pawn_backed = pos
                .attackers(sq, color)
                .any(|dsq| matches!(pos.piece_at(dsq), Some((Piece::Pawn, _))));
            if !pawn_backed {
                continue;
            }
            let file = file_index(sq);
            let evictable = pos.pieces_of(!color).into_iter().any(|(esq, ep)| {
                ep == Piece::Pawn
                    && file_index(esq).abs_diff(file) == 1
                    && match color {
                        Color::White => rank_index(esq) > rank_index(sq),
                        Color::Black => rank_index(esq) < rank_index(sq),
                    }
            });
            if evictable {
                continue;
            }
            themes.push(
                DetectedTheme::new(
                    ThemeId::Outpost,
                    color,
                    Severity::Moderate,
                    Confidence::High,
                    format!(
                        "The {} on {} sits on a permanent outpost",
                        crate::pieces::piece_name(piece),
                        sq
                    ),
                )
                .with_squares(&[sq]),
            );
        }
    }

    themes
}

fn open_files(pos: &Position) -> Vec<DetectedTheme> {
    let mut pawn_files = [false; 8];
    for (sq, piece, _) in pos.all_pieces() {
        if piece == Piece::Pawn {
            pawn_files[file_index(sq)] = true;
        }
    }

    let mut themes = Vec::new();
    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.pieces_of(color) {
            if piece != Piece::Rook || pawn_files[file_index(sq)] {
                continue;
            }
            themes.push(
                DetectedTheme::new(
                    ThemeId::OpenFile,
                    color,
                    Severity::Moderate,
                    Confidence::High,
                    format!(
                        "The rook on {} owns the open {}-file",
                        sq,
                        (b'a' + file_index(sq) as u8) as char
                    ),
                )
                .with_squares(&[sq]),
            );
        }
    }
    themes
}

fn bishop_pair(pos: &Position) -> Vec<DetectedTheme> {
    let count = |color: Color| {
        pos.pieces_of(color)
            .into_iter()
            .filter(|&(_, p)| p == Piece::Bishop)
            .count()
    };
    let white = count(Color::White);
    let black = count(Color::Black);
    let holder = if white >= 2 && black < 2 {
        Color::White
    } else if black >= 2 && white < 2 {
        Color::Black
    } else {
        return Vec::new();
    };
    vec![DetectedTheme::new(
        ThemeId::BishopPair,
        holder,
        Severity::Minor,
        Confidence::High,
        format!(
            "{} has the bishop pair against fewer than two bishops",
            crate::position::Side::from(holder).name()
        ),
    )]
}

/// In the endgame the king is a fighting piece; a clearly more central
/// king is a real asset.
fn king_activity(pos: &Position) -> Vec<DetectedTheme> {
    if !pos.is_endgame() {
        return Vec::new();
    }
    let centrality = |sq: Square| {
        CENTER
            .iter()
            .map(|&(f, r)| king_distance(sq, square_at(f, r)))
            .min()
            .unwrap_or(0) as i32
    };
    let white_sq = pos.king_square(Color::White);
    let black_sq = pos.king_square(Color::Black);
    let white_dist = centrality(white_sq);
    let black_dist = centrality(black_sq);
    if (white_dist - black_dist).abs() < 2 {
        return Vec::new();
    }
    let (active, active_sq) = if white_dist < black_dist {
        (Color::White, white_sq)
    } else {
        (Color::Black, black_sq)
    };
    vec![DetectedTheme::new(
        ThemeId::KingActivity,
        active,
        Severity::Moderate,
        Confidence::Medium,
        format!("The king on {} is far more active than its counterpart", active_sq),
    )
    .with_squares(&[active_sq])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_is_positionally_balanced() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(detect_positional(&pos).is_empty());
    }

    #[test]
    fn test_space_advantage_from_advanced_knights() {
        let pos = Position::from_fen("4k3/8/8/2NNN3/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_positional(&pos);
        let space = themes
            .iter()
            .find(|t| t.theme == ThemeId::SpaceAdvantage)
            .expect("space advantage detected");
        assert_eq!(space.beneficiary.name(), "White");
    }

    #[test]
    fn test_big_pawn_center_controls_the_middle() {
        let pos = Position::from_fen("4k3/8/8/8/2PPPP2/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_positional(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::CentralControl && t.beneficiary.name() == "White"));
    }

    #[test]
    fn test_kingside_convergence() {
        let pos = Position::from_fen("3q2k1/5ppp/8/5NNQ/2B5/8/1B6/6K1 w - - 0 1").unwrap();
        let themes = detect_positional(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::KingsideConvergence && t.beneficiary.name() == "White"));
    }

    #[test]
    fn test_protected_knight_outpost() {
        let pos = Position::from_fen("4k3/8/8/3N4/2P5/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_positional(&pos);
        assert!(themes.iter().any(|t| t.theme == ThemeId::Outpost));
    }

    #[test]
    fn test_rook_on_open_file() {
        let pos = Position::from_fen("4k3/pp3ppp/8/8/8/8/PP3PPP/3RK3 w - - 0 1").unwrap();
        let themes = detect_positional(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::OpenFile && t.squares == vec!["d1".to_string()]));
    }

    #[test]
    fn test_bishop_pair_imbalance() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1").unwrap();
        let themes = detect_positional(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::BishopPair && t.beneficiary.name() == "White"));
    }

    #[test]
    fn test_centralized_king_in_endgame() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/P7/K7 w - - 0 1").unwrap();
        let themes = detect_positional(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::KingActivity && t.beneficiary.name() == "Black"));
    }
}
