//! Dynamic detectors: who is pressing right now. These compare the two
//! sides rather than flagging a single piece.

use chess::{Color, Piece, Square};

use crate::geometry::{file_index, rank_index};
use crate::position::{Position, Side};
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

pub fn detect_dynamics(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    themes.extend(initiative(pos));
    themes.extend(development_lead(pos));
    themes.extend(exposed_kings(pos));
    themes.extend(rooks_on_seventh(pos));
    themes.extend(piece_activity(pos));
    themes.extend(opposite_side_castling(pos));
    themes
}

/// Pressure count: enemy non-pawn pieces under attack, loose ones double.
fn pressure_score(pos: &Position, color: Color) -> i32 {
    let mut score = 0;
    for (sq, piece) in pos.pieces_of(!color) {
        if piece == Piece::Pawn || piece == Piece::King {
            continue;
        }
        if !pos.is_attacked(sq, color) {
            continue;
        }
        score += 1;
        if pos.is_hanging(sq, !color) {
            score += 2;
        }
    }
    score
}

fn initiative(pos: &Position) -> Option<DetectedTheme> {
    let white = pressure_score(pos, Color::White);
    let black = pressure_score(pos, Color::Black);
    let diff = (white - black).abs();
    if diff < 3 {
        return None;
    }
    let leader = if white > black { Color::White } else { Color::Black };
    Some(DetectedTheme::new(
        ThemeId::Initiative,
        leader,
        Severity::Moderate,
        Confidence::Medium,
        format!(
            "{} is creating threats faster than the opponent can answer them",
            Side::from(leader).name()
        ),
    ))
}

fn developed_minors(pos: &Position, color: Color) -> i32 {
    let home = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    pos.pieces_of(color)
        .into_iter()
        .filter(|&(sq, p)| {
            matches!(p, Piece::Knight | Piece::Bishop) && rank_index(sq) != home
        })
        .count() as i32
}

/// Only meaningful while most of the material is still on the board.
fn development_lead(pos: &Position) -> Option<DetectedTheme> {
    if pos.all_pieces().len() < 28 {
        return None;
    }
    let white = developed_minors(pos, Color::White);
    let black = developed_minors(pos, Color::Black);
    let diff = (white - black).abs();
    if diff < 2 {
        return None;
    }
    let leader = if white > black { Color::White } else { Color::Black };
    Some(DetectedTheme::new(
        ThemeId::DevelopmentLead,
        leader,
        Severity::Moderate,
        Confidence::Medium,
        format!(
            "{} is {} minor pieces ahead in development",
            Side::from(leader).name(),
            diff
        ),
    ))
}

/// Pawn cover directly in front of the king, one or two ranks out.
fn shield_pawns(pos: &Position, color: Color) -> usize {
    let king_sq = pos.king_square(color);
    let kf = file_index(king_sq) as i32;
    let kr = rank_index(king_sq) as i32;
    let forward = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    pos.pieces_of(color)
        .into_iter()
        .filter(|&(sq, p)| {
            if p != Piece::Pawn {
                return false;
            }
            let df = (file_index(sq) as i32 - kf).abs();
            let dr = (rank_index(sq) as i32 - kr) * forward;
            df <= 1 && (1..=2).contains(&dr)
        })
        .count()
}

fn exposed_kings(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    for color in [Color::White, Color::Black] {
        let enemy = !color;
        let enemy_has_queen = pos
            .pieces_of(enemy)
            .into_iter()
            .any(|(_, p)| p == Piece::Queen);
        if !enemy_has_queen || pos.non_pawn_material(enemy) < 1500 {
            continue;
        }
        let shield = shield_pawns(pos, color);
        let severity = match shield {
            0 => Severity::Significant,
            1 => Severity::Minor,
            _ => continue,
        };
        let king_sq = pos.king_square(color);
        themes.push(
            DetectedTheme::new(
                ThemeId::ExposedKing,
                enemy,
                severity,
                Confidence::Medium,
                format!("The king on {} has almost no pawn cover left", king_sq),
            )
            .with_squares(&[king_sq]),
        );
    }
    themes
}

fn rooks_on_seventh(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    for color in [Color::White, Color::Black] {
        let (seventh, enemy_back) = match color {
            Color::White => (6, 7),
            Color::Black => (1, 0),
        };
        for (sq, piece) in pos.pieces_of(color) {
            if piece != Piece::Rook || rank_index(sq) != seventh {
                continue;
            }
            let king_cut_off = rank_index(pos.king_square(!color)) == enemy_back;
            themes.push(
                DetectedTheme::new(
                    ThemeId::RookOnSeventh,
                    color,
                    if king_cut_off {
                        Severity::Significant
                    } else {
                        Severity::Moderate
                    },
                    Confidence::High,
                    format!("The rook on {} has reached the seventh rank", sq),
                )
                .with_squares(&[sq]),
            );
        }
    }
    themes
}

/// Raw mobility of the pieces, pawns and kings excluded.
fn mobility(pos: &Position, color: Color) -> i32 {
    pos.pieces_of(color)
        .into_iter()
        .filter(|&(_, p)| p != Piece::Pawn && p != Piece::King)
        .map(|(sq, _)| pos.attacks_from(sq).popcnt() as i32)
        .sum()
}

fn piece_activity(pos: &Position) -> Option<DetectedTheme> {
    let white = mobility(pos, Color::White);
    let black = mobility(pos, Color::Black);
    let diff = (white - black).abs();
    if diff < 10 {
        return None;
    }
    let leader = if white > black { Color::White } else { Color::Black };
    Some(DetectedTheme::new(
        ThemeId::PieceActivity,
        leader,
        Severity::Moderate,
        Confidence::Medium,
        format!(
            "{}'s pieces sweep far more squares than the opponent's",
            Side::from(leader).name()
        ),
    ))
}

/// Kings castled on opposite wings tend to race pawn storms; credit goes
/// to whichever storm is further along.
fn opposite_side_castling(pos: &Position) -> Vec<DetectedTheme> {
    let white_king = pos.king_square(Color::White);
    let black_king = pos.king_square(Color::Black);
    if rank_index(white_king) != 0 || rank_index(black_king) != 7 {
        return Vec::new();
    }
    let wing = |sq: Square| match file_index(sq) {
        0..=2 => Some(false),
        5..=7 => Some(true),
        _ => None,
    };
    let (Some(white_wing), Some(black_wing)) = (wing(white_king), wing(black_king)) else {
        return Vec::new();
    };
    if white_wing == black_wing {
        return Vec::new();
    }
    let queens = pos
        .all_pieces()
        .iter()
        .any(|&(_, p, _)| p == Piece::Queen);
    if !queens {
        return Vec::new();
    }

    let storm = |color: Color, target_kingside: bool| {
        pos.pieces_of(color)
            .into_iter()
            .filter(|&(sq, p)| {
                if p != Piece::Pawn {
                    return false;
                }
                let on_wing = if target_kingside {
                    file_index(sq) >= 5
                } else {
                    file_index(sq) <= 2
                };
                let advanced = match color {
                    Color::White => rank_index(sq) >= 3,
                    Color::Black => rank_index(sq) <= 4,
                };
                on_wing && advanced
            })
            .count()
    };
    let white_storm = storm(Color::White, black_wing);
    let black_storm = storm(Color::Black, white_wing);
    let leader = match white_storm.cmp(&black_storm) {
        std::cmp::Ordering::Greater => Color::White,
        std::cmp::Ordering::Less => Color::Black,
        std::cmp::Ordering::Equal => pos.turn(),
    };

    vec![DetectedTheme::new(
        ThemeId::OppositeSideCastling,
        leader,
        Severity::Moderate,
        Confidence::Low,
        "The kings sit on opposite wings and the pawn storms decide the race".to_string(),
    )
    .with_squares(&[white_king, black_king])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_is_dynamically_balanced() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(detect_dynamics(&pos).is_empty());
    }

    #[test]
    fn test_initiative_from_multiple_threats() {
        // White attacks the knight, bishop and hanging queen at once
        let pos = Position::from_fen("6k1/3q4/1Nn1b3/8/8/8/8/2R1R1K1 w - - 0 1").unwrap();
        let themes = detect_dynamics(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::Initiative && t.beneficiary.name() == "White"));
    }

    #[test]
    fn test_development_lead() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/2B5/2N2N2/PPPPPPPP/R1BQK2R w KQkq - 0 1")
                .unwrap();
        let themes = detect_dynamics(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::DevelopmentLead && t.beneficiary.name() == "White"));
    }

    #[test]
    fn test_bare_king_is_exposed() {
        let pos = Position::from_fen("2nqk2r/8/8/8/8/8/8/6K1 w - - 0 1").unwrap();
        let themes = detect_dynamics(&pos);
        let exposed = themes
            .iter()
            .find(|t| t.theme == ThemeId::ExposedKing)
            .expect("exposed king detected");
        assert_eq!(exposed.severity, Severity::Significant);
        assert_eq!(exposed.beneficiary.name(), "Black");
    }

    #[test]
    fn test_rook_on_seventh_cuts_off_the_king() {
        let pos = Position::from_fen("4k3/R7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_dynamics(&pos);
        let rook = themes
            .iter()
            .find(|t| t.theme == ThemeId::RookOnSeventh)
            .expect("rook on seventh detected");
        assert_eq!(rook.severity, Severity::Significant);
    }

    #[test]
    fn test_opposite_wings_storm_race() {
        let pos = Position::from_fen("1k6/8/8/1P6/P1P5/8/5Q2/6K1 w - - 0 1").unwrap();
        let themes = detect_dynamics(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::OppositeSideCastling && t.beneficiary.name() == "White"));
    }
}
