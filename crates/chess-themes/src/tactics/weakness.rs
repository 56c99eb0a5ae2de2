/// Static weaknesses that sit in the position until someone fixes them:
/// airless back ranks, soft f-pawns, loose pieces, and pieces with
/// nowhere to go.

use chess::{Color, Piece, Square};

use crate::geometry::{file_index, king_distance, offset_square, rank_index, square_at};
use crate::pieces::{king_value, piece_name, MINOR_VALUE, ROOK_VALUE};
use crate::position::Position;
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

pub fn detect_static_weaknesses(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    for color in [Color::White, Color::Black] {
        themes.extend(back_rank_weakness(pos, color));
        themes.extend(f_pawn_weakness(pos, color));
    }
    themes.extend(detect_hanging_pieces(pos));
    themes
}

/// King sealed in by its own pawns with enemy heavy pieces eyeing the rank.
fn back_rank_weakness(pos: &Position, color: Color) -> Option<DetectedTheme> {
    let back = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    let forward: i8 = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let king_sq = pos.king_square(color);
    if rank_index(king_sq) != back {
        return None;
    }

    let file = file_index(king_sq) as i8;
    let mut shield = Vec::new();
    for df in -1..=1 {
        let f = file + df;
        if !(0..8).contains(&f) {
            continue;
        }
        let sq = offset_square(king_sq, df, forward)?;
        match pos.piece_at(sq) {
            Some((Piece::Pawn, c)) if c == color => shield.push(sq),
            _ => return None,
        }
    }
    if shield.is_empty() {
        return None;
    }

    let enemy = !color;
    let heavies: Vec<Square> = pos
        .pieces_of(enemy)
        .into_iter()
        .filter(|&(_, p)| matches!(p, Piece::Rook | Piece::Queen))
        .map(|(sq, _)| sq)
        .collect();
    if heavies.is_empty() {
        return None;
    }

    let on_rank = heavies.iter().any(|&sq| rank_index(sq) == back);
    let eyes_rank = (0..8).any(|f| {
        let target = square_at(f, back);
        heavies
            .iter()
            .any(|&hsq| pos.attacks_from(hsq) & chess::BitBoard::from_square(target) != chess::EMPTY)
    });
    let severity = if on_rank {
        Severity::Critical
    } else if eyes_rank {
        Severity::Significant
    } else {
        return None;
    };

    let mut squares = vec![king_sq];
    squares.extend(shield);
    Some(
        DetectedTheme::new(
            ThemeId::BackRankWeakness,
            enemy,
            severity,
            Confidence::High,
            format!("The king on {} has no escape from its back rank", king_sq),
        )
        .with_squares(&squares),
    )
}

/// The f2/f7 square is the softest point near an uncastled or freshly
/// castled king.
fn f_pawn_weakness(pos: &Position, color: Color) -> Option<DetectedTheme> {
    let f_sq = match color {
        Color::White => square_at(5, 1),
        Color::Black => square_at(5, 6),
    };
    match pos.piece_at(f_sq) {
        Some((Piece::Pawn, c)) if c == color => {}
        _ => return None,
    }
    let enemy = !color;
    let attackers = pos.attackers(f_sq, enemy).popcnt();
    let defenders = pos.attackers(f_sq, color).popcnt();
    if attackers == 0 || attackers < defenders {
        return None;
    }
    if king_distance(pos.king_square(color), f_sq) > 2 {
        return None;
    }
    Some(
        DetectedTheme::new(
            ThemeId::FPawnWeakness,
            enemy,
            Severity::Minor,
            Confidence::Medium,
            format!("The pawn on {} is under more pressure than it has cover", f_sq),
        )
        .with_squares(&[f_sq]),
    )
}

/// Attacked and undefended pieces, graded by what they are worth.
pub fn detect_hanging_pieces(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.pieces_of(color) {
            if piece == Piece::King {
                continue;
            }
            if !pos.is_attacked(sq, !color) || !pos.is_hanging(sq, color) {
                continue;
            }
            let value = king_value(piece);
            let severity = if value >= ROOK_VALUE {
                Severity::Critical
            } else if value >= MINOR_VALUE {
                Severity::Significant
            } else {
                Severity::Minor
            };
            themes.push(
                DetectedTheme::new(
                    ThemeId::HangingPiece,
                    !color,
                    severity,
                    Confidence::High,
                    format!("The {} on {} is attacked and undefended", piece_name(piece), sq),
                )
                .with_squares(&[sq])
                .with_material_at_stake(value),
            );
        }
    }

    themes
}

/// A minor or better that is attacked and has no safe square to run to.
pub fn detect_trapped_pieces(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let moves = pos.legal_moves_for(color);
        for (sq, piece) in pos.pieces_of(color) {
            if piece == Piece::King || piece == Piece::Pawn || king_value(piece) < MINOR_VALUE {
                continue;
            }
            if !pos.is_in_bad_spot(sq) {
                continue;
            }
            let escapes = moves.iter().any(|mv| {
                mv.get_source() == sq
                    && (!pos.is_attacked(mv.get_dest(), !color)
                        || pos.is_defended_excluding(mv.get_dest(), color, sq))
            });
            if escapes {
                continue;
            }
            let value = king_value(piece);
            themes.push(
                DetectedTheme::new(
                    ThemeId::TrappedPiece,
                    !color,
                    if value >= ROOK_VALUE {
                        Severity::Significant
                    } else {
                        Severity::Minor
                    },
                    Confidence::Medium,
                    format!("The {} on {} has no safe square", piece_name(piece), sq),
                )
                .with_squares(&[sq])
                .with_material_at_stake(value),
            );
        }
    }

    themes
}
