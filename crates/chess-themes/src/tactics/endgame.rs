/// King-and-pawn endgame motifs. All detectors here gate on the endgame
/// test; opposition in a middlegame is noise.

use chess::{Color, Piece, Square};

use crate::geometry::{file_index, offset_square, rank_index};
use crate::pieces::BISHOP_VALUE;
use crate::position::Position;
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

/// Opposition belongs to the side NOT on move: the opponent must step
/// aside first.
pub fn detect_opposition(pos: &Position) -> Vec<DetectedTheme> {
    if !pos.is_endgame() {
        return Vec::new();
    }
    // Opposition only decides king-and-pawn endings.
    if pos.non_pawn_material(Color::White) > BISHOP_VALUE
        || pos.non_pawn_material(Color::Black) > BISHOP_VALUE
    {
        return Vec::new();
    }

    let white_king = pos.king_square(Color::White);
    let black_king = pos.king_square(Color::Black);
    let df = file_index(white_king).abs_diff(file_index(black_king));
    let dr = rank_index(white_king).abs_diff(rank_index(black_king));

    let theme = if (df == 0 && dr == 2) || (df == 2 && dr == 0) {
        ThemeId::DirectOpposition
    } else if (df == 0 && dr > 2 && dr % 2 == 0) || (dr == 0 && df > 2 && df % 2 == 0) {
        ThemeId::DistantOpposition
    } else if df == dr && df > 0 && df % 2 == 0 {
        ThemeId::DiagonalOpposition
    } else {
        return Vec::new();
    };

    let holder = !pos.turn();
    vec![DetectedTheme::new(
        theme,
        holder,
        Severity::Moderate,
        Confidence::Medium,
        format!(
            "The kings on {} and {} stand in opposition, held by the side not to move",
            white_king, black_king
        ),
    )
    .with_squares(&[white_king, black_king])]
}

/// With almost nothing left on the board, a king with spare squares can
/// lose a tempo on purpose and hand the opposition back.
pub fn detect_triangulation(pos: &Position) -> Vec<DetectedTheme> {
    if !pos.is_endgame() {
        return Vec::new();
    }
    let non_pawn_pieces = pos
        .all_pieces()
        .iter()
        .filter(|&&(_, p, _)| p != Piece::Pawn && p != Piece::King)
        .count();
    if non_pawn_pieces > 2 {
        return Vec::new();
    }

    let mover = pos.turn();
    let king_sq = pos.king_square(mover);
    let room = king_room(pos, king_sq, mover);
    if room.len() < 3 {
        return Vec::new();
    }

    vec![DetectedTheme::new(
        ThemeId::Triangulation,
        mover,
        Severity::Moderate,
        Confidence::Low,
        format!(
            "The king on {} has room to triangulate and lose a tempo",
            king_sq
        ),
    )
    .with_squares(&[king_sq])]
}

/// Adjacent squares the king could stand on safely.
fn king_room(pos: &Position, king_sq: Square, color: Color) -> Vec<Square> {
    let mut room = Vec::new();
    for df in -1..=1i8 {
        for dr in -1..=1i8 {
            if df == 0 && dr == 0 {
                continue;
            }
            let Some(sq) = offset_square(king_sq, df, dr) else { continue };
            if pos.piece_at(sq).is_some() || pos.is_attacked(sq, !color) {
                continue;
            }
            room.push(sq);
        }
    }
    room
}

/// The side to move is running out of non-losing moves: only a couple of
/// king shuffles, or only pawn moves that drop the pawn.
pub fn detect_zugzwang(pos: &Position) -> Vec<DetectedTheme> {
    if !pos.is_endgame() || pos.is_check() {
        return Vec::new();
    }
    let moves = pos.legal_moves();
    if moves.is_empty() || moves.len() > 15 {
        return Vec::new();
    }

    let mover = pos.turn();
    let king_sq = pos.king_square(mover);
    let all_king = moves.iter().all(|mv| mv.get_source() == king_sq);
    let squeezed = if all_king {
        moves.len() <= 2
    } else {
        let all_pawn = moves.iter().all(|mv| {
            mv.get_source() == king_sq
                || matches!(pos.piece_at(mv.get_source()), Some((Piece::Pawn, _)))
        });
        all_pawn
            && moves.iter().all(|mv| {
                if mv.get_source() == king_sq {
                    return pos.is_attacked(mv.get_dest(), !mover);
                }
                match pos.try_move(*mv) {
                    Some(next) => {
                        next.is_attacked(mv.get_dest(), !mover)
                            && next.is_hanging(mv.get_dest(), mover)
                    }
                    None => true,
                }
            })
    };
    if !squeezed {
        return Vec::new();
    }

    vec![DetectedTheme::new(
        ThemeId::Zugzwang,
        !mover,
        Severity::Minor,
        Confidence::Low,
        format!(
            "{} is in zugzwang: every move makes things worse",
            crate::position::Side::from(mover).name()
        ),
    )
    .with_squares(&[king_sq])]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_opposition_held_by_side_not_to_move() {
        let pos = Position::from_fen("8/8/4k3/8/4K3/8/7P/8 b - - 0 1").unwrap();
        let themes = detect_opposition(&pos);
        let opposition = themes
            .iter()
            .find(|t| t.theme == ThemeId::DirectOpposition)
            .expect("direct opposition detected");
        assert_eq!(opposition.beneficiary.name(), "White");
    }

    #[test]
    fn test_distant_opposition_on_same_file() {
        // Kings on e2 and e8, six ranks apart
        let pos = Position::from_fen("4k3/8/8/8/8/8/4K2P/8 b - - 0 1").unwrap();
        let themes = detect_opposition(&pos);
        assert!(themes.iter().any(|t| t.theme == ThemeId::DistantOpposition));
    }

    #[test]
    fn test_no_opposition_with_heavy_pieces() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4K3/R6R b - - 0 1").unwrap();
        assert!(detect_opposition(&pos).is_empty());
    }

    #[test]
    fn test_triangulation_room() {
        let pos = Position::from_fen("8/8/8/1k6/8/4K3/7P/8 w - - 0 1").unwrap();
        let themes = detect_triangulation(&pos);
        assert!(themes.iter().any(|t| t.theme == ThemeId::Triangulation));
    }

    #[test]
    fn test_cornered_king_zugzwang() {
        // Black has only Kh7; the a-pawn will run
        let pos = Position::from_fen("7k/5K2/8/8/8/8/P7/8 b - - 0 1").unwrap();
        let themes = detect_zugzwang(&pos);
        let zz = themes
            .iter()
            .find(|t| t.theme == ThemeId::Zugzwang)
            .expect("zugzwang detected");
        assert_eq!(zz.beneficiary.name(), "White");
    }

    #[test]
    fn test_middlegame_positions_are_skipped() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(detect_opposition(&pos).is_empty());
        assert!(detect_triangulation(&pos).is_empty());
        assert!(detect_zugzwang(&pos).is_empty());
    }
}
