/// Piece utilities: material values, naming, and geometric move generators.

use chess::{BitBoard, Board, Color, Piece, Square, EMPTY};

use crate::geometry::offset_square;

// Static material values in centipawns
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;
pub const KING_VALUE: i32 = 20_000;

/// A minor piece's worth; the floor for "valuable" fork/skewer targets.
pub const MINOR_VALUE: i32 = 300;

/// Piece value for material arithmetic (king excluded).
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

/// Piece value with the king counted, for target comparisons in
/// fork/pin/skewer detection.
pub fn king_value(piece: Piece) -> i32 {
    match piece {
        Piece::King => KING_VALUE,
        other => piece_value(other),
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

/// Is this a ray (sliding) piece type?
pub fn is_sliding(piece: Piece) -> bool {
    matches!(piece, Piece::Queen | Piece::Rook | Piece::Bishop)
}

/// The squares a knight on `sq` reaches, in index order.
pub fn knight_move_squares(sq: Square) -> Vec<Square> {
    chess::get_knight_moves(sq).collect()
}

/// The two (or one, on the edge) squares a pawn on `sq` captures toward.
pub fn pawn_capture_squares(sq: Square, color: Color) -> Vec<Square> {
    let dr: i8 = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    [-1, 1]
        .iter()
        .filter_map(|&df| offset_square(sq, df, dr))
        .collect()
}

/// Pawn attack squares as a bitboard (diagonal captures only, not pushes).
pub fn pawn_attacks(sq: Square, color: Color) -> BitBoard {
    let mut result = EMPTY;
    for target in pawn_capture_squares(sq, color) {
        result |= BitBoard::from_square(target);
    }
    result
}

/// Locate the king of a color. Every legal position has exactly one.
pub fn find_king(board: &Board, color: Color) -> Square {
    let king_bb = *board.pieces(Piece::King) & *board.color_combined(color);
    debug_assert_eq!(king_bb.popcnt(), 1);
    king_bb.to_square()
}

/// All sliding pieces (bishop, rook, queen) of a color with their squares,
/// in square order.
pub fn sliding_piece_squares(board: &Board, color: Color) -> Vec<(Square, Piece)> {
    let color_bb = *board.color_combined(color);
    let sliders = (*board.pieces(Piece::Bishop)
        | *board.pieces(Piece::Rook)
        | *board.pieces(Piece::Queen))
        & color_bb;
    sliders
        .map(|sq| (sq, board.piece_on(sq).unwrap()))
        .collect()
}

/// Material for one side in centipawns, king excluded.
pub fn material_count(board: &Board, color: Color) -> i32 {
    let color_bb = *board.color_combined(color);
    let count = |piece: Piece| (*board.pieces(piece) & color_bb).popcnt() as i32;
    count(Piece::Pawn) * PAWN_VALUE
        + count(Piece::Knight) * KNIGHT_VALUE
        + count(Piece::Bishop) * BISHOP_VALUE
        + count(Piece::Rook) * ROOK_VALUE
        + count(Piece::Queen) * QUEEN_VALUE
}

/// Material excluding both kings and pawns, used for endgame gating.
pub fn non_pawn_material(board: &Board, color: Color) -> i32 {
    material_count(board, color)
        - (*board.pieces(Piece::Pawn) & *board.color_combined(color)).popcnt() as i32 * PAWN_VALUE
}
