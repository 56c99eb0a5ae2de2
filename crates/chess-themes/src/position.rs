/// The Position Oracle: a snapshot of one board state and the queries the
/// detectors are allowed to make against it.
///
/// Detectors never mutate a position. What-if exploration goes through
/// [`Position::try_move`], which clones first; `chess::Board` is `Copy`, so a
/// clone is an independent snapshot and sibling simulations never interfere.

use std::str::FromStr;

use chess::{
    BitBoard, Board, BoardBuilder, ChessMove, Color, MoveGen, Piece, Square, ALL_SQUARES, EMPTY,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{direction_between, sliding_directions};
use crate::pieces::{self, is_sliding, king_value, piece_value};
use crate::rays;

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

/// Wire form of a color: `w` or `b`, matching FEN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

/// Wire form of a piece type: `p`, `n`, `b`, `r`, `q`, `k`, as in FEN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "p")]
    Pawn,
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "k")]
    King,
}

impl From<Piece> for PieceKind {
    fn from(piece: Piece) -> Self {
        match piece {
            Piece::Pawn => PieceKind::Pawn,
            Piece::Knight => PieceKind::Knight,
            Piece::Bishop => PieceKind::Bishop,
            Piece::Rook => PieceKind::Rook,
            Piece::Queen => PieceKind::Queen,
            Piece::King => PieceKind::King,
        }
    }
}

/// An immutable snapshot of one piece on one square. Never aliases live
/// board state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedPiece {
    #[serde(rename = "type")]
    pub piece: PieceKind,
    pub color: Side,
    pub square: String,
}

impl LocatedPiece {
    pub fn new(piece: Piece, color: Color, square: Square) -> Self {
        Self {
            piece: piece.into(),
            color: color.into(),
            square: square.to_string(),
        }
    }
}

/// One chess position and the oracle queries over it.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    board: Board,
}

impl Position {
    pub fn new(board: Board) -> Self {
        Self { board }
    }

    /// The one fallible constructor. Malformed FEN is rejected here, before
    /// any detector runs.
    ///
    /// Positions where the side to move already attacks the enemy king are
    /// accepted by flipping the side to move: every detector scans both
    /// colors, so the themes on the board do not depend on whose turn the
    /// FEN claims it is.
    pub fn from_fen(fen: &str) -> Result<Self, ThemeError> {
        let mut builder = BoardBuilder::from_str(fen)
            .map_err(|e| ThemeError::InvalidFen(format!("{fen}: {e}")))?;

        // Board construction assumes one king per side; a board without
        // them indexes out of range, so reject before converting.
        for color in [Color::White, Color::Black] {
            let kings = ALL_SQUARES
                .iter()
                .filter(|&&sq| builder[sq] == Some((Piece::King, color)))
                .count();
            if kings != 1 {
                return Err(ThemeError::InvalidFen(format!(
                    "{fen}: found {kings} {} kings, expected 1",
                    match color {
                        Color::White => "white",
                        Color::Black => "black",
                    }
                )));
            }
        }

        if let Ok(board) = Board::try_from(&builder) {
            return Ok(Self::new(board));
        }
        let flipped = !builder.get_side_to_move();
        builder.side_to_move(flipped);
        Board::try_from(&builder)
            .map(Self::new)
            .map_err(|e| ThemeError::InvalidFen(format!("{fen}: {e}")))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    pub fn checker_count(&self) -> u32 {
        self.board.checkers().popcnt()
    }

    /// All pieces on the board in square order.
    pub fn all_pieces(&self) -> Vec<(Square, Piece, Color)> {
        (*self.board.combined())
            .filter_map(|sq| self.piece_at(sq).map(|(p, c)| (sq, p, c)))
            .collect()
    }

    /// Pieces of one color in square order.
    pub fn pieces_of(&self, color: Color) -> Vec<(Square, Piece)> {
        (*self.board.color_combined(color))
            .filter_map(|sq| self.board.piece_on(sq).map(|p| (sq, p)))
            .collect()
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        match (self.board.piece_on(sq), self.board.color_on(sq)) {
            (Some(p), Some(c)) => Some((p, c)),
            _ => None,
        }
    }

    pub fn located(&self, sq: Square) -> Option<LocatedPiece> {
        self.piece_at(sq).map(|(p, c)| LocatedPiece::new(p, c, sq))
    }

    /// Squares attacked by the piece on `sq` (empty when the square is empty).
    pub fn attacks_from(&self, sq: Square) -> BitBoard {
        let piece = match self.board.piece_on(sq) {
            Some(p) => p,
            None => return EMPTY,
        };
        let occupied = *self.board.combined();
        match piece {
            Piece::Pawn => {
                let color = self.board.color_on(sq).unwrap_or(Color::White);
                pieces::pawn_attacks(sq, color)
            }
            Piece::Knight => chess::get_knight_moves(sq),
            Piece::King => chess::get_king_moves(sq),
            Piece::Bishop => chess::get_bishop_moves(sq, occupied),
            Piece::Rook => chess::get_rook_moves(sq, occupied),
            Piece::Queen => {
                chess::get_bishop_moves(sq, occupied) | chess::get_rook_moves(sq, occupied)
            }
        }
    }

    /// All pieces of `color` that attack `sq`, as a bitboard. Pawns are found
    /// by reverse lookup: pawn attacks FROM the target with the opposite
    /// color, intersected with actual pawns.
    pub fn attackers(&self, sq: Square, color: Color) -> BitBoard {
        let occupied = *self.board.combined();
        let color_bb = *self.board.color_combined(color);
        let mut result = EMPTY;

        result |= pieces::pawn_attacks(sq, !color) & *self.board.pieces(Piece::Pawn) & color_bb;
        result |= chess::get_knight_moves(sq) & *self.board.pieces(Piece::Knight) & color_bb;
        result |= chess::get_king_moves(sq) & *self.board.pieces(Piece::King) & color_bb;
        result |= chess::get_bishop_moves(sq, occupied)
            & (*self.board.pieces(Piece::Bishop) | *self.board.pieces(Piece::Queen))
            & color_bb;
        result |= chess::get_rook_moves(sq, occupied)
            & (*self.board.pieces(Piece::Rook) | *self.board.pieces(Piece::Queen))
            & color_bb;
        result
    }

    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        self.attackers(sq, by) != EMPTY
    }

    /// Legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    /// Clone-and-apply. Returns `None` for an illegal move; per the failure
    /// semantics, callers drop the candidate and carry on.
    pub fn try_move(&self, mv: ChessMove) -> Option<Position> {
        if self.board.legal(mv) {
            Some(Position::new(self.board.make_move_new(mv)))
        } else {
            None
        }
    }

    /// Legal moves for `color`, even when it is not that side's turn
    /// (via a null move). Empty when the side to move is in check.
    pub fn legal_moves_for(&self, color: Color) -> Vec<ChessMove> {
        if self.turn() == color {
            return self.legal_moves();
        }
        match self.board.null_move() {
            Some(flipped) => MoveGen::new_legal(&flipped).collect(),
            None => Vec::new(),
        }
    }

    pub fn sliding_pieces(&self, color: Color) -> Vec<(Square, Piece)> {
        pieces::sliding_piece_squares(&self.board, color)
    }

    pub fn king_square(&self, color: Color) -> Square {
        pieces::find_king(&self.board, color)
    }

    /// Material in centipawns, king excluded.
    pub fn material(&self, color: Color) -> i32 {
        pieces::material_count(&self.board, color)
    }

    pub fn non_pawn_material(&self, color: Color) -> i32 {
        pieces::non_pawn_material(&self.board, color)
    }

    /// Endgame gate for the endgame-only detectors: no queens on the board,
    /// or at most 1200cp of non-king, non-pawn material per side.
    pub fn is_endgame(&self) -> bool {
        if self.board.pieces(Piece::Queen).popcnt() == 0 {
            return true;
        }
        self.non_pawn_material(Color::White) <= 1200
            && self.non_pawn_material(Color::Black) <= 1200
    }

    /// Is the piece on `sq` (of `color`) defended? Checks direct defenders
    /// plus x-ray defense: a friendly slider lined up behind an enemy sliding
    /// attacker still guards the square once the attacker lands there.
    pub fn is_defended(&self, sq: Square, color: Color) -> bool {
        if self.attackers(sq, color) != EMPTY {
            return true;
        }
        for att_sq in self.attackers(sq, !color) {
            let Some((att_piece, _)) = self.piece_at(att_sq) else {
                continue;
            };
            if !is_sliding(att_piece) {
                continue;
            }
            let Some(dir) = direction_between(sq, att_sq) else {
                continue;
            };
            if let Some(&(_, behind_piece, behind_color)) =
                rays::pieces_on_ray(self, att_sq, dir).first()
            {
                if behind_color == color && sliding_directions(behind_piece).contains(&dir) {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_hanging(&self, sq: Square, color: Color) -> bool {
        !self.is_defended(sq, color)
    }

    /// Whether `color` defends `sq` with a piece other than the one on
    /// `except`. A piece never defends its own retreat square, so escape
    /// checks mask it out of the defender set.
    pub fn is_defended_excluding(&self, sq: Square, color: Color, except: Square) -> bool {
        self.attackers(sq, color) & !BitBoard::from_square(except) != EMPTY
    }

    pub fn can_be_taken_by_lower_piece(&self, sq: Square) -> bool {
        let Some((piece, color)) = self.piece_at(sq) else {
            return false;
        };
        for att_sq in self.attackers(sq, !color) {
            if let Some((att_piece, _)) = self.piece_at(att_sq) {
                if att_piece != Piece::King && piece_value(att_piece) < piece_value(piece) {
                    return true;
                }
            }
        }
        false
    }

    /// A piece is in a bad spot when it is attacked and either hanging or
    /// takeable by a cheaper piece.
    pub fn is_in_bad_spot(&self, sq: Square) -> bool {
        let Some((_, color)) = self.piece_at(sq) else {
            return false;
        };
        if self.attackers(sq, !color) == EMPTY {
            return false;
        }
        self.is_hanging(sq, color) || self.can_be_taken_by_lower_piece(sq)
    }

    /// Enemy pieces attacked from `sq`, with their squares, in square order.
    pub fn attacked_enemy_pieces(&self, sq: Square) -> Vec<(Square, Piece)> {
        let Some((_, color)) = self.piece_at(sq) else {
            return Vec::new();
        };
        self.attacks_from(sq)
            .filter_map(|target| match self.piece_at(target) {
                Some((p, c)) if c != color => Some((target, p)),
                _ => None,
            })
            .collect()
    }

    /// Value comparison helper for exchanges on `sq`.
    pub fn value_at(&self, sq: Square) -> i32 {
        self.piece_at(sq).map(|(p, _)| king_value(p)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::square_at;

    #[test]
    fn test_from_fen_rejects_garbage() {
        assert!(Position::from_fen("not a fen").is_err());
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_ok());
    }

    #[test]
    fn test_from_fen_rejects_boards_without_kings() {
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/K3K3 w - - 0 1").is_err());
    }

    #[test]
    fn test_from_fen_accepts_mover_attacking_the_enemy_king() {
        // The d7 pawn attacks e8 with White to move; the oracle flips the
        // side to move instead of rejecting the position.
        let pos = Position::from_fen("4k3/3P4/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.turn(), Color::Black);
        assert!(pos.piece_at(square_at(3, 6)).is_some());
    }

    #[test]
    fn test_is_defended_excluding_masks_the_mover() {
        // The a8 knight reaches b6, so it counts as a defender of b6; with
        // the knight masked out nobody else covers the square.
        let pos = Position::from_fen("n6R/8/1P6/2P5/8/8/8/k6K b - - 0 1").unwrap();
        let b6 = square_at(1, 5);
        let a8 = square_at(0, 7);
        assert!(pos.is_defended(b6, Color::Black));
        assert!(!pos.is_defended_excluding(b6, Color::Black, a8));
    }

    #[test]
    fn test_attackers_reverse_pawn_lookup() {
        // White knight on f3 and e-pawns traded glances at e5
        let pos = Position::from_fen(
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2",
        )
        .unwrap();
        let e5 = square_at(4, 4);
        let white = pos.attackers(e5, Color::White);
        assert!((white & BitBoard::from_square(square_at(5, 2))) != EMPTY);
    }

    #[test]
    fn test_try_move_rejects_illegal() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .unwrap();
        let illegal = ChessMove::new(square_at(0, 0), square_at(0, 4), None);
        assert!(pos.try_move(illegal).is_none());
        let legal = ChessMove::new(square_at(4, 1), square_at(4, 3), None);
        let next = pos.try_move(legal).unwrap();
        assert_eq!(next.turn(), Color::Black);
        // The original snapshot is untouched
        assert_eq!(pos.turn(), Color::White);
    }

    #[test]
    fn test_hanging_detection() {
        // Black rook on a5 is attacked by the b4 pawn and defended by nothing
        let pos = Position::from_fen("4k3/8/8/r7/1P6/8/8/4K3 w - - 0 1").unwrap();
        let a5 = square_at(0, 4);
        assert!(pos.is_attacked(a5, Color::White));
        assert!(pos.is_hanging(a5, Color::Black));
        assert!(pos.is_in_bad_spot(a5));
    }

    #[test]
    fn test_xray_defense() {
        // White rook on e1 defends the e4 pawn through... directly; the
        // doubled black rooks on the e-file x-ray each other onto e4.
        let pos = Position::from_fen("4k3/4r3/4r3/8/4P3/8/8/4RK2 w - - 0 1").unwrap();
        let e4 = square_at(4, 3);
        // e4 pawn directly defended by the e1 rook
        assert!(pos.is_defended(e4, Color::White));
        // The e6 rook is defended by the e7 rook behind it
        assert!(pos.is_defended(square_at(4, 5), Color::Black));
    }

    #[test]
    fn test_endgame_gate() {
        let start = Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        )
        .unwrap();
        assert!(!start.is_endgame());

        let kp = Position::from_fen("4k3/3P4/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(kp.is_endgame());

        let rook_endgame = Position::from_fen("4k3/8/8/8/8/8/r7/4K2R w - - 0 1").unwrap();
        assert!(rook_endgame.is_endgame());
    }
}
