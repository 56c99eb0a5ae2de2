/// Ray casting: walk outward from a square along a compass direction, find
/// the first pieces on the line, and derive pin geometry from them.

use chess::{Color, Piece, Square};

use crate::geometry::{offset_square, sliding_directions, Direction};
use crate::pieces::king_value;
use crate::position::Position;

/// Squares outward from `origin` in `dir` until the board edge, nearest
/// first, independent of occupancy.
pub fn squares_in_direction(origin: Square, dir: Direction) -> Vec<Square> {
    let (df, dr) = dir.delta();
    let mut out = Vec::new();
    let mut cursor = origin;
    while let Some(next) = offset_square(cursor, df, dr) {
        out.push(next);
        cursor = next;
    }
    out
}

/// The pieces encountered along a ray, in order of distance from `origin`.
pub fn pieces_on_ray(pos: &Position, origin: Square, dir: Direction) -> Vec<(Square, Piece, Color)> {
    squares_in_direction(origin, dir)
        .into_iter()
        .filter_map(|sq| pos.piece_at(sq).map(|(p, c)| (sq, p, c)))
        .collect()
}

/// A pin found on one ray: `pinned` sits between the attacker and the more
/// valuable `shielded` piece. A pin toward the king is always absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub attacker: Square,
    pub pinned: (Square, Piece),
    pub shielded: (Square, Piece),
    pub absolute: bool,
}

/// Pins delivered by the sliding piece on `attacker_sq`: along each of its
/// sliding directions, exactly two enemy pieces before any friendly blocker,
/// with the nearer worth less than the farther (or the farther the king).
pub fn find_pins_from_square(
    pos: &Position,
    attacker_sq: Square,
    attacker: Piece,
    color: Color,
) -> Vec<Pin> {
    let mut pins = Vec::new();
    for &dir in sliding_directions(attacker) {
        let on_ray = pieces_on_ray(pos, attacker_sq, dir);
        if on_ray.len() < 2 {
            continue;
        }
        let (near_sq, near_piece, near_color) = on_ray[0];
        let (far_sq, far_piece, far_color) = on_ray[1];
        if near_color == color || far_color == color {
            continue;
        }
        let absolute = far_piece == Piece::King;
        if absolute || king_value(near_piece) < king_value(far_piece) {
            pins.push(Pin {
                attacker: attacker_sq,
                pinned: (near_sq, near_piece),
                shielded: (far_sq, far_piece),
                absolute,
            });
        }
    }
    pins
}
