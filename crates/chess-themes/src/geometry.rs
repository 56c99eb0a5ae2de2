/// Square geometry: file/rank indexing, king distance, compass directions.

use chess::{File, Piece, Rank, Square};

pub fn file_index(sq: Square) -> usize {
    sq.get_file().to_index()
}

pub fn rank_index(sq: Square) -> usize {
    sq.get_rank().to_index()
}

/// Build a square from 0-based file and rank indices. Caller guarantees 0..=7.
pub fn square_at(file: usize, rank: usize) -> Square {
    Square::make_square(Rank::from_index(rank), File::from_index(file))
}

/// Distance between two squares in king moves (Chebyshev distance).
pub fn king_distance(a: Square, b: Square) -> u32 {
    let df = (file_index(a) as i32 - file_index(b) as i32).unsigned_abs();
    let dr = (rank_index(a) as i32 - rank_index(b) as i32).unsigned_abs();
    df.max(dr)
}

/// One of the 8 compass directions a sliding piece can travel.
/// North is toward rank 8 regardless of side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// (file delta, rank delta) for one step in this direction.
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast
                | Direction::SouthEast
                | Direction::SouthWest
                | Direction::NorthWest
        )
    }
}

pub const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

pub const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::NorthEast,
    Direction::SouthEast,
    Direction::SouthWest,
    Direction::NorthWest,
];

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::NorthEast,
    Direction::East,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::West,
    Direction::NorthWest,
];

/// Directions a sliding piece moves in. Empty for non-sliders.
pub fn sliding_directions(piece: Piece) -> &'static [Direction] {
    match piece {
        Piece::Rook => &ROOK_DIRECTIONS,
        Piece::Bishop => &BISHOP_DIRECTIONS,
        Piece::Queen => &ALL_DIRECTIONS,
        _ => &[],
    }
}

/// Step from a square by (file, rank) deltas; None when the result is off-board.
pub fn offset_square(sq: Square, df: i8, dr: i8) -> Option<Square> {
    let f = file_index(sq) as i8 + df;
    let r = rank_index(sq) as i8 + dr;
    if (0..8).contains(&f) && (0..8).contains(&r) {
        Some(square_at(f as usize, r as usize))
    } else {
        None
    }
}

/// The compass direction leading from `from` toward `to`, if the two squares
/// share a rank, file, or diagonal.
pub fn direction_between(from: Square, to: Square) -> Option<Direction> {
    let df = file_index(to) as i8 - file_index(from) as i8;
    let dr = rank_index(to) as i8 - rank_index(from) as i8;
    if df == 0 && dr == 0 {
        return None;
    }
    if df != 0 && dr != 0 && df.abs() != dr.abs() {
        return None;
    }
    let dir = match (df.signum(), dr.signum()) {
        (0, 1) => Direction::North,
        (1, 1) => Direction::NorthEast,
        (1, 0) => Direction::East,
        (1, -1) => Direction::SouthEast,
        (0, -1) => Direction::South,
        (-1, -1) => Direction::SouthWest,
        (-1, 0) => Direction::West,
        (-1, 1) => Direction::NorthWest,
        _ => unreachable!(),
    };
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_king_distance() {
        assert_eq!(king_distance(square_at(4, 0), square_at(4, 3)), 3);
        assert_eq!(king_distance(square_at(0, 0), square_at(7, 7)), 7);
        assert_eq!(king_distance(square_at(3, 3), square_at(3, 3)), 0);
    }

    #[test]
    fn test_offset_square_edges() {
        let a1 = square_at(0, 0);
        assert_eq!(offset_square(a1, -1, 0), None);
        assert_eq!(offset_square(a1, 0, -1), None);
        assert_eq!(offset_square(a1, 1, 1), Some(square_at(1, 1)));
    }

    #[test]
    fn test_direction_between() {
        let e4 = square_at(4, 3);
        assert_eq!(direction_between(e4, square_at(4, 7)), Some(Direction::North));
        assert_eq!(direction_between(e4, square_at(7, 6)), Some(Direction::NorthEast));
        assert_eq!(direction_between(e4, square_at(0, 3)), Some(Direction::West));
        // Knight-shaped offset is not a ray
        assert_eq!(direction_between(e4, square_at(5, 5)), None);
    }

    #[test]
    fn test_sliding_directions() {
        assert_eq!(sliding_directions(Piece::Queen).len(), 8);
        assert_eq!(sliding_directions(Piece::Rook).len(), 4);
        assert_eq!(sliding_directions(Piece::Bishop).len(), 4);
        assert!(sliding_directions(Piece::Knight).is_empty());
    }
}
