//! Pawn-structure detectors. These read only pawn placement, so they are
//! cheap and run at every tier above shallow.

use chess::{Color, Piece, Square};

use crate::geometry::{file_index, rank_index};
use crate::position::Position;
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

pub fn detect_structure(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    for color in [Color::White, Color::Black] {
        let own = pawns_of(pos, color);
        let enemy = pawns_of(pos, !color);
        themes.extend(isolated_pawns(color, &own));
        themes.extend(doubled_pawns(color, &own));
        themes.extend(backward_pawns(color, &own, &enemy));
        themes.extend(passed_pawns(color, &own, &enemy));
        themes.extend(pawn_chain(color, &own));
        themes.extend(pawn_majorities(color, &own, &enemy));
    }
    themes
}

fn pawns_of(pos: &Position, color: Color) -> Vec<Square> {
    pos.pieces_of(color)
        .into_iter()
        .filter(|&(_, p)| p == Piece::Pawn)
        .map(|(sq, _)| sq)
        .collect()
}

fn file_counts(pawns: &[Square]) -> [u8; 8] {
    let mut counts = [0u8; 8];
    for &sq in pawns {
        counts[file_index(sq)] += 1;
    }
    counts
}

/// Ranks advanced from this side's home rank. 0 = starting square.
fn advance(color: Color, sq: Square) -> usize {
    match color {
        Color::White => rank_index(sq) - 1,
        Color::Black => 6 - rank_index(sq),
    }
}

fn isolated_pawns(color: Color, own: &[Square]) -> Vec<DetectedTheme> {
    let counts = file_counts(own);
    let mut themes = Vec::new();
    for &sq in own {
        let file = file_index(sq);
        let left = file.checked_sub(1).map(|f| counts[f]).unwrap_or(0);
        let right = if file < 7 { counts[file + 1] } else { 0 };
        if left + right > 0 {
            continue;
        }
        themes.push(
            DetectedTheme::new(
                ThemeId::IsolatedPawn,
                !color,
                Severity::Minor,
                Confidence::High,
                format!("The pawn on {} has no neighbors to support it", sq),
            )
            .with_squares(&[sq]),
        );
    }
    themes
}

fn doubled_pawns(color: Color, own: &[Square]) -> Vec<DetectedTheme> {
    let counts = file_counts(own);
    let mut themes = Vec::new();
    for file in 0..8 {
        if counts[file] < 2 {
            continue;
        }
        let squares: Vec<Square> = own
            .iter()
            .copied()
            .filter(|&sq| file_index(sq) == file)
            .collect();
        themes.push(
            DetectedTheme::new(
                ThemeId::DoubledPawns,
                !color,
                Severity::Minor,
                Confidence::High,
                format!("Doubled pawns on the {}-file", (b'a' + file as u8) as char),
            )
            .with_squares(&squares),
        );
    }
    themes
}

/// A pawn stuck behind its neighbors whose advance square is covered by an
/// enemy pawn.
fn backward_pawns(color: Color, own: &[Square], enemy: &[Square]) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    for &sq in own {
        let file = file_index(sq);
        let neighbors: Vec<Square> = own
            .iter()
            .copied()
            .filter(|&other| file_index(other).abs_diff(file) == 1)
            .collect();
        if neighbors.is_empty() {
            continue;
        }
        if neighbors.iter().any(|&n| advance(color, n) <= advance(color, sq)) {
            continue;
        }
        // An enemy pawn guards the stop square when their advances from
        // opposite ends meet across it.
        let stop_advance = advance(color, sq) + 1;
        let covered = enemy.iter().any(|&e| {
            file_index(e).abs_diff(file) == 1 && advance(!color, e) + stop_advance == 4
        });
        if !covered {
            continue;
        }
        themes.push(
            DetectedTheme::new(
                ThemeId::BackwardPawn,
                !color,
                Severity::Minor,
                Confidence::Medium,
                format!("The pawn on {} lags its neighbors and cannot safely advance", sq),
            )
            .with_squares(&[sq]),
        );
    }
    themes
}

fn is_passed(color: Color, sq: Square, enemy: &[Square]) -> bool {
    let file = file_index(sq);
    !enemy.iter().any(|&e| {
        file_index(e).abs_diff(file) <= 1 && advance(!color, e) + advance(color, sq) < 5
    })
}

fn passed_pawns(color: Color, own: &[Square], enemy: &[Square]) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    let passers: Vec<Square> = own
        .iter()
        .copied()
        .filter(|&sq| is_passed(color, sq, enemy))
        .collect();

    for &sq in &passers {
        let severity = if advance(color, sq) >= 4 {
            Severity::Significant
        } else {
            Severity::Minor
        };
        themes.push(
            DetectedTheme::new(
                ThemeId::PassedPawn,
                color,
                severity,
                Confidence::High,
                format!("The pawn on {} has no enemy pawn in its way", sq),
            )
            .with_squares(&[sq]),
        );
    }

    // Adjacent passers defend each other's promotion path.
    let mut pairs: Vec<(Square, Square)> = Vec::new();
    for &a in &passers {
        for &b in &passers {
            if a < b && file_index(a) + 1 == file_index(b) {
                pairs.push((a, b));
            }
        }
    }
    for (a, b) in pairs {
        themes.push(
            DetectedTheme::new(
                ThemeId::ConnectedPassedPawns,
                color,
                Severity::Significant,
                Confidence::High,
                format!("Connected passed pawns on {} and {}", a, b),
            )
            .with_squares(&[a, b]),
        );
    }

    themes
}

/// Three or more pawns linked along a defense diagonal.
fn pawn_chain(color: Color, own: &[Square]) -> Vec<DetectedTheme> {
    let defends = |base: Square, tip: Square| {
        let df = file_index(base).abs_diff(file_index(tip)) == 1;
        let dr = match color {
            Color::White => rank_index(tip) as i32 - rank_index(base) as i32 == 1,
            Color::Black => rank_index(base) as i32 - rank_index(tip) as i32 == 1,
        };
        df && dr
    };

    for &start in own {
        let mut chain = vec![start];
        let mut current = start;
        loop {
            let next = own
                .iter()
                .copied()
                .find(|&other| defends(current, other));
            match next {
                Some(sq) => {
                    chain.push(sq);
                    current = sq;
                }
                None => break,
            }
        }
        if chain.len() >= 3 {
            return vec![DetectedTheme::new(
                ThemeId::PawnChain,
                color,
                Severity::Minor,
                Confidence::Medium,
                format!("A pawn chain of {} pawns anchored on {}", chain.len(), start),
            )
            .with_squares(&chain)];
        }
    }
    Vec::new()
}

fn pawn_majorities(color: Color, own: &[Square], enemy: &[Square]) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    for (label, range) in [("queenside", 0..4usize), ("kingside", 4..8usize)] {
        let ours = own.iter().filter(|&&sq| range.contains(&file_index(sq))).count();
        let theirs = enemy
            .iter()
            .filter(|&&sq| range.contains(&file_index(sq)))
            .count();
        if ours <= theirs || ours == 0 {
            continue;
        }
        let squares: Vec<Square> = own
            .iter()
            .copied()
            .filter(|&sq| range.contains(&file_index(sq)))
            .collect();
        themes.push(
            DetectedTheme::new(
                ThemeId::PawnMajority,
                color,
                Severity::Minor,
                Confidence::Medium,
                format!("A {} pawn majority of {} against {}", label, ours, theirs),
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
    fn test_starting_position_is_structurally_clean() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(detect_structure(&pos).is_empty());
    }

    #[test]
    fn test_isolated_pawn() {
        let pos = Position::from_fen("4k3/pp2p3/8/8/8/8/3P4/4K3 w - - 0 1").unwrap();
        let themes = detect_structure(&pos);
        assert!(themes.iter().any(|t| {
            t.theme == ThemeId::IsolatedPawn && t.squares == vec!["d2".to_string()]
        }));
    }

    #[test]
    fn test_doubled_pawns_on_one_file() {
        let pos = Position::from_fen("4k3/pppp4/8/8/3P4/8/3P4/4K3 w - - 0 1").unwrap();
        let themes = detect_structure(&pos);
        assert!(themes.iter().any(|t| t.theme == ThemeId::DoubledPawns));
    }

    #[test]
    fn test_advanced_passer_is_significant() {
        // White pawn on d6 with no black pawn on c, d or e
        let pos = Position::from_fen("4k3/pp6/3P4/8/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_structure(&pos);
        let passer = themes
            .iter()
            .find(|t| t.theme == ThemeId::PassedPawn && t.beneficiary.name() == "White")
            .expect("passed pawn detected");
        assert_eq!(passer.severity, Severity::Significant);
    }

    #[test]
    fn test_backward_pawn_behind_its_neighbor() {
        // The e3 pawn trails d4 and its stop square e4 is covered by d5
        let pos = Position::from_fen("4k3/8/8/3p4/3P4/4P3/8/4K3 w - - 0 1").unwrap();
        let themes = detect_structure(&pos);
        assert!(themes.iter().any(|t| {
            t.theme == ThemeId::BackwardPawn && t.squares == vec!["e3".to_string()]
        }));
    }

    #[test]
    fn test_connected_passed_pawns() {
        let pos = Position::from_fen("4k3/pp6/8/4PP2/8/8/8/4K3 w - - 0 1").unwrap();
        let themes = detect_structure(&pos);
        assert!(themes
            .iter()
            .any(|t| t.theme == ThemeId::ConnectedPassedPawns));
    }

    #[test]
    fn test_pawn_chain_of_three() {
        let pos = Position::from_fen("4k3/pppp4/8/4P3/3P4/2P5/8/4K3 w - - 0 1").unwrap();
        let themes = detect_structure(&pos);
        assert!(themes.iter().any(|t| t.theme == ThemeId::PawnChain));
    }

    #[test]
    fn test_kingside_majority() {
        let pos = Position::from_fen("4k3/pppp1p2/8/8/8/8/3PPPPP/4K3 w - - 0 1").unwrap();
        let themes = detect_structure(&pos);
        assert!(themes.iter().any(|t| {
            t.theme == ThemeId::PawnMajority && t.beneficiary.name() == "White"
        }));
    }
}
