/// Defender-pressure tactics: pieces stretched across too many duties,
/// sole defenders that can be traded off or dragged away, and doomed
/// pieces that should sell themselves.

use chess::{BitBoard, Color, Piece, Square, EMPTY};

use crate::pieces::{king_value, piece_name, MINOR_VALUE};
use crate::position::Position;
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

/// A piece is overloaded when it is the only defender of two or more
/// friendly pieces that are already under attack.
pub fn detect_overloaded_pieces(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.pieces_of(color) {
            if piece == Piece::King {
                continue;
            }
            let burdens = sole_defense_duties(pos, sq, color);
            if burdens.len() < 2 {
                continue;
            }
            let min_value = burdens
                .iter()
                .map(|&(_, p)| king_value(p))
                .min()
                .unwrap_or(0);
            let mut squares = vec![sq];
            squares.extend(burdens.iter().map(|&(bsq, _)| bsq));
            themes.push(
                DetectedTheme::new(
                    ThemeId::OverloadedPiece,
                    !color,
                    Severity::Significant,
                    Confidence::Medium,
                    format!(
                        "The {} on {} is the only defender of {} attacked pieces",
                        piece_name(piece),
                        sq,
                        burdens.len()
                    ),
                )
                .with_squares(&squares)
                .with_material_at_stake(min_value),
            );
        }
    }

    themes
}

/// Attacked friendly pieces whose sole defender sits on `sq`.
fn sole_defense_duties(pos: &Position, sq: Square, color: Color) -> Vec<(Square, Piece)> {
    let mut duties = Vec::new();
    for (tsq, tp) in pos.pieces_of(color) {
        if tsq == sq || tp == Piece::King {
            continue;
        }
        if !pos.is_attacked(tsq, !color) {
            continue;
        }
        let defenders = pos.attackers(tsq, color);
        if defenders.popcnt() == 1 && defenders & BitBoard::from_square(sq) != EMPTY {
            duties.push((tsq, tp));
        }
    }
    duties
}

/// Remove-the-defender: a valuable piece held together by exactly one
/// defender, where both the piece and its defender can be attacked.
pub fn detect_remove_defender(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let enemy = !color;
        for (tsq, tp) in pos.pieces_of(enemy) {
            if tp == Piece::King || king_value(tp) < MINOR_VALUE {
                continue;
            }
            if !pos.is_attacked(tsq, color) {
                continue;
            }
            let defenders = pos.attackers(tsq, enemy);
            if defenders.popcnt() != 1 {
                continue;
            }
            let dsq = defenders.to_square();
            if !pos.is_attacked(dsq, color) {
                continue;
            }
            let defender = match pos.piece_at(dsq) {
                Some((p, _)) => p,
                None => continue,
            };
            themes.push(
                DetectedTheme::new(
                    ThemeId::RemoveDefender,
                    color,
                    Severity::Significant,
                    Confidence::Medium,
                    format!(
                        "The {} on {} is the only thing holding the {} on {} together",
                        piece_name(defender),
                        dsq,
                        piece_name(tp),
                        tsq
                    ),
                )
                .with_squares(&[dsq, tsq])
                .with_material_at_stake(king_value(tp)),
            );
        }
    }

    themes
}

/// Full-tier detector: capturing a sole defender so that a more valuable
/// piece is left hanging on the next move.
pub fn detect_deflection(pos: &Position) -> Vec<DetectedTheme> {
    let mover = pos.turn();
    let enemy = !mover;
    let mut themes = Vec::new();

    for mv in pos.legal_moves() {
        let dsq = mv.get_dest();
        let Some((victim, vc)) = pos.piece_at(dsq) else { continue };
        if vc != enemy || victim == Piece::King {
            continue;
        }
        for (tsq, tp) in pos.pieces_of(enemy) {
            if tsq == dsq || tp == Piece::King || king_value(tp) <= king_value(victim) {
                continue;
            }
            let defenders = pos.attackers(tsq, enemy);
            if defenders.popcnt() != 1 || defenders & BitBoard::from_square(dsq) == EMPTY {
                continue;
            }
            let Some(next) = pos.try_move(mv) else { continue };
            if !next.is_attacked(tsq, mover) || !next.is_hanging(tsq, enemy) {
                continue;
            }
            themes.push(
                DetectedTheme::new(
                    ThemeId::Deflection,
                    mover,
                    Severity::Significant,
                    Confidence::Medium,
                    format!(
                        "Capturing the {} on {} leaves the {} on {} hanging",
                        piece_name(victim),
                        dsq,
                        piece_name(tp),
                        tsq
                    ),
                )
                .with_squares(&[mv.get_source(), dsq, tsq])
                .with_material_at_stake(king_value(tp)),
            );
        }
    }

    themes
}

/// A doomed piece with a capture available should take something with it.
pub fn detect_desperado(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let moves = pos.legal_moves_for(color);
        for (sq, piece) in pos.pieces_of(color) {
            if piece == Piece::King || piece == Piece::Pawn {
                continue;
            }
            if !pos.is_attacked(sq, !color) || !pos.is_hanging(sq, color) {
                continue;
            }
            let own_moves: Vec<_> = moves.iter().filter(|mv| mv.get_source() == sq).collect();
            if own_moves.is_empty() {
                continue;
            }
            let has_safe_retreat = own_moves.iter().any(|mv| {
                let dest = mv.get_dest();
                !pos.is_attacked(dest, !color) || pos.is_defended_excluding(dest, color, sq)
            });
            if has_safe_retreat {
                continue;
            }
            let best_capture = own_moves
                .iter()
                .filter_map(|mv| {
                    pos.piece_at(mv.get_dest())
                        .filter(|&(_, c)| c != color)
                        .map(|(p, _)| king_value(p))
                })
                .max();
            let Some(gain) = best_capture else { continue };
            themes.push(
                DetectedTheme::new(
                    ThemeId::Desperado,
                    color,
                    Severity::Minor,
                    Confidence::Low,
                    format!(
                        "The {} on {} is lost anyway and should grab what it can",
                        piece_name(piece),
                        sq
                    ),
                )
                .with_squares(&[sq])
                .with_material_at_stake(gain),
            );
        }
    }

    themes
}
