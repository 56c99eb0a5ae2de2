/// Named attacking patterns that are worth more than the sum of their
/// geometry: the Greek gift bishop sacrifice, in-between moves, windmills,
/// and speculative sacrifices in general.

use std::collections::HashSet;

use chess::{BitBoard, Color, Piece, Square, EMPTY};

use crate::geometry::{file_index, king_distance, rank_index, square_at};
use crate::pieces::{king_value, piece_name, BISHOP_VALUE, MINOR_VALUE};
use crate::position::Position;
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

/// Bxh7+ (or Bxh2+) against a short-castled king whose h-pawn is covered
/// only by the king, with a knight or queen ready to follow up.
pub fn detect_greek_gift(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let enemy = !color;
        let (h_sq, follow_sq, enemy_back) = match color {
            Color::White => (square_at(7, 6), square_at(6, 4), 7),
            Color::Black => (square_at(7, 1), square_at(6, 3), 0),
        };
        let enemy_king = pos.king_square(enemy);
        if rank_index(enemy_king) != enemy_back || file_index(enemy_king) < 6 {
            continue;
        }
        match pos.piece_at(h_sq) {
            Some((Piece::Pawn, c)) if c == enemy => {}
            _ => continue,
        }
        let defenders = pos.attackers(h_sq, enemy);
        if defenders.popcnt() != 1 || defenders & BitBoard::from_square(enemy_king) == EMPTY {
            continue;
        }
        let bishop_hits = pos
            .attackers(h_sq, color)
            .find(|&sq| matches!(pos.piece_at(sq), Some((Piece::Bishop, _))));
        let Some(bishop_sq) = bishop_hits else { continue };

        // Follow-up: a knight hop to the g5 square or a queen lift to the
        // h-file within one move.
        let moves = pos.legal_moves_for(color);
        let has_followup = moves.iter().any(|mv| match pos.piece_at(mv.get_source()) {
            Some((Piece::Knight, _)) => mv.get_dest() == follow_sq,
            Some((Piece::Queen, _)) => file_index(mv.get_dest()) == 7,
            _ => false,
        });
        if !has_followup {
            continue;
        }

        themes.push(
            DetectedTheme::new(
                ThemeId::GreekGift,
                color,
                Severity::Significant,
                Confidence::Medium,
                format!(
                    "The bishop on {} can sacrifice itself on {} to rip open the king",
                    bishop_sq, h_sq
                ),
            )
            .with_squares(&[bishop_sq, h_sq, enemy_king])
            .with_material_at_stake(BISHOP_VALUE),
        );
    }

    themes
}

/// A rook on the seventh guarded by its own bishop next to the enemy king
/// can shuttle with discovered checks.
pub fn detect_windmill(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let seventh = match color {
            Color::White => 6,
            Color::Black => 1,
        };
        let enemy_king = pos.king_square(!color);
        for (sq, piece) in pos.pieces_of(color) {
            if piece != Piece::Rook || rank_index(sq) != seventh {
                continue;
            }
            if king_distance(sq, enemy_king) > 2 {
                continue;
            }
            let bishop_guard = (pos.attackers(sq, color))
                .any(|dsq| matches!(pos.piece_at(dsq), Some((Piece::Bishop, _))));
            if !bishop_guard {
                continue;
            }
            themes.push(
                DetectedTheme::new(
                    ThemeId::Windmill,
                    color,
                    Severity::Critical,
                    Confidence::Medium,
                    format!(
                        "The rook on {} backed by its bishop can start a windmill against the king on {}",
                        sq, enemy_king
                    ),
                )
                .with_squares(&[sq, enemy_king]),
            );
        }
    }

    themes
}

/// Full-tier detector: after a capture, the opponent keeps the recapture in
/// hand and has a check to play first.
pub fn detect_zwischenzug(pos: &Position) -> Vec<DetectedTheme> {
    let mover = pos.turn();
    let mut themes = Vec::new();
    // One report per capture square, however many pieces can take there.
    let mut reported: HashSet<Square> = HashSet::new();

    for mv in pos.legal_moves() {
        let dest = mv.get_dest();
        if reported.contains(&dest) {
            continue;
        }
        if !matches!(pos.piece_at(dest), Some((_, c)) if c != mover) {
            continue;
        }
        let Some(next) = pos.try_move(mv) else { continue };
        let replies = next.legal_moves();
        let has_recapture = replies.iter().any(|r| r.get_dest() == dest);
        if !has_recapture {
            continue;
        }
        let has_interposed_check = replies.iter().any(|r| {
            r.get_dest() != dest
                && next.try_move(*r).map(|after| after.is_check()).unwrap_or(false)
        });
        if !has_interposed_check {
            continue;
        }
        reported.insert(dest);
        themes.push(
            DetectedTheme::new(
                ThemeId::Zwischenzug,
                !mover,
                Severity::Minor,
                Confidence::Low,
                format!(
                    "After the capture on {} there is a check to play before recapturing",
                    dest
                ),
            )
            .with_squares(&[dest]),
        );
    }

    themes
}

/// Full-tier detector: captures that ship at least two pawns of material
/// into a defended square, justified by a check or a follow-up barrage.
pub fn detect_sacrifices(pos: &Position) -> Vec<DetectedTheme> {
    let mover = pos.turn();
    let enemy = !mover;
    let mut themes = Vec::new();

    for mv in pos.legal_moves() {
        let dest = mv.get_dest();
        let Some((attacker, _)) = pos.piece_at(mv.get_source()) else { continue };
        if attacker == Piece::King {
            continue;
        }
        let Some((victim, vc)) = pos.piece_at(dest) else { continue };
        if vc != enemy {
            continue;
        }
        let invested = king_value(attacker) - king_value(victim);
        if invested < 200 || !pos.is_defended(dest, enemy) {
            continue;
        }
        let Some(next) = pos.try_move(mv) else { continue };
        let justified = next.is_check() || compensation_after_recapture(&next, dest);
        if !justified {
            continue;
        }
        themes.push(
            DetectedTheme::new(
                ThemeId::Sacrifice,
                mover,
                Severity::Significant,
                Confidence::Low,
                format!(
                    "{} takes on {} and invites the recapture",
                    piece_name(attacker),
                    dest
                ),
            )
            .with_squares(&[mv.get_source(), dest])
            .with_material_at_stake(invested),
        );
    }

    themes
}

/// Let the recapture happen, then ask whether the attacker still has at
/// least two forcing continuations.
fn compensation_after_recapture(next: &Position, dest: Square) -> bool {
    let Some(recapture) = next
        .legal_moves()
        .into_iter()
        .find(|r| r.get_dest() == dest)
    else {
        return false;
    };
    let Some(after) = next.try_move(recapture) else { return false };
    let forcing = after
        .legal_moves()
        .iter()
        .filter(|mv| {
            let grabs = matches!(
                after.piece_at(mv.get_dest()),
                Some((p, c)) if c != after.turn() && king_value(p) >= MINOR_VALUE
            );
            grabs
                || after
                    .try_move(**mv)
                    .map(|a| a.is_check())
                    .unwrap_or(false)
        })
        .count();
    forcing >= 2
}
