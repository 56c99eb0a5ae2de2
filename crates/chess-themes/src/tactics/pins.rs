/// Pin detection: absolute and relative pins from ray geometry, plus a
/// second pass that promotes ≥2 pins sharing a pinned square to a cross-pin.

use std::collections::BTreeMap;

use chess::{Color, Square};

use crate::pieces::{king_value, piece_name, ROOK_VALUE};
use crate::position::{LocatedPiece, Position};
use crate::rays::{find_pins_from_square, Pin};
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

pub fn detect_pins(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();
    let mut by_pinned_square: BTreeMap<Square, Vec<(Color, Pin)>> = BTreeMap::new();

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.sliding_pieces(color) {
            for pin in find_pins_from_square(pos, sq, piece, color) {
                by_pinned_square
                    .entry(pin.pinned.0)
                    .or_default()
                    .push((color, pin));
                themes.push(pin_theme(pos, color, &pin));
            }
        }
    }

    // Two pins nailing the same piece from different rays leave it no good
    // square at all.
    for (square, pins) in by_pinned_square {
        if pins.len() < 2 {
            continue;
        }
        let (color, first) = pins[0];
        let attackers: Vec<Square> = pins.iter().map(|(_, p)| p.attacker).collect();
        let mut squares = vec![square];
        squares.extend(attackers);
        themes.push(
            DetectedTheme::new(
                ThemeId::CrossPin,
                color,
                Severity::Critical,
                Confidence::High,
                format!(
                    "The {} on {} is pinned along {} lines at once",
                    piece_name(first.pinned.1),
                    square,
                    pins.len()
                ),
            )
            .with_squares(&squares)
            .with_material_at_stake(king_value(first.pinned.1)),
        );
    }

    themes
}

fn pin_theme(pos: &Position, color: Color, pin: &Pin) -> DetectedTheme {
    let (pinned_sq, pinned_piece) = pin.pinned;
    let (shield_sq, shield_piece) = pin.shielded;
    let pinned_value = king_value(pinned_piece);

    let (theme, severity, confidence) = if pin.absolute {
        let severity = if pinned_value >= ROOK_VALUE {
            Severity::Critical
        } else {
            Severity::Significant
        };
        (ThemeId::AbsolutePin, severity, Confidence::High)
    } else {
        let severity = if king_value(shield_piece) - pinned_value >= 400 {
            Severity::Significant
        } else {
            Severity::Minor
        };
        (ThemeId::RelativePin, severity, Confidence::High)
    };

    let target = if pin.absolute { "king" } else { piece_name(shield_piece) };
    let pieces: Vec<LocatedPiece> = [pin.attacker, pinned_sq, shield_sq]
        .iter()
        .filter_map(|&sq| pos.located(sq))
        .collect();

    DetectedTheme::new(
        theme,
        color,
        severity,
        confidence,
        format!(
            "The {} on {} is pinned against the {} on {}",
            piece_name(pinned_piece),
            pinned_sq,
            target,
            shield_sq
        ),
    )
    .with_squares(&[pinned_sq, pin.attacker, shield_sq])
    .with_pieces(pieces)
    .with_material_at_stake(pinned_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_pin_detected() {
        // Rook e1 pins the knight e4 against the black king
        let pos = Position::from_fen("4k3/8/8/8/4n3/8/8/4R1K1 w - - 0 1").unwrap();
        let themes = detect_pins(&pos);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].theme, ThemeId::AbsolutePin);
        assert_eq!(themes[0].squares[0], "e4");
    }

    #[test]
    fn test_cross_pin_promoted_to_critical() {
        // Black bishop d5 pinned twice: rook d1 against the d8 king, and
        // bishop a2 against the g8 rook
        let pos = Position::from_fen("3k2r1/8/8/3b4/8/8/B6K/3R4 w - - 0 1").unwrap();
        let themes = detect_pins(&pos);
        let cross: Vec<_> = themes.iter().filter(|t| t.theme == ThemeId::CrossPin).collect();
        assert_eq!(cross.len(), 1);
        assert_eq!(cross[0].severity, Severity::Critical);
    }

    #[test]
    fn test_no_pins_in_starting_position() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert!(detect_pins(&pos).is_empty());
    }
}
