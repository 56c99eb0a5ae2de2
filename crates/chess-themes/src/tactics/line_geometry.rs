/// Line tactics built on ray walks: skewers, discovered attacks and checks,
/// batteries, and simulated discovery threats.

use chess::{BitBoard, Color, Piece, Square, EMPTY};

use crate::geometry::{king_distance, sliding_directions, Direction};
use crate::pieces::{king_value, piece_name, MINOR_VALUE, ROOK_VALUE};
use crate::position::Position;
use crate::rays::{pieces_on_ray, squares_in_direction};
use crate::theme::{Confidence, DetectedTheme, Severity, ThemeId};

pub fn detect_skewers(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.sliding_pieces(color) {
            for &dir in sliding_directions(piece) {
                let ray = pieces_on_ray(pos, sq, dir);
                let &[(near_sq, near, nc), (far_sq, far, fc), ..] = ray.as_slice() else {
                    continue;
                };
                if nc == color || fc == color {
                    continue;
                }
                // Skewer: the front piece outranks the back one, so stepping
                // aside exposes something still worth taking.
                if king_value(near) <= king_value(far) || king_value(far) < MINOR_VALUE {
                    continue;
                }
                let severity = if near == Piece::King {
                    Severity::Critical
                } else {
                    Severity::Significant
                };
                themes.push(
                    DetectedTheme::new(
                        ThemeId::Skewer,
                        color,
                        severity,
                        Confidence::High,
                        format!(
                            "The {} on {} skewers the {} on {} against the {} on {}",
                            piece_name(piece),
                            sq,
                            piece_name(near),
                            near_sq,
                            piece_name(far),
                            far_sq
                        ),
                    )
                    .with_squares(&[sq, near_sq, far_sq])
                    .with_material_at_stake(king_value(far)),
                );
            }
        }
    }

    themes
}

pub fn detect_discoveries(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        for (sq, piece) in pos.sliding_pieces(color) {
            for &dir in sliding_directions(piece) {
                if let Some(theme) = discovery_on_ray(pos, sq, piece, color, dir) {
                    themes.push(theme);
                }
            }
        }
    }

    themes
}

fn discovery_on_ray(
    pos: &Position,
    sq: Square,
    piece: Piece,
    color: Color,
    dir: Direction,
) -> Option<DetectedTheme> {
    let ray = pieces_on_ray(pos, sq, dir);
    let &[(blocker_sq, blocker, bc), (target_sq, target, tc), ..] = ray.as_slice() else {
        return None;
    };
    if bc != color || tc == color {
        return None;
    }
    // A friendly slider aiming the same way is a battery, not a discovery.
    if sliding_directions(blocker).contains(&dir) {
        return None;
    }

    let (theme, severity) = if target == Piece::King {
        (ThemeId::DiscoveredCheck, Severity::Critical)
    } else if king_value(target) >= ROOK_VALUE {
        (ThemeId::DiscoveredAttack, Severity::Significant)
    } else {
        return None;
    };

    // When it is this side's move, the blocker must actually be able to
    // clear the line; when it is not, report the threat at low confidence.
    let confidence = if color == pos.turn() {
        let ray_squares = squares_in_direction(sq, dir);
        let can_clear = pos
            .legal_moves()
            .iter()
            .any(|mv| mv.get_source() == blocker_sq && !ray_squares.contains(&mv.get_dest()));
        if !can_clear {
            return None;
        }
        Confidence::High
    } else {
        Confidence::Low
    };

    Some(
        DetectedTheme::new(
            theme,
            color,
            severity,
            confidence,
            format!(
                "Moving the {} on {} uncovers the {} on {} against the {} on {}",
                piece_name(blocker),
                blocker_sq,
                piece_name(piece),
                sq,
                piece_name(target),
                target_sq
            ),
        )
        .with_squares(&[sq, blocker_sq, target_sq])
        .with_material_at_stake(if target == Piece::King {
            0
        } else {
            king_value(target)
        }),
    )
}

/// Two friendly sliders stacked on one line. Emitted once per pair, from the
/// rear piece, so scanning both endpoints cannot duplicate it.
pub fn detect_batteries(pos: &Position) -> Vec<DetectedTheme> {
    let mut themes = Vec::new();

    for color in [Color::White, Color::Black] {
        let enemy_king = pos.king_square(!color);
        for (sq, piece) in pos.sliding_pieces(color) {
            for &dir in sliding_directions(piece) {
                let ray = pieces_on_ray(pos, sq, dir);
                let Some(&(front_sq, front, fc)) = ray.first() else { continue };
                if fc != color || !sliding_directions(front).contains(&dir) {
                    continue;
                }
                if sq.to_index() > front_sq.to_index() {
                    continue;
                }
                let pressure_on_king = battery_ray_squares(pos, front_sq, dir)
                    .iter()
                    .any(|&s| king_distance(s, enemy_king) <= 1);
                let severity = if pressure_on_king {
                    Severity::Significant
                } else {
                    Severity::Minor
                };
                themes.push(
                    DetectedTheme::new(
                        ThemeId::Battery,
                        color,
                        severity,
                        Confidence::High,
                        format!(
                            "The {} on {} and the {} on {} double up on the same line",
                            piece_name(piece),
                            sq,
                            piece_name(front),
                            front_sq
                        ),
                    )
                    .with_squares(&[sq, front_sq]),
                );
            }
        }
    }

    themes
}

/// Squares the battery sweeps past its front piece, up to the first blocker.
fn battery_ray_squares(pos: &Position, front: Square, dir: Direction) -> Vec<Square> {
    let mut out = Vec::new();
    for sq in squares_in_direction(front, dir) {
        out.push(sq);
        if pos.piece_at(sq).is_some() {
            break;
        }
    }
    out
}

/// Full-tier detector: a legal move whose resulting check does not come from
/// the moved piece itself is a discovery in waiting.
pub fn detect_potential_discoveries(pos: &Position) -> Vec<DetectedTheme> {
    let mover = pos.turn();
    let mut themes = Vec::new();

    for mv in pos.legal_moves() {
        let Some(next) = pos.try_move(mv) else { continue };
        if !next.is_check() {
            continue;
        }
        let from_dest = *next.board().checkers() & BitBoard::from_square(mv.get_dest());
        if from_dest != EMPTY {
            continue;
        }
        let Some((piece, _)) = pos.piece_at(mv.get_source()) else { continue };
        themes.push(
            DetectedTheme::new(
                ThemeId::PotentialDiscovery,
                mover,
                Severity::Significant,
                Confidence::Medium,
                format!(
                    "Moving the {} from {} to {} would give a discovered check",
                    piece_name(piece),
                    mv.get_source(),
                    mv.get_dest()
                ),
            )
            .with_squares(&[mv.get_source(), mv.get_dest()]),
        );
    }

    themes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skewer_through_king() {
        // White rook on e1 hits the black king on e8 with the queen behind
        // it... queen in front: black king e5, queen e8, rook e1
        let pos = Position::from_fen("4q3/8/8/4k3/8/8/8/4R1K1 b - - 0 1").unwrap();
        let themes = detect_skewers(&pos);
        let skewer = themes
            .iter()
            .find(|t| t.theme == ThemeId::Skewer)
            .expect("skewer detected");
        assert_eq!(skewer.severity, Severity::Critical);
        assert_eq!(skewer.material_at_stake, Some(900));
    }

    #[test]
    fn test_battery_detected_once() {
        // Doubled white rooks on the d-file
        let pos = Position::from_fen("4k3/8/8/8/8/8/3R4/3R2K1 w - - 0 1").unwrap();
        let batteries: Vec<_> = detect_batteries(&pos)
            .into_iter()
            .filter(|t| t.theme == ThemeId::Battery)
            .collect();
        assert_eq!(batteries.len(), 1);
    }

    #[test]
    fn test_discovered_check_threat() {
        // White bishop c1 behind the d2 knight, aiming at the g5... use a
        // rook discovery: rook e1, knight e4, black king e8, white to move
        let pos = Position::from_fen("4k3/8/8/8/4N3/8/8/4R1K1 w - - 0 1").unwrap();
        let themes = detect_discoveries(&pos);
        let dc = themes
            .iter()
            .find(|t| t.theme == ThemeId::DiscoveredCheck)
            .expect("discovered check detected");
        assert_eq!(dc.severity, Severity::Critical);
        assert_eq!(dc.confidence, Confidence::High);
    }

    #[test]
    fn test_potential_discovery_found() {
        let pos = Position::from_fen("4k3/8/8/8/4N3/8/8/4R1K1 w - - 0 1").unwrap();
        let themes = detect_potential_discoveries(&pos);
        assert!(themes.iter().any(|t| t.theme == ThemeId::PotentialDiscovery));
    }
}
