/// Tactical detectors, grouped by the geometry they rely on.
/// Each is a pure function `&Position -> Vec<DetectedTheme>`.

pub mod defenders;
pub mod endgame;
pub mod forks;
pub mod line_geometry;
pub mod pawns;
pub mod pins;
pub mod special;
pub mod weakness;
