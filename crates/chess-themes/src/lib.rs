//! Board-pattern theme detection.
//!
//! Given a single position, the detectors in this crate answer "what tactical,
//! structural, positional, or dynamic patterns exist here, and who benefits?".
//! Every detector is a pure function over a [`position::Position`] snapshot;
//! the entry point is [`aggregator::detect`], which fans out to the detectors
//! selected by a [`aggregator::Tier`], then ranks and deduplicates the result.

pub use chess;

pub mod aggregator;
pub mod dynamics;
pub mod geometry;
pub mod pieces;
pub mod position;
pub mod positional;
pub mod rays;
pub mod structure;
pub mod tactics;
pub mod theme;

pub use aggregator::{detect, detect_with_artifact, DetectOptions, Tier};
pub use position::{LocatedPiece, PieceKind, Position, Side, ThemeError};
pub use theme::{Category, Confidence, DetectedTheme, Severity, ThemeArtifact, ThemeId};
