//! Rating-adaptive move classification. What counts as a blunder for a
//! 600-rated player is routine imprecision at master level, so every
//! centipawn cutoff scales with the player's rating band.

use serde::{Deserialize, Serialize};

use crate::evaluation::MoveClassification;

/// Centipawn cutoffs for one rating band. `max_rating` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationThresholds {
    pub min_rating: u32,
    pub max_rating: u32,
    pub inaccuracy_range: [i32; 2],
    pub mistake_range: [i32; 2],
    pub blunder_threshold: i32,
    pub excellent_threshold: i32,
    pub good_threshold: i32,
}

/// Nine contiguous bands covering [0, 4000). `blunder_threshold` is
/// non-increasing as rating rises.
pub const RATING_BANDS: [ClassificationThresholds; 9] = [
    ClassificationThresholds {
        min_rating: 0,
        max_rating: 600,
        inaccuracy_range: [100, 250],
        mistake_range: [250, 500],
        blunder_threshold: 500,
        excellent_threshold: 25,
        good_threshold: 100,
    },
    ClassificationThresholds {
        min_rating: 600,
        max_rating: 1000,
        inaccuracy_range: [90, 225],
        mistake_range: [225, 450],
        blunder_threshold: 450,
        excellent_threshold: 20,
        good_threshold: 90,
    },
    ClassificationThresholds {
        min_rating: 1000,
        max_rating: 1200,
        inaccuracy_range: [80, 200],
        mistake_range: [200, 400],
        blunder_threshold: 400,
        excellent_threshold: 20,
        good_threshold: 80,
    },
    ClassificationThresholds {
        min_rating: 1200,
        max_rating: 1400,
        inaccuracy_range: [70, 175],
        mistake_range: [175, 350],
        blunder_threshold: 350,
        excellent_threshold: 15,
        good_threshold: 70,
    },
    ClassificationThresholds {
        min_rating: 1400,
        max_rating: 1800,
        inaccuracy_range: [60, 150],
        mistake_range: [150, 300],
        blunder_threshold: 300,
        excellent_threshold: 15,
        good_threshold: 60,
    },
    ClassificationThresholds {
        min_rating: 1800,
        max_rating: 2200,
        inaccuracy_range: [50, 125],
        mistake_range: [125, 250],
        blunder_threshold: 250,
        excellent_threshold: 10,
        good_threshold: 50,
    },
    ClassificationThresholds {
        min_rating: 2200,
        max_rating: 2400,
        inaccuracy_range: [40, 90],
        mistake_range: [90, 150],
        blunder_threshold: 150,
        excellent_threshold: 10,
        good_threshold: 40,
    },
    ClassificationThresholds {
        min_rating: 2400,
        max_rating: 2700,
        inaccuracy_range: [30, 60],
        mistake_range: [60, 100],
        blunder_threshold: 100,
        excellent_threshold: 5,
        good_threshold: 30,
    },
    ClassificationThresholds {
        min_rating: 2700,
        max_rating: 4000,
        inaccuracy_range: [25, 45],
        mistake_range: [45, 75],
        blunder_threshold: 75,
        excellent_threshold: 5,
        good_threshold: 25,
    },
];

/// The 1200-1400 band. The bands are contiguous over [0, 4000), so the
/// scan below only misses if the table is edited badly.
const FALLBACK_BAND: usize = 3;

/// Band lookup with the rating clamped into [0, 3999].
pub fn thresholds_for_rating(rating: u32) -> ClassificationThresholds {
    let rating = rating.min(3999);
    RATING_BANDS
        .iter()
        .find(|band| rating >= band.min_rating && rating < band.max_rating)
        .copied()
        .unwrap_or(RATING_BANDS[FALLBACK_BAND])
}

fn lerp(lo: i32, hi: i32, factor: f64) -> i32 {
    (lo as f64 + (hi as f64 - lo as f64) * factor).round() as i32
}

/// Smoothed thresholds: interpolates from the enclosing band toward its
/// upper neighbor by how far into the band the rating sits. Exact at each
/// band's `min_rating`; the top band has no neighbor and is returned as-is.
pub fn interpolated_thresholds(rating: u32) -> ClassificationThresholds {
    let rating = rating.min(3999);
    let index = RATING_BANDS
        .iter()
        .position(|band| rating >= band.min_rating && rating < band.max_rating)
        .unwrap_or(FALLBACK_BAND);
    let band = RATING_BANDS[index];
    let Some(next) = RATING_BANDS.get(index + 1) else {
        return band;
    };

    let width = (band.max_rating - band.min_rating) as f64;
    let factor = (rating - band.min_rating) as f64 / width;
    ClassificationThresholds {
        min_rating: band.min_rating,
        max_rating: band.max_rating,
        inaccuracy_range: [
            lerp(band.inaccuracy_range[0], next.inaccuracy_range[0], factor),
            lerp(band.inaccuracy_range[1], next.inaccuracy_range[1], factor),
        ],
        mistake_range: [
            lerp(band.mistake_range[0], next.mistake_range[0], factor),
            lerp(band.mistake_range[1], next.mistake_range[1], factor),
        ],
        blunder_threshold: lerp(band.blunder_threshold, next.blunder_threshold, factor),
        excellent_threshold: lerp(band.excellent_threshold, next.excellent_threshold, factor),
        good_threshold: lerp(band.good_threshold, next.good_threshold, factor),
    }
}

/// Judge a move's centipawn loss against the interpolated thresholds for
/// the player's rating.
pub fn classify_move(cp_loss: i32, rating: u32) -> MoveClassification {
    let t = interpolated_thresholds(rating);
    if cp_loss >= t.blunder_threshold {
        MoveClassification::Blunder
    } else if cp_loss >= t.mistake_range[0] {
        MoveClassification::Mistake
    } else if cp_loss >= t.inaccuracy_range[0] {
        MoveClassification::Inaccuracy
    } else if cp_loss <= t.excellent_threshold {
        MoveClassification::Excellent
    } else {
        MoveClassification::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_contiguous_over_the_rating_space() {
        assert_eq!(RATING_BANDS[0].min_rating, 0);
        assert_eq!(RATING_BANDS[RATING_BANDS.len() - 1].max_rating, 4000);
        for pair in RATING_BANDS.windows(2) {
            assert_eq!(pair[0].max_rating, pair[1].min_rating);
        }
    }

    #[test]
    fn test_blunder_threshold_is_non_increasing() {
        for pair in RATING_BANDS.windows(2) {
            assert!(pair[0].blunder_threshold >= pair[1].blunder_threshold);
        }
    }

    #[test]
    fn test_scenario_thresholds() {
        assert_eq!(thresholds_for_rating(500).blunder_threshold, 500);
        assert_eq!(thresholds_for_rating(2500).blunder_threshold, 100);
    }

    #[test]
    fn test_lookup_is_total_and_clamped() {
        for rating in [0u32, 599, 600, 1399, 2399, 3999, 4000, 10_000] {
            let band = thresholds_for_rating(rating);
            assert!(band.blunder_threshold > 0);
        }
        assert_eq!(thresholds_for_rating(9999), thresholds_for_rating(3999));
    }

    #[test]
    fn test_interpolation_is_exact_at_band_boundaries() {
        for band in &RATING_BANDS {
            assert_eq!(
                interpolated_thresholds(band.min_rating),
                thresholds_for_rating(band.min_rating)
            );
        }
    }

    #[test]
    fn test_interpolation_moves_toward_the_next_band() {
        // Midway through the 1400-1800 band: between 300 and 250
        let mid = interpolated_thresholds(1600);
        assert_eq!(mid.blunder_threshold, 275);
    }

    #[test]
    fn test_classification_adapts_to_rating() {
        // 200cp is a blunder for a master but a mistake for a beginner
        assert_eq!(classify_move(200, 2700), MoveClassification::Blunder);
        assert_eq!(classify_move(200, 100), MoveClassification::Inaccuracy);
        assert_eq!(classify_move(0, 1500), MoveClassification::Excellent);
        assert_eq!(classify_move(600, 500), MoveClassification::Blunder);
    }
}
