//! End-to-end critical-moment detection and rating-adaptive thresholds.

use chess_themes::Tier;
use game_moments::{
    classify_move, detect_critical_moments, interpolated_thresholds, recommend_multipv,
    thresholds_for_rating, CriticalMomentOptions, CriticalMomentType, MoveClassification,
    MultipvOptions, PlyEvaluation, RATING_BANDS,
};

fn ply(
    ply_index: usize,
    eval_before: i32,
    eval_after: i32,
    classification: MoveClassification,
) -> PlyEvaluation {
    PlyEvaluation {
        ply_index,
        move_number: (ply_index / 2 + 1) as u32,
        is_white_move: ply_index % 2 == 0,
        eval_before,
        eval_after,
        classification,
        cp_loss: None,
    }
}

fn quiet_game(total: usize) -> Vec<PlyEvaluation> {
    (0..total)
        .map(|i| ply(i, 20, -20, MoveClassification::Good))
        .collect()
}

#[test]
fn test_a_blunder_dominates_a_short_game() {
    // White is winning, blunders on ply 2, and Black converts.
    let plies = vec![
        ply(0, 250, -245, MoveClassification::Good),
        ply(1, -245, 250, MoveClassification::Good),
        ply(2, 250, 280, MoveClassification::Blunder),
        ply(3, 280, -290, MoveClassification::Good),
    ];
    let moments = detect_critical_moments(&plies, &CriticalMomentOptions::default());
    assert_eq!(moments.len(), 1);
    assert_eq!(moments[0].ply_index, 2);
    assert_eq!(moments[0].moment_type, CriticalMomentType::ResultChange);
    assert!(moments[0].score >= 90);
}

#[test]
fn test_moment_count_never_exceeds_the_ratio_cap() {
    // Every ply swings wildly, so the cap is the only limiter.
    let plies: Vec<PlyEvaluation> = (0..40)
        .map(|i| {
            let sign = if i % 2 == 0 { 1 } else { -1 };
            ply(i, sign * 300, sign * 300, MoveClassification::Blunder)
        })
        .collect();
    let options = CriticalMomentOptions::default();
    let moments = detect_critical_moments(&plies, &options);
    let cap = (options.max_critical_ratio * plies.len() as f64).floor() as usize;
    assert!(moments.len() <= cap, "{} > {}", moments.len(), cap);
    assert!(!moments.is_empty());
    for pair in moments.windows(2) {
        assert!(pair[0].ply_index < pair[1].ply_index);
    }
}

#[test]
fn test_quiet_games_surface_only_phase_transitions() {
    let moments = detect_critical_moments(&quiet_game(80), &CriticalMomentOptions::default());
    assert!(!moments.is_empty());
    for moment in &moments {
        assert_eq!(moment.moment_type, CriticalMomentType::PhaseTransition);
    }
    // Short games have no transitions to report.
    let moments = detect_critical_moments(&quiet_game(20), &CriticalMomentOptions::default());
    assert!(moments.is_empty());
}

#[test]
fn test_min_score_filters_weak_moments() {
    let mut plies = quiet_game(80);
    plies[40] = ply(40, 250, 280, MoveClassification::Blunder);
    let options = CriticalMomentOptions {
        min_score: 50,
        ..Default::default()
    };
    let moments = detect_critical_moments(&plies, &options);
    assert_eq!(moments.len(), 1);
    assert_eq!(moments[0].ply_index, 40);
}

#[test]
fn test_moment_wire_format() {
    let plies = vec![
        ply(0, -250, 250, MoveClassification::Good),
        ply(1, 250, 280, MoveClassification::Blunder),
    ];
    let moments = detect_critical_moments(&plies, &CriticalMomentOptions::default());
    let json = serde_json::to_value(&moments[0]).unwrap();
    assert_eq!(json["plyIndex"], 1);
    assert_eq!(json["momentType"], "result_change");
    assert!(json["score"].as_u64().unwrap() <= 100);
    assert!(json["reason"].is_string());
}

#[test]
fn test_rating_bands_cover_the_whole_range() {
    for pair in RATING_BANDS.windows(2) {
        assert_eq!(pair[0].max_rating, pair[1].min_rating);
        // Stronger players get tighter blunder thresholds.
        assert!(pair[0].blunder_threshold >= pair[1].blunder_threshold);
    }
    assert_eq!(RATING_BANDS[0].min_rating, 0);
    assert_eq!(RATING_BANDS[RATING_BANDS.len() - 1].max_rating, 4000);
}

#[test]
fn test_threshold_lookup_scenarios() {
    assert_eq!(thresholds_for_rating(500).blunder_threshold, 500);
    assert_eq!(thresholds_for_rating(2500).blunder_threshold, 100);
    // Out-of-range ratings clamp into the top band.
    assert_eq!(
        thresholds_for_rating(9999).blunder_threshold,
        thresholds_for_rating(3999).blunder_threshold
    );
}

#[test]
fn test_interpolation_agrees_with_band_edges() {
    for band in &RATING_BANDS {
        assert_eq!(
            interpolated_thresholds(band.min_rating).blunder_threshold,
            band.blunder_threshold
        );
    }
    // Halfway between the 1400 and 1800 bands.
    assert_eq!(interpolated_thresholds(1600).blunder_threshold, 275);
}

#[test]
fn test_classification_adapts_to_rating() {
    assert_eq!(classify_move(200, 2700), MoveClassification::Blunder);
    assert_eq!(classify_move(200, 100), MoveClassification::Inaccuracy);
    assert_eq!(classify_move(600, 500), MoveClassification::Blunder);
    assert_eq!(classify_move(0, 1500), MoveClassification::Excellent);
}

#[test]
fn test_multipv_widens_with_criticality() {
    let options = MultipvOptions::default();
    assert_eq!(recommend_multipv(0, Tier::Shallow, &options).multipv, 1);
    assert_eq!(recommend_multipv(0, Tier::Standard, &options).multipv, 2);
    assert_eq!(recommend_multipv(60, Tier::Standard, &options).multipv, 3);
    assert_eq!(recommend_multipv(90, Tier::Full, &options).multipv, 5);
    let capped = MultipvOptions { max_multipv: 3 };
    assert_eq!(recommend_multipv(90, Tier::Full, &capped).multipv, 3);
}
