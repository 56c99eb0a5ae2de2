//! How many principal variations a ply deserves from the engine. Critical
//! plies get wider searches; bulk plies get the cheapest pass the tier
//! allows.

use chess_themes::Tier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipvRecommendation {
    pub multipv: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy)]
pub struct MultipvOptions {
    pub max_multipv: u32,
}

impl Default for MultipvOptions {
    fn default() -> Self {
        Self { max_multipv: 5 }
    }
}

/// Tier sets the floor, criticality adds lines on top, the option caps it.
pub fn recommend_multipv(
    criticality_score: u32,
    tier: Tier,
    options: &MultipvOptions,
) -> MultipvRecommendation {
    let base = match tier {
        Tier::Shallow => 1,
        Tier::Standard => 2,
        Tier::Full => 3,
    };
    let bump = if criticality_score >= 75 {
        2
    } else if criticality_score >= 50 {
        1
    } else {
        0
    };
    let multipv = (base + bump).min(options.max_multipv.max(1));

    let reason = if bump > 0 {
        format!(
            "Critical ply (score {}): widened to {} lines",
            criticality_score, multipv
        )
    } else {
        format!("Routine ply: {} lines for the {:?} tier", multipv, tier)
    };
    MultipvRecommendation { multipv, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_sets_the_base() {
        let options = MultipvOptions::default();
        assert_eq!(recommend_multipv(0, Tier::Shallow, &options).multipv, 1);
        assert_eq!(recommend_multipv(0, Tier::Standard, &options).multipv, 2);
        assert_eq!(recommend_multipv(0, Tier::Full, &options).multipv, 3);
    }

    #[test]
    fn test_criticality_widens_the_search() {
        let options = MultipvOptions::default();
        assert_eq!(recommend_multipv(50, Tier::Standard, &options).multipv, 3);
        assert_eq!(recommend_multipv(75, Tier::Standard, &options).multipv, 4);
        assert_eq!(recommend_multipv(100, Tier::Full, &options).multipv, 5);
    }

    #[test]
    fn test_cap_applies() {
        let options = MultipvOptions { max_multipv: 3 };
        assert_eq!(recommend_multipv(100, Tier::Full, &options).multipv, 3);
    }

    #[test]
    fn test_reason_is_informative() {
        let rec = recommend_multipv(80, Tier::Full, &MultipvOptions::default());
        assert!(rec.reason.contains("80"));
    }
}
