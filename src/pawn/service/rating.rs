//! Rating performance math (component C9): expected score, delta-R, and
//! the ARO/TPR/PTP family.
//!
//! `rating.py` was not part of the retrieval pack this engine was
//! grounded on, so the formulas below follow the published FIDE
//! regulations (Handbook B.0, Table 8.1b logistic approximation) rather
//! than a specific source file.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Standard logistic expected-score formula: `1 / (1 + 10^((b-a)/400))`.
pub fn expected_score(rating_a: i32, rating_b: i32) -> Decimal {
    let diff = (rating_b - rating_a) as f64;
    let expected = 1.0 / (1.0 + 10f64.powf(diff / 400.0));
    Decimal::from_f64_retain(expected).unwrap_or(Decimal::new(5, 1))
}

/// `actual - expected`, used to populate a round result's `delta_r`.
pub fn delta_r(expected: Decimal, actual: Decimal) -> Decimal {
    actual - expected
}

pub fn average_rating_of_opponents(ratings: &[i32]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = ratings.iter().map(|&r| r as i64).sum();
    Decimal::from(sum) / Decimal::from(ratings.len() as i64)
}

/// FIDE `dp` table: rating-difference bonus/penalty for a scored
/// percentage, clamped at +/-800 at the extremes per Handbook B.0 6.4.
fn dp_for_percentage(pct: f64) -> f64 {
    const TABLE: [(f64, f64); 51] = [
        (100.0, 800.0),
        (99.0, 677.0),
        (98.0, 589.0),
        (97.0, 538.0),
        (96.0, 501.0),
        (95.0, 470.0),
        (94.0, 444.0),
        (93.0, 422.0),
        (92.0, 401.0),
        (91.0, 383.0),
        (90.0, 366.0),
        (89.0, 351.0),
        (88.0, 336.0),
        (87.0, 322.0),
        (86.0, 309.0),
        (85.0, 296.0),
        (84.0, 284.0),
        (83.0, 273.0),
        (82.0, 262.0),
        (81.0, 251.0),
        (80.0, 240.0),
        (79.0, 230.0),
        (78.0, 220.0),
        (77.0, 211.0),
        (76.0, 202.0),
        (75.0, 193.0),
        (74.0, 184.0),
        (73.0, 175.0),
        (72.0, 166.0),
        (71.0, 158.0),
        (70.0, 149.0),
        (69.0, 141.0),
        (68.0, 133.0),
        (67.0, 125.0),
        (66.0, 117.0),
        (65.0, 110.0),
        (64.0, 102.0),
        (63.0, 95.0),
        (62.0, 87.0),
        (61.0, 80.0),
        (60.0, 72.0),
        (59.0, 65.0),
        (58.0, 57.0),
        (57.0, 50.0),
        (56.0, 43.0),
        (55.0, 36.0),
        (54.0, 29.0),
        (53.0, 21.0),
        (52.0, 14.0),
        (51.0, 7.0),
        (50.0, 0.0),
    ];
    if pct >= 100.0 {
        return 800.0;
    }
    if pct <= 0.0 {
        return -800.0;
    }
    if pct < 50.0 {
        return -dp_for_percentage(100.0 - pct);
    }
    for window in TABLE.windows(2) {
        let (hi_pct, hi_dp) = window[0];
        let (lo_pct, lo_dp) = window[1];
        if pct <= hi_pct && pct >= lo_pct {
            if (hi_pct - lo_pct).abs() < f64::EPSILON {
                return hi_dp;
            }
            let t = (pct - lo_pct) / (hi_pct - lo_pct);
            return lo_dp + t * (hi_dp - lo_dp);
        }
    }
    0.0
}

/// TPR: average opponent rating plus the dp-table bonus for the
/// percentage actually scored.
pub fn tournament_performance_rating(score: Decimal, ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let avg = average_rating_of_opponents(ratings).to_f64().unwrap_or(0.0);
    let pct = (score.to_f64().unwrap_or(0.0) / ratings.len() as f64) * 100.0;
    (avg + dp_for_percentage(pct)).round() as i32
}

/// PTP: the rating `R` such that `sum(expected_score(R, opponent))`
/// equals the score actually achieved, found by bisection since the
/// expected-score curve is monotone in `R`.
pub fn perfect_tournament_performance(score: Decimal, ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let target = score.to_f64().unwrap_or(0.0);
    let mut lo = -1000.0_f64;
    let mut hi = 4000.0_f64;
    for _ in 0..60 {
        let mid = (lo + hi) / 2.0;
        let total: f64 = ratings
            .iter()
            .map(|&r| 1.0 / (1.0 + 10f64.powf((r as f64 - mid) / 400.0)))
            .sum();
        if total < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    ((lo + hi) / 2.0).round() as i32
}

pub fn average(values: &[i32]) -> Decimal {
    let nonzero: Vec<i32> = values.iter().copied().filter(|&v| v != 0).collect();
    if nonzero.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = nonzero.iter().map(|&v| v as i64).sum();
    Decimal::from(sum) / Decimal::from(nonzero.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_score_is_half_for_equal_ratings() {
        let e = expected_score(2000, 2000);
        assert!((e.to_f64().unwrap() - 0.5).abs() < 0.001);
    }

    #[test]
    fn tpr_matches_average_for_fifty_percent() {
        let ratings = [2000, 2000];
        let tpr = tournament_performance_rating(Decimal::ONE, &ratings);
        assert_eq!(tpr, 2000);
    }

    #[test]
    fn ptp_reproduces_score_within_tolerance() {
        let ratings = [2000, 2000];
        let ptp = perfect_tournament_performance(Decimal::new(15, 1), &ratings);
        let reproduced: f64 = ratings
            .iter()
            .map(|&r| 1.0 / (1.0 + 10f64.powf((r as f64 - ptp as f64) / 400.0)))
            .sum();
        assert!((reproduced - 1.5).abs() < 0.05);
    }

    #[test]
    fn average_ignores_zero_entries() {
        let values = [0, 2000, 2200];
        assert_eq!(average(&values), Decimal::from(2100));
    }
}
