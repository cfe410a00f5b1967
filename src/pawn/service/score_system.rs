//! Score-system registry and the point-value equation solver (components C1/C2).

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::pawn::domain::model::ScoreSystem;

/// Well-known FIDE point values, used when a tournament's declared score
/// system can't be reconciled from observed results.
pub fn standard_score_system(name: &str) -> ScoreSystem {
    let mut values = HashMap::new();
    values.insert('W', Decimal::ONE);
    values.insert('D', Decimal::new(5, 1));
    values.insert('L', Decimal::ZERO);
    values.insert('Z', Decimal::ZERO);
    values.insert('P', Decimal::ONE);
    values.insert('U', Decimal::ZERO);
    values.insert('A', Decimal::ZERO);
    ScoreSystem {
        name: name.to_string(),
        values,
    }
}

/// The `rating` pseudo-system is always classic 1/half/0 regardless of the
/// tournament's declared scoring, since expected-score math must stay on
/// a fixed scale.
pub fn rating_score_system() -> ScoreSystem {
    standard_score_system("rating")
}

/// Observed count of a result tag for one competitor, used as the raw
/// material the equation solver reconciles against.
#[derive(Debug, Clone, Copy)]
pub struct ResultEquation {
    pub tag: char,
    pub count: i32,
}

/// Given a set of `(total_score, [equations])` observations, search the
/// small set of FIDE-legal assignments for unknown tags until one is
/// found that reconciles every observation exactly.
///
/// Mirrors the brute-force substitution order of the original solver:
/// force progressively larger sets of tags to a shared unknown value,
/// falling back to the full `{W, D, L}` triple as a last resort.
pub fn solve_scoresystem(
    base: &ScoreSystem,
    observations: &[(Decimal, Vec<ResultEquation>)],
) -> ScoreSystem {
    if observations.is_empty() {
        return base.clone();
    }
    let candidate_sets: [&[char]; 6] = [
        &['W'],
        &['D'],
        &['L'],
        &['W', 'D'],
        &['D', 'L'],
        &['W', 'D', 'L'],
    ];
    for unknowns in candidate_sets {
        if let Some(system) = solve_scoresystem_p(base, observations, unknowns) {
            return system;
        }
    }
    debug!("score-system solver failed to reconcile observations, using base system");
    base.clone()
}

fn solve_scoresystem_p(
    base: &ScoreSystem,
    observations: &[(Decimal, Vec<ResultEquation>)],
    unknowns: &[char],
) -> Option<ScoreSystem> {
    // Try candidate shared values on a coarse grid; stop at the first
    // value that satisfies every observation.
    let grid = [
        Decimal::ONE,
        Decimal::new(5, 1),
        Decimal::ZERO,
        Decimal::new(15, 1),
        Decimal::new(2, 0),
    ];
    for candidate in grid {
        let mut system = base.clone();
        for tag in unknowns {
            system.values.insert(*tag, candidate);
        }
        if observations
            .iter()
            .all(|(total, eqs)| reconciles(&system, *total, eqs))
        {
            return Some(system);
        }
    }
    None
}

fn reconciles(system: &ScoreSystem, total: Decimal, eqs: &[ResultEquation]) -> bool {
    let sum: Decimal = eqs
        .iter()
        .map(|eq| system.get(eq.tag) * Decimal::from(eq.count))
        .sum();
    sum == total
}
