//! Recursive tie-resolution driver (component C7).
//!
//! Repeatedly re-applies a criterion-specific `single_run` callback to
//! shrinking, equally-ranked cohorts until every cohort stabilises or the
//! 30-iteration cap is hit. Used by direct encounter, extended direct
//! encounter, and top/bottom-board-result.

use std::collections::HashMap;

use crate::pawn::domain::model::Competitor;

const MAX_LOOPS: i32 = 30;

/// A criterion's dense, 1-based rank for every member of one run (ties
/// share a value). Callbacks build this from whatever per-competitor
/// differentiator they compute (direct-encounter score, board value, ...).
pub type LocalRanks = HashMap<i32, i32>;

/// Runs the driver over one outer rank band (competitors already known to
/// be tied going into this criterion) and returns each competitor's
/// resolved DE-rank within that band (1-based, ties allowed).
///
/// `single_run` receives the current cohort (empty slice on the
/// initialisation/end-of-iteration hooks) and returns the run's local
/// ranks plus whether the run still needs another iteration (e.g.
/// top/bottom-board moving one board deeper because this round's boards
/// tied).
pub fn run_recursive<F>(
    cmps: &mut HashMap<i32, Competitor>,
    cohort: &[i32],
    mut single_run: F,
) -> HashMap<i32, i32>
where
    F: FnMut(&mut HashMap<i32, Competitor>, &[i32], i32) -> (LocalRanks, bool),
{
    let mut de_rank: HashMap<i32, i32> = cohort.iter().map(|&cid| (cid, 1)).collect();
    let mut more_loops: HashMap<i32, bool> = cohort.iter().map(|&cid| (cid, true)).collect();

    let _ = single_run(cmps, &[], 0);

    let mut order: Vec<i32> = cohort.to_vec();

    for loopcount in 1..=MAX_LOOPS {
        let old_rank = de_rank.clone();
        let mut local_ranks: HashMap<i32, i32> = HashMap::new();
        let mut keep_going = false;
        let mut i = 0;
        while i < order.len() {
            let mut j = i + 1;
            while j < order.len() && old_rank[&order[j]] == old_rank[&order[i]] {
                j += 1;
            }
            let run: Vec<i32> = order[i..j].to_vec();
            if run.len() >= 2 && run.iter().any(|c| more_loops[c]) {
                let (ranks, want_more) = single_run(cmps, &run, loopcount);
                for c in &run {
                    more_loops.insert(*c, want_more);
                    local_ranks.insert(*c, *ranks.get(c).unwrap_or(&1));
                }
                if want_more {
                    keep_going = true;
                }
            } else {
                for c in &run {
                    more_loops.insert(*c, false);
                    local_ranks.insert(*c, 1);
                }
            }
            i = j;
        }

        let _ = single_run(cmps, &[], loopcount);

        // Rebuild a dense global rank from (previous band, local rank
        // within that band) pairs: strictly increasing across band
        // boundaries and wherever a run actually differentiated, tied
        // wherever it didn't.
        let mut counter = 0i32;
        let mut prev: Option<(i32, i32)> = None;
        for cid in &order {
            let key = (old_rank[cid], *local_ranks.get(cid).unwrap_or(&1));
            if prev != Some(key) {
                counter += 1;
                prev = Some(key);
            }
            de_rank.insert(*cid, counter);
        }

        order.sort_by(|a, b| de_rank[a].cmp(&de_rank[b]).then(a.cmp(b)));

        if !keep_going {
            break;
        }
    }

    compact(&order, &mut de_rank);
    de_rank
}

/// Subtract the minimum DE-rank observed so the returned ranks start at 1
/// and stay monotone, without reading one past the end of the order.
fn compact(order: &[i32], de_rank: &mut HashMap<i32, i32>) {
    if order.is_empty() {
        return;
    }
    let min = order.iter().map(|c| de_rank[c]).min().unwrap_or(1);
    for c in order {
        if let Some(v) = de_rank.get_mut(c) {
            *v -= min - 1;
        }
    }
}
