//! Ranking assembler (component C8).
//!
//! Applies one criterion's already-computed state to the live rank
//! order: appends the value to each competitor's tiebreak trace, sorts
//! by (prior rank, criterion value, cid), and assigns new ranks that
//! preserve ties.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::instrument;

use crate::pawn::domain::model::Competitor;
use crate::pawn::domain::tiebreak::TiebreakDescriptor;

#[instrument(skip(cmps, descriptor))]
pub fn apply_criterion(cmps: &mut HashMap<i32, Competitor>, descriptor: &TiebreakDescriptor) {
    let key = descriptor.state_key();
    let ascending = descriptor.modifiers.reverse.unwrap_or(false);

    let mut order: Vec<i32> = cmps.keys().copied().collect();
    for cid in &order {
        let acc = cmps[cid].get(&key).cloned().unwrap_or_default();
        let competitor = cmps.get_mut(cid).unwrap();
        competitor.tiebreak_score.push(acc.val.clone());
        competitor.tiebreak_details.push(acc);
    }

    order.sort_by(|a, b| {
        let rank_a = cmps[a].rank;
        let rank_b = cmps[b].rank;
        rank_a.cmp(&rank_b).then_with(|| {
            let va = cmps[a].get(&key).map(|x| x.val.as_decimal()).unwrap_or(Decimal::ZERO);
            let vb = cmps[b].get(&key).map(|x| x.val.as_decimal()).unwrap_or(Decimal::ZERO);
            let cmp = va.cmp(&vb);
            if ascending { cmp } else { cmp.reverse() }
        }).then_with(|| a.cmp(b))
    });

    let mut prev: Option<(i32, Decimal, i32)> = None; // (old_rank, value, assigned_new_rank)
    for (idx, cid) in order.iter().enumerate() {
        let position = idx as i32 + 1;
        let value = cmps[cid].get(&key).map(|x| x.val.as_decimal()).unwrap_or(Decimal::ZERO);
        let old_rank = cmps[cid].rank;
        let new_rank = match prev {
            Some((pr, pv, assigned)) if pr == old_rank && pv == value => assigned,
            _ => position,
        };
        cmps.get_mut(cid).unwrap().rank = new_rank;
        prev = Some((old_rank, value, new_rank));
    }
}
