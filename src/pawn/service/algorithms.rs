//! The individual tiebreak algorithms (component C6).
//!
//! Each `compute_*` function reads the accumulator's (C4) per-competitor
//! state and a [`TiebreakDescriptor`], and writes the criterion's result
//! back into `state[descriptor.state_key()]`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::instrument;

use crate::pawn::domain::model::{AccValue, Competitor, ScoreSystem, TbNum};
use crate::pawn::domain::tiebreak::{PointType, TiebreakDescriptor};
use crate::pawn::service::rating;
use crate::pawn::service::tie_driver;

/// Static tournament facts the algorithms need but that never change
/// across criteria: round count, team shape, and the two score systems.
#[derive(Debug, Clone)]
pub struct TournamentContext {
    pub current_round: i32,
    pub team_tournament: bool,
    pub team_size: i32,
    pub max_board: i32,
    pub is_round_robin: bool,
    pub game_score_system: ScoreSystem,
    pub match_score_system: ScoreSystem,
}

fn own_points(competitor: &Competitor, point_type: PointType) -> Decimal {
    match point_type {
        PointType::GamePoints | PointType::GMPoints | PointType::GGPoints => competitor
            .results
            .values()
            .map(|r| r.game_points)
            .sum(),
        _ => competitor
            .get("points")
            .map(|a| a.val.as_decimal())
            .unwrap_or_default(),
    }
}

fn round_points(competitor: &Competitor, round: i32, point_type: PointType) -> Decimal {
    match point_type {
        PointType::GamePoints | PointType::GMPoints | PointType::GGPoints => competitor
            .results
            .get(&round)
            .map(|r| r.game_points)
            .unwrap_or_default(),
        _ => competitor
            .results
            .get(&round)
            .map(|r| r.points_primary)
            .unwrap_or_default(),
    }
}

#[instrument(skip(cmps, descriptor))]
pub fn compute_points(cmps: &mut HashMap<i32, Competitor>, descriptor: &TiebreakDescriptor) {
    let key = descriptor.state_key();
    let values: Vec<(i32, Decimal)> = cmps
        .values()
        .map(|c| (c.cid, own_points(c, descriptor.point_type)))
        .collect();
    for (cid, val) in values {
        cmps.get_mut(&cid)
            .unwrap()
            .set(&key, AccValue::with_val(TbNum::Dec(val)));
    }
}

/// Pseudo-criteria pass through an already-accumulated statistic
/// unchanged: `SNO/RANK/RND/WIN/WON/BPG/BWG/GE/REP/VUR/NUM/COP/COD/CSQ`.
#[instrument(skip(cmps, descriptor))]
pub fn compute_pseudo(cmps: &mut HashMap<i32, Competitor>, descriptor: &TiebreakDescriptor) {
    let key = descriptor.state_key();
    let source_key = match descriptor.name.as_str() {
        "WIN" => "win",
        "WON" => "won",
        "BPG" => "bpg",
        "BWG" => "bwg",
        "GE" => "ge",
        "REP" => "rep",
        "VUR" => "vur",
        "NUM" => "num",
        "COP" => "cop",
        "COD" => "cod",
        "CSQ" => "csq",
        _ => "",
    };
    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let value = match descriptor.name.as_str() {
            "SNO" => TbNum::Int(cid as i64),
            "RANK" => TbNum::Int(cmps[&cid].rank as i64),
            "RND" => TbNum::Int(cmps[&cid].random as i64),
            _ => cmps[&cid]
                .get(source_key)
                .map(|a| a.val.clone())
                .unwrap_or_default(),
        };
        cmps.get_mut(&cid)
            .unwrap()
            .set(&key, AccValue::with_val(value));
    }
}

/// `PS`: sum of running cumulative totals after round `low`.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_progressive_score(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let key = descriptor.state_key();
    let low = descriptor.modifiers.low.max(0);
    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let competitor = &cmps[&cid];
        let mut cumulative = Decimal::ZERO;
        let mut progressive = Decimal::ZERO;
        let mut rounds = HashMap::new();
        for round in 1..=ctx.current_round {
            cumulative += round_points(competitor, round, descriptor.point_type);
            if round > low {
                progressive += cumulative;
            }
            rounds.insert(round, TbNum::Dec(cumulative));
        }
        let acc = AccValue {
            val: TbNum::Dec(progressive),
            rounds,
            cut: Vec::new(),
        };
        cmps.get_mut(&cid).unwrap().set(&key, acc);
    }
}

/// `KS`: own points scored against opponents whose total meets the
/// `plim%`/`nlim` threshold.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_koya(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let key = descriptor.state_key();
    let win = ctx.match_score_system.get('W');
    let team_factor = if ctx.team_tournament {
        Decimal::from(ctx.team_size.max(1))
    } else {
        Decimal::ONE
    };
    let threshold = descriptor.modifiers.plim / Decimal::from(100)
        * win
        * Decimal::from(ctx.current_round)
        * team_factor
        + descriptor.modifiers.nlim;

    let opponent_totals: HashMap<i32, Decimal> = cmps
        .values()
        .map(|c| (c.cid, own_points(c, descriptor.point_type)))
        .collect();

    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let competitor = &cmps[&cid];
        let mut sum = Decimal::ZERO;
        let mut rounds = HashMap::new();
        for round in 1..=ctx.current_round {
            if let Some(rr) = competitor.results.get(&round) {
                if rr.played && rr.opponent != 0 {
                    let opp_total = opponent_totals.get(&rr.opponent).copied().unwrap_or_default();
                    if opp_total >= threshold {
                        sum += rr.points_primary;
                        rounds.insert(round, TbNum::Dec(rr.points_primary));
                    }
                }
            }
        }
        let acc = AccValue {
            val: TbNum::Dec(sum),
            rounds,
            cut: Vec::new(),
        };
        cmps.get_mut(&cid).unwrap().set(&key, acc);
    }
}

/// The Buchholz family: `BH/ABH/FB/AFB/SB/ESB`, optionally cut and
/// summed, optionally weighted by the subject's own result for
/// Sonneborn-Berger variants.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_buchholz_family(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let is_sb = matches!(descriptor.name.as_str(), "SB" | "ESB");
    let is_fore = matches!(descriptor.name.as_str(), "FB" | "AFB");
    let adjusted_only = matches!(descriptor.name.as_str(), "ABH" | "AFB");
    let key = descriptor.state_key();
    let draw = ctx.match_score_system.get('D');

    // Step 1: each competitor's per-round adjusted own-score ("abh").
    let mut abh: HashMap<i32, HashMap<i32, Decimal>> = HashMap::new();
    let mut abh_total: HashMap<i32, Decimal> = HashMap::new();
    for (cid, competitor) in cmps.iter() {
        let mut per_round = HashMap::new();
        let lo = competitor
            .get("lo")
            .map(|a| a.val.as_decimal().to_i32().unwrap_or(0))
            .unwrap_or(0);
        let mut total = Decimal::ZERO;
        for round in 1..=ctx.current_round {
            let Some(rr) = competitor.results.get(&round) else {
                continue;
            };
            let real_game = rr.opponent != 0 && rr.played;
            let is_last_round_fore = is_fore && round == ctx.current_round && rr.opponent != 0;
            let mut value = if real_game || round <= lo {
                rr.points_primary
            } else if ctx.is_round_robin {
                Decimal::ZERO
            } else {
                draw
            };
            if is_last_round_fore {
                value = draw;
            }
            per_round.insert(round, value);
            total += value;
        }
        abh_total.insert(*cid, total);
        abh.insert(*cid, per_round);
    }

    if adjusted_only {
        for (cid, total) in &abh_total {
            cmps.get_mut(cid)
                .unwrap()
                .set(&key, AccValue::with_val(TbNum::Dec(*total)));
        }
        return;
    }

    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let competitor = &cmps[&cid];
        let mut terms: Vec<(i32, Decimal, bool)> = Vec::new(); // (round, value, is_vur)
        for round in 1..=ctx.current_round {
            let Some(rr) = competitor.results.get(&round) else {
                continue;
            };
            if rr.opponent == 0 {
                continue;
            }
            let opp_abh = abh_total.get(&rr.opponent).copied().unwrap_or_default();
            let term = if is_sb {
                let own_result = if descriptor.name == "ESB" {
                    rr.points_rating
                } else {
                    rr.points_primary
                };
                opp_abh * own_result
            } else {
                opp_abh
            };
            let value = if !rr.played && descriptor.modifiers.urd {
                draw
            } else {
                term
            };
            terms.push((round, value, rr.vur));
        }

        let mut cut_rounds = Vec::new();
        let low = descriptor.modifiers.low.max(0) as usize;
        let high = descriptor.modifiers.high.max(0) as usize;
        cut_lowest(&mut terms, low, descriptor.modifiers.vun, &mut cut_rounds);
        cut_highest(&mut terms, high, &mut cut_rounds);

        let sum: Decimal = terms.iter().map(|(_, v, _)| *v).sum();
        let rounds = terms
            .iter()
            .map(|(r, v, _)| (*r, TbNum::Dec(*v)))
            .collect();

        let acc = AccValue {
            val: TbNum::Dec(sum),
            rounds,
            cut: cut_rounds,
        };
        cmps.get_mut(&cid).unwrap().set(&key, acc);
    }

    if descriptor.name == "AOB" {
        compute_average_of_opponents_buchholz(cmps, descriptor, &key);
    }
}

fn cut_lowest(
    terms: &mut Vec<(i32, Decimal, bool)>,
    n: usize,
    vun: bool,
    cut_rounds: &mut Vec<i32>,
) {
    for _ in 0..n {
        if terms.is_empty() {
            break;
        }
        let idx = if !vun {
            terms
                .iter()
                .enumerate()
                .filter(|(_, (_, _, is_vur))| *is_vur)
                .min_by_key(|(_, (_, v, _))| *v)
                .map(|(i, _)| i)
                .unwrap_or_else(|| {
                    terms
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, (_, v, _))| *v)
                        .map(|(i, _)| i)
                        .unwrap_or(0)
                })
        } else {
            terms
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, v, _))| *v)
                .map(|(i, _)| i)
                .unwrap_or(0)
        };
        let (round, _, _) = terms.remove(idx);
        cut_rounds.push(round);
    }
}

fn cut_highest(terms: &mut Vec<(i32, Decimal, bool)>, n: usize, cut_rounds: &mut Vec<i32>) {
    for _ in 0..n {
        if terms.is_empty() {
            break;
        }
        let idx = terms
            .iter()
            .enumerate()
            .max_by_key(|(_, (_, v, _))| *v)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let (round, _, _) = terms.remove(idx);
        cut_rounds.push(round);
    }
}

/// `AOB`: average, over this competitor's opponents, of their own BH
/// value (already stored under the same state key by the pass above).
fn compute_average_of_opponents_buchholz(
    cmps: &mut HashMap<i32, Competitor>,
    _descriptor: &TiebreakDescriptor,
    key: &str,
) {
    let bh_of: HashMap<i32, Decimal> = cmps
        .values()
        .map(|c| (c.cid, c.get(key).map(|a| a.val.as_decimal()).unwrap_or_default()))
        .collect();

    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let competitor = &cmps[&cid];
        let mut vals = Vec::new();
        for rr in competitor.results.values() {
            if rr.opponent != 0 {
                if let Some(v) = bh_of.get(&rr.opponent) {
                    vals.push(*v);
                }
            }
        }
        let avg = if vals.is_empty() {
            Decimal::ZERO
        } else {
            vals.iter().sum::<Decimal>() / Decimal::from(vals.len() as i64)
        };
        cmps.get_mut(&cid)
            .unwrap()
            .set(key, AccValue::with_val(TbNum::Dec(avg)));
    }
}

/// `DE`/`EDGE`: direct encounter within the cohort of competitors
/// currently tied, driven by the recursive tie driver (C7).
#[instrument(skip(cmps, descriptor, ctx, cohort))]
pub fn compute_direct_encounter(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
    cohort: &[i32],
) {
    let key = descriptor.state_key();
    let extended = descriptor.name == "EDGE";
    let sws = descriptor.modifiers.sws || !ctx.is_round_robin;

    let de_rank = tie_driver::run_recursive(cmps, cohort, |cmps, run, _loopcount| {
        if run.is_empty() {
            return (HashMap::new(), false);
        }
        let set: std::collections::HashSet<i32> = run.iter().copied().collect();
        let mut deval: HashMap<i32, Decimal> = HashMap::new();
        let mut demax: HashMap<i32, Decimal> = HashMap::new();
        let mut denum: HashMap<i32, i32> = HashMap::new();
        let win = ctx.match_score_system.get('W');

        for &cid in run {
            let competitor = &cmps[&cid];
            let mut sum = Decimal::ZERO;
            let mut met = std::collections::HashSet::new();
            for rr in competitor.results.values() {
                if set.contains(&rr.opponent) {
                    let val = if extended {
                        rr.points_rating
                    } else {
                        rr.points_primary
                    };
                    sum += val;
                    met.insert(rr.opponent);
                }
            }
            let unmet = (run.len() as i32 - 1 - met.len() as i32).max(0);
            deval.insert(cid, sum);
            denum.insert(cid, met.len() as i32);
            demax.insert(cid, sum + Decimal::from(unmet) * win * Decimal::from(ctx.team_size.max(1)));
        }

        let all_met = run.len() > 1
            && run.iter().all(|c| denum[c] == run.len() as i32 - 1)
            && ctx.is_round_robin
            && !sws;

        let mut order: Vec<i32> = run.to_vec();
        if all_met {
            order.sort_by(|a, b| deval[b].cmp(&deval[a]).then(a.cmp(b)));
        } else {
            order.sort_by(|a, b| deval[b].cmp(&deval[a]).then(demax[b].cmp(&demax[a])).then(a.cmp(b)));
        }

        let mut ranks = HashMap::new();
        let mut counter = 0i32;
        let mut prev: Option<(Decimal, Decimal)> = None;
        for &cid in &order {
            let key = if all_met {
                (deval[&cid], Decimal::ZERO)
            } else {
                (deval[&cid], demax[&cid])
            };
            if prev != Some(key) {
                counter += 1;
                prev = Some(key);
            }
            ranks.insert(cid, counter);
        }

        (ranks, false)
    });

    for (cid, rank) in de_rank {
        cmps.get_mut(&cid)
            .unwrap()
            .set(&key, AccValue::with_val(TbNum::Int(rank as i64)));
    }
}

/// `ARO/APRO/TPR/PTP/APPO`: rating-performance criteria, built from each
/// competitor's played-game opponent rating list with `low`/`high` cuts.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_rating_performance(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let key = descriptor.state_key();
    let unr = descriptor.modifiers.unr;
    let cids: Vec<i32> = cmps.keys().copied().collect();

    for cid in cids {
        let competitor = &cmps[&cid];
        let mut ratings: Vec<i32> = Vec::new();
        for round in 1..=ctx.current_round {
            if let Some(rr) = competitor.results.get(&round) {
                if rr.opponent == 0 {
                    continue;
                }
                if rr.opp_rating == 0 {
                    if unr > 0 {
                        ratings.push(unr);
                    }
                } else {
                    ratings.push(rr.opp_rating);
                }
            }
        }
        let total_rounds = ratings.len();
        let low = descriptor.modifiers.low.max(0) as usize;
        let high = descriptor.modifiers.high.max(0) as usize;
        ratings.sort_unstable();
        if total_rounds == ratings.len() && low <= ratings.len() {
            ratings.drain(0..low.min(ratings.len()));
        }
        if total_rounds == ratings.len() + low && high <= ratings.len() {
            let cut_from = ratings.len().saturating_sub(high);
            ratings.truncate(cut_from);
        }

        let score = own_points(competitor, descriptor.point_type);
        let value: TbNum = match descriptor.name.as_str() {
            "ARO" | "APRO" => TbNum::Dec(rating::average_rating_of_opponents(&ratings)),
            "TPR" => TbNum::Int(rating::tournament_performance_rating(score, &ratings) as i64),
            "PTP" | "APPO" => TbNum::Int(rating::perfect_tournament_performance(score, &ratings) as i64),
            _ => TbNum::Dec(Decimal::ZERO),
        };

        cmps.get_mut(&cid).unwrap().set(&key, AccValue::with_val(value));
    }
}

/// `BC`: sum of `board * points` on that board, lower is better.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_board_count(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let key = descriptor.state_key();
    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let competitor = &cmps[&cid];
        let mut sum = Decimal::ZERO;
        for round in 1..=ctx.current_round {
            if let Some(rr) = competitor.results.get(&round) {
                for game in &rr.games {
                    sum += Decimal::from(game.board) * game.points;
                }
            }
        }
        cmps.get_mut(&cid)
            .unwrap()
            .set(&key, AccValue::with_val(TbNum::Dec(sum)));
    }
}

/// `TBR`/`BBE`: top- or bottom-board result comparison, driven by the
/// recursive tie driver over the cohort's board point vectors.
#[instrument(skip(cmps, descriptor, cohort))]
pub fn compute_top_bottom_board(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    cohort: &[i32],
) {
    let key = descriptor.state_key();
    let top = descriptor.name == "TBR";

    let de_rank = tie_driver::run_recursive(cmps, cohort, |cmps, run, loopcount| {
        if run.is_empty() {
            return (HashMap::new(), false);
        }
        let k = loopcount as usize - 1;
        let mut board_val: HashMap<i32, Decimal> = HashMap::new();
        let mut max_boards = 0usize;
        for &cid in run {
            let competitor = &cmps[&cid];
            let mut boards: Vec<Decimal> = competitor
                .results
                .values()
                .flat_map(|rr| rr.games.iter())
                .map(|g| g.points)
                .collect();
            boards.sort_by(|a, b| b.cmp(a));
            if !top {
                boards.reverse();
            }
            max_boards = max_boards.max(boards.len());
            let value = if k < boards.len() {
                boards[k]
            } else {
                Decimal::ZERO
            };
            board_val.insert(cid, value);
        }

        let mut order: Vec<i32> = run.to_vec();
        order.sort_by(|a, b| board_val[b].cmp(&board_val[a]).then(a.cmp(b)));
        let mut ranks = HashMap::new();
        let mut counter = 0i32;
        let mut prev: Option<Decimal> = None;
        for &cid in &order {
            let v = board_val[&cid];
            if prev != Some(v) {
                counter += 1;
                prev = Some(v);
            }
            ranks.insert(cid, counter);
        }

        let distinct = counter > 1;
        let want_more = !distinct && k + 1 < max_boards;
        (ranks, want_more)
    });

    for (cid, rank) in de_rank {
        cmps.get_mut(&cid)
            .unwrap()
            .set(&key, AccValue::with_val(TbNum::Int(rank as i64)));
    }
}

/// `SSSC`: own secondary score plus a Buchholz-derived strength term on
/// the other score dimension, quantised to 0.01.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_sssc(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let key = descriptor.state_key();
    let other_point_type = match descriptor.point_type {
        PointType::MPoints => PointType::GamePoints,
        _ => PointType::MPoints,
    };
    let win_other = ctx.match_score_system.get('W').max(Decimal::ONE);
    let divisor = if ctx.max_board > 0 {
        (ctx.match_score_system.get('W') * Decimal::from(ctx.current_round)
            / win_other
            / Decimal::from(ctx.max_board))
        .max(Decimal::ONE)
    } else if descriptor.modifiers.nlim > Decimal::ZERO {
        descriptor.modifiers.nlim
    } else {
        Decimal::ONE
    };

    let mut base: HashMap<i32, Decimal> = HashMap::new();
    for (cid, competitor) in cmps.iter() {
        let mut sum = Decimal::ZERO;
        for rr in competitor.results.values() {
            if rr.opponent != 0 {
                sum += rr.points_primary;
            }
        }
        base.insert(*cid, sum);
    }

    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let own_other = own_points(&cmps[&cid], other_point_type);
        let strength = base.get(&cid).copied().unwrap_or_default() / divisor;
        let value = (own_other + strength).round_dp(2);
        cmps.get_mut(&cid)
            .unwrap()
            .set(&key, AccValue::with_val(TbNum::Dec(value)));
    }
}

/// `ACC`: cumulative own score plus credited acceleration points.
/// `FLT`: up/down float history, weighted and decayed each round.
/// `TOP`: whether the competitor's accelerated score clears half the
/// maximum attainable score.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_acceleration(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let key = descriptor.state_key();
    let win = ctx.match_score_system.get('W');

    match descriptor.name.as_str() {
        "ACC" => {
            let cids: Vec<i32> = cmps.keys().copied().collect();
            for cid in cids {
                let acc = own_points(&cmps[&cid], descriptor.point_type);
                cmps.get_mut(&cid)
                    .unwrap()
                    .set(&key, AccValue::with_val(TbNum::Dec(acc)));
            }
        }
        "FLT" => {
            let acc_by_round: HashMap<i32, HashMap<i32, Decimal>> = cmps
                .iter()
                .map(|(cid, c)| {
                    let mut cumulative = Decimal::ZERO;
                    let mut rounds = HashMap::new();
                    for r in 1..=ctx.current_round {
                        cumulative += round_points(c, r, descriptor.point_type);
                        rounds.insert(r, cumulative);
                    }
                    (*cid, rounds)
                })
                .collect();

            let cids: Vec<i32> = cmps.keys().copied().collect();
            for cid in cids {
                let competitor = &cmps[&cid];
                let mut sfloat: i64 = 0;
                let mut rounds = HashMap::new();
                for r in 2..=ctx.current_round {
                    let own_prev = acc_by_round[&cid].get(&(r - 1)).copied().unwrap_or_default();
                    let opp = competitor.results.get(&r).map(|rr| rr.opponent).unwrap_or(0);
                    let opp_prev = acc_by_round
                        .get(&opp)
                        .and_then(|m| m.get(&(r - 1)))
                        .copied()
                        .unwrap_or_default();
                    let weight = match own_prev.cmp(&opp_prev) {
                        std::cmp::Ordering::Greater => 8,
                        std::cmp::Ordering::Less => 4,
                        std::cmp::Ordering::Equal => 0,
                    };
                    sfloat = sfloat / 4 + weight;
                    rounds.insert(r, TbNum::Int(sfloat));
                }
                let acc = AccValue {
                    val: TbNum::Int(sfloat),
                    rounds,
                    cut: Vec::new(),
                };
                cmps.get_mut(&cid).unwrap().set(&key, acc);
            }
        }
        "TOP" => {
            let cids: Vec<i32> = cmps.keys().copied().collect();
            let team_factor = if ctx.team_tournament {
                Decimal::from(ctx.team_size.max(1))
            } else {
                Decimal::ONE
            };
            let threshold = win * Decimal::from(ctx.current_round - 1) * team_factor / Decimal::from(2);
            for cid in cids {
                let score = own_points(&cmps[&cid], descriptor.point_type);
                let is_top = score > threshold;
                cmps.get_mut(&cid)
                    .unwrap()
                    .set(&key, AccValue::with_val(TbNum::Bool(is_top)));
            }
        }
        _ => {}
    }
}

/// `RFP`: colour-for-pairing, one entry per round describing opponent and
/// colour, or `Y` once the competitor has no more games left.
#[instrument(skip(cmps, descriptor, ctx))]
pub fn compute_rfp(
    cmps: &mut HashMap<i32, Competitor>,
    descriptor: &TiebreakDescriptor,
    ctx: &TournamentContext,
) {
    let key = descriptor.state_key();
    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        let competitor = &cmps[&cid];
        let lp = competitor
            .get("lp")
            .map(|a| a.val.as_decimal().to_i32().unwrap_or(0))
            .unwrap_or(0);
        let mut rounds = HashMap::new();
        for round in 1..=ctx.current_round {
            let rr = competitor.results.get(&round);
            let text = match rr {
                Some(rr) if rr.played || (rr.opponent == 0 && rr.points_primary > Decimal::ZERO) => {
                    let color = match rr.color {
                        crate::pawn::domain::model::Color::White => "W",
                        crate::pawn::domain::model::Color::Black => "B",
                        crate::pawn::domain::model::Color::None => "",
                    };
                    format!("{}{}", rr.opponent, color)
                }
                _ if round > lp && lp > 0 => "Y".to_string(),
                _ => String::new(),
            };
            rounds.insert(round, TbNum::Text(text));
        }
        let acc = AccValue {
            val: TbNum::Text(String::new()),
            rounds,
            cut: Vec::new(),
        };
        cmps.get_mut(&cid).unwrap().set(&key, acc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pawn::domain::model::{Color, GameRow, RoundResult};
    use crate::pawn::domain::tiebreak::Modifiers;
    use crate::pawn::service::accumulator::accumulate;
    use crate::pawn::service::score_system::standard_score_system;

    fn ctx() -> TournamentContext {
        TournamentContext {
            current_round: 3,
            team_tournament: false,
            team_size: 1,
            max_board: 0,
            is_round_robin: false,
            game_score_system: standard_score_system("game"),
            match_score_system: standard_score_system("match"),
        }
    }

    fn played(round: i32, opponent: i32, points: Decimal) -> RoundResult {
        RoundResult {
            round,
            points_primary: points,
            points_rating: points,
            color: Color::White,
            played: true,
            vur: false,
            rated: true,
            opponent,
            opp_rating: 2000,
            board: 1,
            delta_r: None,
            games: Vec::new(),
            game_points: Decimal::ZERO,
        }
    }

    fn descriptor(name: &str) -> TiebreakDescriptor {
        TiebreakDescriptor {
            order: 1,
            name: name.to_string(),
            year: 24,
            point_type: PointType::Points,
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn buchholz_sums_opponents_scores() {
        let mut cmps = HashMap::new();
        let mut c1 = Competitor::new(1, 1);
        c1.results.insert(1, played(1, 2, Decimal::ONE));
        let mut c2 = Competitor::new(2, 2);
        c2.results.insert(1, played(1, 1, Decimal::ZERO));
        cmps.insert(1, c1);
        cmps.insert(2, c2);
        accumulate(&mut cmps, 1, Decimal::ONE);
        let mut d = descriptor("BH");
        d.modifiers.p4f = true;
        let ctx = TournamentContext {
            current_round: 1,
            ..ctx()
        };
        compute_buchholz_family(&mut cmps, &d, &ctx);
        let bh = cmps[&1].get(&d.state_key()).unwrap();
        assert_eq!(bh.val, TbNum::Dec(Decimal::ZERO));
    }

    #[test]
    fn koya_counts_points_against_strong_opponents_only() {
        let mut cmps = HashMap::new();
        let mut c1 = Competitor::new(1, 1);
        c1.results.insert(1, played(1, 2, Decimal::ONE));
        c1.results.insert(2, played(2, 3, Decimal::ONE));
        let mut c2 = Competitor::new(2, 2);
        c2.results.insert(1, played(1, 1, Decimal::ZERO));
        c2.results.insert(2, RoundResult::stub(2));
        let mut c3 = Competitor::new(3, 3);
        c3.results.insert(2, played(2, 1, Decimal::ZERO));
        c3.results.insert(1, RoundResult::stub(1));
        cmps.insert(1, c1);
        cmps.insert(2, c2);
        cmps.insert(3, c3);
        accumulate(&mut cmps, 2, Decimal::ONE);
        let mut d = descriptor("KS");
        d.modifiers.plim = Decimal::new(50, 0);
        let ctx = TournamentContext {
            current_round: 2,
            ..ctx()
        };
        compute_koya(&mut cmps, &d, &ctx);
        let ks = cmps[&1].get(&d.state_key()).unwrap();
        assert!(matches!(ks.val, TbNum::Dec(_)));
    }

    #[test]
    fn pseudo_sno_is_the_competitor_id() {
        let mut cmps = HashMap::new();
        cmps.insert(7, Competitor::new(7, 1));
        let d = descriptor("SNO");
        compute_pseudo(&mut cmps, &d);
        assert_eq!(cmps[&7].get(&d.state_key()).unwrap().val, TbNum::Int(7));
    }

    #[test]
    fn direct_encounter_separates_cohort_by_head_to_head_score() {
        let mut cmps = HashMap::new();
        let mut c1 = Competitor::new(1, 1);
        c1.results.insert(1, played(1, 2, Decimal::ONE));
        c1.results.insert(2, played(2, 3, Decimal::ONE));
        c1.results.insert(3, RoundResult::stub(3));
        let mut c2 = Competitor::new(2, 1);
        c2.results.insert(1, played(1, 1, Decimal::ZERO));
        c2.results.insert(2, RoundResult::stub(2));
        c2.results.insert(3, played(3, 3, Decimal::new(5, 1)));
        let mut c3 = Competitor::new(3, 1);
        c3.results.insert(1, RoundResult::stub(1));
        c3.results.insert(2, played(2, 1, Decimal::ZERO));
        c3.results.insert(3, played(3, 2, Decimal::new(5, 1)));
        cmps.insert(1, c1);
        cmps.insert(2, c2);
        cmps.insert(3, c3);

        let d = descriptor("DE");
        let de_ctx = TournamentContext {
            is_round_robin: true,
            ..ctx()
        };
        compute_direct_encounter(&mut cmps, &d, &de_ctx, &[1, 2, 3]);

        let key = d.state_key();
        let rank1 = cmps[&1].get(&key).unwrap().val.as_decimal();
        let rank2 = cmps[&2].get(&key).unwrap().val.as_decimal();
        let rank3 = cmps[&3].get(&key).unwrap().val.as_decimal();
        assert!(rank1 < rank2, "undefeated player must out-rank the others");
        assert_eq!(rank2, rank3, "the two players who only drew each other stay tied");
    }

    #[test]
    fn top_board_result_separates_cohort_by_board_one_points() {
        let mut cmps = HashMap::new();
        let mut c1 = Competitor::new(1, 1);
        let mut r1 = RoundResult::stub(1);
        r1.games.push(GameRow {
            player: 1,
            opponent: 2,
            color: Color::White,
            board: 1,
            played: true,
            rated: true,
            vur: false,
            points: Decimal::ONE,
            rpoints: Decimal::ONE,
        });
        c1.results.insert(1, r1);
        let mut c2 = Competitor::new(2, 1);
        let mut r2 = RoundResult::stub(1);
        r2.games.push(GameRow {
            player: 2,
            opponent: 1,
            color: Color::Black,
            board: 1,
            played: true,
            rated: true,
            vur: false,
            points: Decimal::ZERO,
            rpoints: Decimal::ZERO,
        });
        c2.results.insert(1, r2);
        cmps.insert(1, c1);
        cmps.insert(2, c2);

        let d = descriptor("TBR");
        compute_top_bottom_board(&mut cmps, &d, &[1, 2]);

        let key = d.state_key();
        let rank1 = cmps[&1].get(&key).unwrap().val.as_decimal();
        let rank2 = cmps[&2].get(&key).unwrap().val.as_decimal();
        assert!(rank1 < rank2, "the board-one winner must out-rank the loser");
    }
}
