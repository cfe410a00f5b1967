//! Per-round statistics accumulator (component C4).
//!
//! Walks every competitor's round results once and derives the full set
//! of intermediate statistics the tiebreak algorithms read: points,
//! win/loss counts, colour sequence and balance, virtual-unplayed-round
//! bookkeeping, and team board-point totals.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::instrument;

use crate::pawn::domain::model::{AccValue, Color, Competitor, TbNum};

/// Runs the accumulator over every competitor, mutating their state bags
/// in place. Must run exactly once, before any tiebreak criterion.
#[instrument(skip(cmps))]
pub fn accumulate(cmps: &mut HashMap<i32, Competitor>, current_round: i32, win_value: Decimal) {
    let cids: Vec<i32> = cmps.keys().copied().collect();
    for cid in cids {
        accumulate_one(cmps, cid, current_round, win_value);
    }
}

fn accumulate_one(cmps: &mut HashMap<i32, Competitor>, cid: i32, current_round: i32, win_value: Decimal) {
    let rounds: Vec<(i32, crate::pawn::domain::model::RoundResult)> = {
        let competitor = &cmps[&cid];
        (1..=current_round)
            .map(|r| (r, competitor.results[&r].clone()))
            .collect()
    };

    let mut points = AccValue::default();
    let mut num = AccValue::default();
    let mut win = AccValue::default();
    let mut won = AccValue::default();
    let mut bpg = AccValue::default();
    let mut bwg = AccValue::default();
    let mut ge = AccValue::default();
    let mut vur = AccValue::default();
    let mut csq = String::new();
    let mut lg = Decimal::ZERO;

    let mut cum_points = Decimal::ZERO;
    let mut cum_num = 0i64;
    let mut cum_win = 0i64;
    let mut cum_won = 0i64;
    let mut cum_bpg = 0i64;
    let mut cum_bwg = 0i64;
    let mut cum_ge = 0i64;
    let mut cum_vur = 0i64;
    let mut cod = 0i64;
    let mut lo = 0i32;
    let mut lp = 0i32;
    let mut last_played_color: Option<Color> = None;

    for (round, rr) in &rounds {
        cum_points += rr.points_primary;
        points.rounds.insert(*round, TbNum::Dec(rr.points_primary));

        let has_real_opponent = rr.opponent != 0;
        let is_win = is_win_score(rr.points_primary, win_value);
        let forfeit_win = is_forfeit_win(rr, win_value);

        if rr.played {
            cum_ge += 1;
            lp = *round;
            if has_real_opponent {
                cum_num += 1;
            }
        } else if forfeit_win {
            cum_ge += 1;
        }
        ge.rounds.insert(*round, TbNum::Bool(rr.played || forfeit_win));

        if !rr.vur {
            lo = *round;
        }
        if is_win {
            cum_win += 1;
        }
        if is_win && has_real_opponent && rr.played {
            cum_won += 1;
        }
        if rr.vur {
            cum_vur += 1;
        }
        vur.rounds.insert(*round, TbNum::Bool(rr.vur));

        if rr.played && has_real_opponent {
            match rr.color {
                Color::White => {
                    cod += 1;
                    csq.push('W');
                }
                Color::Black => {
                    cod -= 1;
                    cum_bpg += 1;
                    csq.push('B');
                    if is_win {
                        cum_bwg += 1;
                    }
                }
                Color::None => csq.push('-'),
            }
            last_played_color = Some(rr.color);
        } else {
            csq.push('-');
        }

        if *round == current_round && has_real_opponent {
            lg = rr.points_primary;
        }
    }

    points.val = TbNum::Dec(cum_points);
    num.val = TbNum::Int(cum_num);
    win.val = TbNum::Int(cum_win);
    won.val = TbNum::Int(cum_won);
    bpg.val = TbNum::Int(cum_bpg);
    bwg.val = TbNum::Int(cum_bwg);
    ge.val = TbNum::Int(cum_ge);
    vur.val = TbNum::Int(cum_vur);

    let cop = compute_preferred_colour(cod, last_played_color);

    let competitor = cmps.get_mut(&cid).unwrap();
    competitor.set("points", points);
    competitor.set("num", num);
    competitor.set("win", win);
    competitor.set("won", won);
    competitor.set("bpg", bpg);
    competitor.set("bwg", bwg);
    competitor.set("ge", ge.clone());
    competitor.set("rep", ge);
    competitor.set("vur", vur);
    competitor.set("lo", AccValue::with_val(TbNum::Int(lo as i64)));
    competitor.set("lp", AccValue::with_val(TbNum::Int(lp as i64)));
    competitor.set("lg", AccValue::with_val(TbNum::Dec(lg)));
    competitor.set("cod", AccValue::with_val(TbNum::Int(cod)));
    competitor.set("cop", AccValue::with_val(TbNum::Text(cop)));
    competitor.set("csq", AccValue::with_val(TbNum::Text(csq)));
}

fn is_win_score(points: Decimal, win_value: Decimal) -> bool {
    win_value > Decimal::ZERO && points >= win_value
}

fn is_forfeit_win(rr: &crate::pawn::domain::model::RoundResult, win_value: Decimal) -> bool {
    !rr.played && rr.opponent == 0 && is_win_score(rr.points_primary, win_value)
}

/// `cop`: `+` prefers white next, `-` prefers black next, `2` means the
/// preferred colour is the same as the last one actually played (rare,
/// alternating imbalance), single-char coded to match the original's
/// compact representation.
fn compute_preferred_colour(cod: i64, last_color: Option<Color>) -> String {
    let preferred = match cod.cmp(&0) {
        std::cmp::Ordering::Less => Color::White,
        std::cmp::Ordering::Greater => Color::Black,
        std::cmp::Ordering::Equal => match last_color {
            Some(Color::White) => Color::Black,
            Some(Color::Black) => Color::White,
            _ => return "=".to_string(),
        },
    };
    if last_color == Some(preferred) {
        return "2".to_string();
    }
    match preferred {
        Color::White => "+".to_string(),
        Color::Black => "-".to_string(),
        Color::None => "=".to_string(),
    }
}
