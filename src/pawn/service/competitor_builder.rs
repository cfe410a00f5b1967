//! Builds the per-competitor, per-round result map from a tournament's
//! flat result lists (component C3).

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::instrument;

use crate::pawn::domain::model::{
    Competitor, GameRow, MatchResultRow, RoundResult, TournamentInput,
};
use crate::pawn::service::rating;

/// Build the full competitor map: one entry per declared competitor, with
/// a `RoundResult` for every round `1..=current_round`, stubbing rounds
/// the result lists have no data for.
#[instrument(skip(tournament))]
pub fn build_competitors(
    tournament: &TournamentInput,
    current_round: i32,
) -> HashMap<i32, Competitor> {
    let mut cmps: HashMap<i32, Competitor> = HashMap::new();

    for (idx, c) in tournament.competitors.iter().enumerate() {
        let mut competitor = Competitor::new(c.cid, c.rank.unwrap_or(idx as i32 + 1));
        competitor.rank = c.rank.unwrap_or(idx as i32 + 1);
        competitor.rating = c.rating.unwrap_or(0);
        competitor.present = c.present.unwrap_or(true);
        competitor.random = c.random.unwrap_or(0);
        cmps.insert(c.cid, competitor);
    }

    if tournament.team_tournament {
        fill_team_rounds(tournament, &mut cmps, current_round);
    } else {
        fill_individual_rounds(tournament, &mut cmps, current_round);
    }

    for competitor in cmps.values_mut() {
        for round in 1..=current_round {
            competitor
                .results
                .entry(round)
                .or_insert_with(|| RoundResult::stub(round));
        }
    }

    cmps
}

fn fill_individual_rounds(
    tournament: &TournamentInput,
    cmps: &mut HashMap<i32, Competitor>,
    current_round: i32,
) {
    for row in &tournament.mpoints_list {
        if row.round > current_round {
            continue;
        }
        let points = tournament.game_score_system.get(row.result);
        let points_rating = crate::pawn::service::score_system::rating_score_system().get(row.result);
        let vur = !row.played;
        let own_rating = cmps.get(&row.cid).map(|c| c.rating).unwrap_or(0);
        let delta_r = played_against_real_opponent(row.played, row.opponent)
            .then(|| rating::delta_r(rating::expected_score(own_rating, row.opp_rating), points_rating));
        let rr = RoundResult {
            round: row.round,
            points_primary: points,
            points_rating,
            color: row.color,
            played: row.played,
            vur,
            rated: row.rated,
            opponent: row.opponent,
            opp_rating: row.opp_rating,
            board: row.board,
            delta_r,
            games: Vec::new(),
            game_points: Decimal::ZERO,
        };
        if let Some(competitor) = cmps.get_mut(&row.cid) {
            competitor.results.insert(row.round, rr);
        }
    }
}

fn played_against_real_opponent(played: bool, opponent: i32) -> bool {
    played && opponent != 0
}

fn fill_team_rounds(
    tournament: &TournamentInput,
    cmps: &mut HashMap<i32, Competitor>,
    current_round: i32,
) {
    // Pass 1: match-level (team vs team) results.
    fill_individual_rounds(tournament, cmps, current_round);

    // Pass 2: per-board game rows, grouped by (round, team), folded into
    // each team's RoundResult.games and game_points.
    let mut grouped: HashMap<(i32, i32), Vec<&crate::pawn::domain::model::GameResultRow>> =
        HashMap::new();
    for row in &tournament.game_points_list {
        if row.round > current_round {
            continue;
        }
        grouped.entry((row.round, row.team)).or_default().push(row);
    }

    for ((round, team), rows) in grouped {
        let Some(competitor) = cmps.get_mut(&team) else {
            continue;
        };
        let mut game_points = Decimal::ZERO;
        let mut games = Vec::new();
        for row in rows {
            let points = tournament.game_score_system.get(row.result);
            game_points += points;
            let rpoints = crate::pawn::service::score_system::rating_score_system().get(row.result);
            games.push(GameRow {
                player: row.player,
                opponent: row.opponent,
                color: row.color,
                board: row.board,
                played: row.played,
                rated: row.rated,
                vur: !row.played,
                points,
                rpoints,
            });
        }
        let entry = competitor
            .results
            .entry(round)
            .or_insert_with(|| RoundResult::stub(round));
        entry.games = games;
        entry.game_points = game_points;
    }
}

/// Convenience used by tests: builds one `RoundResult` directly from a
/// match row, reusing the same score lookup the builder itself performs.
pub fn round_result_from_row(
    row: &MatchResultRow,
    score: Decimal,
    rating_score: Decimal,
    own_rating: i32,
) -> RoundResult {
    let delta_r = played_against_real_opponent(row.played, row.opponent)
        .then(|| rating::delta_r(rating::expected_score(own_rating, row.opp_rating), rating_score));
    RoundResult {
        round: row.round,
        points_primary: score,
        points_rating: rating_score,
        color: row.color,
        played: row.played,
        vur: !row.played,
        rated: row.rated,
        opponent: row.opponent,
        opp_rating: row.opp_rating,
        board: row.board,
        delta_r,
        games: Vec::new(),
        game_points: Decimal::ZERO,
    }
}
