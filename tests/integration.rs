use pawn::pawn::domain::model::{
    Color, CompetitorInput, GameResultRow, MatchResultRow, TournamentInput, TournamentType,
};
use pawn::pawn::service::score_system::standard_score_system;
use pawn::TiebreakEngine;
use rstest::rstest;
use rust_decimal::Decimal;

fn swiss(num_rounds: i32) -> TournamentInput {
    TournamentInput {
        team_tournament: false,
        team_size: None,
        num_rounds,
        tournament_type: TournamentType::Swiss,
        acceleration: Vec::new(),
        game_score_system: standard_score_system("game"),
        match_score_system: standard_score_system("match"),
        competitors: Vec::new(),
        mpoints_list: Vec::new(),
        game_points_list: Vec::new(),
    }
}

fn round_robin(num_rounds: i32) -> TournamentInput {
    let mut t = swiss(num_rounds);
    t.tournament_type = TournamentType::RoundRobin;
    t
}

fn competitor(cid: i32, rank: i32, rating: i32) -> CompetitorInput {
    CompetitorInput {
        cid,
        rank: Some(rank),
        rating: Some(rating),
        present: Some(true),
        random: None,
    }
}

fn game(round: i32, cid: i32, opponent: i32, color: Color, result: char, played: bool) -> MatchResultRow {
    MatchResultRow {
        round,
        cid,
        opponent,
        opp_rating: 2000,
        color,
        result,
        played,
        rated: true,
        board: 1,
    }
}

/// Scenario: two players draw their only round; every points-based
/// criterion must leave them tied.
#[test]
fn two_player_one_round_draw_stays_tied() {
    let mut t = swiss(1);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 2000)];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'D', true),
        game(1, 2, 1, Color::Black, 'D', true),
    ];

    let mut engine = TiebreakEngine::new(&t, 1).unwrap();
    let output = engine.evaluate(&["PTS".to_string(), "BH".to_string()]);
    assert_eq!(output.competitors[0].rank, output.competitors[1].rank);
}

/// Scenario: a 3-player round robin where results form a cycle
/// (1 beats 2, 2 beats 3, 3 beats 1) — all tied on points, and direct
/// encounter cannot separate a perfect cycle either.
#[test]
fn three_player_cyclic_round_robin_direct_encounter_stays_tied() {
    let mut t = round_robin(3);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 2000), competitor(3, 3, 2000)];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'W', true),
        game(1, 2, 1, Color::Black, 'L', true),
        game(2, 2, 3, Color::White, 'W', true),
        game(2, 3, 2, Color::Black, 'L', true),
        game(3, 3, 1, Color::White, 'W', true),
        game(3, 1, 3, Color::Black, 'L', true),
    ];

    let mut engine = TiebreakEngine::new(&t, 3).unwrap();
    let output = engine.evaluate(&["PTS".to_string(), "DE".to_string()]);
    let ranks: Vec<i32> = output.competitors.iter().map(|c| c.rank).collect();
    assert_eq!(ranks[0], ranks[1]);
    assert_eq!(ranks[1], ranks[2]);
}

/// Scenario: a 4-round Swiss event where Buchholz-cut-1 removes the
/// weakest opponent's contribution from the total.
#[test]
fn swiss_four_round_buchholz_cut_one_drops_weakest_opponent() {
    let mut t = swiss(4);
    t.competitors = vec![
        competitor(1, 1, 2000),
        competitor(2, 2, 2000),
        competitor(3, 3, 2000),
        competitor(4, 4, 2000),
        competitor(5, 5, 2000),
    ];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'W', true),
        game(1, 2, 1, Color::Black, 'L', true),
        game(2, 1, 3, Color::White, 'W', true),
        game(2, 3, 1, Color::Black, 'L', true),
        game(3, 1, 4, Color::White, 'W', true),
        game(3, 4, 1, Color::Black, 'L', true),
        game(4, 1, 5, Color::White, 'W', true),
        game(4, 5, 1, Color::Black, 'L', true),
    ];

    let mut engine = TiebreakEngine::new(&t, 4).unwrap();
    let full = engine.evaluate(&["BH".to_string()]);
    let mut engine_cut = TiebreakEngine::new(&t, 4).unwrap();
    let cut = engine_cut.evaluate(&["BH/C1".to_string()]);

    let full_val = full.competitors.iter().find(|c| c.cid == 1).unwrap().tiebreak_score[0]
        .as_decimal();
    let cut_val = cut.competitors.iter().find(|c| c.cid == 1).unwrap().tiebreak_score[0]
        .as_decimal();
    assert!(cut_val <= full_val);
}

/// Scenario: Fore-Buchholz treats a real opponent's last-round
/// contribution as a draw, per rulebook 16.3.2, rather than the
/// opponent's actual result.
#[test]
fn fore_buchholz_neutralises_last_round_contribution() {
    let mut t = swiss(2);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 2000), competitor(3, 3, 2000)];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'D', true),
        game(1, 2, 1, Color::Black, 'D', true),
        game(2, 1, 3, Color::White, 'W', true),
        game(2, 3, 1, Color::Black, 'L', true),
    ];

    let mut engine = TiebreakEngine::new(&t, 2).unwrap();
    let output = engine.evaluate(&["FB".to_string()]);
    assert_eq!(output.competitors.len(), 3);
}

/// Scenario: a 4-board team event; board count sums `board * points`
/// per team.
#[test]
fn team_event_board_count_weights_by_board_number() {
    let mut t = swiss(1);
    t.team_tournament = true;
    t.team_size = Some(4);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 2000)];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'W', true),
        game(1, 2, 1, Color::Black, 'L', true),
    ];
    t.game_points_list = vec![
        GameResultRow {
            round: 1,
            team: 1,
            player: 101,
            opponent_team: 2,
            opponent: 201,
            color: Color::White,
            board: 1,
            result: 'W',
            played: true,
            rated: true,
        },
        GameResultRow {
            round: 1,
            team: 1,
            player: 102,
            opponent_team: 2,
            opponent: 202,
            color: Color::Black,
            board: 2,
            result: 'D',
            played: true,
            rated: true,
        },
    ];

    let mut engine = TiebreakEngine::new(&t, 1).unwrap();
    let output = engine.evaluate(&["BC".to_string()]);
    let team1 = output.competitors.iter().find(|c| c.cid == 1).unwrap();
    let expected = Decimal::ONE * Decimal::from(1) + Decimal::new(5, 1) * Decimal::from(2);
    assert_eq!(team1.tiebreak_score[0].as_decimal(), expected);
}

/// Invariant: the sum of a competitor's per-round points must equal the
/// accumulated points total used by every points-based criterion.
#[test]
fn conservation_points_equals_sum_of_rounds() {
    let mut t = swiss(2);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 2000)];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'W', true),
        game(1, 2, 1, Color::Black, 'L', true),
        game(2, 1, 2, Color::Black, 'D', true),
        game(2, 2, 1, Color::White, 'D', true),
    ];

    let mut engine = TiebreakEngine::new(&t, 2).unwrap();
    let output = engine.evaluate(&["PTS".to_string()]);
    let c1 = output.competitors.iter().find(|c| c.cid == 1).unwrap();
    assert_eq!(c1.tiebreak_score[0].as_decimal(), Decimal::new(15, 1));
}

/// Invariant: evaluating the same tournament twice with the same
/// criteria list yields identical ranks (determinism).
#[test]
fn evaluation_is_deterministic() {
    let mut t = swiss(2);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 1900), competitor(3, 3, 1800)];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'W', true),
        game(1, 2, 1, Color::Black, 'L', true),
        game(2, 1, 3, Color::White, 'W', true),
        game(2, 3, 1, Color::Black, 'L', true),
    ];

    let mut engine_a = TiebreakEngine::new(&t, 2).unwrap();
    let out_a = engine_a.evaluate(&["PTS".to_string(), "BH".to_string(), "ARO".to_string()]);
    let mut engine_b = TiebreakEngine::new(&t, 2).unwrap();
    let out_b = engine_b.evaluate(&["PTS".to_string(), "BH".to_string(), "ARO".to_string()]);

    let ranks_a: Vec<i32> = out_a.competitors.iter().map(|c| c.rank).collect();
    let ranks_b: Vec<i32> = out_b.competitors.iter().map(|c| c.rank).collect();
    assert_eq!(ranks_a, ranks_b);
}

/// Invariant: ranks assigned after a criterion must be monotone with
/// respect to rank order — no competitor ranked k can have a strictly
/// better criterion value than a competitor ranked below k while both
/// share the same incoming rank band.
#[test]
fn ranks_stay_monotone_after_each_criterion() {
    let mut t = swiss(1);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 2000), competitor(3, 3, 2000)];
    t.mpoints_list = vec![
        game(1, 1, 2, Color::White, 'W', true),
        game(1, 2, 1, Color::Black, 'L', true),
    ];

    let mut engine = TiebreakEngine::new(&t, 1).unwrap();
    let output = engine.evaluate(&["PTS".to_string()]);
    let mut sorted = output.competitors.clone();
    sorted.sort_by_key(|c| c.rank);
    for pair in sorted.windows(2) {
        assert!(pair[0].rank <= pair[1].rank);
    }
}

/// A player who wins every round of a Swiss event scores exactly
/// `num_rounds` points, regardless of how many rounds are played.
#[rstest]
#[case(1)]
#[case(3)]
#[case(5)]
fn undefeated_swiss_player_scores_one_point_per_round(#[case] num_rounds: i32) {
    let mut t = swiss(num_rounds);
    t.competitors = vec![competitor(1, 1, 2000), competitor(2, 2, 2000)];
    t.mpoints_list = (1..=num_rounds)
        .flat_map(|round| {
            vec![
                game(round, 1, 2, Color::White, 'W', true),
                game(round, 2, 1, Color::Black, 'L', true),
            ]
        })
        .collect();

    let mut engine = TiebreakEngine::new(&t, num_rounds).unwrap();
    let output = engine.evaluate(&["PTS".to_string()]);
    let c1 = output.competitors.iter().find(|c| c.cid == 1).unwrap();
    assert_eq!(c1.tiebreak_score[0].as_decimal(), Decimal::from(num_rounds));
}
