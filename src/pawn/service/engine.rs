//! Engine façade (component C10): wires the accumulator, parser,
//! algorithms, tie driver, and ranking assembler together for one
//! tournament evaluation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::pawn::common::error::PawnError;
use crate::pawn::domain::model::{AccValue, Competitor, TbNum, TournamentInput};
use crate::pawn::domain::tiebreak::TiebreakDescriptor;
use crate::pawn::service::algorithms::{self, TournamentContext};
use crate::pawn::service::{accumulator, competitor_builder, parser, ranking};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    pub check: bool,
    pub number_of_rounds: i32,
    pub tie_break: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInput {
    pub service: String,
    #[serde(flatten)]
    pub options: EngineOptions,
    pub tournament: TournamentInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorOutput {
    pub cid: i32,
    pub rank: i32,
    pub tiebreak_score: Vec<TbNum>,
    pub tiebreak_details: Vec<AccValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOutput {
    pub check: bool,
    pub tiebreaks: Vec<TiebreakDescriptor>,
    pub competitors: Vec<CompetitorOutput>,
}

pub struct TiebreakEngine {
    cmps: HashMap<i32, Competitor>,
    ctx: TournamentContext,
    is_round_robin: bool,
}

impl TiebreakEngine {
    #[instrument(skip(tournament))]
    pub fn new(tournament: &TournamentInput, current_round: i32) -> Result<Self, PawnError> {
        if tournament.competitors.is_empty() {
            return Err(PawnError::InvalidInput(
                "tournament has no competitors".to_string(),
            ));
        }
        let current_round = if current_round < 0 {
            tournament.num_rounds
        } else {
            current_round
        };

        let mut cmps = competitor_builder::build_competitors(tournament, current_round);
        let win_value = tournament.match_score_system.get('W');
        accumulator::accumulate(&mut cmps, current_round, win_value);

        let max_board = tournament
            .game_points_list
            .iter()
            .map(|g| g.board)
            .max()
            .unwrap_or(0);

        let ctx = TournamentContext {
            current_round,
            team_tournament: tournament.team_tournament,
            team_size: tournament.team_size.unwrap_or(1),
            max_board,
            is_round_robin: tournament.tournament_type.is_round_robin(),
            game_score_system: tournament.game_score_system.clone(),
            match_score_system: tournament.match_score_system.clone(),
        };

        Ok(TiebreakEngine {
            cmps,
            ctx,
            is_round_robin: tournament.tournament_type.is_round_robin(),
        })
    }

    #[instrument(skip(self, specs))]
    pub fn evaluate(&mut self, specs: &[String]) -> EngineOutput {
        let mut tracker = parser::PrimaryScoreTracker::default();
        let mut descriptors = Vec::new();

        let tournament_type = if self.is_round_robin {
            crate::pawn::domain::model::TournamentType::RoundRobin
        } else {
            crate::pawn::domain::model::TournamentType::Swiss
        };

        for (idx, spec) in specs.iter().enumerate() {
            let descriptor = parser::parse_tiebreak(spec, idx as i32 + 1, tournament_type, &mut tracker);
            if !is_known(&descriptor.name) {
                tracing::debug!(name = %descriptor.name, "skipping unknown tiebreak criterion");
                continue;
            }
            self.run_one(&descriptor);
            ranking::apply_criterion(&mut self.cmps, &descriptor);
            descriptors.push(descriptor);
        }

        let mut competitors: Vec<CompetitorOutput> = self
            .cmps
            .values()
            .map(|c| CompetitorOutput {
                cid: c.cid,
                rank: c.rank,
                tiebreak_score: c.tiebreak_score.clone(),
                tiebreak_details: c.tiebreak_details.clone(),
            })
            .collect();
        competitors.sort_by_key(|c| (c.rank, c.cid));

        EngineOutput {
            check: false,
            tiebreaks: descriptors,
            competitors,
        }
    }

    fn run_one(&mut self, descriptor: &TiebreakDescriptor) {
        match descriptor.name.as_str() {
            "PTS" | "MPTS" | "GPTS" => algorithms::compute_points(&mut self.cmps, descriptor),
            "SNO" | "RANK" | "RND" | "WIN" | "WON" | "BPG" | "BWG" | "GE" | "REP" | "VUR"
            | "NUM" | "COP" | "COD" | "CSQ" => algorithms::compute_pseudo(&mut self.cmps, descriptor),
            "PS" => algorithms::compute_progressive_score(&mut self.cmps, descriptor, &self.ctx),
            "KS" => algorithms::compute_koya(&mut self.cmps, descriptor, &self.ctx),
            "BH" | "ABH" | "FB" | "AFB" | "SB" | "ESB" | "AOB" => {
                algorithms::compute_buchholz_family(&mut self.cmps, descriptor, &self.ctx)
            }
            "DE" | "EDGE" => {
                for cohort in self.rank_cohorts() {
                    algorithms::compute_direct_encounter(&mut self.cmps, descriptor, &self.ctx, &cohort);
                }
            }
            "ARO" | "APRO" | "TPR" | "PTP" | "APPO" => {
                algorithms::compute_rating_performance(&mut self.cmps, descriptor, &self.ctx)
            }
            "BC" => algorithms::compute_board_count(&mut self.cmps, descriptor, &self.ctx),
            "TBR" | "BBE" => {
                for cohort in self.rank_cohorts() {
                    algorithms::compute_top_bottom_board(&mut self.cmps, descriptor, &cohort);
                }
            }
            "SSSC" => algorithms::compute_sssc(&mut self.cmps, descriptor, &self.ctx),
            "ACC" | "FLT" | "TOP" => algorithms::compute_acceleration(&mut self.cmps, descriptor, &self.ctx),
            "RFP" => algorithms::compute_rfp(&mut self.cmps, descriptor, &self.ctx),
            _ => {}
        }
    }

    /// Groups competitors currently sharing the same rank, the cohorts
    /// the cohort-dependent criteria (DE/EDGE/TBR/BBE) resolve.
    fn rank_cohorts(&self) -> Vec<Vec<i32>> {
        let mut by_rank: HashMap<i32, Vec<i32>> = HashMap::new();
        for c in self.cmps.values() {
            by_rank.entry(c.rank).or_default().push(c.cid);
        }
        by_rank
            .into_values()
            .filter(|v| v.len() > 1)
            .map(|mut v| {
                v.sort_unstable();
                v
            })
            .collect()
    }
}

fn is_known(name: &str) -> bool {
    matches!(
        name,
        "PTS" | "MPTS"
            | "GPTS"
            | "SNO"
            | "RANK"
            | "RND"
            | "WIN"
            | "WON"
            | "BPG"
            | "BWG"
            | "GE"
            | "REP"
            | "VUR"
            | "NUM"
            | "COP"
            | "COD"
            | "CSQ"
            | "PS"
            | "KS"
            | "BH"
            | "ABH"
            | "FB"
            | "AFB"
            | "SB"
            | "ESB"
            | "AOB"
            | "DE"
            | "EDGE"
            | "ARO"
            | "APRO"
            | "TPR"
            | "PTP"
            | "APPO"
            | "BC"
            | "TBR"
            | "BBE"
            | "SSSC"
            | "ACC"
            | "FLT"
            | "TOP"
            | "RFP"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pawn::domain::model::{Color, CompetitorInput, MatchResultRow, TournamentType};
    use crate::pawn::service::score_system::standard_score_system;

    fn two_player_tournament() -> TournamentInput {
        TournamentInput {
            team_tournament: false,
            team_size: None,
            num_rounds: 1,
            tournament_type: TournamentType::Swiss,
            acceleration: Vec::new(),
            game_score_system: standard_score_system("game"),
            match_score_system: standard_score_system("match"),
            competitors: vec![
                CompetitorInput {
                    cid: 1,
                    rank: Some(1),
                    rating: Some(2000),
                    present: Some(true),
                    random: None,
                },
                CompetitorInput {
                    cid: 2,
                    rank: Some(2),
                    rating: Some(2000),
                    present: Some(true),
                    random: None,
                },
            ],
            mpoints_list: vec![
                MatchResultRow {
                    round: 1,
                    cid: 1,
                    opponent: 2,
                    opp_rating: 2000,
                    color: Color::White,
                    result: 'D',
                    played: true,
                    rated: true,
                    board: 1,
                },
                MatchResultRow {
                    round: 1,
                    cid: 2,
                    opponent: 1,
                    opp_rating: 2000,
                    color: Color::Black,
                    result: 'D',
                    played: true,
                    rated: true,
                    board: 1,
                },
            ],
            game_points_list: Vec::new(),
        }
    }

    #[test]
    fn draw_leaves_both_players_tied_on_points() {
        let tournament = two_player_tournament();
        let mut engine = TiebreakEngine::new(&tournament, 1).unwrap();
        let output = engine.evaluate(&["PTS".to_string()]);
        assert_eq!(output.competitors[0].rank, output.competitors[1].rank);
    }

    #[test]
    fn unknown_criterion_is_skipped_not_fatal() {
        let tournament = two_player_tournament();
        let mut engine = TiebreakEngine::new(&tournament, 1).unwrap();
        let output = engine.evaluate(&["PTS".to_string(), "ZZZNOPE".to_string()]);
        assert_eq!(output.tiebreaks.len(), 1);
    }

    #[test]
    fn empty_tournament_is_rejected() {
        let mut tournament = two_player_tournament();
        tournament.competitors.clear();
        assert!(TiebreakEngine::new(&tournament, 1).is_err());
    }
}
