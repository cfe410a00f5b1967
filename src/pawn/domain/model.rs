use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Colour a game was played with, from the subject competitor's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
    None,
}

/// One game row inside a team match (subsidiary per-board detail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRow {
    pub player: i32,
    pub opponent: i32,
    pub color: Color,
    pub board: i32,
    pub played: bool,
    pub rated: bool,
    pub vur: bool,
    pub points: Decimal,
    pub rpoints: Decimal,
}

/// A single competitor's record for a single round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: i32,
    pub points_primary: Decimal,
    pub points_rating: Decimal,
    pub color: Color,
    pub played: bool,
    pub vur: bool,
    pub rated: bool,
    /// 0 means bye/unpaired.
    pub opponent: i32,
    pub opp_rating: i32,
    pub board: i32,
    pub delta_r: Option<Decimal>,
    pub games: Vec<GameRow>,
    pub game_points: Decimal,
}

impl RoundResult {
    /// A stub record for a round the competitor has no data for: counts as
    /// unplayed, not a real opponent, zero points.
    pub fn stub(round: i32) -> Self {
        RoundResult {
            round,
            points_primary: Decimal::ZERO,
            points_rating: Decimal::ZERO,
            color: Color::None,
            played: false,
            vur: true,
            rated: false,
            opponent: 0,
            opp_rating: 0,
            board: 0,
            delta_r: None,
            games: Vec::new(),
            game_points: Decimal::ZERO,
        }
    }
}

/// One named point system mapping outcome tags to decimal values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreSystem {
    pub name: String,
    pub values: HashMap<char, Decimal>,
}

impl ScoreSystem {
    pub fn get(&self, tag: char) -> Decimal {
        self.values.get(&tag).copied().unwrap_or(Decimal::ZERO)
    }
}

/// A single numeric/text/boolean value carried in a competitor's state bag.
///
/// Mirrors the heterogeneous statistic slots (decimal sums, colour
/// sequences, boolean flags) the accumulator produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TbNum {
    Dec(Decimal),
    Int(i64),
    Text(String),
    Bool(bool),
}

impl TbNum {
    pub fn as_decimal(&self) -> Decimal {
        match self {
            TbNum::Dec(d) => *d,
            TbNum::Int(i) => Decimal::from(*i),
            TbNum::Bool(b) => {
                if *b {
                    Decimal::ONE
                } else {
                    Decimal::ZERO
                }
            }
            TbNum::Text(_) => Decimal::ZERO,
        }
    }
}

impl Default for TbNum {
    fn default() -> Self {
        TbNum::Dec(Decimal::ZERO)
    }
}

/// A named statistic for a competitor: a comparable summary, a per-round
/// detail trace, and the list of rounds a cut modifier excluded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccValue {
    pub val: TbNum,
    pub rounds: HashMap<i32, TbNum>,
    pub cut: Vec<i32>,
}

impl AccValue {
    pub fn with_val(val: TbNum) -> Self {
        AccValue {
            val,
            rounds: HashMap::new(),
            cut: Vec::new(),
        }
    }
}

/// A single competitor, carrying per-round results and the accumulated
/// state bag that tiebreak algorithms read and write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub cid: i32,
    pub rank: i32,
    pub orgrank: i32,
    pub rating: i32,
    pub present: bool,
    pub random: i32,
    pub results: HashMap<i32, RoundResult>,
    pub state: HashMap<String, AccValue>,
    pub tiebreak_score: Vec<TbNum>,
    pub tiebreak_details: Vec<AccValue>,
}

impl Competitor {
    pub fn new(cid: i32, orgrank: i32) -> Self {
        Competitor {
            cid,
            rank: orgrank,
            orgrank,
            rating: 0,
            present: true,
            random: 0,
            results: HashMap::new(),
            state: HashMap::new(),
            tiebreak_score: Vec::new(),
            tiebreak_details: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AccValue> {
        self.state.get(key)
    }

    pub fn set(&mut self, key: &str, value: AccValue) {
        self.state.insert(key.to_string(), value);
    }
}

/// One acceleration entry: for a range of rounds and a range of
/// competitors (by seeding order), credit an extra virtual result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccelerationEntry {
    pub first_round: i32,
    pub last_round: i32,
    pub first_competitor: i32,
    pub last_competitor: i32,
    pub game_score: char,
}

/// Tournament type as declared by the upstream collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentType {
    Swiss,
    RoundRobin,
    Knockout,
    Unknown,
}

impl TournamentType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "d" | "rr" | "round-robin" => TournamentType::RoundRobin,
            "s" | "swiss" => TournamentType::Swiss,
            "p" | "knockout" => TournamentType::Knockout,
            _ => TournamentType::Unknown,
        }
    }

    pub fn is_round_robin(&self) -> bool {
        matches!(self, TournamentType::RoundRobin)
    }
}

/// The tournament structure the engine is constructed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentInput {
    pub team_tournament: bool,
    pub team_size: Option<i32>,
    pub num_rounds: i32,
    pub tournament_type: TournamentType,
    #[serde(default)]
    pub acceleration: Vec<AccelerationEntry>,
    pub game_score_system: ScoreSystem,
    pub match_score_system: ScoreSystem,
    pub competitors: Vec<CompetitorInput>,
    #[serde(default)]
    pub mpoints_list: Vec<MatchResultRow>,
    #[serde(default)]
    pub game_points_list: Vec<GameResultRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorInput {
    pub cid: i32,
    pub rank: Option<i32>,
    pub rating: Option<i32>,
    pub present: Option<bool>,
    pub random: Option<i32>,
}

/// One row of the individual (match-level) results list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResultRow {
    pub round: i32,
    pub cid: i32,
    pub opponent: i32,
    pub opp_rating: i32,
    pub color: Color,
    pub result: char,
    pub played: bool,
    pub rated: bool,
    pub board: i32,
}

/// One row of the team game-level results list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResultRow {
    pub round: i32,
    pub team: i32,
    pub player: i32,
    pub opponent_team: i32,
    pub opponent: i32,
    pub color: Color,
    pub board: i32,
    pub result: char,
    pub played: bool,
    pub rated: bool,
}
