use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which score axis a criterion reads: a competitor's own points, the
/// match-level score, or the game-level score (team tournaments only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointType {
    Points,
    MPoints,
    GamePoints,
    MMPoints,
    MGPoints,
    GMPoints,
    GGPoints,
}

impl PointType {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "MP" => Some(PointType::MPoints),
            "GP" => Some(PointType::GamePoints),
            "MM" => Some(PointType::MMPoints),
            "MG" => Some(PointType::MGPoints),
            "GM" => Some(PointType::GMPoints),
            "GG" => Some(PointType::GGPoints),
            _ => None,
        }
    }
}

/// Every modifier token a tiebreak specifier can carry. Unset numeric
/// fields default to zero; unset booleans default to false.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub low: i32,
    pub high: i32,
    pub plim: Decimal,
    pub nlim: Decimal,
    pub unr: i32,
    pub urd: bool,
    pub p4f: bool,
    pub sws: bool,
    pub fmo: bool,
    pub rb5: bool,
    pub z4h: bool,
    pub vun: bool,
    pub reverse: Option<bool>,
}

impl Default for Modifiers {
    fn default() -> Self {
        Modifiers {
            low: 0,
            high: 0,
            plim: Decimal::new(50, 0),
            nlim: Decimal::ZERO,
            unr: 0,
            urd: false,
            p4f: false,
            sws: false,
            fmo: false,
            rb5: false,
            z4h: false,
            vun: false,
            reverse: None,
        }
    }
}

/// The decoded form of a textual tiebreak specifier, e.g. `BH@23:IP/C1-P4F`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiebreakDescriptor {
    pub order: i32,
    pub name: String,
    pub year: i32,
    pub point_type: PointType,
    pub modifiers: Modifiers,
}

impl TiebreakDescriptor {
    /// Namespaced key used to store this criterion's value under a
    /// competitor's state bag, so re-running the same criterion name with
    /// different modifiers never collides.
    pub fn state_key(&self) -> String {
        format!("{}#{}", self.name, self.order)
    }

    /// Human label, matching the family of names the engine recognises.
    pub fn display_name(&self) -> &'static str {
        display_name_for(&self.name)
    }
}

pub fn display_name_for(name: &str) -> &'static str {
    match name {
        "PTS" | "MPTS" | "GPTS" => "Points",
        "BH" => "Buchholz",
        "ABH" => "Buchholz (no cut, adjusted)",
        "FB" => "Fore-Buchholz",
        "AFB" => "Fore-Buchholz (adjusted)",
        "SB" => "Sonneborn-Berger",
        "ESB" => "Extended Sonneborn-Berger",
        "AOB" => "Average of opponents' Buchholz",
        "DE" => "Direct Encounter",
        "EDGE" => "Extended Direct Encounter",
        "KS" => "Koya System",
        "PS" => "Progressive Score",
        "ARO" => "Average Rating of Opponents",
        "APRO" => "Average Perfect Rating of Opponents",
        "TPR" => "Tournament Performance Rating",
        "PTP" => "Perfect Tournament Performance",
        "APPO" => "Average Perfect Performance of Opponents",
        "BC" => "Board Count",
        "TBR" => "Top Board Result",
        "BBE" => "Bottom Board Result",
        "SSSC" => "Score-Strength Combination",
        "ACC" => "Accelerated Score",
        "FLT" => "Float History",
        "TOP" => "Topscorer Flag",
        "RFP" => "Colour for Pairing",
        "SNO" => "Starting Number",
        "RANK" => "Rank",
        "RND" => "Random",
        "WIN" => "Wins (incl. byes)",
        "WON" => "Wins (games only)",
        "BPG" => "Games with Black",
        "BWG" => "Wins with Black",
        "GE" => "Games Elected to Play",
        "REP" => "Rounds Played",
        "VUR" => "Virtual Unplayed Rounds",
        "NUM" => "Number of Decisive Games",
        "COP" => "Colour Preference",
        "COD" => "Colour Difference",
        "CSQ" => "Colour Sequence",
        _ => "Unknown",
    }
}

/// Criteria whose sort direction is forced ascending regardless of the
/// competitor's own score scale.
pub fn forced_ascending(name: &str) -> bool {
    matches!(
        name,
        "SNO" | "RANK" | "RND" | "DE" | "EDGE" | "BC" | "TBR" | "BBE"
    )
}
