//! Tiebreak specifier grammar parser (component C5).
//!
//! Decodes `NAME[@YY][:PT](/MOD)*` into a [`TiebreakDescriptor`]. Modifier
//! tokens are a leading letter, optionally followed by a signed decimal.
//! Unknown tokens are ignored rather than rejected, matching the engine's
//! "skip, don't fail" error posture.

use rust_decimal::Decimal;
use tracing::trace;

use crate::pawn::domain::model::TournamentType;
use crate::pawn::domain::tiebreak::{Modifiers, PointType, TiebreakDescriptor};

/// Tracks the point-type a competitor's "primary" score is pinned to
/// once a `PTS`/`MPTS`/`GPTS` criterion first appears in the list, so
/// later criteria without an explicit point-type inherit it.
#[derive(Debug, Default)]
pub struct PrimaryScoreTracker {
    primary: Option<PointType>,
}

impl PrimaryScoreTracker {
    pub fn observe(&mut self, name: &str, explicit: Option<PointType>) -> PointType {
        if let Some(pt) = explicit {
            return pt;
        }
        let implied = match name {
            "MPTS" => Some(PointType::MPoints),
            "GPTS" => Some(PointType::GamePoints),
            _ => None,
        };
        if let Some(pt) = implied {
            self.primary = Some(pt);
            return pt;
        }
        self.primary.unwrap_or(PointType::Points)
    }
}

/// Parse one tiebreak specifier into a descriptor. `order` is the
/// criterion's 1-based position in the user's list (used for namespacing
/// state keys so repeated criteria never collide).
pub fn parse_tiebreak(
    spec: &str,
    order: i32,
    tournament_type: TournamentType,
    tracker: &mut PrimaryScoreTracker,
) -> TiebreakDescriptor {
    let upper = spec.to_uppercase();
    let mut rest = upper.as_str();

    let mut year = 24;
    let mut point_suffix: Option<&str> = None;
    let mut modifier_tokens: Vec<&str> = Vec::new();

    // Split off modifier tail first: separators `/`, `!`, `#` are
    // equivalent and may repeat.
    let mut head = rest;
    if let Some(idx) = rest.find(['/', '!', '#']) {
        head = &rest[..idx];
        let tail = &rest[idx..];
        for token in tail.split(['/', '!', '#']) {
            if !token.is_empty() {
                modifier_tokens.push(token);
            }
        }
    }
    rest = head;

    if let Some(idx) = rest.find('@') {
        let (name_part, year_part) = rest.split_at(idx);
        let year_part = &year_part[1..];
        rest = name_part;
        // A year suffix may itself carry a `:PT` point-type tag.
        if let Some(colon) = year_part.find(':') {
            if let Ok(y) = year_part[..colon].parse::<i32>() {
                year = y;
            }
            point_suffix = Some(&year_part[colon + 1..]);
        } else if let Ok(y) = year_part.parse::<i32>() {
            year = y;
        }
    }

    if point_suffix.is_none() {
        if let Some(idx) = rest.find(':') {
            point_suffix = Some(&rest[idx + 1..]);
            rest = &rest[..idx];
        }
    }

    let name = rest.to_string();
    let explicit_point_type = point_suffix.and_then(PointType::from_suffix);
    let point_type = tracker.observe(&name, explicit_point_type);

    let mut modifiers = Modifiers::default();
    for token in modifier_tokens {
        apply_modifier(&mut modifiers, token);
    }

    if tournament_type.is_round_robin() && !modifiers.sws {
        modifiers.p4f = true;
    }

    if crate::pawn::domain::tiebreak::forced_ascending(&name) {
        modifiers.reverse = Some(true);
    }

    TiebreakDescriptor {
        order,
        name,
        year,
        point_type,
        modifiers,
    }
}

fn apply_modifier(modifiers: &mut Modifiers, token: &str) {
    let mut chars = token.chars();
    let Some(tag) = chars.next() else { return };
    let remainder: String = chars.collect();

    match tag {
        'C' => {
            if let Ok(n) = remainder.parse::<i32>() {
                modifiers.low = n;
            }
        }
        'M' => {
            if let Ok(n) = remainder.parse::<i32>() {
                modifiers.low = n;
                modifiers.high = n;
            }
        }
        'L' => {
            if remainder.starts_with('+') || remainder.starts_with('-') {
                if let Ok(n) = remainder.parse::<Decimal>() {
                    let scale = if remainder.contains('.') {
                        Decimal::ONE
                    } else {
                        Decimal::new(5, 1)
                    };
                    modifiers.nlim = n * scale;
                }
            } else if let Ok(n) = remainder.parse::<Decimal>() {
                modifiers.plim = n;
            }
        }
        'K' => {
            if let Ok(n) = remainder.parse::<Decimal>() {
                modifiers.nlim = n;
            }
        }
        'U' => {
            if let Ok(n) = remainder.parse::<i32>() {
                modifiers.unr = n;
            } else {
                modifiers.unr = 0;
            }
        }
        'D' => modifiers.urd = true,
        'P' => modifiers.p4f = true,
        'F' => modifiers.fmo = true,
        'R' => modifiers.rb5 = true,
        'S' => modifiers.sws = true,
        'Z' => modifiers.z4h = true,
        'V' => modifiers.vun = true,
        _ => trace!(token, "ignoring unknown tiebreak modifier token"),
    }
}
