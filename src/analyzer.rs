use crate::{error::MalformedReason, tally::ParticipantId};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub const WINNING_RANK: f64 = 1.0;

/// Per-player entry in the simulator's `stats` map. Fields other than the
/// rank are ignored. The rank is read as a number so `1` and `1.0` both win.
#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
pub struct ParticipantStats {
    pub rank: f64,
}

/// Finds the single participant ranked first in a `--results-as-json` payload.
pub fn determine_winner(raw: &str) -> Result<ParticipantId, MalformedReason> {
    let mut payload: Value =
        serde_json::from_str(raw).map_err(|e| MalformedReason::InvalidJson(e.to_string()))?;

    let stats = match payload.get_mut("stats").map(Value::take) {
        None | Some(Value::Null) => return Err(MalformedReason::MissingStats),
        Some(stats) => stats,
    };
    let stats: HashMap<ParticipantId, ParticipantStats> =
        serde_json::from_value(stats).map_err(|e| MalformedReason::InvalidStats(e.to_string()))?;

    let mut winners: Vec<ParticipantId> = stats
        .into_iter()
        .filter(|(_, s)| s.rank == WINNING_RANK)
        .map(|(id, _)| id)
        .collect();
    winners.sort();

    match winners.len() {
        0 => Err(MalformedReason::NoWinner),
        1 => Ok(winners.remove(0)),
        _ => Err(MalformedReason::MultipleWinners(winners)),
    }
}
