use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap, fmt};

/// Identity of a participant as reported by the simulator.
///
/// The simulator keys its `stats` by player id, which is the position of the
/// bot command on its command line. Numeric ids are therefore positional and
/// order numerically; anything else orders lexically after them.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn position(&self) -> Option<usize> {
        self.0.parse::<usize>().ok()
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> ParticipantId {
        ParticipantId(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> ParticipantId {
        ParticipantId(s)
    }
}

impl Ord for ParticipantId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.position(), other.position()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ParticipantId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wins per participant. Only grows, one win per completed match.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct WinTally {
    wins: BTreeMap<ParticipantId, u64>,
}

impl WinTally {
    pub fn new() -> WinTally {
        WinTally::default()
    }

    pub fn record_win(&mut self, winner: ParticipantId) {
        *self.wins.entry(winner).or_insert(0) += 1;
    }

    pub fn wins(&self, id: &ParticipantId) -> u64 {
        self.wins.get(id).copied().unwrap_or_default()
    }

    pub fn games_played(&self) -> u64 {
        self.wins.values().sum()
    }

    pub fn win_ratio(&self, id: &ParticipantId) -> f64 {
        match self.games_played() {
            0 => 0.0,
            games => self.wins(id) as f64 / games as f64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, u64)> {
        self.wins.iter().map(|(id, &w)| (id, w))
    }
}

impl fmt::Display for WinTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.iter().map(|(id, w)| format!("{id}: {w}")).join(", ")
        )
    }
}
