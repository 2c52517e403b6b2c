use crate::tally::{ParticipantId, WinTally};
use itertools::Itertools;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum GymError {
    #[error("the number of bots specified must be either 2 or 4, got {count}")]
    InvalidParticipantCount { count: usize },

    #[error("simulator `{command}` failed: {reason} (exit status: {})", display_status(.status))]
    ProcessExecution {
        command: String,
        status: Option<ExitStatus>,
        reason: String,
    },

    #[error("malformed match result: {0}")]
    MalformedResult(#[from] MalformedReason),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("output is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("no `stats` field in result")]
    MissingStats,
    #[error("`stats` has an unexpected shape: {0}")]
    InvalidStats(String),
    #[error("no participant has rank 1")]
    NoWinner,
    #[error("several participants claim rank 1: {}", .0.iter().join(", "))]
    MultipleWinners(Vec<ParticipantId>),
}

/// A match failed part way through a tournament. The wins recorded before
/// the failure are kept.
#[derive(Debug, thiserror::Error)]
#[error("tournament aborted after {completed} completed matches: {source}")]
pub struct TournamentAborted {
    pub completed: u64,
    pub tally: WinTally,
    pub source: GymError,
}

fn display_status(status: &Option<ExitStatus>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "none".to_string(),
    }
}
