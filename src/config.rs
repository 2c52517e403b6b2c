use crate::error::GymError;
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_MAP_SIZE: u32 = 48;
pub const DEFAULT_ITERATIONS: u64 = 100;

/// Settings shared by every match of one tournament.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MatchConfiguration {
    pub binary: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bot_commands: Vec<String>,
    pub flags: Vec<String>,
    pub iterations: u64,
    pub timeout: Option<Duration>,
}

impl MatchConfiguration {
    pub fn new(binary: impl Into<PathBuf>, bot_commands: Vec<String>) -> MatchConfiguration {
        MatchConfiguration {
            binary: binary.into(),
            width: DEFAULT_MAP_SIZE,
            height: DEFAULT_MAP_SIZE,
            bot_commands,
            flags: Vec::new(),
            iterations: DEFAULT_ITERATIONS,
            timeout: None,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.bot_commands.len()
    }

    /// Matches are only defined for two or four participants.
    pub fn validate(&self) -> Result<(), GymError> {
        match self.participant_count() {
            2 | 4 => Ok(()),
            count => Err(GymError::InvalidParticipantCount { count }),
        }
    }

    pub fn bot_command(&self, position: usize) -> Option<&str> {
        self.bot_commands.get(position).map(String::as_str)
    }
}
