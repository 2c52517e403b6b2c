use crate::config::{DEFAULT_ITERATIONS, DEFAULT_MAP_SIZE, MatchConfiguration};
use clap::{ArgAction, Parser};
use std::{path::PathBuf, time::Duration};

/// Play many matches between bots and tally who wins.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "botgym", version)]
pub struct CliOptions {
    /// The command to run a specific bot. Pass either 2 or 4 of these.
    #[arg(short = 'r', long = "run-command", action = ArgAction::Append, required = true)]
    pub run_commands: Vec<String>,

    /// The game executable used to run the matches.
    #[arg(short = 'b', long = "binary")]
    pub binary: PathBuf,

    /// The map width the matches will run on.
    #[arg(short = 'W', long, default_value_t = DEFAULT_MAP_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// The map height the matches will run on.
    #[arg(short = 'H', long, default_value_t = DEFAULT_MAP_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Number of matches to run.
    #[arg(short = 'i', long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u64,

    /// Extra flag handed to the game executable before the bot commands.
    #[arg(short = 'f', long = "flag", action = ArgAction::Append, allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// Kill a match that runs longer than this many seconds.
    #[arg(short = 't', long = "timeout", value_parser = parse_timeout)]
    pub timeout: Option<f64>,

    /// Print progress as JSON lines on stdout.
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}

impl CliOptions {
    pub fn match_configuration(&self) -> MatchConfiguration {
        MatchConfiguration {
            width: self.width,
            height: self.height,
            flags: self.flags.clone(),
            iterations: self.iterations,
            timeout: self
                .timeout
                .filter(|t| *t > 0.0)
                .and_then(|t| Duration::try_from_secs_f64(t).ok()),
            ..MatchConfiguration::new(self.binary.clone(), self.run_commands.clone())
        }
    }
}

/// Seconds as a float. Zero or less means no limit, but the value must fit
/// in a `Duration`.
fn parse_timeout(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if secs.is_nan() {
        return Err("timeout must be a number".to_string());
    }
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).map_err(|e| format!("{e}"))?;
    }
    Ok(secs)
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}
