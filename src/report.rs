use crate::{
    config::MatchConfiguration,
    tally::{ParticipantId, WinTally},
};
use log::{info, warn};
use serde::Serialize;
use std::{fmt, io::Write};

/// State of the tally after a completed match.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Progress<'a> {
    pub games_played: u64,
    pub stats: &'a WinTally,
}

impl Progress<'_> {
    pub fn message(&self) -> String {
        format!("Finished {} runs.", self.games_played)
    }
}

/// Receives a progress report after every match. Reports are observational
/// only; a sink cannot influence the tournament.
pub trait ProgressSink {
    fn report(&mut self, progress: &Progress<'_>);

    fn finish(&mut self, _summary: &Summary) {}
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn report(&mut self, progress: &Progress<'_>) {
        (**self).report(progress)
    }

    fn finish(&mut self, summary: &Summary) {
        (**self).finish(summary)
    }
}

/// Writes progress through the `log` facade.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressSink for LogReporter {
    fn report(&mut self, progress: &Progress<'_>) {
        info!("{}", progress.message());
        info!("Win Ratio: {}", progress.stats);
    }

    fn finish(&mut self, summary: &Summary) {
        print!("{summary}");
    }
}

/// Writes one JSON object per line, for tools that consume the output.
pub struct JsonReporter<W: Write> {
    out: W,
}

#[derive(Serialize)]
struct JsonLine<'a, T: Serialize> {
    message: String,
    #[serde(flatten)]
    body: &'a T,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> JsonReporter<W> {
        JsonReporter { out }
    }

    fn emit<T: Serialize>(&mut self, message: String, body: &T) {
        let line = JsonLine { message, body };
        let written = serde_json::to_writer(&mut self.out, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(e) = written {
            warn!("Failed to write progress report: {e}");
        }
    }
}

impl<W: Write> ProgressSink for JsonReporter<W> {
    fn report(&mut self, progress: &Progress<'_>) {
        self.emit(progress.message(), progress);
    }

    fn finish(&mut self, summary: &Summary) {
        self.emit(summary.headline(), summary);
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SummaryRow {
    pub id: ParticipantId,
    pub command: Option<String>,
    pub wins: u64,
    pub ratio: f64,
}

/// Final standings of a tournament, complete or aborted.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Summary {
    pub games_played: u64,
    pub planned: u64,
    pub aborted: Option<String>,
    pub standings: Vec<SummaryRow>,
}

impl Summary {
    /// Every seat gets a row, even without wins, followed by any
    /// non-positional winners the simulator reported.
    pub fn new(config: &MatchConfiguration, tally: &WinTally, aborted: Option<String>) -> Summary {
        let mut ids: Vec<ParticipantId> = (0..config.participant_count())
            .map(|i| ParticipantId::from(i.to_string()))
            .collect();
        for (id, _) in tally.iter() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();

        let standings = ids
            .into_iter()
            .map(|id| SummaryRow {
                command: id
                    .position()
                    .and_then(|p| config.bot_command(p))
                    .map(str::to_string),
                wins: tally.wins(&id),
                ratio: tally.win_ratio(&id),
                id,
            })
            .collect();

        Summary {
            games_played: tally.games_played(),
            planned: config.iterations,
            aborted,
            standings,
        }
    }

    pub fn headline(&self) -> String {
        match &self.aborted {
            None => format!("Completed {} of {} runs.", self.games_played, self.planned),
            Some(reason) => format!(
                "Aborted after {} of {} runs: {reason}",
                self.games_played, self.planned
            ),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_len = self
            .standings
            .iter()
            .filter_map(|r| r.command.as_ref().map(String::len))
            .max()
            .unwrap_or(0)
            .max(25);

        writeln!(f, "{}", self.headline())?;
        writeln!(
            f,
            "{:>4} {:<name_len$} {:>10} {:>10}",
            "Id", "Command", "Wins", "Ratio"
        )?;
        for row in &self.standings {
            let command = row.command.as_deref().unwrap_or("?");
            writeln!(
                f,
                "{:>4} {command:<name_len$} {:>10} {:>9.1}%",
                row.id.as_str(),
                row.wins,
                row.ratio * 100.0
            )?;
        }
        Ok(())
    }
}
