use crate::{
    analyzer,
    config::MatchConfiguration,
    error::{GymError, TournamentAborted},
    invoker::MatchInvoker,
    report::{Progress, ProgressSink, Summary},
    tally::{ParticipantId, WinTally},
};
use log::{debug, error, info};

/// Plays a fixed number of independent matches between the same bots and
/// counts who wins them.
pub struct Tournament<I, S> {
    invoker: I,
    sink: S,
}

impl<I, S> Tournament<I, S>
where
    I: MatchInvoker,
    S: ProgressSink,
{
    pub fn new(invoker: I, sink: S) -> Tournament<I, S> {
        Tournament { invoker, sink }
    }

    /// Runs every configured match in sequence. The first failing match ends
    /// the tournament; the wins recorded up to that point travel with the
    /// error.
    pub fn play(&mut self, config: &MatchConfiguration) -> Result<WinTally, TournamentAborted> {
        if let Err(source) = config.validate() {
            return Err(TournamentAborted {
                completed: 0,
                tally: WinTally::new(),
                source,
            });
        }

        info!(
            "Comparing {} bots over {} runs on a {}x{} map",
            config.participant_count(),
            config.iterations,
            config.width,
            config.height
        );

        let result = self.play_all(config);
        let summary = match &result {
            Ok(tally) => Summary::new(config, tally, None),
            Err(aborted) => {
                Summary::new(config, &aborted.tally, Some(aborted.source.to_string()))
            }
        };
        self.sink.finish(&summary);
        result
    }

    fn play_all(&mut self, config: &MatchConfiguration) -> Result<WinTally, TournamentAborted> {
        let mut tally = WinTally::new();
        for game in 1..=config.iterations {
            let winner = match self.play_match(config) {
                Ok(winner) => winner,
                Err(source) => {
                    error!("Run {game} failed: {source}");
                    return Err(TournamentAborted {
                        completed: game - 1,
                        tally,
                        source,
                    });
                }
            };
            debug!("Run {game} won by {winner}");
            tally.record_win(winner);
            self.sink.report(&Progress {
                games_played: game,
                stats: &tally,
            });
        }
        Ok(tally)
    }

    fn play_match(&mut self, config: &MatchConfiguration) -> Result<ParticipantId, GymError> {
        let raw = self.invoker.run_match(config)?;
        Ok(analyzer::determine_winner(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;

    /// Replays canned simulator results in order.
    #[derive(Default)]
    struct ScriptedInvoker {
        outputs: VecDeque<Result<String, GymError>>,
        calls: usize,
    }

    impl ScriptedInvoker {
        fn new(outputs: Vec<Result<String, GymError>>) -> ScriptedInvoker {
            ScriptedInvoker {
                outputs: outputs.into(),
                calls: 0,
            }
        }

        fn winners(winners: &[&str]) -> ScriptedInvoker {
            ScriptedInvoker::new(winners.iter().map(|w| Ok(payload(w))).collect())
        }
    }

    impl MatchInvoker for ScriptedInvoker {
        fn run_match(&mut self, _config: &MatchConfiguration) -> Result<String, GymError> {
            self.calls += 1;
            self.outputs
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected match {}", self.calls))
        }
    }

    #[derive(Default)]
    struct CapturingSink {
        reports: Vec<(u64, WinTally)>,
        summaries: Vec<Summary>,
    }

    impl ProgressSink for CapturingSink {
        fn report(&mut self, progress: &Progress<'_>) {
            self.reports
                .push((progress.games_played, progress.stats.clone()));
        }

        fn finish(&mut self, summary: &Summary) {
            self.summaries.push(summary.clone());
        }
    }

    fn payload(winner: &str) -> String {
        let mut stats = serde_json::Map::new();
        for id in ["A", "B", "C", "D"] {
            let rank = if id == winner { 1 } else { 2 };
            stats.insert(id.to_string(), json!({"rank": rank}));
        }
        stats.insert(winner.to_string(), json!({"rank": 1}));
        json!({"stats": stats}).to_string()
    }

    fn config(bots: usize, iterations: u64) -> MatchConfiguration {
        let mut config =
            MatchConfiguration::new("halite", (0..bots).map(|i| format!("./bot{i}")).collect());
        config.iterations = iterations;
        config
    }

    fn crash() -> GymError {
        GymError::ProcessExecution {
            command: "halite".to_string(),
            status: None,
            reason: "exited unsuccessfully".to_string(),
        }
    }

    fn expected(pairs: &[(&str, u64)]) -> WinTally {
        let mut tally = WinTally::new();
        for &(id, wins) in pairs {
            for _ in 0..wins {
                tally.record_win(id.into());
            }
        }
        tally
    }

    #[test]
    fn invalid_bot_count_launches_nothing() {
        for bots in [0, 1, 3, 5] {
            let mut tournament =
                Tournament::new(ScriptedInvoker::winners(&["A"]), CapturingSink::default());
            let err = tournament.play(&config(bots, 3)).unwrap_err();
            assert!(matches!(
                err.source,
                GymError::InvalidParticipantCount { count } if count == bots
            ));
            assert_eq!(err.completed, 0);
            assert!(err.tally.is_empty());
            assert_eq!(tournament.invoker.calls, 0);
            assert!(tournament.sink.reports.is_empty());
            assert!(tournament.sink.summaries.is_empty());
        }
    }

    #[test]
    fn zero_iterations_is_empty() {
        let mut tournament = Tournament::new(ScriptedInvoker::default(), CapturingSink::default());
        let tally = tournament.play(&config(2, 0)).unwrap();
        assert!(tally.is_empty());
        assert_eq!(tournament.invoker.calls, 0);
        assert!(tournament.sink.reports.is_empty());
        assert_eq!(tournament.sink.summaries[0].games_played, 0);
    }

    #[test]
    fn same_winner_three_times() {
        let mut tournament = Tournament::new(
            ScriptedInvoker::winners(&["A", "A", "A"]),
            CapturingSink::default(),
        );
        let tally = tournament.play(&config(2, 3)).unwrap();
        assert_eq!(tally, expected(&[("A", 3)]));

        let reports = &tournament.sink.reports;
        let played: Vec<u64> = reports.iter().map(|(n, _)| *n).collect();
        assert_eq!(played, [1, 2, 3]);
        assert_eq!(reports[0].1, expected(&[("A", 1)]));
        assert_eq!(reports[2].1, tally);
    }

    #[test]
    fn four_bots_split_wins() {
        let mut tournament =
            Tournament::new(ScriptedInvoker::winners(&["C", "B"]), CapturingSink::default());
        let tally = tournament.play(&config(4, 2)).unwrap();
        assert_eq!(tally, expected(&[("C", 1), ("B", 1)]));
        assert_eq!(tournament.invoker.calls, 2);
    }

    #[test]
    fn crash_keeps_earlier_wins() {
        let outputs = vec![
            Ok(payload("A")),
            Err(crash()),
            Ok(payload("B")),
            Ok(payload("B")),
            Ok(payload("B")),
        ];
        let mut tournament = Tournament::new(ScriptedInvoker::new(outputs), CapturingSink::default());
        let err = tournament.play(&config(2, 5)).unwrap_err();

        assert!(matches!(err.source, GymError::ProcessExecution { .. }));
        assert_eq!(err.completed, 1);
        assert_eq!(err.tally, expected(&[("A", 1)]));
        assert_eq!(tournament.invoker.calls, 2);
        assert_eq!(tournament.sink.reports.len(), 1);

        let summary = &tournament.sink.summaries[0];
        assert_eq!(summary.games_played, 1);
        assert!(summary.aborted.is_some());
    }

    #[test]
    fn malformed_result_aborts() {
        let outputs = vec![
            Ok(payload("B")),
            Ok(payload("A")),
            Ok(r#"{"stats": {"A": {"rank": 1}, "B": {"rank": 1}}}"#.to_string()),
        ];
        let mut tournament = Tournament::new(ScriptedInvoker::new(outputs), CapturingSink::default());
        let err = tournament.play(&config(2, 3)).unwrap_err();
        assert!(matches!(err.source, GymError::MalformedResult(_)));
        assert_eq!(err.completed, 2);
        assert_eq!(err.tally.games_played(), 2);
    }

    #[test]
    fn wins_always_sum_to_games_played() {
        let winners = ["A", "B", "B", "D", "C", "A", "A", "D"];
        let mut tournament =
            Tournament::new(ScriptedInvoker::winners(&winners), CapturingSink::default());
        let tally = tournament.play(&config(4, winners.len() as u64)).unwrap();
        assert_eq!(tally.games_played(), winners.len() as u64);
        for (played, stats) in &tournament.sink.reports {
            assert_eq!(stats.games_played(), *played);
        }
    }

    #[test]
    fn same_outputs_same_tally() {
        let winners = ["B", "A", "B", "B"];
        let run = || {
            let mut tournament =
                Tournament::new(ScriptedInvoker::winners(&winners), CapturingSink::default());
            tournament.play(&config(2, 4)).unwrap()
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(first, expected(&[("A", 1), ("B", 3)]));
    }
}
