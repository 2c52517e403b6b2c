use log::{error, info};
use std::process::ExitCode;

mod analyzer;
mod cli;
mod config;
mod error;
mod invoker;
mod report;
mod tally;
mod tournament;

use invoker::SimulatorInvoker;
use report::{JsonReporter, LogReporter, ProgressSink};
use tournament::Tournament;

fn main() -> ExitCode {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .map_err(|e| eprintln!("Failed to start logger: {e}"))
        .ok();

    let cli_options = cli::parse();
    info!("{:#?}", &cli_options);

    let config = cli_options.match_configuration();
    let sink: Box<dyn ProgressSink> = if cli_options.json {
        Box::new(JsonReporter::new(std::io::stdout()))
    } else {
        Box::new(LogReporter)
    };

    let mut tournament = Tournament::new(SimulatorInvoker, sink);
    match tournament.play(&config) {
        Ok(tally) if tally.is_empty() => {
            info!("No runs were played");
            ExitCode::SUCCESS
        }
        Ok(tally) => {
            info!("Final tally: {tally}");
            ExitCode::SUCCESS
        }
        Err(aborted) => {
            error!("{aborted}; tally at abort: {}", aborted.tally);
            ExitCode::FAILURE
        }
    }
}
