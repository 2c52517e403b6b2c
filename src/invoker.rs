use crate::{config::MatchConfiguration, error::GymError};
use chrono::Utc;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use itertools::Itertools;
use log::{debug, error, info, trace, warn};
use std::{
    io::{self, Read},
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::Duration,
};
use wait_timeout::ChildExt;

pub const RESULTS_AS_JSON: &str = "--results-as-json";

/// How long to wait for the output pipes to close once the simulator exits.
const DRAIN_GRACE: Duration = Duration::from_secs(10);

/// Runs one match and returns the simulator's standard output.
pub trait MatchInvoker {
    fn run_match(&mut self, config: &MatchConfiguration) -> Result<String, GymError>;
}

/// Arguments for one simulator run, bot commands last and in order.
pub fn build_args(config: &MatchConfiguration) -> Vec<String> {
    let mut args = vec![
        "--width".to_string(),
        config.width.to_string(),
        "--height".to_string(),
        config.height.to_string(),
        RESULTS_AS_JSON.to_string(),
    ];
    args.extend(config.flags.iter().cloned());
    args.extend(config.bot_commands.iter().cloned());
    args
}

fn render_command(binary: &Path, args: &[String]) -> String {
    std::iter::once(binary.display().to_string())
        .chain(args.iter().map(|a| {
            if a.contains(char::is_whitespace) {
                format!("{a:?}")
            } else {
                a.clone()
            }
        }))
        .join(" ")
}

/// Launches the real simulator executable.
#[derive(Debug, Default)]
pub struct SimulatorInvoker;

impl MatchInvoker for SimulatorInvoker {
    fn run_match(&mut self, config: &MatchConfiguration) -> Result<String, GymError> {
        let args = build_args(config);
        let command = render_command(&config.binary, &args);
        trace!("> {command}");

        let game_start = Utc::now();
        let process = SimulatorProcess::spawn(&config.binary, &args, command)?;
        let output = process.finish(config.timeout)?;
        let elapsed = Utc::now() - game_start;
        debug!(
            "Match started {} finished in {}.{:03}s",
            game_start.format("%H:%M:%S"),
            elapsed.num_seconds(),
            elapsed.num_milliseconds() % 1000
        );
        Ok(output)
    }
}

type Drained = Receiver<io::Result<Vec<u8>>>;

fn drain<R>(mut pipe: R) -> Drained
where
    R: Read + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf).map(|_| buf);
        // Nobody is listening if the process was abandoned.
        let _ = tx.send(result);
    });
    rx
}

/// A running simulator. Both pipes are drained on their own threads so the
/// child can never block on a full pipe, and the child is always reaped.
struct SimulatorProcess {
    child: Child,
    stdout: Drained,
    stderr: Drained,
    command: String,
    reaped: bool,
}

impl SimulatorProcess {
    fn spawn(binary: &Path, args: &[String], command: String) -> Result<SimulatorProcess, GymError> {
        let mut child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GymError::ProcessExecution {
                command: command.clone(),
                status: None,
                reason: format!("failed to launch: {e}"),
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(GymError::ProcessExecution {
                command,
                status: None,
                reason: "output pipes unavailable".to_string(),
            });
        };

        Ok(SimulatorProcess {
            child,
            stdout: drain(stdout),
            stderr: drain(stderr),
            command,
            reaped: false,
        })
    }

    fn fail(&self, status: Option<ExitStatus>, reason: impl Into<String>) -> GymError {
        GymError::ProcessExecution {
            command: self.command.clone(),
            status,
            reason: reason.into(),
        }
    }

    fn wait(&mut self, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
        let status = match timeout {
            Some(timeout) => self.child.wait_timeout(timeout)?,
            None => Some(self.child.wait()?),
        };
        self.reaped = status.is_some();
        Ok(status)
    }

    fn kill(&mut self) -> Option<ExitStatus> {
        if let Err(e) = self.child.kill() {
            error!("Failed to kill simulator: {e}");
        }
        let status = self.child.wait().ok();
        self.reaped = status.is_some();
        status
    }

    fn collect(&self, pipe: &Drained) -> Result<Vec<u8>, String> {
        match pipe.recv_timeout(DRAIN_GRACE) {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(format!("failed to read output: {e}")),
            Err(RecvTimeoutError::Timeout) => Err("output pipe left open".to_string()),
            Err(RecvTimeoutError::Disconnected) => Err("output reader vanished".to_string()),
        }
    }

    fn finish(mut self, timeout: Option<Duration>) -> Result<String, GymError> {
        let status = match self.wait(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let limit = timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
                warn!("Simulator exceeded {limit}s, killing it...");
                let status = self.kill();
                return Err(self.fail(status, format!("timed out after {limit}s")));
            }
            Err(e) => return Err(self.fail(None, format!("failed to wait: {e}"))),
        };

        let stderr = self.collect(&self.stderr).unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("simulator: {line}");
        }

        if !status.success() {
            let reason = match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                Some(last) => format!("exited unsuccessfully: {}", last.trim()),
                None => "exited unsuccessfully".to_string(),
            };
            return Err(self.fail(Some(status), reason));
        }

        let stdout = self
            .collect(&self.stdout)
            .map_err(|reason| self.fail(Some(status), reason))?;
        let stdout =
            String::from_utf8(stdout).map_err(|_| self.fail(Some(status), "output is not valid UTF-8"))?;
        if stdout.trim().is_empty() {
            return Err(self.fail(Some(status), "produced no output"));
        }
        Ok(stdout)
    }
}

impl Drop for SimulatorProcess {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => {
                info!("Simulator still running, attempting to kill...");
                match self.kill() {
                    Some(_) => info!("Simulator killed"),
                    None => info!("Failed to reap simulator, giving up"),
                }
            }
        }
    }
}
