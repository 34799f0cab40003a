//! Conversion of a whole Polygon contest.
//!
//! The problems already converted at their current revision are skipped. The validation script of
//! every other problem is run, and if some of them fail the conversion continues only when the
//! [`Confirmation`] allows it. Only then are the packages written.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Error};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use walkdir::WalkDir;

use crate::polygon::ContestProblem;
use crate::{ConversionConfig, ConversionError, Converter, SourcePackage, TargetFormat};

/// Permissions of the shell scripts of the contest.
const SCRIPT_MODE: u32 = 0o744;
/// How often the validation script is checked for completion when it has a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The result of the validation of a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the validation succeeded.
    pub success: bool,
    /// The combined stdout and stderr of the validation.
    pub output: String,
}

/// Something able to validate a problem of a contest before converting it.
pub trait Validator {
    /// Validate the problem. An error counts as a failed validation.
    fn validate(&mut self, problem: &ContestProblem) -> Result<ValidationOutcome, Error>;
}

/// Something able to decide whether to continue after some validations failed.
pub trait Confirmation {
    /// Whether to continue even if the validation of the provided problems failed.
    fn confirm(&mut self, failed: &[String]) -> Result<bool, Error>;
}

/// Validates the problems by running a script inside their directory.
///
/// The script runs in its own process group: when it times out, and after it exits, every process
/// it left behind is killed.
#[derive(Debug, Clone)]
pub struct ScriptValidator {
    script: String,
    timeout: Option<Duration>,
    echo: bool,
}

impl ScriptValidator {
    /// Run `script` with an optional timeout.
    pub fn new<S: Into<String>>(script: S, timeout: Option<Duration>) -> ScriptValidator {
        ScriptValidator {
            script: script.into(),
            timeout,
            echo: false,
        }
    }

    /// Run the validation script of the configuration.
    pub fn from_config(config: &ConversionConfig) -> ScriptValidator {
        ScriptValidator::new(config.validation_script.clone(), config.validation_timeout)
    }

    /// Also write the output of the script to stdout while it runs.
    pub fn echo(mut self, echo: bool) -> ScriptValidator {
        self.echo = echo;
        self
    }
}

/// Append everything read from `source` to `log`, echoing it to stdout if asked.
fn forward_output<R: Read + Send + 'static>(
    mut source: R,
    log: Arc<Mutex<Vec<u8>>>,
    echo: bool,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buffer = [0; 4096];
        loop {
            let n = match source.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Failed to read the validation output: {}", e);
                    break;
                }
            };
            if echo {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(&buffer[..n]).and_then(|_| stdout.flush()) {
                    debug!("Failed to echo the validation output: {}", e);
                }
            }
            match log.lock() {
                Ok(mut log) => log.extend_from_slice(&buffer[..n]),
                Err(_) => break,
            }
        }
    })
}

/// Kill all the processes in the process group led by `child`.
fn kill_group(child: &Child) {
    let group = Pid::from_raw(child.id() as i32);
    match killpg(group, Signal::SIGKILL) {
        Ok(()) => debug!("Killed the processes of group {}", group),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill the processes of group {}: {}", group, e),
    }
}

impl Validator for ScriptValidator {
    fn validate(&mut self, problem: &ContestProblem) -> Result<ValidationOutcome, Error> {
        let script = problem.path.join(&self.script);
        if !script.is_file() {
            return Err(ConversionError::PathResolution {
                problem: problem.short_name.clone(),
                path: script,
            }
            .into());
        }
        info!("Running {}", script.display());
        let mut child = Command::new(&script)
            .current_dir(&problem.path)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {}", script.display()))?;

        // stdout and stderr end up in the same log, in the order they arrive
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut readers = vec![];
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_output(stdout, log.clone(), self.echo));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_output(stderr, log.clone(), self.echo));
        }

        let status = match self.timeout {
            None => Some(child.wait().context("Failed to wait the validation")?),
            Some(timeout) => {
                let start = Instant::now();
                loop {
                    if let Some(status) =
                        child.try_wait().context("Failed to wait the validation")?
                    {
                        break Some(status);
                    }
                    if start.elapsed() >= timeout {
                        warn!(
                            "Validation of {} timed out after {:?}, killing it",
                            problem.short_name, timeout
                        );
                        kill_group(&child);
                        child.wait().context("Failed to wait the validation")?;
                        break None;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };
        kill_group(&child);
        for reader in readers {
            reader
                .join()
                .map_err(|_| anyhow!("The reader of the validation output panicked"))?;
        }

        let output = match log.lock() {
            Ok(log) => String::from_utf8_lossy(&log).into_owned(),
            Err(_) => String::new(),
        };
        let success = status.map_or(false, |status| status.success());
        if !success {
            let reason = match status {
                Some(status) => status.to_string(),
                None => "timed out".to_string(),
            };
            warn!(
                "{}",
                ConversionError::ValidationFailure {
                    problem: problem.short_name.clone(),
                    reason,
                }
            );
        }
        Ok(ValidationOutcome { success, output })
    }
}

/// What happened while converting a contest.
#[derive(Debug, Default)]
pub struct ContestReport {
    /// The problems already converted at their current revision, with the existing package.
    pub skipped: Vec<(ContestProblem, PathBuf)>,
    /// The problems validated, with the outcome of the validation.
    pub validated: Vec<(ContestProblem, ValidationOutcome)>,
    /// The problems converted, with the produced package.
    pub converted: Vec<(ContestProblem, PathBuf)>,
}

impl ContestReport {
    /// The short names of the problems whose validation failed.
    pub fn failed_validations(&self) -> Vec<String> {
        self.validated
            .iter()
            .filter(|(_, outcome)| !outcome.success)
            .map(|(problem, _)| problem.short_name.clone())
            .collect()
    }
}

/// Mark all the shell scripts inside `dir` as executable.
pub fn mark_scripts_executable(dir: &Path) -> Result<(), Error> {
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        let is_script = entry.path().extension().map_or(false, |ext| ext == "sh");
        if entry.file_type().is_file() && is_script {
            debug!("Marking {} as executable", entry.path().display());
            std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(SCRIPT_MODE))
                .with_context(|| {
                    format!("Failed to set permissions of {}", entry.path().display())
                })?;
        }
    }
    Ok(())
}

/// Converts all the problems of a Polygon contest.
#[derive(Debug, Clone)]
pub struct ContestConverter {
    config: ConversionConfig,
}

impl ContestConverter {
    /// Make a new converter with the provided configuration.
    pub fn new(config: ConversionConfig) -> ContestConverter {
        ContestConverter { config }
    }

    /// Convert the contest at `contest`. The packages are written in the output directory of the
    /// configuration or, if not set, next to the contest package.
    pub fn convert(
        &self,
        contest: &Path,
        format: TargetFormat,
        validator: &mut dyn Validator,
        confirmation: &mut dyn Confirmation,
    ) -> Result<ContestReport, Error> {
        let package = SourcePackage::open(contest)?;
        let descriptor = package
            .contest()
            .with_context(|| format!("Failed to parse the contest at {}", contest.display()))?;
        mark_scripts_executable(package.root())?;

        let mut config = self.config.clone();
        if config.output_dir.is_none() {
            config.output_dir = Some(
                contest
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            );
        }
        let converter = Converter::new(config);

        let mut report = ContestReport::default();
        let mut pending = vec![];
        for problem in descriptor.problems {
            let planned = converter
                .output_path(&problem.path, format, Some(problem.index.as_str()))
                .with_context(|| format!("Failed to plan problem {}", problem.short_name))?;
            if planned.is_file() {
                info!(
                    "Package of {} already exists for this revision, skipping",
                    problem.short_name
                );
                report.skipped.push((problem, planned));
            } else {
                pending.push(problem);
            }
        }

        for problem in &pending {
            let outcome = match validator.validate(problem) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Cannot validate {}: {:?}", problem.short_name, e);
                    ValidationOutcome {
                        success: false,
                        output: format!("{:?}", e),
                    }
                }
            };
            report.validated.push((problem.clone(), outcome));
        }

        let failed = report.failed_validations();
        if !failed.is_empty() && !confirmation.confirm(&failed)? {
            return Err(ConversionError::Aborted { failed }.into());
        }

        for problem in pending {
            let output = converter
                .convert(&problem.path, format, Some(problem.index.as_str()), None)
                .with_context(|| format!("Failed to convert problem {}", problem.short_name))?;
            report.converted.push((problem, output));
        }
        Ok(report)
    }
}
