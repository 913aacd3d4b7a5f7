//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start one logger per process, writing to rotating files or to stderr.
//! - Announce the records store on startup: crate version, schema version
//!   and log target.
//! - Record panics as one sanitized line before the previous hook runs.
//!
//! # Invariants
//! - Events carry ids, codes of failure and counts; pet and owner names
//!   never reach the log.
//! - Repeating initialization with the same level and target is a no-op.
//! - A second initialization with other settings fails with
//!   `LoggingError::AlreadyActive` and leaves the running logger untouched.

use crate::db::latest_version;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "mascotas";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Rotating files under this absolute directory.
    Directory(PathBuf),
    Stderr,
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    Level(String),
    #[error("log directory must be a non-empty absolute path, got `{0}`")]
    Directory(String),
    #[error("cannot create log directory `{}`: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot start logger: {0}")]
    Start(#[from] FlexiLoggerError),
    #[error("logging already active with level `{level}` at `{target}`")]
    AlreadyActive { level: LevelFilter, target: LogTarget },
}

struct ActiveLogger {
    level: LevelFilter,
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Starts rotating file logs under `log_dir`.
///
/// # Errors
/// - `LoggingError::Level` / `LoggingError::Directory` for bad arguments.
/// - `LoggingError::CreateDirectory` / `LoggingError::Start` when the logger
///   cannot be brought up.
/// - `LoggingError::AlreadyActive` when another configuration is running.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let dir = parse_log_dir(log_dir)?;
    activate(level, LogTarget::Directory(dir))
}

/// Starts logging to stderr, for command-line runs without a log dir.
pub fn init_stderr_logging(level: &str) -> Result<(), LoggingError> {
    activate(parse_level(level)?, LogTarget::Stderr)
}

/// Level and target of the running logger, if any.
pub fn logging_status() -> Option<(LevelFilter, LogTarget)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.target.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn activate(level: LevelFilter, target: LogTarget) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| start(level, target.clone()))?;
    if active.level == level && active.target == target {
        Ok(())
    } else {
        Err(LoggingError::AlreadyActive {
            level: active.level,
            target: active.target.clone(),
        })
    }
}

fn start(level: LevelFilter, target: LogTarget) -> Result<ActiveLogger, LoggingError> {
    let logger = Logger::with(LogSpecification::builder().default(level).build());
    let logger = match &target {
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEPT_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
    };
    let handle = logger.start()?;

    PANIC_HOOK.get_or_init(install_panic_hook);

    info!(
        "event=app_start module=core status=ok app=mascotas version={} schema_version={} level={} target={}",
        env!("CARGO_PKG_VERSION"),
        latest_version(),
        level,
        target
    );

    Ok(ActiveLogger {
        level,
        target,
        _handle: handle,
    })
}

fn parse_level(raw: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "warning" => Ok(LevelFilter::Warn),
        "off" => Err(LoggingError::Level(trimmed.to_string())),
        other => other
            .parse()
            .map_err(|_| LoggingError::Level(trimmed.to_string())),
    }
}

fn parse_log_dir(raw: &str) -> Result<PathBuf, LoggingError> {
    let path = Path::new(raw.trim());
    if path.as_os_str().is_empty() || !path.is_absolute() {
        return Err(LoggingError::Directory(raw.to_string()));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            panic_summary(info.payload())
        );
        previous(info);
    }));
}

/// One-line, bounded rendering of a panic payload; payloads may echo user
/// input.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    single_line(text, PANIC_SUMMARY_CHARS)
}

fn single_line(text: &str, max_chars: usize) -> String {
    let mut line: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(max_chars)
        .collect();
    if text.chars().count() > max_chars {
        line.push_str("...");
    }
    line
}
