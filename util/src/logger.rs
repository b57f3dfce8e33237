//! Logging setup shared by the wand executables.
//!
//! Every record carries the number of seconds since the session epoch, so that
//! log lines can be lined up against the saved run summary.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Failures while installing the global logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Refusing to log below `INFO`, `{0}` was requested")]
    LevelTooLow(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("A global logger is already installed: {0}")]
    AlreadyInstalled(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the global logger for this process.
///
/// Everything at or above `min_level` goes to the session's log file. Only
/// `DEBUG` and more severe records reach stdout, per-cycle `TRACE` output of
/// the control loop stays in the file.
///
/// Must be called once, after the session has been created.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::LevelTooLow(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFile)?;

    let terminal = fern::Dispatch::new()
        .filter(|meta| meta.level() <= Level::Debug)
        .chain(std::io::stdout());

    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("{}{}", prefix(record), message)))
        .level(min_level)
        .chain(terminal)
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    info!("Logger ready at level {:?}", min_level);
    if let Some(epoch) = session::get_epoch() {
        info!("    epoch: {}", epoch);
    }
    info!("    file: {}", session.log_file_path.display());

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Line prefix of a record. Verbose levels also name the emitting module.
fn prefix(record: &Record) -> String {
    let stamp = format!(
        "[{:10.6} {}] ",
        session::get_elapsed_seconds(),
        level_tag(record.level())
    );

    match record.level() {
        Level::Debug | Level::Trace => format!("{}{}: ", stamp, record.target()),
        _ => stamp,
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERR".red().bold(),
        Level::Warn => "WRN".yellow(),
        Level::Info => "INF".normal(),
        Level::Debug => "DBG".dimmed(),
        Level::Trace => "TRC".dimmed().italic(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
