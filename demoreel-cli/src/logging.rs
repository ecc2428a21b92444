use clap::ArgMatches;
use log::{LevelFilter, Log, Metadata, Record};
use std::sync::OnceLock;

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger.
///
/// `--quiet` keeps errors only, `--debug` forces debug output, otherwise the
/// level comes from `RUST_LOG` (default info).
pub fn init(args: &ArgMatches) {
    let args = innermost(args);
    let level = if args.get_flag("quiet") {
        LevelFilter::Error
    } else if args.get_flag("debug") {
        LevelFilter::Debug
    } else {
        env_level()
    };

    let logger = LOGGER.get_or_init(|| StderrLogger { level });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

/// Global flags are visible on the deepest matched subcommand.
fn innermost(args: &ArgMatches) -> &ArgMatches {
    let mut current = args;
    while let Some((_, sub)) = current.subcommand() {
        current = sub;
    }
    current
}

fn env_level() -> LevelFilter {
    match std::env::var("RUST_LOG") {
        Ok(level) => match level.to_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        },
        Err(_) => LevelFilter::Info,
    }
}
