use log::{LevelFilter, Log, Metadata, Record};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// `-v` raises warnings to info, `-vv` or `--debug` to debug.
    pub fn from_flags(verbose: u8, debug: bool) -> Self {
        match (debug, verbose) {
            (true, _) | (_, 2..) => LogLevel::Debug,
            (_, 1) => LogLevel::Info,
            _ => LogLevel::Warn,
        }
    }

    fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let label = record.level().as_str().to_ascii_lowercase();
            eprintln!("[{}] {}", label, record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the stderr logger. Calling it again only changes the level.
pub fn init(level: LogLevel) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level.filter());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_flags() {
        assert_eq!(LogLevel::from_flags(0, false), LogLevel::Warn);
        assert_eq!(LogLevel::from_flags(1, false), LogLevel::Info);
        assert_eq!(LogLevel::from_flags(2, false), LogLevel::Debug);
        assert_eq!(LogLevel::from_flags(5, false), LogLevel::Debug);
        assert_eq!(LogLevel::from_flags(0, true), LogLevel::Debug);
    }

    #[test]
    fn test_init_twice() {
        init(LogLevel::Info);
        assert_eq!(log::max_level(), LevelFilter::Info);
        init(LogLevel::Debug);
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }
}
