use core::fmt::Write;
use log::LevelFilter;
use spin::{Mutex, Once};

/// A [`log`] backend writing formatted records to a console sink (usually the
/// boot UART).
pub struct Logger {
    sink: Mutex<&'static mut (dyn Write + Send)>,
    max_level: LevelFilter,
}

impl Logger {
    pub fn new(sink: &'static mut (dyn Write + Send), max_level: LevelFilter) -> Self {
        Self {
            sink: Mutex::new(sink),
            max_level,
        }
    }

    /// Installs the global logger.
    ///
    /// Only the first call installs a logger; later calls return an error.
    pub fn init(
        sink: &'static mut (dyn Write + Send),
        max_level: LevelFilter,
    ) -> Result<(), log::SetLoggerError> {
        static LOGGER: Once<Logger> = Once::new();

        let static_logger = LOGGER.call_once(|| Self::new(sink, max_level));

        log::set_logger(static_logger)?;
        log::set_max_level(static_logger.max_level);

        Ok(())
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            with_formatted_log_record(record, |args| {
                self.sink.lock().write_fmt(args).ok();
            });
        }
    }

    fn flush(&self) {}
}

fn with_formatted_log_record(record: &log::Record, func: impl FnOnce(core::fmt::Arguments)) {
    func(format_args!(
        "[{level}][{target}] {args}\n",
        level = record.level(),
        target = record.target(),
        args = record.args(),
    ));
}
