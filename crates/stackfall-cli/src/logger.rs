use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::Path,
    sync::Mutex,
};

use anyhow::Context as _;
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

/// Log backend that appends records to a file.
///
/// The terminal belongs to the TUI while playing, so nothing is written to stderr.
#[derive(Debug)]
struct FileLogger {
    level: LevelFilter,
    writer: Mutex<BufWriter<File>>,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        // A failed log write has nowhere to be reported.
        let _ = writeln!(
            writer,
            "{} {:<5} [{}] {}",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// Installs the file logger as the global `log` backend.
pub fn init(path: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;
    let logger = FileLogger {
        level,
        writer: Mutex::new(BufWriter::new(file)),
    };
    log::set_boxed_logger(Box::new(logger)).context("Failed to install logger")?;
    log::set_max_level(level);
    Ok(())
}
