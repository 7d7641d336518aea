//! Console renderer
//!
//! Verbose mode prints every record with level colours. Quiet mode prints
//! info/warn/error in full and folds trace records into a progress marker
//! printed once every `progress_every` traces. The marker is keyed on the
//! record's emission-time position, so a lagging console skips markers
//! rather than printing them at the wrong count.

use colored::*;
use lattice_core::domain::log::{LogLevel, LogRecord};
use std::io::Write;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::bus::LogBus;

pub struct ConsoleRenderer {
    verbose: bool,
    /// Marker period for quiet mode; zero or negative disables the marker
    progress_every: i64,
}

impl ConsoleRenderer {
    pub fn new(verbose: bool, progress_every: i64) -> Self {
        Self {
            verbose,
            progress_every,
        }
    }

    /// Renders one record, or returns `None` when nothing should be printed
    pub fn render(&self, record: &LogRecord) -> Option<String> {
        if self.verbose {
            return Some(format_record(record));
        }

        match record.level {
            LogLevel::Trace => {
                if self.progress_every <= 0 {
                    return None;
                }
                let every = self.progress_every as u64;
                record
                    .trace_seq
                    .filter(|seq| seq % every == 0)
                    .map(format_marker)
            }
            _ => Some(format_record(record)),
        }
    }
}

fn format_record(record: &LogRecord) -> String {
    let level = format!("{:<5}", record.level.to_string());
    let level = match record.level {
        LogLevel::Trace => level.dimmed(),
        LogLevel::Info => level.green(),
        LogLevel::Warn => level.yellow(),
        LogLevel::Error => level.red().bold(),
    };

    let mut line = format!(
        "{} {} {} {}",
        record
            .timestamp
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string()
            .dimmed(),
        level,
        format!("[{}]", record.source).cyan(),
        record.message
    );

    if let Some(data) = &record.data {
        line.push(' ');
        line.push_str(&data.to_string().dimmed().to_string());
    }

    line
}

fn format_marker(count: u64) -> String {
    format!("{:>12} trace records", count).dimmed().to_string()
}

/// Spawns the console subscriber on the bus, writing to stdout
///
/// The task ends when every sender of the bus has been dropped.
pub fn spawn_console(bus: &LogBus, renderer: ConsoleRenderer) -> JoinHandle<()> {
    spawn_sink(bus, renderer, std::io::stdout())
}

/// Spawns a rendering subscriber that writes lines to `out`
pub fn spawn_sink<W>(bus: &LogBus, renderer: ConsoleRenderer, mut out: W) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(record) => {
                    if let Some(line) = renderer.render(&record) {
                        let _ = writeln!(out, "{}", line);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Console sink lagged, skipped {} records", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        let _ = out.flush();
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// In-memory writer shared between a sink task and the test
    #[derive(Clone, Default)]
    pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub(crate) fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn record(level: LogLevel, message: &str) -> LogRecord {
        LogRecord::new(level, "test", message)
    }

    fn trace(seq: u64) -> LogRecord {
        let mut record = record(LogLevel::Trace, "sample");
        record.trace_seq = Some(seq);
        record
    }

    #[test]
    fn test_verbose_renders_traces() {
        let renderer = ConsoleRenderer::new(true, 1000);
        let line = renderer.render(&record(LogLevel::Trace, "sample 1")).unwrap();
        assert!(line.contains("sample 1"));
        assert!(line.contains("TRACE"));
    }

    #[test]
    fn test_quiet_renders_info_warn_error() {
        let renderer = ConsoleRenderer::new(false, 1000);
        for level in [LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            let line = renderer.render(&record(level, "visible")).unwrap();
            assert!(line.contains("visible"));
            assert!(line.contains("[test]"));
        }
    }

    #[test]
    fn test_quiet_folds_traces_into_marker() {
        let renderer = ConsoleRenderer::new(false, 3);

        assert!(renderer.render(&trace(1)).is_none());
        assert!(renderer.render(&trace(2)).is_none());
        let marker = renderer.render(&trace(3)).unwrap();
        assert!(marker.contains("3 trace records"));
        assert!(renderer.render(&trace(4)).is_none());
    }

    #[test]
    fn test_non_positive_period_disables_marker() {
        for every in [0, -5] {
            let renderer = ConsoleRenderer::new(false, every);
            for seq in 1..=10 {
                assert!(renderer.render(&trace(seq)).is_none());
            }
        }
    }

    #[test]
    fn test_unnumbered_trace_is_never_a_marker() {
        let renderer = ConsoleRenderer::new(false, 1);
        assert!(renderer.render(&record(LogLevel::Trace, "x")).is_none());
    }

    #[test]
    fn test_structured_data_is_rendered() {
        let renderer = ConsoleRenderer::new(false, 1000);
        let line = renderer
            .render(&record(LogLevel::Warn, "retrying").with_data(json!({ "attempt": 2 })))
            .unwrap();
        assert!(line.contains("\"attempt\":2"));
    }

    #[tokio::test]
    async fn test_sink_renders_markers_from_the_bus() {
        let bus = LogBus::new(64);
        let out = Captured::default();
        let sink = spawn_sink(&bus, ConsoleRenderer::new(false, 2), out.clone());

        let logger = bus.logger("model");
        logger.info("job started");
        for i in 0..5 {
            logger.trace(format!("sample {}", i));
        }
        drop(logger);
        drop(bus);
        sink.await.unwrap();

        let lines = out.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("job started"));
        assert!(lines[1].contains("2 trace records"));
        assert!(lines[2].contains("4 trace records"));
    }
}
