use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::UnboundedSender;

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A human readable controller event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: u64,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: current_timestamp(),
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Mirrors the entry to the `log` facade.
    pub fn trace_to_log(&self) {
        match self.severity {
            Severity::Info | Severity::Success => log::info!("{}", self.message),
            Severity::Warning => log::warn!("{}", self.message),
            Severity::Error => log::error!("{}", self.message),
        }
    }
}

/// Bounded window over the most recent events, newest first.
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    pub fn recent(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Downstream consumer of controller events.
pub trait EventSink: Send {
    fn record(&mut self, entry: &LogEntry) -> Result<()>;
}

/// Appends every event to a CSV file, writing the header only for a new file.
pub struct CsvEventSink {
    path: PathBuf,
}

impl CsvEventSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl EventSink for CsvEventSink {
    fn record(&mut self, entry: &LogEntry) -> Result<()> {
        let file_exists = self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(!file_exists)
            .from_writer(file);
        wtr.serialize(entry)?;
        wtr.flush()?;
        Ok(())
    }
}

/// Hands events to another task, e.g. the AMQP publisher.
pub struct ChannelEventSink {
    sender: UnboundedSender<LogEntry>,
}

impl ChannelEventSink {
    pub fn new(sender: UnboundedSender<LogEntry>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelEventSink {
    fn record(&mut self, entry: &LogEntry) -> Result<()> {
        // A closed receiver just means nobody is publishing any more.
        if self.sender.send(entry.clone()).is_err() {
            log::debug!("event channel closed, dropping '{}'", entry.message);
        }
        Ok(())
    }
}

/// Reads back an event file written by `CsvEventSink`.
pub fn read_event_csv(path: impl AsRef<Path>) -> Result<Vec<LogEntry>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    for result in rdr.deserialize() {
        entries.push(result?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_newest_first_and_drops_oldest() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.push(LogEntry::info(format!("event {}", i)));
        }
        let recent: Vec<String> = log.recent().into_iter().map(|e| e.message).collect();
        assert_eq!(recent, vec!["event 4", "event 3", "event 2"]);
    }

    #[test]
    fn zero_capacity_window_stays_empty() {
        let mut log = EventLog::new(0);
        log.push(LogEntry::error("lost"));
        assert!(log.is_empty());
    }

    #[test]
    fn csv_sink_appends_with_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut sink = CsvEventSink::new(&path);

        sink.record(&LogEntry::success("North/South Axis Green for 16s")).unwrap();
        sink.record(&LogEntry::warning("EMERGENCY: Green for West")).unwrap();

        let entries = read_event_csv(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Success);
        assert_eq!(entries[1].message, "EMERGENCY: Green for West");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.matches("timestamp,message,severity").count(), 1);
    }

    #[test]
    fn channel_sink_forwards_and_tolerates_closed_receiver() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = ChannelEventSink::new(tx);
        sink.record(&LogEntry::info("System Start: North/South Green")).unwrap();
        assert_eq!(rx.try_recv().unwrap().message, "System Start: North/South Green");

        drop(rx);
        assert!(sink.record(&LogEntry::info("after close")).is_ok());
    }
}
