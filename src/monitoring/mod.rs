pub mod console;
pub mod event_log;

pub use event_log::{
    current_timestamp, ChannelEventSink, CsvEventSink, EventLog, EventSink, LogEntry, Severity,
};
