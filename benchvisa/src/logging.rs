//! Per-session log output.
//!
//! Every [`Session`](crate::Session) owns a sink and a threshold. The default
//! sink forwards to the `log` facade.

use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};

use log::{Level, LevelFilter};

pub const LOG_TARGET: &str = "benchvisa";

pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, source: &str, message: &str);
}

/// Forwards records to whatever logger the process installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log(&self, level: Level, source: &str, message: &str) {
        log::log!(target: LOG_TARGET, level, "[{}] {}", source, message);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    pub source: String,
    pub message: String,
}

/// Keeps every record in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|x| x.level == level && x.message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, source: &str, message: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Record {
                level,
                source: source.to_string(),
                message: message.to_string(),
            });
    }
}

#[derive(Clone)]
pub(crate) struct Logger {
    sink: Arc<dyn LogSink>,
    pub(crate) threshold: LevelFilter,
    pub(crate) source: String,
}

impl Logger {
    pub(crate) fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            threshold: LevelFilter::Warn,
            source: String::new(),
        }
    }

    pub(crate) fn enabled(&self, level: Level) -> bool {
        level <= self.threshold
    }

    pub(crate) fn log<T: Display>(&self, level: Level, message: T) {
        if !self.enabled(level) {
            return;
        }
        let source = if self.source.is_empty() {
            LOG_TARGET
        } else {
            &self.source
        };
        self.sink.log(level, source, &message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_filters_records() {
        let sink = MemorySink::new();
        let mut logger = Logger::new(Arc::new(sink.clone()));
        logger.log(Level::Info, "dropped");
        logger.log(Level::Error, "kept");
        logger.threshold = LevelFilter::Debug;
        logger.source = "GPIB0::5::INSTR".to_string();
        logger.log(Level::Info, "now kept");

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, LOG_TARGET);
        assert_eq!(records[1].source, "GPIB0::5::INSTR");
        assert!(sink.contains(Level::Info, "now kept"));
    }

    #[test]
    fn off_silences_everything() {
        let sink = MemorySink::new();
        let mut logger = Logger::new(Arc::new(sink.clone()));
        logger.threshold = LevelFilter::Off;
        logger.log(Level::Error, "nope");
        assert!(sink.records().is_empty());
    }
}
