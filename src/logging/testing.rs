//! In-memory sink for asserting on lifecycle output in tests.

use std::sync::{Mutex, PoisonError};

use super::{Level, LogSink};

#[derive(Default)]
pub(crate) struct RecordingSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub(crate) fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn count(&self, level: Level) -> usize {
        self.lines().iter().filter(|(l, _)| *l == level).count()
    }

    pub(crate) fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, line)| *l == level && line.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn write(&self, level: Level, prefix: &str, message: &str) {
        let line = if prefix.is_empty() {
            message.to_string()
        } else {
            format!("{prefix}: {message}")
        };
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, line));
    }
}
