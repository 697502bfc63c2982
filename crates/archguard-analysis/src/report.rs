//! Report output.
//!
//! Each file's report is built in a private [`FileReport`] and written to the
//! shared sink in one piece, so lines from concurrent files never interleave.

use std::fmt::{self, Write as _};
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

/// How a file left the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    /// Context, retrieval, and judging ran to completion.
    Analyzed,
    /// Unreadable, or skipped by the CI warn-open policy.
    Skipped,
    /// Stopped by cancellation.
    Cancelled,
}

/// Report text and tallies for one file.
#[derive(Debug)]
pub struct FileReport {
    debug: bool,
    text: String,
    violations: usize,
    outcome: FileOutcome,
}

impl FileReport {
    /// Empty report; `debug` enables [`FileReport::debug`] lines.
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            text: String::new(),
            violations: 0,
            outcome: FileOutcome::Analyzed,
        }
    }

    /// Append a line.
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.text.write_fmt(args);
        self.text.push('\n');
    }

    /// Append a line in debug mode only.
    pub fn debug(&mut self, args: fmt::Arguments<'_>) {
        if self.debug {
            self.line(args);
        }
    }

    /// Count one violation.
    pub fn add_violation(&mut self) {
        self.violations += 1;
    }

    /// Finish with the given outcome.
    #[must_use]
    pub fn finish(mut self, outcome: FileOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Accumulated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Violations counted so far.
    pub fn violations(&self) -> usize {
        self.violations
    }

    /// Final outcome.
    pub fn outcome(&self) -> FileOutcome {
        self.outcome
    }
}

/// In-memory report sink whose clones share one buffer.
#[derive(Clone, Debug, Default)]
pub struct ReportBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl ReportBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }
}

impl io::Write for ReportBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn debug_lines_respect_flag() {
        let mut quiet = FileReport::new(false);
        quiet.debug(format_args!("hidden"));
        quiet.line(format_args!("shown {}", 1));
        assert_eq!(quiet.text(), "shown 1\n");

        let mut loud = FileReport::new(true);
        loud.debug(format_args!("visible"));
        assert_eq!(loud.text(), "visible\n");
    }

    #[test]
    fn finish_records_outcome_and_violations() {
        let mut report = FileReport::new(false);
        report.add_violation();
        report.add_violation();
        let report = report.finish(FileOutcome::Skipped);
        assert_eq!(report.violations(), 2);
        assert_eq!(report.outcome(), FileOutcome::Skipped);
    }

    #[test]
    fn buffer_clones_share_contents() {
        let buffer = ReportBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"hello\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(buffer.contents(), "hello\n");
    }
}
