//! In-memory capture of report lines.

use tracing::{error, info};

/// Ordered sink for the lines that make up the run report.
///
/// Every line is also forwarded to `tracing`, so the console shows the
/// same narrative the notification carries.
#[derive(Debug, Default)]
pub struct ReportLog {
    lines: Vec<String>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational line.
    pub fn line(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.lines.push(message);
    }

    /// Record an error line.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.lines.push(message);
    }

    /// Record an empty separator line.
    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Take every captured line, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_emission_order() {
        let mut log = ReportLog::new();
        log.line("first");
        log.error("second");
        log.blank();
        log.line(String::from("third"));

        assert_eq!(log.lines(), ["first", "second", "", "third"]);
    }

    #[test]
    fn test_drain_clears_sink() {
        let mut log = ReportLog::new();
        log.line("only");

        assert_eq!(log.drain(), vec!["only".to_string()]);
        assert!(log.lines().is_empty());
        assert!(log.drain().is_empty());
    }
}
