//! Turns the captured report lines into the notification title and body.

use super::ReportLog;

/// Brand shown between the two title fragments.
const TITLE_BRAND: &str = "Cloud189";

/// Separator between report lines; two trailing spaces force a markdown
/// line break in channels that render markdown.
const LINE_SEPARATOR: &str = "  \n";

/// The finished report of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    lines: Vec<String>,
}

impl ReportDocument {
    /// Build the document by draining `log`, so nothing carries over into
    /// a later run sharing the same sink.
    pub fn assemble(log: &mut ReportLog) -> Self {
        Self { lines: log.drain() }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Notification body.
    pub fn body(&self) -> String {
        self.lines.join(LINE_SEPARATOR)
    }

    /// Short status title for the notification.
    pub fn title(&self) -> String {
        status_title(&self.body())
    }
}

/// Best-effort title built from fixed positions near the end of the body.
///
/// Depends on the trailing layout of the report: in a normal run the
/// 4th-from-last line is `account <masked name>:` (characters 17..19 are the
/// tail of a masked phone number) and the last line is a delta line whose
/// last 12 characters hold the family increase. Any other layout still
/// yields a title, just a less meaningful one.
pub fn status_title(body: &str) -> String {
    let lines: Vec<&str> = body.split('\n').collect();
    let count = lines.len();

    let nth = |index: Option<usize>| -> String {
        index
            .and_then(|i| lines.get(i))
            .map(|line| line.trim().to_string())
            .unwrap_or_default()
    };

    let account_line = nth(count.checked_sub(4));
    let last_line = nth(count.checked_sub(1));

    let head: String = account_line.chars().skip(17).take(2).collect();
    let tail_len = last_line.chars().count().saturating_sub(12);
    let tail: String = last_line.chars().skip(tail_len).collect();

    format!(" {}{}{}", head, TITLE_BRAND, tail)
}
