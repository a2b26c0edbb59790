//! Before/after capacity reporting.
//!
//! Two passes over the session records: a megabyte-scale change summary
//! for non-primary accounts, then full gigabyte-scale detail for the
//! primary ones.

use super::ReportLog;
use crate::models::{fixed, CapacitySnapshot};
use crate::runner::SessionRecord;

/// Delta line shared by both passes.
pub fn delta_line(before: &CapacitySnapshot, after: &CapacitySnapshot) -> String {
    let (personal, family) = after.delta_mb(before);
    format!(
        "personal total increase: {}M, family total increase: {}M",
        fixed(personal, 2),
        fixed(family, 2)
    )
}

/// Totals line in gigabytes, prefixed with `label`.
fn totals_line(label: &str, snapshot: &CapacitySnapshot) -> String {
    format!(
        "{} personal: {}G, family: {}G",
        label,
        fixed(snapshot.personal_gb(), 3),
        fixed(snapshot.family_gb(), 3)
    )
}

/// Produces the capacity sections of the report.
pub struct DeltaReporter {
    account_person: usize,
}

impl DeltaReporter {
    pub fn new(account_person: usize) -> Self {
        Self { account_person }
    }

    /// Run both passes.
    pub async fn report(&self, records: &[SessionRecord], log: &mut ReportLog) {
        self.non_primary_changes(records, log).await;
        self.primary_details(records, log).await;
    }

    /// Pass A: accounts past the primary ones, logged only when their
    /// family total changed.
    pub async fn non_primary_changes(&self, records: &[SessionRecord], log: &mut ReportLog) {
        for record in records.iter().skip(self.account_person) {
            let masked = record.account.masked_name();
            let after = match record.session.size_info().await {
                Ok(after) => after,
                Err(e) => {
                    log.error(format!("account {} capacity query failed: {}", masked, e));
                    continue;
                }
            };

            if after.family_total_bytes != record.before.family_total_bytes {
                log.line(format!("non-primary account {} capacity change:", masked));
                log.line(delta_line(&record.before, &after));
            }
        }
        log.blank();
    }

    /// Pass B: the first `account_person` records with before/after totals.
    pub async fn primary_details(&self, records: &[SessionRecord], log: &mut ReportLog) {
        for record in records.iter().take(self.account_person) {
            let masked = record.account.masked_name();
            let after = match record.session.size_info().await {
                Ok(after) => after,
                Err(e) => {
                    log.error(format!("account {} capacity query failed: {}", masked, e));
                    continue;
                }
            };

            log.line(format!("account {}:", masked));
            log.line(totals_line("before", &record.before));
            log.line(totals_line("after", &after));
            log.line(delta_line(&record.before, &after));
        }
    }
}
