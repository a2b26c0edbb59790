//! Account loop: login, before-snapshot, check-in tasks and pacing.

use super::tasks::TaskExecutor;
use crate::config::TaskConfig;
use crate::models::{Account, CapacitySnapshot, Role};
use crate::report::ReportLog;
use crate::session::{AccountSession, Connector, SessionError};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A logged-in account together with its capacity before check-in.
pub struct SessionRecord {
    pub account: Account,
    pub session: Arc<dyn AccountSession>,
    pub before: CapacitySnapshot,
}

/// Result of the account loop.
pub struct OrchestrationOutcome {
    /// Records of every account that logged in, in processing order.
    pub records: Vec<SessionRecord>,
    /// Timeout that stopped the loop early, if any.
    pub aborted: Option<SessionError>,
}

/// Drives the check-in tasks over the configured account list.
pub struct AccountOrchestrator<'a> {
    connector: &'a dyn Connector,
    executor: TaskExecutor,
    config: TaskConfig,
}

impl<'a> AccountOrchestrator<'a> {
    pub fn new(connector: &'a dyn Connector, config: TaskConfig, family_filter: Vec<String>) -> Self {
        Self {
            connector,
            executor: TaskExecutor::new(config.clone(), family_filter),
            config,
        }
    }

    /// Process `accounts` in order, writing the narrative to `log`.
    ///
    /// Failures stay local to their account, except timeouts, which stop
    /// the loop. Records collected before the timeout are still returned.
    pub async fn run(&self, accounts: &[Account], log: &mut ReportLog) -> OrchestrationOutcome {
        let mut records = Vec::new();

        for (index, account) in accounts.iter().enumerate() {
            if !account.is_complete() {
                debug!("Skipping account {} with missing credentials", index + 1);
                continue;
            }

            log.line(format!(
                "{}. account {} starting",
                index + 1,
                account.masked_name()
            ));

            let role = Role::of(index, self.config.account_person);
            let result = self.process(account, role, &mut records, log).await;

            if let Err(e) = &result {
                log.error(format!("account {} failed: {}", account.masked_name(), e));
            }
            log.blank();

            if let Err(e) = result {
                if e.is_timeout() {
                    warn!("Timeout on account {}, aborting remaining accounts", index + 1);
                    return OrchestrationOutcome {
                        records,
                        aborted: Some(e),
                    };
                }
            }
        }

        OrchestrationOutcome {
            records,
            aborted: None,
        }
    }

    async fn process(
        &self,
        account: &Account,
        role: Role,
        records: &mut Vec<SessionRecord>,
        log: &mut ReportLog,
    ) -> Result<(), SessionError> {
        let session = self.connector.connect(account);
        session.login().await?;

        let before = session.size_info().await?;
        records.push(SessionRecord {
            account: account.clone(),
            session: session.clone(),
            before,
        });

        for message in self.executor.personal(session.as_ref(), role).await? {
            log.line(message);
        }

        let family = self.executor.family(session.as_ref(), role).await?;
        log.line(family.summary());

        tokio::time::sleep(self.pacing_delay()).await;
        Ok(())
    }

    /// Random pause in `[pacing_min_ms, pacing_max_ms)`.
    fn pacing_delay(&self) -> Duration {
        let (min, max) = (self.config.pacing_min_ms, self.config.pacing_max_ms);
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NOT_A_MEMBER, REPEATED_FAMILY_SIGN};
    use crate::session::fake::{FakeConnector, FakeSession};

    fn accounts(names: &[&str]) -> Vec<Account> {
        names.iter().map(|n| Account::new(*n, "pw")).collect()
    }

    #[tokio::test]
    async fn test_runs_accounts_in_order() {
        let mut connector = FakeConnector::new();
        let primary = connector.register(
            "10000000001",
            FakeSession::new()
                .with_families(&["f"])
                .with_family_result(false, 100)
                .with_snapshot(10, 20),
        );
        let secondary = connector.register("10000000002", FakeSession::new().with_families(&["f"]));

        let orchestrator = AccountOrchestrator::new(&connector, TaskConfig::immediate(2, 1), vec![]);
        let mut log = ReportLog::new();
        let outcome = orchestrator
            .run(&accounts(&["10000000001", "10000000002"]), &mut log)
            .await;

        assert!(outcome.aborted.is_none());
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].account.user_name, "10000000001");
        assert_eq!(outcome.records[0].before, CapacitySnapshot::new(10, 20));
        assert_eq!(primary.user_signs(), 1);
        assert_eq!(secondary.user_signs(), 0);
        assert_eq!(secondary.family_signs().len(), 2);

        assert_eq!(
            log.lines(),
            [
                "1. account 100****0001 starting",
                "Personal sign-in: 50M",
                "1 effective family sign-ins (M): 100",
                "",
                "2. account 100****0002 starting",
                REPEATED_FAMILY_SIGN,
                "",
            ]
        );
    }

    #[tokio::test]
    async fn test_skips_incomplete_accounts() {
        let connector = FakeConnector::new();
        let orchestrator = AccountOrchestrator::new(&connector, TaskConfig::immediate(1, 1), vec![]);
        let mut log = ReportLog::new();

        let list = vec![Account::new("nopass", ""), Account::new("", "pw")];
        let outcome = orchestrator.run(&list, &mut log).await;

        assert!(outcome.records.is_empty());
        assert!(connector.connected().is_empty());
        assert!(log.lines().is_empty());
    }

    #[tokio::test]
    async fn test_login_failure_is_isolated() {
        let mut connector = FakeConnector::new();
        connector.register(
            "broken",
            FakeSession::new().with_login_error(SessionError::Auth("bad password".to_string())),
        );
        let healthy = connector.register("healthy", FakeSession::new());

        let orchestrator = AccountOrchestrator::new(&connector, TaskConfig::immediate(1, 1), vec![]);
        let mut log = ReportLog::new();
        let outcome = orchestrator
            .run(&accounts(&["broken", "healthy"]), &mut log)
            .await;

        assert!(outcome.aborted.is_none());
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].account.user_name, "healthy");
        assert_eq!(healthy.logins(), 1);
        assert!(log.lines()[1].contains("login failed: bad password"));
        assert_eq!(log.lines()[2], "");
    }

    #[tokio::test]
    async fn test_timeout_aborts_remaining_accounts() {
        let mut connector = FakeConnector::new();
        connector.register("first", FakeSession::new().with_snapshot(1, 1));
        connector.register(
            "second",
            FakeSession::new().with_login_error(SessionError::Timeout("connect".to_string())),
        );
        connector.register("third", FakeSession::new());

        let orchestrator = AccountOrchestrator::new(&connector, TaskConfig::immediate(1, 1), vec![]);
        let mut log = ReportLog::new();
        let outcome = orchestrator
            .run(&accounts(&["first", "second", "third"]), &mut log)
            .await;

        assert!(outcome.aborted.as_ref().is_some_and(SessionError::is_timeout));
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].account.user_name, "first");
        assert_eq!(connector.connected(), vec!["first", "second"]);
        assert_eq!(log.lines().last().map(String::as_str), Some(""));
    }

    #[tokio::test]
    async fn test_filter_miss_is_reported() {
        let mut connector = FakeConnector::new();
        let session = connector.register("member", FakeSession::new().with_families(&["a"]));

        let orchestrator =
            AccountOrchestrator::new(&connector, TaskConfig::immediate(1, 0), vec!["b".to_string()]);
        let mut log = ReportLog::new();
        orchestrator.run(&accounts(&["member"]), &mut log).await;

        assert!(session.family_signs().is_empty());
        assert_eq!(log.lines()[1], NOT_A_MEMBER);
    }

    #[test]
    fn test_pacing_delay_within_bounds() {
        let connector = FakeConnector::new();
        let mut config = TaskConfig::immediate(1, 1);
        config.pacing_min_ms = 3000;
        config.pacing_max_ms = 6000;
        let orchestrator = AccountOrchestrator::new(&connector, config, vec![]);

        for _ in 0..50 {
            let delay = orchestrator.pacing_delay();
            assert!(delay >= Duration::from_millis(3000));
            assert!(delay < Duration::from_millis(6000));
        }
    }
}
