//! Personal and family check-in tasks for a single account.

use crate::config::TaskConfig;
use crate::models::{FamilyInfo, FamilyOutcome, Role, NOT_A_MEMBER};
use crate::session::{AccountSession, SessionError};
use futures::future::try_join_all;
use tracing::debug;

/// Runs the check-in tasks of one account according to its role.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    config: TaskConfig,
    /// Family ids the family sign-in is restricted to.
    family_filter: Vec<String>,
}

impl TaskExecutor {
    pub fn new(config: TaskConfig, family_filter: Vec<String>) -> Self {
        Self {
            config,
            family_filter,
        }
    }

    /// Personal sign-in. Only primary accounts sign in; the others get an
    /// empty outcome without any call.
    pub async fn personal(
        &self,
        session: &dyn AccountSession,
        role: Role,
    ) -> Result<Vec<String>, SessionError> {
        if !role.is_primary() {
            return Ok(Vec::new());
        }

        let result = session.user_sign().await?;
        tokio::time::sleep(self.config.settle_delay()).await;

        Ok(vec![result.message()])
    }

    /// Family sign-in.
    ///
    /// Primary accounts sign in once. Non-primary accounts fire
    /// `exec_threshold` sign-ins at the same family concurrently, one per
    /// possible member, and keep only the ones that took effect.
    pub async fn family(
        &self,
        session: &dyn AccountSession,
        role: Role,
    ) -> Result<FamilyOutcome, SessionError> {
        let families = session.family_list().await?;
        if families.is_empty() {
            debug!("Account has no family group");
            return Ok(FamilyOutcome::Absent);
        }

        let family = match self.resolve_family(&families) {
            Some(family) => family,
            None => return Ok(FamilyOutcome::Message(NOT_A_MEMBER.to_string())),
        };

        let calls = match role {
            Role::Primary => 1,
            Role::NonPrimary => self.config.exec_threshold,
        };
        debug!(
            "Signing family {} ({}) with {} call(s)",
            family.family_id,
            family.name.as_deref().unwrap_or("unnamed"),
            calls
        );

        let family_id = family.family_id.as_str();
        let results =
            try_join_all((0..calls).map(|_| session.family_user_sign(family_id))).await?;

        let bonuses = results
            .into_iter()
            .filter(|r| !r.already_satisfied)
            .map(|r| r.bonus_space)
            .collect();

        Ok(FamilyOutcome::from_bonuses(bonuses))
    }

    /// Pick the family to sign into: the first one allowed by the filter,
    /// or the first one overall when no filter is configured.
    fn resolve_family<'f>(&self, families: &'f [FamilyInfo]) -> Option<&'f FamilyInfo> {
        if self.family_filter.is_empty() {
            return families.first();
        }

        families
            .iter()
            .find(|f| self.family_filter.contains(&f.family_id))
    }
}
