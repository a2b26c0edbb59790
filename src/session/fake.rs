//! Scripted in-memory session for tests.

use super::{AccountSession, Connector, SessionError};
use crate::models::{
    Account, BonusSpace, CapacitySnapshot, FamilyInfo, FamilySignResult, UserSignResult,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct State {
    login_error: Option<SessionError>,
    families: Vec<FamilyInfo>,
    family_results: VecDeque<FamilySignResult>,
    snapshots: VecDeque<CapacitySnapshot>,
    size_error: Option<SessionError>,
    logins: usize,
    user_signs: usize,
    family_signs: Vec<String>,
    sign_latency: Option<Duration>,
    signs_in_flight: usize,
    max_signs_in_flight: usize,
    size_queries: usize,
}

/// A session whose answers are queued up front and whose calls are counted.
#[derive(Default)]
pub struct FakeSession {
    state: Mutex<State>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login_error(self, error: SessionError) -> Self {
        self.state.lock().unwrap().login_error = Some(error);
        self
    }

    pub fn with_families(self, ids: &[&str]) -> Self {
        self.state.lock().unwrap().families = ids
            .iter()
            .map(|id| FamilyInfo {
                family_id: id.to_string(),
                name: None,
            })
            .collect();
        self
    }

    /// Queue a family sign-in answer. Once drained, calls report
    /// "already satisfied".
    pub fn with_family_result(self, already_satisfied: bool, bonus: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .family_results
            .push_back(FamilySignResult {
                already_satisfied,
                bonus_space: BonusSpace::Amount(bonus),
            });
        self
    }

    /// Queue a size snapshot. The last queued one is repeated forever.
    pub fn with_snapshot(self, personal: u64, family: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .snapshots
            .push_back(CapacitySnapshot::new(personal, family));
        self
    }

    /// Make each family sign-in take `latency` before answering.
    pub fn with_sign_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().sign_latency = Some(latency);
        self
    }

    pub fn with_size_error(self, error: SessionError) -> Self {
        self.state.lock().unwrap().size_error = Some(error);
        self
    }

    pub fn logins(&self) -> usize {
        self.state.lock().unwrap().logins
    }

    pub fn user_signs(&self) -> usize {
        self.state.lock().unwrap().user_signs
    }

    pub fn family_signs(&self) -> Vec<String> {
        self.state.lock().unwrap().family_signs.clone()
    }

    /// Highest number of family sign-ins observed running at once.
    pub fn max_signs_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_signs_in_flight
    }

    pub fn size_queries(&self) -> usize {
        self.state.lock().unwrap().size_queries
    }
}

#[async_trait]
impl AccountSession for FakeSession {
    async fn login(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        state.logins += 1;
        match state.login_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn user_sign(&self) -> Result<UserSignResult, SessionError> {
        self.state.lock().unwrap().user_signs += 1;
        Ok(UserSignResult {
            already_signed: false,
            bonus_mb: 50,
        })
    }

    async fn family_list(&self) -> Result<Vec<FamilyInfo>, SessionError> {
        Ok(self.state.lock().unwrap().families.clone())
    }

    async fn family_user_sign(&self, family_id: &str) -> Result<FamilySignResult, SessionError> {
        let latency = {
            let mut state = self.state.lock().unwrap();
            state.family_signs.push(family_id.to_string());
            state.signs_in_flight += 1;
            state.max_signs_in_flight = state.max_signs_in_flight.max(state.signs_in_flight);
            state.sign_latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().unwrap();
        state.signs_in_flight -= 1;
        Ok(state
            .family_results
            .pop_front()
            .unwrap_or(FamilySignResult {
                already_satisfied: true,
                bonus_space: BonusSpace::Amount(0),
            }))
    }

    async fn size_info(&self) -> Result<CapacitySnapshot, SessionError> {
        let mut state = self.state.lock().unwrap();
        state.size_queries += 1;
        if let Some(e) = state.size_error.clone() {
            return Err(e);
        }
        if state.snapshots.len() > 1 {
            Ok(state.snapshots.pop_front().unwrap_or_default())
        } else {
            Ok(state.snapshots.front().copied().unwrap_or_default())
        }
    }
}

/// Hands out pre-registered fake sessions by user name.
#[derive(Default)]
pub struct FakeConnector {
    sessions: HashMap<String, Arc<FakeSession>>,
    connected: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, user_name: &str, session: FakeSession) -> Arc<FakeSession> {
        let session = Arc::new(session);
        self.sessions.insert(user_name.to_string(), session.clone());
        session
    }

    /// User names in the order sessions were requested.
    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, account: &Account) -> Arc<dyn AccountSession> {
        self.connected
            .lock()
            .unwrap()
            .push(account.user_name.clone());
        match self.sessions.get(&account.user_name) {
            Some(session) => session.clone() as Arc<dyn AccountSession>,
            None => Arc::new(FakeSession::new()),
        }
    }
}
