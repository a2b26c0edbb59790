//! HTTP implementation of the account session.
//!
//! Talks JSON to the cloud service endpoints configured in `[service]`.
//! The login endpoint trades the account credentials for a session key,
//! which is then sent as the `SessionKey` header on every call.

use super::{AccountSession, Connector, SessionError};
use crate::config::ServiceConfig;
use crate::models::{
    deserialize_id, Account, BonusSpace, CapacitySnapshot, FamilyInfo, FamilySignResult,
    UserSignResult,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Builds [`CloudSession`]s sharing one HTTP client.
pub struct CloudConnector {
    http_client: reqwest::Client,
    service: Arc<ServiceConfig>,
}

impl CloudConnector {
    pub fn new(service: ServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(service.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            service: Arc::new(service),
        })
    }
}

impl Connector for CloudConnector {
    fn connect(&self, account: &Account) -> Arc<dyn AccountSession> {
        Arc::new(CloudSession {
            http_client: self.http_client.clone(),
            service: self.service.clone(),
            account: account.clone(),
            session_key: RwLock::new(None),
        })
    }
}

/// Session for one account.
pub struct CloudSession {
    http_client: reqwest::Client,
    service: Arc<ServiceConfig>,
    account: Account,
    session_key: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    session_key: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSignResponse {
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_sign: bool,
    #[serde(default)]
    netdisk_bonus: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyListResponse {
    #[serde(default)]
    family_info_resp: Option<Vec<FamilyEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyEntry {
    #[serde(deserialize_with = "deserialize_id")]
    family_id: String,
    #[serde(default)]
    remark_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilySignResponse {
    #[serde(default, deserialize_with = "deserialize_flag")]
    sign_status: bool,
    #[serde(default)]
    bonus_space: Option<BonusSpace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SizeInfoResponse {
    cloud_capacity_info: CapacityInfo,
    family_capacity_info: CapacityInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapacityInfo {
    total_size: u64,
}

/// Accepts `true`/`false` as well as numeric 0/1 status flags.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Num(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Num(n) => n != 0,
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, SessionError> {
    serde_json::from_str(body).map_err(|e| SessionError::Decode(format!("{}: {}", e, body)))
}

fn map_transport(e: reqwest::Error) -> SessionError {
    if e.is_timeout() {
        SessionError::Timeout(e.to_string())
    } else {
        SessionError::Request(e.to_string())
    }
}

fn parse_user_sign(body: &str) -> Result<UserSignResult, SessionError> {
    let res: UserSignResponse = decode(body)?;
    Ok(UserSignResult {
        already_signed: res.is_sign,
        bonus_mb: res.netdisk_bonus,
    })
}

fn parse_family_list(body: &str) -> Result<Vec<FamilyInfo>, SessionError> {
    let res: FamilyListResponse = decode(body)?;
    Ok(res
        .family_info_resp
        .unwrap_or_default()
        .into_iter()
        .map(|f| FamilyInfo {
            family_id: f.family_id,
            name: f.remark_name,
        })
        .collect())
}

fn parse_family_sign(body: &str) -> Result<FamilySignResult, SessionError> {
    let res: FamilySignResponse = decode(body)?;
    Ok(FamilySignResult {
        already_satisfied: res.sign_status,
        bonus_space: res
            .bonus_space
            .unwrap_or_else(|| BonusSpace::Text(String::new())),
    })
}

fn parse_size_info(body: &str) -> Result<CapacitySnapshot, SessionError> {
    let res: SizeInfoResponse = decode(body)?;
    Ok(CapacitySnapshot::new(
        res.cloud_capacity_info.total_size,
        res.family_capacity_info.total_size,
    ))
}

impl CloudSession {
    fn current_session_key(&self) -> Result<String, SessionError> {
        self.session_key
            .read()
            .ok()
            .and_then(|key| key.as_ref().cloned())
            .ok_or_else(|| SessionError::Auth("not logged in".to_string()))
    }

    fn store_session_key(&self, key: String) -> Result<(), SessionError> {
        let mut slot = self
            .session_key
            .write()
            .map_err(|_| SessionError::Auth("session key lock poisoned".to_string()))?;
        *slot = Some(key);
        Ok(())
    }

    /// Send an authenticated GET and return the response body.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, SessionError> {
        let session_key = self.current_session_key()?;

        debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .query(query)
            .header("SessionKey", session_key)
            .header("Accept", "application/json;charset=UTF-8")
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;

        if !status.is_success() {
            return Err(SessionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl AccountSession for CloudSession {
    async fn login(&self) -> Result<(), SessionError> {
        let url = self
            .service
            .login_url
            .as_deref()
            .ok_or_else(|| SessionError::Auth("no login endpoint configured".to_string()))?;

        let form = [
            ("userName", self.account.user_name.as_str()),
            ("password", self.account.password.as_str()),
        ];

        let response = self
            .http_client
            .post(url)
            .form(&form)
            .header("Accept", "application/json;charset=UTF-8")
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;

        if !status.is_success() {
            return Err(SessionError::Auth(format!("status {}: {}", status, body)));
        }

        let login: LoginResponse = decode(&body)?;
        match login.session_key.filter(|key| !key.is_empty()) {
            Some(key) => self.store_session_key(key),
            None => Err(SessionError::Auth(
                login.msg.unwrap_or_else(|| "no session key returned".to_string()),
            )),
        }
    }

    async fn user_sign(&self) -> Result<UserSignResult, SessionError> {
        let rand = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        let query = [
            ("rand", rand.to_string()),
            ("clientType", "TELEANDROID".to_string()),
            ("version", "8.6.3".to_string()),
            ("model", "SM-G930K".to_string()),
        ];

        let body = self.get(&self.service.user_sign_url, &query).await?;
        parse_user_sign(&body)
    }

    async fn family_list(&self) -> Result<Vec<FamilyInfo>, SessionError> {
        let body = self.get(&self.service.family_list_url, &[]).await?;
        parse_family_list(&body)
    }

    async fn family_user_sign(&self, family_id: &str) -> Result<FamilySignResult, SessionError> {
        let query = [("familyId", family_id.to_string())];
        let body = self.get(&self.service.family_sign_url, &query).await?;
        parse_family_sign(&body)
    }

    async fn size_info(&self) -> Result<CapacitySnapshot, SessionError> {
        let body = self.get(&self.service.size_info_url, &[]).await?;
        parse_size_info(&body)
    }
}
