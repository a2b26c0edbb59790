//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cloud-checkin.toml` files.

use crate::models::Account;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".cloud-checkin.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Family ids to restrict family sign-in to. Empty means "first family".
    #[serde(default)]
    pub families: Vec<String>,

    /// Accounts, processed in order.
    #[serde(default)]
    pub accounts: Vec<Account>,

    /// Task settings.
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Cloud service endpoints.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Push channel credentials.
    #[serde(default)]
    pub push: PushConfig,
}

/// Check-in task settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Concurrent family sign-ins issued for each non-primary account.
    #[serde(default = "default_exec_threshold")]
    pub exec_threshold: usize,

    /// Number of leading accounts treated as primary.
    #[serde(default = "default_account_person")]
    pub account_person: usize,

    /// Wait after the personal sign-in, in milliseconds.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Lower bound of the pause between accounts, in milliseconds.
    #[serde(default = "default_pacing_min")]
    pub pacing_min_ms: u64,

    /// Upper bound (exclusive) of the pause between accounts.
    #[serde(default = "default_pacing_max")]
    pub pacing_max_ms: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            exec_threshold: default_exec_threshold(),
            account_person: default_account_person(),
            settle_delay_ms: default_settle_delay(),
            pacing_min_ms: default_pacing_min(),
            pacing_max_ms: default_pacing_max(),
        }
    }
}

fn default_exec_threshold() -> usize {
    1
}

fn default_account_person() -> usize {
    1
}

fn default_settle_delay() -> u64 {
    5000
}

fn default_pacing_min() -> u64 {
    3000
}

fn default_pacing_max() -> u64 {
    6000
}

impl TaskConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Settings with every delay disabled.
    #[cfg(test)]
    pub fn immediate(exec_threshold: usize, account_person: usize) -> Self {
        Self {
            exec_threshold,
            account_person,
            settle_delay_ms: 0,
            pacing_min_ms: 0,
            pacing_max_ms: 0,
        }
    }
}

/// Cloud service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Endpoint exchanging credentials for a session key.
    #[serde(default)]
    pub login_url: Option<String>,

    #[serde(default = "default_user_sign_url")]
    pub user_sign_url: String,

    #[serde(default = "default_size_info_url")]
    pub size_info_url: String,

    #[serde(default = "default_family_list_url")]
    pub family_list_url: String,

    #[serde(default = "default_family_sign_url")]
    pub family_sign_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            login_url: None,
            user_sign_url: default_user_sign_url(),
            size_info_url: default_size_info_url(),
            family_list_url: default_family_list_url(),
            family_sign_url: default_family_sign_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_user_sign_url() -> String {
    "https://cloud.189.cn/mkt/userSign.action".to_string()
}

fn default_size_info_url() -> String {
    "https://cloud.189.cn/api/portal/getUserSizeInfo.action".to_string()
}

fn default_family_list_url() -> String {
    "https://api.cloud.189.cn/open/family/manage/getFamilyList.action".to_string()
}

fn default_family_sign_url() -> String {
    "https://api.cloud.189.cn/open/family/manage/exeFamilyUserSign.action".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Push channel credentials. A channel is enabled when all of its fields are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub server_chan: ServerChanConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub wecom: WecomConfig,
    #[serde(default)]
    pub wxpusher: WxPusherConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerChanConfig {
    #[serde(default)]
    pub send_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WecomConfig {
    #[serde(default)]
    pub key: String,
    /// Phone number to mention in the group message.
    #[serde(default)]
    pub telphone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WxPusherConfig {
    #[serde(default)]
    pub app_token: String,
    #[serde(default)]
    pub uid: String,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment fallbacks) take precedence, but
    /// only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(exec_threshold) = args.exec_threshold {
            self.tasks.exec_threshold = exec_threshold;
        }
        if let Some(account_person) = args.account_person {
            self.tasks.account_person = account_person;
        }
        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }
    }

    /// Check values the runner relies on.
    pub fn validate(&self) -> Result<()> {
        if self.tasks.exec_threshold == 0 {
            anyhow::bail!("exec_threshold must be at least 1");
        }
        if self.tasks.pacing_max_ms < self.tasks.pacing_min_ms {
            anyhow::bail!(
                "pacing_max_ms ({}) must not be below pacing_min_ms ({})",
                self.tasks.pacing_max_ms,
                self.tasks.pacing_min_ms
            );
        }
        if self.service.timeout_seconds == 0 {
            anyhow::bail!("timeout_seconds must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config {
            accounts: vec![Account::new("13800000000", "password")],
            ..Config::default()
        };
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
