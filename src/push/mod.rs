//! Push notification fan-out.
//!
//! Every enabled [`PushChannel`] receives the same title and body. Sends
//! run together and never affect each other: a failing channel is logged
//! and the rest still deliver.

pub mod channels;

use crate::config::PushConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors raised by a push channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but refused the message.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// A notification destination.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Display name used in log lines.
    fn name(&self) -> &'static str;

    /// Whether the credentials this channel needs are present.
    fn is_enabled(&self) -> bool;

    async fn send(&self, title: &str, body: &str) -> Result<(), ChannelError>;
}

/// Outcome of one notification round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    pub attempted: usize,
    pub failed: usize,
}

/// Sends the report to every enabled channel.
pub struct Notifier {
    channels: Vec<Box<dyn PushChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn PushChannel>>) -> Self {
        Self { channels }
    }

    /// Build the notifier with every known channel.
    pub fn from_config(config: &PushConfig, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::new(channels::all(config, &http_client)))
    }

    /// Names of the channels that will be attempted.
    pub fn enabled_channels(&self) -> Vec<&'static str> {
        self.channels
            .iter()
            .filter(|c| c.is_enabled())
            .map(|c| c.name())
            .collect()
    }

    /// Deliver to all enabled channels, waiting for every one of them.
    pub async fn notify(&self, title: &str, body: &str) -> DeliverySummary {
        let enabled: Vec<&dyn PushChannel> = self
            .channels
            .iter()
            .filter(|c| c.is_enabled())
            .map(|c| c.as_ref())
            .collect();

        if enabled.is_empty() {
            debug!("No push channel configured");
            return DeliverySummary::default();
        }

        let sends = enabled.iter().map(|channel| async move {
            let result = channel.send(title, body).await;
            (channel.name(), result)
        });

        let mut summary = DeliverySummary {
            attempted: enabled.len(),
            failed: 0,
        };

        for (name, result) in join_all(sends).await {
            match result {
                Ok(()) => info!("{} push succeeded", name),
                Err(e) => {
                    summary.failed += 1;
                    error!("{} push failed: {}", name, e);
                }
            }
        }

        summary
    }
}
