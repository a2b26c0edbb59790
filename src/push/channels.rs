//! Concrete push channels.
//!
//! Each channel owns its endpoint, payload shape and success check. The
//! payload builders and response checks are plain functions so they can be
//! tested without a network.

use super::{ChannelError, PushChannel};
use crate::config::{PushConfig, ServerChanConfig, TelegramConfig, WecomConfig, WxPusherConfig};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Every channel known to the tool, enabled or not.
pub fn all(config: &PushConfig, http_client: &reqwest::Client) -> Vec<Box<dyn PushChannel>> {
    vec![
        Box::new(ServerChan {
            http_client: http_client.clone(),
            config: config.server_chan.clone(),
        }),
        Box::new(TelegramBot {
            http_client: http_client.clone(),
            config: config.telegram.clone(),
        }),
        Box::new(WecomBot {
            http_client: http_client.clone(),
            config: config.wecom.clone(),
        }),
        Box::new(WxPusher {
            http_client: http_client.clone(),
            config: config.wxpusher.clone(),
        }),
    ]
}

/// Send a request and decode the JSON answer.
async fn execute(request: reqwest::RequestBuilder) -> Result<Value, ChannelError> {
    let response = request
        .send()
        .await
        .map_err(|e| ChannelError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ChannelError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(ChannelError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|_| ChannelError::Rejected(body))
}

/// ServerChan (sct.ftqq.com).
pub struct ServerChan {
    http_client: reqwest::Client,
    config: ServerChanConfig,
}

fn check_server_chan(json: &Value) -> Result<(), ChannelError> {
    match json["code"].as_i64() {
        Some(0) => Ok(()),
        _ => Err(ChannelError::Rejected(json.to_string())),
    }
}

#[async_trait]
impl PushChannel for ServerChan {
    fn name(&self) -> &'static str {
        "ServerChan"
    }

    fn is_enabled(&self) -> bool {
        !self.config.send_key.is_empty()
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), ChannelError> {
        let url = format!("https://sctapi.ftqq.com/{}.send", self.config.send_key);
        let form = [("title", title), ("desp", body)];
        let json = execute(self.http_client.post(&url).form(&form)).await?;
        check_server_chan(&json)
    }
}

/// Telegram bot message.
pub struct TelegramBot {
    http_client: reqwest::Client,
    config: TelegramConfig,
}

fn telegram_text(title: &str, body: &str) -> String {
    format!("{}\n\n{}", title, body)
}

fn check_telegram(json: &Value) -> Result<(), ChannelError> {
    if json["ok"].as_bool() == Some(true) {
        Ok(())
    } else {
        Err(ChannelError::Rejected(json.to_string()))
    }
}

#[async_trait]
impl PushChannel for TelegramBot {
    fn name(&self) -> &'static str {
        "TelegramBot"
    }

    fn is_enabled(&self) -> bool {
        !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), ChannelError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        );
        let text = telegram_text(title, body);
        let form = [("chat_id", self.config.chat_id.as_str()), ("text", text.as_str())];
        let json = execute(self.http_client.post(&url).form(&form)).await?;
        check_telegram(&json)
    }
}

/// WeCom (WeChat Work) group robot.
pub struct WecomBot {
    http_client: reqwest::Client,
    config: WecomConfig,
}

fn wecom_payload(title: &str, body: &str, phone: &str) -> Value {
    json!({
        "msgtype": "text",
        "text": {
            "content": format!("{}\n\n{}", title, body),
            "mentioned_mobile_list": [phone],
        }
    })
}

fn check_wecom(json: &Value) -> Result<(), ChannelError> {
    match json["errcode"].as_i64() {
        None | Some(0) => Ok(()),
        Some(_) => Err(ChannelError::Rejected(json.to_string())),
    }
}

#[async_trait]
impl PushChannel for WecomBot {
    fn name(&self) -> &'static str {
        "WecomBot"
    }

    fn is_enabled(&self) -> bool {
        !self.config.key.is_empty() && !self.config.telphone.is_empty()
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), ChannelError> {
        let url = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send";
        let payload = wecom_payload(title, body, &self.config.telphone);
        let request = self
            .http_client
            .post(url)
            .query(&[("key", self.config.key.as_str())])
            .json(&payload);
        let json = execute(request).await?;
        check_wecom(&json)
    }
}

/// WxPusher message.
pub struct WxPusher {
    http_client: reqwest::Client,
    config: WxPusherConfig,
}

fn wxpusher_payload(title: &str, body: &str, config: &WxPusherConfig) -> Value {
    json!({
        "appToken": config.app_token,
        "contentType": 1,
        "summary": title,
        "content": body,
        "uids": [config.uid],
    })
}

fn check_wxpusher(json: &Value) -> Result<(), ChannelError> {
    if json["data"][0]["code"].as_i64() == Some(1000) {
        Ok(())
    } else {
        Err(ChannelError::Rejected(json.to_string()))
    }
}

#[async_trait]
impl PushChannel for WxPusher {
    fn name(&self) -> &'static str {
        "WxPusher"
    }

    fn is_enabled(&self) -> bool {
        !self.config.app_token.is_empty() && !self.config.uid.is_empty()
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), ChannelError> {
        let payload = wxpusher_payload(title, body, &self.config);
        let request = self
            .http_client
            .post("https://wxpusher.zjiecode.com/api/send/message")
            .json(&payload);
        let json = execute(request).await?;
        check_wxpusher(&json)
    }
}
