/*!
Slack-compatible incoming webhook sink.

The payload is a single `danger`-coloured attachment carrying the message,
posted as JSON. Slack answers a successful post with the literal body `ok`;
anything else is a delivery failure even when the HTTP exchange succeeded.
*/

use crate::core::alert::{AlertError, AlertSink};
use isahc::config::Configurable;
use isahc::{AsyncReadResponseExt, HttpClient, Request};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_USERNAME: &str = "alertr";
pub const DEFAULT_ICON_EMOJI: &str = ":arrow_heading_down:";
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

const FAILURE_COLOR: &str = "danger";
// Keep error bodies short in logs
const MAX_BODY_IN_ERROR: usize = 200;

/// Webhook request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackPayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub link_names: bool,
    pub attachments: Vec<SlackAttachment>,
}

/// Richly-formatted message block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackAttachment {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title_link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pretext: String,
    pub text: String,
    #[serde(default)]
    pub fallback: String,
    #[serde(default)]
    pub callback_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thumb_url: String,
    #[serde(default)]
    pub footer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<String>,
}

impl SlackPayload {
    /// Failure notification with the default identity
    pub fn failure(channel: &str, message: &str) -> Self {
        Self {
            channel: channel.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            icon_emoji: DEFAULT_ICON_EMOJI.to_string(),
            icon_url: String::new(),
            link_names: true,
            attachments: vec![SlackAttachment {
                text: message.to_string(),
                color: FAILURE_COLOR.to_string(),
                ..Default::default()
            }],
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, AlertError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Posts failure notifications to an incoming webhook
pub struct SlackSink {
    client: HttpClient,
    webhook_url: String,
    channel: String,
    username: String,
    icon_emoji: String,
}

impl SlackSink {
    /// Create the sink and its shared webhook client (30 second timeout)
    pub fn new(webhook_url: impl Into<String>, channel: impl Into<String>) -> Result<Self, AlertError> {
        let client = HttpClient::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| AlertError::ClientBuild(e.to_string()))?;
        Ok(Self::with_client(client, webhook_url, channel))
    }

    /// Create the sink around an existing client
    pub fn with_client(
        client: HttpClient,
        webhook_url: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            channel: channel.into(),
            username: DEFAULT_USERNAME.to_string(),
            icon_emoji: DEFAULT_ICON_EMOJI.to_string(),
        }
    }

    /// Override the posting identity; empty values keep the defaults
    pub fn with_identity(mut self, username: Option<String>, icon_emoji: Option<String>) -> Self {
        if let Some(username) = username.filter(|u| !u.is_empty()) {
            self.username = username;
        }
        if let Some(icon) = icon_emoji.filter(|i| !i.is_empty()) {
            self.icon_emoji = icon;
        }
        self
    }

    pub fn payload(&self, message: &str) -> SlackPayload {
        let mut payload = SlackPayload::failure(&self.channel, message);
        payload.username = self.username.clone();
        payload.icon_emoji = self.icon_emoji.clone();
        payload
    }
}

#[async_trait::async_trait]
impl AlertSink for SlackSink {
    async fn notify(&self, message: &str) -> Result<(), AlertError> {
        let body = self.payload(message).to_json()?;

        let request = Request::post(self.webhook_url.as_str())
            .header("Content-Type", "application/json")
            .body(body)
            .map_err(|e| AlertError::Request(e.to_string()))?;

        let mut response = self
            .client
            .send_async(request)
            .await
            .map_err(|e| AlertError::Post(e.to_string()))?;

        let status = response.status().as_u16();
        let raw = response
            .bytes()
            .await
            .map_err(|e| AlertError::Post(format!("reading response body: {}", e)))?;
        let text = String::from_utf8_lossy(&raw);

        if text != "ok" {
            let body: String = text.chars().take(MAX_BODY_IN_ERROR).collect();
            return Err(AlertError::NonOkResponse { status, body });
        }

        Ok(())
    }
}
