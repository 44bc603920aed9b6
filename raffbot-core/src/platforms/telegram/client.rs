// File: src/platforms/telegram/client.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use raffbot_common::traits::{RaffleNotifier, SubscriptionVerifier};

use super::types::{ApiResponse, ChatMember};
use crate::http::HttpClient;
use crate::Error;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API descriptions that mean "this user is not in the chat" rather than
/// "the request went wrong".
const NOT_A_MEMBER_DESCRIPTIONS: &[&str] = &["user not found", "PARTICIPANT_ID_INVALID"];

/// Thin Telegram Bot API client covering membership checks and result posts.
pub struct TelegramClient {
    http: Arc<dyn HttpClient>,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(http: Arc<dyn HttpClient>, api_base: &str, token: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn parse<T: DeserializeOwned>(method: &str, body: &str) -> Result<ApiResponse<T>, Error> {
        serde_json::from_str(body).map_err(|e| {
            Error::Platform(format!("Malformed {} response from Telegram: {}", method, e))
        })
    }

    pub async fn get_chat_member(&self, chat_id: &str, user_id: i64) -> Result<Option<ChatMember>, Error> {
        let body = self.http
            .get(
                self.method_url("getChatMember"),
                vec![
                    ("chat_id".to_string(), chat_id.to_string()),
                    ("user_id".to_string(), user_id.to_string()),
                ],
            )
            .await?;

        let resp: ApiResponse<ChatMember> = Self::parse("getChatMember", &body)?;
        if resp.ok {
            return resp.result
                .map(Some)
                .ok_or_else(|| Error::Platform("getChatMember returned ok without a result".into()));
        }

        let description = resp.description.unwrap_or_default();
        if NOT_A_MEMBER_DESCRIPTIONS.iter().any(|d| description.contains(d)) {
            debug!("Telegram reports user {} unknown in {}", user_id, chat_id);
            return Ok(None);
        }

        Err(Error::Platform(format!(
            "getChatMember({}) failed: code={:?} {}",
            chat_id, resp.error_code, description
        )))
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), Error> {
        let body = self.http
            .post_json(
                self.method_url("sendMessage"),
                serde_json::json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;

        let resp: ApiResponse<serde_json::Value> = Self::parse("sendMessage", &body)?;
        if !resp.ok {
            return Err(Error::Platform(format!(
                "sendMessage({}) failed: code={:?} {}",
                chat_id,
                resp.error_code,
                resp.description.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionVerifier for TelegramClient {
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool, Error> {
        let member = self.get_chat_member(channel, user_id).await?;
        Ok(member.map(|m| m.counts_as_member()).unwrap_or(false))
    }
}

#[async_trait]
impl RaffleNotifier for TelegramClient {
    async fn announce(&self, chat: &str, text: &str) -> Result<(), Error> {
        self.send_message(chat, text).await
    }
}

/// Stand-in used when no bot token is configured. Every membership question is
/// unanswerable, so raffles with required channels cannot admit anyone.
pub struct UnconfiguredPlatform;

#[async_trait]
impl SubscriptionVerifier for UnconfiguredPlatform {
    async fn is_member(&self, channel: &str, _user_id: i64) -> Result<bool, Error> {
        warn!("Cannot verify membership in {}: no bot token configured", channel);
        Err(Error::Config("no bot token configured".into()))
    }
}
