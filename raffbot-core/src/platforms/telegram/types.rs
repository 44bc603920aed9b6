// File: src/platforms/telegram/types.rs
//
// The slices of Telegram Bot API payloads the raffle bot reads.

use serde::Deserialize;

/// Every Bot API response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMember {
    pub status: String,
    /// Only present for `restricted` members.
    pub is_member: Option<bool>,
}

impl ChatMember {
    pub fn counts_as_member(&self) -> bool {
        match self.status.as_str() {
            "creator" | "administrator" | "member" => true,
            "restricted" => self.is_member.unwrap_or(false),
            _ => false,
        }
    }
}
