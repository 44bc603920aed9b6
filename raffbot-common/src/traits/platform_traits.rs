use async_trait::async_trait;

use crate::error::Error;

/// Answers "is this user a member of that channel?" against the chat platform.
///
/// Implementations talk to a remote API and may be slow or fail. An `Err` means
/// the answer is unknown; callers must never treat it as membership.
#[async_trait]
pub trait SubscriptionVerifier: Send + Sync {
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool, Error>;
}

/// Posts raffle results back into a chat.
#[async_trait]
pub trait RaffleNotifier: Send + Sync {
    async fn announce(&self, chat: &str, text: &str) -> Result<(), Error>;
}
