use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use raffbot_common::models::ParticipantKey;
use raffbot_common::traits::SubscriptionVerifier;

use crate::store::{RaffleMap, RaffleStore};
use crate::Error;

pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a join was refused.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("raffle not found")]
    NotFound,

    #[error("raffle has ended")]
    Ended,

    #[error("not subscribed to: {}", .0.join(", "))]
    NotSubscribed(Vec<String>),

    /// Membership could not be established; the user may retry.
    #[error("subscription check failed: {0}")]
    Transient(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] Error),
}

/// Admits users into raffles.
pub struct JoinService {
    store: Arc<RaffleStore>,
    verifier: Arc<dyn SubscriptionVerifier>,
    verify_timeout: Duration,
}

impl JoinService {
    pub fn new(store: Arc<RaffleStore>, verifier: Arc<dyn SubscriptionVerifier>) -> Self {
        Self {
            store,
            verifier,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    pub fn with_verify_timeout(mut self, verify_timeout: Duration) -> Self {
        self.verify_timeout = verify_timeout;
        self
    }

    /// Joins `user_id` into raffle `raffle_id` and returns the participant list.
    ///
    /// Joining again with the same identity is a no-op success. Membership
    /// checks run without holding the store lock; the final append re-checks
    /// the raffle under the lock against the real clock, and refuses drawn
    /// raffles, before anything is written.
    pub async fn join(
        &self,
        raffle_id: &str,
        user_id: i64,
        username: Option<&str>,
    ) -> Result<Vec<String>, JoinError> {
        self.join_at(raffle_id, user_id, username, Utc::now()).await
    }

    pub async fn join_at(
        &self,
        raffle_id: &str,
        user_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, JoinError> {
        if user_id <= 0 {
            return Err(JoinError::BadRequest(format!("invalid user id {}", user_id)));
        }

        let raffle = self.store.get(raffle_id).await.ok_or(JoinError::NotFound)?;
        if raffle.is_ended(now) {
            info!("Rejected join into ended raffle id={} by user {}", raffle_id, user_id);
            return Err(JoinError::Ended);
        }

        let key = ParticipantKey::new(user_id, username);
        if raffle.has_participant(key.as_str()) {
            return Ok(raffle.participants);
        }

        self.check_subscriptions(&raffle.channels, user_id).await?;

        let participants = self.store.mutate(|raffles: &mut RaffleMap| -> Result<Vec<String>, JoinError> {
            let raffle = raffles.get_mut(raffle_id).ok_or(JoinError::NotFound)?;
            // verification may have outlasted the deadline
            if raffle.is_drawn() || raffle.is_ended(now.max(Utc::now())) {
                info!("Rejected late join into raffle id={} by user {}", raffle_id, user_id);
                return Err(JoinError::Ended);
            }
            raffle.add_participant(key.as_str());
            Ok(raffle.participants.clone())
        }).await?;

        info!("{} joined raffle id={} ({} participant(s))", key, raffle_id, participants.len());
        Ok(participants)
    }

    /// Checks every required channel concurrently.
    ///
    /// Any channel the user is definitely missing yields `NotSubscribed` with
    /// exactly those channels. Otherwise, any check that errored or timed out
    /// yields `Transient`. Only all-positive answers pass.
    async fn check_subscriptions(&self, channels: &[String], user_id: i64) -> Result<(), JoinError> {
        if channels.is_empty() {
            return Ok(());
        }

        let checks = channels.iter().map(|channel| async move {
            let answer = timeout(self.verify_timeout, self.verifier.is_member(channel, user_id)).await;
            (channel, answer)
        });

        let mut missing = Vec::new();
        let mut failures = Vec::new();
        for (channel, answer) in join_all(checks).await {
            match answer {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => missing.push(channel.clone()),
                Ok(Err(e)) => {
                    warn!("Membership check of user {} in {} failed: {}", user_id, channel, e);
                    failures.push(format!("{}: {}", channel, e));
                }
                Err(_) => {
                    warn!(
                        "Membership check of user {} in {} timed out after {:?}",
                        user_id, channel, self.verify_timeout
                    );
                    failures.push(format!("{}: timed out", channel));
                }
            }
        }

        if !missing.is_empty() {
            info!("User {} is missing required channel(s) {:?}", user_id, missing);
            return Err(JoinError::NotSubscribed(missing));
        }
        if !failures.is_empty() {
            return Err(JoinError::Transient(failures.join("; ")));
        }
        Ok(())
    }
}
