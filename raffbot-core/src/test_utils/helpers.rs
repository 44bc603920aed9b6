// File: raffbot-core/src/test_utils/helpers.rs

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use raffbot_common::traits::{RaffleNotifier, SubscriptionVerifier};

use crate::store::RaffleStore;
use crate::Error;

/// Opens an empty store inside a fresh temp dir. Keep the `TempDir` alive for
/// as long as the store is used.
pub async fn temp_store() -> Result<(TempDir, Arc<RaffleStore>), Error> {
    let dir = tempfile::tempdir()?;
    let store = RaffleStore::open(dir.path().join("raffles.json")).await?;
    Ok((dir, Arc::new(store)))
}

/// In-memory membership table standing in for the chat platform.
#[derive(Default)]
pub struct FakeVerifier {
    members: Mutex<HashSet<(String, i64)>>,
    broken_channels: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    calls: Mutex<usize>,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every answer is delayed by `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn subscribe(&self, channel: &str, user_id: i64) {
        if let Ok(mut members) = self.members.lock() {
            members.insert((channel.to_string(), user_id));
        }
    }

    /// Checks against `channel` fail as if the platform were unreachable.
    pub fn break_channel(&self, channel: &str) {
        if let Ok(mut broken) = self.broken_channels.lock() {
            broken.insert(channel.to_string());
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl SubscriptionVerifier for FakeVerifier {
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool, Error> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let broken = self.broken_channels
            .lock()
            .map(|b| b.contains(channel))
            .unwrap_or(false);
        if broken {
            return Err(Error::Platform(format!("{channel} is unreachable")));
        }

        let member = self.members
            .lock()
            .map(|m| m.contains(&(channel.to_string(), user_id)))
            .unwrap_or(false);
        Ok(member)
    }
}

/// Collects announcements instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RaffleNotifier for RecordingNotifier {
    async fn announce(&self, chat: &str, text: &str) -> Result<(), Error> {
        if self.failing {
            return Err(Error::Platform("sendMessage failed".into()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((chat.to_string(), text.to_string()));
        }
        Ok(())
    }
}
