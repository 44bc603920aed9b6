use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINNER_COUNT: u32 = 1;

fn default_winner_count() -> u32 {
    DEFAULT_WINNER_COUNT
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// A timed giveaway as it is persisted in the store file.
///
/// The id is the key of the store document, so it is not repeated inside the
/// serialized record; the store fills it in on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raffle {
    #[serde(skip)]
    pub id: String,

    /// `None` means the raffle never closes on its own.
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,

    /// Participant keys in join order. Unique.
    #[serde(default)]
    pub participants: Vec<String>,

    /// Channels a user must belong to before being admitted.
    #[serde(default)]
    pub channels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default = "default_winner_count")]
    pub winner_count: u32,

    /// `None` until the draw has happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce_chat: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub announced: bool,
}

impl Raffle {
    pub fn new(id: impl Into<String>, end_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            end_at,
            participants: Vec::new(),
            channels: Vec::new(),
            created_at: None,
            winner_count: DEFAULT_WINNER_COUNT,
            winners: None,
            announce_chat: None,
            announced: false,
        }
    }

    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// A raffle is over once `now` reaches its end timestamp.
    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        match self.end_at {
            Some(end_at) => now >= end_at,
            None => false,
        }
    }

    pub fn has_participant(&self, key: &str) -> bool {
        self.participants.iter().any(|p| p == key)
    }

    /// Appends `key` unless it is already present. Returns whether it was added.
    pub fn add_participant(&mut self, key: &str) -> bool {
        if self.has_participant(key) {
            return false;
        }
        self.participants.push(key.to_string());
        true
    }

    pub fn is_drawn(&self) -> bool {
        self.winners.is_some()
    }
}

/// Display and dedup identity of a participant: `@username`, or `id:<userId>`
/// when the user has no username.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantKey(String);

impl ParticipantKey {
    pub fn new(user_id: i64, username: Option<&str>) -> Self {
        let name = username
            .map(|u| u.trim().trim_start_matches('@'))
            .filter(|u| !u.is_empty());

        match name {
            Some(name) => Self(format!("@{name}")),
            None => Self(format!("id:{user_id}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn key_prefers_username() {
        assert_eq!(ParticipantKey::new(7, Some("alice")).as_str(), "@alice");
        assert_eq!(ParticipantKey::new(7, Some("@alice")).as_str(), "@alice");
    }

    #[test]
    fn key_falls_back_to_numeric_id() {
        assert_eq!(ParticipantKey::new(7, None).as_str(), "id:7");
        assert_eq!(ParticipantKey::new(7, Some("")).as_str(), "id:7");
        assert_eq!(ParticipantKey::new(7, Some("  ")).as_str(), "id:7");
        assert_eq!(ParticipantKey::new(7, Some("@")).as_str(), "id:7");
    }

    #[test]
    fn ended_at_exact_deadline() {
        let now = Utc::now();
        let raffle = Raffle::new("1", Some(now));
        assert!(raffle.is_ended(now));
        assert!(!raffle.is_ended(now - Duration::seconds(1)));
    }

    #[test]
    fn raffle_without_deadline_never_ends() {
        let raffle = Raffle::new("1", None);
        assert!(!raffle.is_ended(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn add_participant_keeps_keys_unique() {
        let mut raffle = Raffle::new("1", None);
        assert!(raffle.add_participant("@alice"));
        assert!(!raffle.add_participant("@alice"));
        assert!(raffle.add_participant("id:9"));
        assert_eq!(raffle.participants, vec!["@alice", "id:9"]);
    }

    #[test]
    fn legacy_record_without_optional_fields_loads() {
        let json = r#"{"endAt":"2030-01-01T00:00:00Z","participants":["@bob"],"channels":["@newsch"]}"#;
        let raffle: Raffle = serde_json::from_str(json).unwrap();
        assert_eq!(raffle.participants, vec!["@bob"]);
        assert_eq!(raffle.winner_count, DEFAULT_WINNER_COUNT);
        assert!(!raffle.is_drawn());
        assert!(!raffle.announced);
    }
}
