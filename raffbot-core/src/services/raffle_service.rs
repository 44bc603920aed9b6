use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::seq::index;
use tracing::info;

use raffbot_common::models::{Raffle, DEFAULT_WINNER_COUNT};

use crate::store::{RaffleMap, RaffleStore};
use crate::Error;

/// Parameters for a new raffle.
#[derive(Debug, Clone)]
pub struct NewRaffle {
    /// Explicit id; the next free numeric id is used when absent.
    pub id: Option<String>,
    pub duration: Duration,
    pub channels: Vec<String>,
    pub winner_count: u32,
    pub announce_chat: Option<String>,
}

impl NewRaffle {
    pub fn lasting(duration: Duration) -> Self {
        Self {
            id: None,
            duration,
            channels: Vec::new(),
            winner_count: DEFAULT_WINNER_COUNT,
            announce_chat: None,
        }
    }
}

/// Creates raffles and answers questions about them.
pub struct RaffleService {
    store: Arc<RaffleStore>,
}

impl RaffleService {
    pub fn new(store: Arc<RaffleStore>) -> Self {
        Self { store }
    }

    pub async fn get_raffle(&self, id: &str) -> Result<Raffle, Error> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("raffle '{}'", id)))
    }

    /// All raffles, numeric ids first in numeric order, then the rest by name.
    pub async fn list_raffles(&self) -> Vec<Raffle> {
        let mut raffles = self.store.list().await;
        raffles.sort_by(|a, b| compare_ids(&a.id, &b.id));
        raffles
    }

    pub async fn create_raffle(&self, new: NewRaffle) -> Result<Raffle, Error> {
        self.create_raffle_at(new, Utc::now()).await
    }

    pub async fn create_raffle_at(&self, new: NewRaffle, now: DateTime<Utc>) -> Result<Raffle, Error> {
        if new.duration <= Duration::zero() {
            return Err(Error::Invalid("raffle duration must be positive".into()));
        }
        if new.winner_count == 0 {
            return Err(Error::Invalid("a raffle needs at least one winner".into()));
        }
        let explicit_id = match new.id.as_deref().map(str::trim) {
            Some("") => return Err(Error::Invalid("raffle id must not be empty".into())),
            Some(id) => Some(id.to_string()),
            None => None,
        };
        let end_at = now
            .checked_add_signed(new.duration)
            .ok_or_else(|| Error::Invalid("raffle duration is out of range".into()))?;
        let channels = normalize_channels(&new.channels);
        let announce_chat = new.announce_chat
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let raffle = self.store.mutate(|raffles: &mut RaffleMap| -> Result<Raffle, Error> {
            let id = match explicit_id {
                Some(id) if raffles.contains_key(&id) => {
                    return Err(Error::Conflict(format!("raffle '{}' already exists", id)));
                }
                Some(id) => id,
                None => next_numeric_id(raffles.keys()),
            };

            let mut raffle = Raffle::new(id.clone(), Some(end_at)).with_channels(channels);
            raffle.created_at = Some(now);
            raffle.winner_count = new.winner_count;
            raffle.announce_chat = announce_chat;
            raffles.insert(id, raffle.clone());
            Ok(raffle)
        }).await?;

        info!(
            "Created raffle id={} ending {} with {} required channel(s)",
            raffle.id, end_at, raffle.channels.len()
        );
        Ok(raffle)
    }

    /// Picks winners for an ended raffle and stores them. A raffle that has
    /// already been drawn keeps its winners.
    pub async fn draw_winners(&self, id: &str) -> Result<Vec<String>, Error> {
        self.draw_winners_at(id, Utc::now()).await
    }

    pub async fn draw_winners_at(&self, id: &str, now: DateTime<Utc>) -> Result<Vec<String>, Error> {
        let (winners, fresh) = self.store.mutate(|raffles: &mut RaffleMap| -> Result<_, Error> {
            let raffle = raffles
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(format!("raffle '{}'", id)))?;
            if let Some(winners) = &raffle.winners {
                return Ok((winners.clone(), false));
            }
            if !raffle.is_ended(now) {
                return Err(Error::InvalidState(format!("raffle '{}' has not ended yet", id)));
            }

            let winners = pick_winners(&raffle.participants, raffle.winner_count as usize);
            raffle.winners = Some(winners.clone());
            Ok((winners, true))
        }).await?;

        if fresh {
            info!("Drew {} winner(s) for raffle id={}: {:?}", winners.len(), id, winners);
        }
        Ok(winners)
    }

    pub async fn mark_announced(&self, id: &str) -> Result<(), Error> {
        self.store.mutate(|raffles: &mut RaffleMap| -> Result<(), Error> {
            let raffle = raffles
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(format!("raffle '{}'", id)))?;
            raffle.announced = true;
            Ok(())
        }).await
    }
}

fn pick_winners(participants: &[String], count: usize) -> Vec<String> {
    let amount = count.min(participants.len());
    let mut rng = rand::rng();
    index::sample(&mut rng, participants.len(), amount)
        .into_iter()
        .map(|i| participants[i].clone())
        .collect()
}

/// Trims, drops empties and duplicates, and turns bare channel names into
/// `@name` so they are valid Bot API chat ids. Numeric chat ids are kept.
pub fn normalize_channels(channels: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for channel in channels {
        let channel = channel.trim();
        if channel.is_empty() || channel == "@" {
            continue;
        }
        let channel = if channel.starts_with('@') || channel.parse::<i64>().is_ok() {
            channel.to_string()
        } else {
            format!("@{channel}")
        };
        if !out.contains(&channel) {
            out.push(channel);
        }
    }
    out
}

fn next_numeric_id<'a>(ids: impl Iterator<Item = &'a String>) -> String {
    let max = ids.filter_map(|id| id.parse::<u64>().ok()).max().unwrap_or(0);
    (max + 1).to_string()
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
