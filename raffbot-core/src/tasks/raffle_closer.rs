// src/tasks/raffle_closer.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use raffbot_common::models::Raffle;
use raffbot_common::traits::RaffleNotifier;

use crate::services::RaffleService;
use crate::Error;

/// Spawns a background task that draws and announces ended raffles every
/// `every`.
pub fn spawn_raffle_closer(
    raffles: Arc<RaffleService>,
    notifier: Option<Arc<dyn RaffleNotifier>>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = close_ended_raffles(&raffles, notifier.as_deref(), Utc::now()).await {
                error!("Raffle closer run failed: {:?}", e);
            }
        }
    })
}

/// One closer pass:
///  1. draw winners for every ended raffle that has none yet
///  2. post results for drawn raffles that have an announcement chat
///
/// A failed announcement is left for the next pass. Returns how many raffles
/// were drawn in this pass.
pub async fn close_ended_raffles(
    raffles: &RaffleService,
    notifier: Option<&dyn RaffleNotifier>,
    now: DateTime<Utc>,
) -> Result<usize, Error> {
    let mut drawn = 0;

    for raffle in raffles.list_raffles().await {
        if !raffle.is_ended(now) {
            continue;
        }

        let winners = match &raffle.winners {
            Some(winners) => winners.clone(),
            None => match raffles.draw_winners_at(&raffle.id, now).await {
                Ok(winners) => {
                    drawn += 1;
                    winners
                }
                Err(e) => {
                    error!("Could not draw raffle id={}: {:?}", raffle.id, e);
                    continue;
                }
            },
        };

        let (Some(chat), Some(notifier)) = (raffle.announce_chat.as_deref(), notifier) else {
            continue;
        };
        if raffle.announced {
            continue;
        }

        match notifier.announce(chat, &announcement_text(&raffle, &winners)).await {
            Ok(()) => {
                if let Err(e) = raffles.mark_announced(&raffle.id).await {
                    error!("Announced raffle id={} but could not record it: {:?}", raffle.id, e);
                    continue;
                }
                info!("Announced results of raffle id={} in {}", raffle.id, chat);
            }
            Err(e) => {
                warn!("Could not announce raffle id={} in {}: {}", raffle.id, chat, e);
            }
        }
    }

    Ok(drawn)
}

pub fn announcement_text(raffle: &Raffle, winners: &[String]) -> String {
    if winners.is_empty() {
        return format!("Raffle #{} has ended with no participants.", raffle.id);
    }

    let mut text = format!(
        "Raffle #{} has ended! {} participant(s).\n\nWinners:",
        raffle.id,
        raffle.participants.len()
    );
    for (i, winner) in winners.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, winner));
    }
    text
}
