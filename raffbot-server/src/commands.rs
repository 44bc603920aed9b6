// One-shot administrative commands working directly on the store file.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use raffbot_core::api::responses::format_timestamp;
use raffbot_core::services::{NewRaffle, RaffleService};
use raffbot_core::{Error, RaffleStore};

use crate::CreateArgs;

async fn open_service(store_path: &Path) -> Result<RaffleService, Error> {
    let store = RaffleStore::open(store_path).await?;
    Ok(RaffleService::new(Arc::new(store)))
}

pub async fn create(store_path: &Path, args: CreateArgs) -> Result<(), Error> {
    let duration = chrono::Duration::try_minutes(args.duration_mins)
        .ok_or_else(|| Error::Invalid(format!("duration of {} minutes is out of range", args.duration_mins)))?;
    let service = open_service(store_path).await?;
    let raffle = service
        .create_raffle(NewRaffle {
            id: args.id,
            duration,
            channels: args.channels,
            winner_count: args.winners,
            announce_chat: args.announce_chat,
        })
        .await?;

    println!("Created raffle {}", raffle.id);
    if let Some(end_at) = raffle.end_at {
        println!("  ends:     {}", format_timestamp(end_at));
    }
    if !raffle.channels.is_empty() {
        println!("  requires: {}", raffle.channels.join(", "));
    }
    println!("  winners:  {}", raffle.winner_count);
    Ok(())
}

pub async fn list(store_path: &Path) -> Result<(), Error> {
    let service = open_service(store_path).await?;
    let raffles = service.list_raffles().await;
    if raffles.is_empty() {
        println!("No raffles.");
        return Ok(());
    }

    let now = Utc::now();
    for raffle in raffles {
        let status = if raffle.is_drawn() {
            "drawn"
        } else if raffle.is_ended(now) {
            "ended"
        } else {
            "open"
        };
        let end = raffle.end_at.map(format_timestamp).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<6} ends={} participants={}",
            raffle.id,
            status,
            end,
            raffle.participants.len()
        );
    }
    Ok(())
}

pub async fn show(store_path: &Path, id: &str) -> Result<(), Error> {
    let service = open_service(store_path).await?;
    let raffle = service.get_raffle(id).await?;

    println!("Raffle {}", raffle.id);
    println!(
        "  ends:         {}",
        raffle.end_at.map(format_timestamp).unwrap_or_else(|| "never".to_string())
    );
    println!("  channels:     {}", raffle.channels.join(", "));
    println!("  participants: {}", raffle.participants.len());
    for p in &raffle.participants {
        println!("    {}", p);
    }
    if let Some(winners) = &raffle.winners {
        println!("  winners:      {}", winners.join(", "));
    }
    Ok(())
}

pub async fn draw(store_path: &Path, id: &str) -> Result<(), Error> {
    let service = open_service(store_path).await?;
    let winners = service.draw_winners(id).await?;
    if winners.is_empty() {
        println!("Raffle {} had no participants.", id);
    } else {
        println!("Winners of raffle {}:", id);
        for (i, w) in winners.iter().enumerate() {
            println!("  {}. {}", i + 1, w);
        }
    }
    Ok(())
}
