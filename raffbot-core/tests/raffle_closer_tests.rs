// tests/raffle_closer_tests.rs

use chrono::{Duration, Utc};

use raffbot_core::services::{NewRaffle, RaffleService};
use raffbot_core::store::RaffleMap;
use raffbot_core::tasks::close_ended_raffles;
use raffbot_core::tasks::raffle_closer::announcement_text;
use raffbot_core::test_utils::helpers::{temp_store, RecordingNotifier};
use raffbot_core::Error;

async fn create(service: &RaffleService, id: &str, mins: i64, chat: Option<&str>) -> Result<(), Error> {
    let now = Utc::now();
    let mut new = NewRaffle::lasting(Duration::minutes(mins));
    new.id = Some(id.to_string());
    new.announce_chat = chat.map(str::to_string);
    service.create_raffle_at(new, now).await?;
    Ok(())
}

#[tokio::test]
async fn test_closer_draws_only_ended_raffles() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store.clone());
    create(&service, "short", 1, None).await?;
    create(&service, "long", 120, None).await?;
    store.mutate(|raffles: &mut RaffleMap| -> Result<(), Error> {
        if let Some(r) = raffles.get_mut("short") {
            r.add_participant("@alice");
        }
        Ok(())
    }).await?;

    let later = Utc::now() + Duration::minutes(5);
    let drawn = close_ended_raffles(&service, None, later).await?;
    assert_eq!(drawn, 1);
    assert_eq!(service.get_raffle("short").await?.winners, Some(vec!["@alice".to_string()]));
    assert!(!service.get_raffle("long").await?.is_drawn());

    // second pass has nothing left to draw
    assert_eq!(close_ended_raffles(&service, None, later).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_closer_announces_once() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store);
    create(&service, "7", 1, Some("@results")).await?;
    let notifier = RecordingNotifier::new();

    let later = Utc::now() + Duration::minutes(5);
    close_ended_raffles(&service, Some(&notifier), later).await?;
    close_ended_raffles(&service, Some(&notifier), later).await?;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "@results");
    assert!(sent[0].1.contains("#7"));
    assert!(service.get_raffle("7").await?.announced);
    Ok(())
}

#[tokio::test]
async fn test_failed_announcement_is_retried() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store);
    create(&service, "7", 1, Some("@results")).await?;

    let later = Utc::now() + Duration::minutes(5);
    close_ended_raffles(&service, Some(&RecordingNotifier::failing()), later).await?;
    let raffle = service.get_raffle("7").await?;
    assert!(raffle.is_drawn());
    assert!(!raffle.announced);

    let notifier = RecordingNotifier::new();
    assert_eq!(close_ended_raffles(&service, Some(&notifier), later).await?, 0);
    assert_eq!(notifier.sent().len(), 1);
    Ok(())
}

#[test]
fn test_announcement_text_lists_winners() {
    let mut raffle = raffbot_common::models::Raffle::new("3", None);
    raffle.participants = vec!["@a".into(), "@b".into()];

    let text = announcement_text(&raffle, &["@b".to_string()]);
    assert!(text.contains("#3"));
    assert!(text.contains("2 participant(s)"));
    assert!(text.contains("1. @b"));

    let empty = announcement_text(&raffbot_common::models::Raffle::new("4", None), &[]);
    assert!(empty.contains("no participants"));
}

#[tokio::test]
async fn test_unrecorded_announcement_does_not_stop_the_pass() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store.clone());
    create(&service, "1", 1, Some("@results")).await?;
    create(&service, "2", 1, Some("@results")).await?;

    let later = Utc::now() + Duration::minutes(5);
    close_ended_raffles(&service, Some(&RecordingNotifier::failing()), later).await?;

    // a directory in the temp file's place makes every flush fail
    let mut tmp = store.path().as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::create_dir(&tmp)?;

    let notifier = RecordingNotifier::new();
    assert_eq!(close_ended_raffles(&service, Some(&notifier), later).await?, 0);
    let texts: Vec<String> = notifier.sent().into_iter().map(|(_, text)| text).collect();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("#1"));
    assert!(texts[1].contains("#2"));
    assert!(!service.get_raffle("1").await?.announced);
    Ok(())
}
