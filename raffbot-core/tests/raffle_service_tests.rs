// tests/raffle_service_tests.rs

use chrono::{Duration, Utc};

use raffbot_core::services::{NewRaffle, RaffleService};
use raffbot_core::store::read_store_file;
use raffbot_core::test_utils::helpers::temp_store;
use raffbot_core::Error;

#[tokio::test]
async fn test_create_computes_expiry_and_numeric_ids() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store.clone());
    let now = Utc::now();

    let first = service.create_raffle_at(NewRaffle::lasting(Duration::minutes(30)), now).await?;
    let second = service.create_raffle_at(NewRaffle::lasting(Duration::hours(2)), now).await?;

    assert_eq!(first.id, "1");
    assert_eq!(second.id, "2");
    assert_eq!(first.end_at, Some(now + Duration::minutes(30)));
    assert_eq!(second.end_at, Some(now + Duration::hours(2)));
    assert_eq!(first.created_at, Some(now));
    assert!(first.participants.is_empty());

    let persisted = read_store_file(store.path()).await?;
    assert_eq!(persisted.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_create_with_explicit_id_and_channels() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store);

    let raffle = service
        .create_raffle(NewRaffle {
            id: Some(" 42 ".into()),
            duration: Duration::hours(1),
            channels: vec!["newsch".into(), "@newsch".into(), " ".into()],
            winner_count: 2,
            announce_chat: Some("@results".into()),
        })
        .await?;

    assert_eq!(raffle.id, "42");
    assert_eq!(raffle.channels, vec!["@newsch"]);
    assert_eq!(raffle.winner_count, 2);
    assert_eq!(raffle.announce_chat.as_deref(), Some("@results"));

    let next = service.create_raffle(NewRaffle::lasting(Duration::hours(1))).await?;
    assert_eq!(next.id, "43");
    Ok(())
}

#[tokio::test]
async fn test_create_rejects_bad_input() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store);

    let res = service.create_raffle(NewRaffle::lasting(Duration::zero())).await;
    assert!(matches!(res, Err(Error::Invalid(_))));

    let mut zero_winners = NewRaffle::lasting(Duration::hours(1));
    zero_winners.winner_count = 0;
    assert!(matches!(service.create_raffle(zero_winners).await, Err(Error::Invalid(_))));

    let mut blank_id = NewRaffle::lasting(Duration::hours(1));
    blank_id.id = Some("  ".into());
    assert!(matches!(service.create_raffle(blank_id).await, Err(Error::Invalid(_))));

    let mut taken = NewRaffle::lasting(Duration::hours(1));
    taken.id = Some("dup".into());
    service.create_raffle(taken.clone()).await?;
    assert!(matches!(service.create_raffle(taken).await, Err(Error::Conflict(_))));

    assert_eq!(service.list_raffles().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_get_unknown_raffle() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store);

    assert!(matches!(service.get_raffle("nope").await, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_list_orders_ids() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store);
    for id in ["10", "summer", "9"] {
        let mut new = NewRaffle::lasting(Duration::hours(1));
        new.id = Some(id.into());
        service.create_raffle(new).await?;
    }

    let ids: Vec<String> = service.list_raffles().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["9", "10", "summer"]);
    Ok(())
}

#[tokio::test]
async fn test_draw_only_after_end_and_only_once() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store.clone());
    let now = Utc::now();

    let mut new = NewRaffle::lasting(Duration::minutes(10));
    new.winner_count = 2;
    let raffle = service.create_raffle_at(new, now).await?;
    store.mutate(|raffles: &mut raffbot_core::store::RaffleMap| -> Result<(), Error> {
        if let Some(r) = raffles.get_mut(&raffle.id) {
            for p in ["@a", "@b", "@c", "@d"] {
                r.add_participant(p);
            }
        }
        Ok(())
    }).await?;

    let early = service.draw_winners_at(&raffle.id, now + Duration::minutes(5)).await;
    assert!(matches!(early, Err(Error::InvalidState(_))));

    let after = now + Duration::minutes(11);
    let winners = service.draw_winners_at(&raffle.id, after).await?;
    assert_eq!(winners.len(), 2);
    assert_ne!(winners[0], winners[1]);

    let again = service.draw_winners_at(&raffle.id, after).await?;
    assert_eq!(again, winners, "a drawn raffle keeps its winners");

    let persisted = read_store_file(store.path()).await?;
    assert_eq!(persisted[&raffle.id].winners.as_ref(), Some(&winners));
    Ok(())
}

#[tokio::test]
async fn test_draw_empty_raffle() -> Result<(), Error> {
    let (_dir, store) = temp_store().await?;
    let service = RaffleService::new(store);
    let now = Utc::now();
    let raffle = service.create_raffle_at(NewRaffle::lasting(Duration::minutes(1)), now).await?;

    let winners = service.draw_winners_at(&raffle.id, now + Duration::minutes(2)).await?;
    assert!(winners.is_empty());
    assert!(service.get_raffle(&raffle.id).await?.is_drawn());
    Ok(())
}
