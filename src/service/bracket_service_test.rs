use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{SeedBracketRequest, Tournament, TournamentStatus};
use crate::service::bracket_service::{BracketError, BracketService};
use crate::store::{InMemoryStore, MatchStore};

fn tournament(capacity: i32) -> Tournament {
    let now = Utc::now();
    Tournament {
        id: Uuid::new_v4(),
        name: "Saturday Open".to_string(),
        game: "Tekken 8".to_string(),
        status: TournamentStatus::Upcoming,
        tier_requirement: None,
        entry_fee_cents: 1000,
        prize: Some("Free play credit".to_string()),
        capacity,
        rounds: None,
        starts_at: now,
        created_at: now,
        updated_at: now,
    }
}

/// Store + service with a freshly seeded bracket of `field` players.
async fn seeded(
    field: usize,
    capacity: i32,
) -> (Arc<InMemoryStore>, Arc<BracketService>, Uuid, Vec<Uuid>) {
    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(BracketService::new(store.clone()));
    let t = tournament(capacity);
    store.insert_tournament(&t).await.unwrap();

    let players: Vec<Uuid> = (0..field).map(|_| Uuid::new_v4()).collect();
    service
        .seed_bracket(
            t.id,
            SeedBracketRequest {
                player_ids: players.clone(),
            },
        )
        .await
        .unwrap();

    (store, service, t.id, players)
}

// =============================================================================
// RECORD WINNER
// =============================================================================

#[tokio::test]
async fn test_record_winner_sets_only_the_winner() {
    let (store, service, tid, _) = seeded(4, 4).await;
    let first = store.list_matches(tid).await.unwrap().remove(0);
    let winner = first.player1_id.unwrap();

    let outcome = service.record_winner(tid, first.id, winner).await.unwrap();

    assert_eq!(outcome.decided.winner_id, Some(winner));
    assert_eq!(outcome.decided.player1_id, first.player1_id);
    assert_eq!(outcome.decided.player2_id, first.player2_id);

    let stored = store.get_match(tid, first.id).await.unwrap().unwrap();
    assert_eq!(stored.winner_id, Some(winner));
    assert_eq!(stored.player1_id, first.player1_id);
    assert_eq!(stored.player2_id, first.player2_id);
}

#[tokio::test]
async fn test_unseated_winner_is_rejected_without_mutation() {
    let (store, service, tid, _) = seeded(4, 4).await;
    let before = store.list_matches(tid).await.unwrap();
    let target = before[0].clone();

    let err = service
        .record_winner(tid, target.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::InvalidWinner(_)));

    let after = store.list_matches(tid).await.unwrap();
    assert_eq!(after.len(), before.len());
    let stored = store.get_match(tid, target.id).await.unwrap().unwrap();
    assert!(stored.winner_id.is_none());
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let (store, service, tid, _) = seeded(4, 4).await;
    let real_match = store.list_matches(tid).await.unwrap().remove(0);

    let err = service
        .record_winner(tid, Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::MatchNotFound));

    let err = service
        .record_winner(Uuid::new_v4(), real_match.id, real_match.player1_id.unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::TournamentNotFound));
}

#[tokio::test]
async fn test_match_is_scoped_to_its_tournament() {
    let (store, service, tid, _) = seeded(4, 4).await;
    let foreign = tournament(4);
    store.insert_tournament(&foreign).await.unwrap();

    let m = store.list_matches(tid).await.unwrap().remove(0);
    let err = service
        .record_winner(foreign.id, m.id, m.player1_id.unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::MatchNotFound));
}

#[tokio::test]
async fn test_even_and_odd_indices_take_opposite_seats() {
    // Round 1 index 2 is a left feeder into round 2 index 1; index 3 is the
    // right feeder into the same match.
    let (store, service, tid, _) = seeded(8, 8).await;
    let round1 = store.list_matches(tid).await.unwrap();
    let even = round1.iter().find(|m| m.match_index == 2).unwrap().clone();
    let odd = round1.iter().find(|m| m.match_index == 3).unwrap().clone();

    let even_winner = even.player2_id.unwrap();
    let outcome = service.record_winner(tid, even.id, even_winner).await.unwrap();
    let next = outcome.next_match.unwrap();
    assert_eq!(next.round, 2);
    assert_eq!(next.match_index, 1);
    assert_eq!(next.player1_id, Some(even_winner));
    assert_eq!(next.player2_id, None);
    assert!(next.winner_id.is_none());

    let odd_winner = odd.player1_id.unwrap();
    let outcome = service.record_winner(tid, odd.id, odd_winner).await.unwrap();
    let next = outcome.next_match.unwrap();
    assert_eq!(next.round, 2);
    assert_eq!(next.match_index, 1);
    assert_eq!(next.player1_id, Some(even_winner));
    assert_eq!(next.player2_id, Some(odd_winner));
}

#[tokio::test]
async fn test_double_record_fails_and_propagates_once() {
    let (store, service, tid, _) = seeded(4, 4).await;
    let m = store.list_matches(tid).await.unwrap().remove(0);
    let winner = m.player1_id.unwrap();
    let runner_up = m.player2_id.unwrap();

    service.record_winner(tid, m.id, winner).await.unwrap();
    let err = service.record_winner(tid, m.id, runner_up).await.unwrap_err();
    assert!(matches!(err, BracketError::AlreadyDecided));

    let round2: Vec<_> = store
        .list_matches(tid)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.round == 2)
        .collect();
    assert_eq!(round2.len(), 1);
    assert_eq!(round2[0].player1_id, Some(winner));
    assert_eq!(round2[0].player2_id, None);
}

#[tokio::test]
async fn test_final_crowns_champion_without_propagating() {
    let (store, service, tid, players) = seeded(2, 2).await;
    let the_final = store.list_matches(tid).await.unwrap().remove(0);
    assert_eq!(the_final.round, 1);

    let outcome = service
        .record_winner(tid, the_final.id, players[1])
        .await
        .unwrap();

    assert!(outcome.next_match.is_none());
    assert_eq!(outcome.champion, Some(players[1]));
    assert_eq!(store.list_matches(tid).await.unwrap().len(), 1);

    let t = store.get_tournament(tid).await.unwrap().unwrap();
    assert_eq!(t.status, TournamentStatus::Completed);
}

#[tokio::test]
async fn test_underfull_field_final_is_the_seeded_draws_final() {
    // Two entrants in a capacity-8 tournament play a one-round bracket.
    let (store, service, tid, players) = seeded(2, 8).await;
    let the_final = store.list_matches(tid).await.unwrap().remove(0);

    let outcome = service
        .record_winner(tid, the_final.id, players[0])
        .await
        .unwrap();

    assert!(outcome.next_match.is_none());
    assert_eq!(outcome.champion, Some(players[0]));
    let t = store.get_tournament(tid).await.unwrap().unwrap();
    assert_eq!(t.status, TournamentStatus::Completed);
    assert_eq!(t.rounds, Some(1));
}

#[tokio::test]
async fn test_eight_player_bracket_end_to_end() {
    let (store, service, tid, _) = seeded(8, 8).await;
    let round1 = store.list_matches(tid).await.unwrap();
    assert_eq!(round1.len(), 4);

    // Winners recorded in arbitrary order.
    let mut winners = [Uuid::nil(); 4];
    for index in [2usize, 0, 3, 1] {
        let m = round1.iter().find(|m| m.match_index == index as i32).unwrap();
        let winner = m.player1_id.unwrap();
        winners[index] = winner;
        service.record_winner(tid, m.id, winner).await.unwrap();
    }

    let round2: Vec<_> = store
        .list_matches(tid)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.round == 2)
        .collect();
    assert_eq!(round2.len(), 2);
    assert_eq!(round2[0].player1_id, Some(winners[0]));
    assert_eq!(round2[0].player2_id, Some(winners[1]));
    assert_eq!(round2[1].player1_id, Some(winners[2]));
    assert_eq!(round2[1].player2_id, Some(winners[3]));

    for m in &round2 {
        service
            .record_winner(tid, m.id, m.player2_id.unwrap())
            .await
            .unwrap();
    }

    let the_final: Vec<_> = store
        .list_matches(tid)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.round == 3)
        .collect();
    assert_eq!(the_final.len(), 1);
    assert_eq!(the_final[0].match_index, 0);
    assert_eq!(the_final[0].player1_id, Some(winners[1]));
    assert_eq!(the_final[0].player2_id, Some(winners[3]));

    let outcome = service
        .record_winner(tid, the_final[0].id, winners[3])
        .await
        .unwrap();
    assert_eq!(outcome.champion, Some(winners[3]));
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_siblings_never_lose_an_update() {
    for _ in 0..100 {
        let (store, service, tid, _) = seeded(4, 4).await;
        let round1 = store.list_matches(tid).await.unwrap();
        let left = round1[0].clone();
        let right = round1[1].clone();
        let left_winner = left.player1_id.unwrap();
        let right_winner = right.player2_id.unwrap();

        let a = {
            let service = service.clone();
            tokio::spawn(async move { service.record_winner(tid, left.id, left_winner).await })
        };
        let b = {
            let service = service.clone();
            tokio::spawn(async move { service.record_winner(tid, right.id, right_winner).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let round2: Vec<_> = store
            .list_matches(tid)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.round == 2)
            .collect();
        assert_eq!(round2.len(), 1);
        assert_eq!(round2[0].player1_id, Some(left_winner));
        assert_eq!(round2[0].player2_id, Some(right_winner));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_double_record_decides_exactly_once() {
    for _ in 0..100 {
        let (store, service, tid, _) = seeded(4, 4).await;
        let m = store.list_matches(tid).await.unwrap().remove(0);
        let p1 = m.player1_id.unwrap();
        let p2 = m.player2_id.unwrap();

        let a = {
            let service = service.clone();
            let id = m.id;
            tokio::spawn(async move { service.record_winner(tid, id, p1).await })
        };
        let b = {
            let service = service.clone();
            let id = m.id;
            tokio::spawn(async move { service.record_winner(tid, id, p2).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

        let decided = store.get_match(tid, m.id).await.unwrap().unwrap();
        let winner = decided.winner_id.unwrap();

        let round2: Vec<_> = store
            .list_matches(tid)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.round == 2)
            .collect();
        assert_eq!(round2.len(), 1);
        assert_eq!(round2[0].player1_id, Some(winner));
        assert_eq!(round2[0].player2_id, None);
    }
}

// =============================================================================
// SEEDING
// =============================================================================

#[tokio::test]
async fn test_seed_full_draw_has_no_byes() {
    let (store, _, tid, players) = seeded(4, 4).await;
    let round1 = store.list_matches(tid).await.unwrap();
    assert_eq!(round1.len(), 2);

    // Seed i meets mirrored seed (draw - 1 - i).
    assert_eq!(round1[0].player1_id, Some(players[0]));
    assert_eq!(round1[0].player2_id, Some(players[3]));
    assert_eq!(round1[1].player1_id, Some(players[1]));
    assert_eq!(round1[1].player2_id, Some(players[2]));
    assert!(round1.iter().all(|m| m.winner_id.is_none()));

    let t = store.get_tournament(tid).await.unwrap().unwrap();
    assert_eq!(t.status, TournamentStatus::Ongoing);
}

#[tokio::test]
async fn test_seed_short_field_auto_advances_byes() {
    let (store, _, tid, players) = seeded(5, 8).await;
    let matches = store.list_matches(tid).await.unwrap();

    let round1: Vec<_> = matches.iter().filter(|m| m.round == 1).collect();
    assert_eq!(round1.len(), 4);

    // Three byes, auto-won by their sole player; one real pairing.
    for index in 0..3 {
        assert_eq!(round1[index].player1_id, Some(players[index]));
        assert!(round1[index].player2_id.is_none());
        assert_eq!(round1[index].winner_id, Some(players[index]));
    }
    assert_eq!(round1[3].player1_id, Some(players[3]));
    assert_eq!(round1[3].player2_id, Some(players[4]));
    assert!(round1[3].winner_id.is_none());

    // Bye winners are already seated in round 2.
    let round2: Vec<_> = matches.iter().filter(|m| m.round == 2).collect();
    assert_eq!(round2.len(), 2);
    assert_eq!(round2[0].player1_id, Some(players[0]));
    assert_eq!(round2[0].player2_id, Some(players[1]));
    assert_eq!(round2[1].player1_id, Some(players[2]));
    assert!(round2[1].player2_id.is_none());
}

#[tokio::test]
async fn test_bye_walkover_reaches_the_final() {
    let (store, service, tid, players) = seeded(3, 4).await;
    let round1 = store.list_matches(tid).await.unwrap();
    let real = round1
        .iter()
        .find(|m| m.round == 1 && !m.is_bye())
        .unwrap()
        .clone();

    service
        .record_winner(tid, real.id, players[2])
        .await
        .unwrap();

    let the_final: Vec<_> = store
        .list_matches(tid)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.round == 2)
        .collect();
    assert_eq!(the_final.len(), 1);
    assert_eq!(the_final[0].player1_id, Some(players[0]));
    assert_eq!(the_final[0].player2_id, Some(players[2]));
}

#[tokio::test]
async fn test_seed_rejects_bad_fields() {
    let store = Arc::new(InMemoryStore::new());
    let service = BracketService::new(store.clone());
    let t = tournament(4);
    store.insert_tournament(&t).await.unwrap();

    let lone = vec![Uuid::new_v4()];
    let err = service
        .seed_bracket(t.id, SeedBracketRequest { player_ids: lone })
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::InvalidField(_)));

    let repeat = Uuid::new_v4();
    let err = service
        .seed_bracket(
            t.id,
            SeedBracketRequest {
                player_ids: vec![repeat, Uuid::new_v4(), repeat],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::InvalidField(_)));

    let oversized: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    let err = service
        .seed_bracket(
            t.id,
            SeedBracketRequest {
                player_ids: oversized,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::InvalidField(_)));
}

#[tokio::test]
async fn test_reseeding_is_rejected() {
    let (_, service, tid, _) = seeded(4, 4).await;
    let fresh: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    let err = service
        .seed_bracket(tid, SeedBracketRequest { player_ids: fresh })
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::AlreadySeeded));
}

#[tokio::test]
async fn test_bracket_view_groups_rounds() {
    let (store, service, tid, _) = seeded(8, 8).await;
    let m = store.list_matches(tid).await.unwrap().remove(0);
    service
        .record_winner(tid, m.id, m.player1_id.unwrap())
        .await
        .unwrap();

    let view = service.bracket(tid).await.unwrap();
    assert_eq!(view.tournament_id, tid);
    assert_eq!(view.rounds.len(), 2);
    assert_eq!(view.rounds[0].round, 1);
    assert_eq!(view.rounds[0].matches.len(), 4);
    assert_eq!(view.rounds[1].round, 2);
    assert_eq!(view.rounds[1].matches.len(), 1);

    let err = service.bracket(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BracketError::TournamentNotFound));
}
