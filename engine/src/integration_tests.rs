//! Cross-component scenarios exercising the engine the way a transport
//! would: actions in, structured responses out, with the mock store
//! standing in for the external account store.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use wheelhouse_types::api::{Action, PaymentResponse, Response, SpinResponse};
use wheelhouse_types::{Catalog, SkinKind, Tier, STARTING_SPINS};

use crate::engine::Engine;
use crate::mocks::Memory;
use crate::referral::encode_referral_code;

fn engine() -> Engine<Memory> {
    Engine::new(Memory::default(), Catalog::default())
}

#[tokio::test]
async fn a_full_player_journey_stays_coherent() {
    let engine = engine();

    // New player arrives via a referral link.
    let code = encode_referral_code(100);
    engine.claim_referral(&code, 200).await.unwrap();

    // They spin a few times on the referral credits.
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let mut winnings = 0u64;
    for _ in 0..3 {
        match engine.spin_with_rng(200, 1, &mut rng).await.unwrap() {
            SpinResponse::Spun { final_prize, .. } => winnings += final_prize,
            SpinResponse::NoSpins { .. } => panic!("credits should remain"),
        }
    }

    // They buy the plus tier and a skin through the provider flow.
    engine
        .confirm_payment("ch_tier", "200:tier:plus", 700)
        .await
        .unwrap();
    engine
        .confirm_payment("ch_skin", "200:skin_bg:1", 100)
        .await
        .unwrap();

    let account = engine.ledger().read(200).await.unwrap().unwrap();
    assert_eq!(account.balance, 200 + winnings);
    assert_eq!(account.spins_left, STARTING_SPINS + 20 - 3);
    assert_eq!(account.tier, Tier::Plus);
    assert_eq!(account.invites, 0);

    let unlock = engine.unlock(200, SkinKind::Background, 1).await.unwrap();
    assert!(unlock.already_owned);

    // Their referrer was credited exactly once.
    let referrer = engine.ledger().read(100).await.unwrap().unwrap();
    assert_eq!(referrer.balance, 200);
    assert_eq!(referrer.invites, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spins_never_overdraw_credits() {
    let engine = Arc::new(engine());
    engine.ledger().get_or_create(1, 0).await.unwrap();

    // 20 starting credits, five concurrent turbo-5 spins: exactly four can
    // settle, one must be turned away, and credits end at zero.
    let mut handles = Vec::new();
    for _ in 0..5 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move { engine.spin(1, 5).await }));
    }
    let mut settled = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            SpinResponse::Spun { .. } => settled += 1,
            SpinResponse::NoSpins { .. } => rejected += 1,
        }
    }
    assert_eq!(settled, 4);
    assert_eq!(rejected, 1);

    let account = engine.ledger().read(1).await.unwrap().unwrap();
    assert_eq!(account.spins_left, 0);
}

#[tokio::test]
async fn transport_json_round_trips_through_dispatch() {
    let engine = engine();

    let action: Action = serde_json::from_str(
        r#"{"action":"grant_reward","account":4,"coins":150,"spins":5,"tickets":1}"#,
    )
    .unwrap();
    let response = engine.handle(action).await.unwrap();
    let rendered = serde_json::to_value(&response).unwrap();
    assert_eq!(rendered["op"], "reward");
    assert_eq!(rendered["balance"], 150);
    assert_eq!(rendered["spins_left"], STARTING_SPINS as u64 + 5);
    assert_eq!(rendered["golden_tickets"], 1);

    let action: Action = serde_json::from_str(
        r#"{"action":"pre_checkout","claimed_amount":250,"payload":"4:bundle:medium"}"#,
    )
    .unwrap();
    let response = engine.handle(action).await.unwrap();
    assert_eq!(
        serde_json::to_value(&response).unwrap()["status"],
        "approved"
    );
}

#[tokio::test]
async fn payment_replays_across_dispatch_remain_idempotent() {
    let engine = engine();
    let confirm = Action::PaymentConfirmed {
        charge_id: "ch_9".to_string(),
        payload: "9:bundle:mini".to_string(),
        amount_paid: 100,
    };
    let first = engine.handle(confirm.clone()).await.unwrap();
    assert!(matches!(
        first,
        Response::Payment(PaymentResponse::Applied { .. })
    ));
    let second = engine.handle(confirm).await.unwrap();
    assert!(matches!(
        second,
        Response::Payment(PaymentResponse::Duplicate)
    ));

    let account = engine.ledger().read(9).await.unwrap().unwrap();
    assert_eq!(account.balance, 100);
    assert_eq!(account.golden_tickets, 0);
}
