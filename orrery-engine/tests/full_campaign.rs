//! Full campaigns against the bundled demo configurations.

use orrery_engine::{
    Engine, Fact, SessionStatus, decode_to_seed, encode_friendly,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn load_salvage() -> Engine {
    Engine::from_json(include_str!("../../orrery-cli/assets/salvage.json")).unwrap()
}

fn load_homestead() -> Engine {
    Engine::from_json(include_str!("../../orrery-cli/assets/homestead.json")).unwrap()
}

fn run_random_campaign(engine: &Engine, seed: u64, cap: u32) -> SessionStatus {
    let mut session = engine.create_session(seed);
    let mut picker = ChaCha8Rng::seed_from_u64(seed);
    while session.status() == SessionStatus::Running && session.turn() < cap {
        let available = engine.available_actions(&session);
        if available.is_empty() {
            break;
        }
        let action = &available[picker.gen_range(0..available.len())];
        let report = engine.submit(&mut session, action).unwrap();
        assert!(report.is_accepted());
    }

    // History is append-only and consistent with the turn counter.
    assert_eq!(session.history().len() as u32, session.turn());
    for (index, record) in session.history().iter().enumerate() {
        assert_eq!(record.turn as usize, index + 1);
        assert!(
            record
                .facts
                .iter()
                .any(|fact| matches!(fact, Fact::ActionResolved { .. }))
        );
    }
    session.status()
}

#[test]
fn salvage_campaigns_end_or_hit_cap() {
    let engine = load_salvage();
    for seed in [1337u64, 4242, 90_210] {
        let status = run_random_campaign(&engine, seed, 1500);
        // The 1000-turn safeguard rule guarantees termination below the cap.
        assert!(status.is_over(), "seed {seed} still running");
    }
}

#[test]
fn homestead_campaigns_end_or_hit_cap() {
    let engine = load_homestead();
    for seed in [7u64, 2024] {
        let status = run_random_campaign(&engine, seed, 1000);
        assert!(status.is_over(), "seed {seed} still running");
    }
}

#[test]
fn homestead_plant_rolls_default_field_table() {
    let engine = load_homestead();
    let mut session = engine.create_session(31);

    let report = engine.submit(&mut session, "plant").unwrap();
    assert!(report.is_accepted());

    let record = &session.history()[0];
    let field_table = engine.config().event_tables.get("field").unwrap();
    let event = record.event.as_deref().expect("default table must roll");
    assert!(
        field_table.events.iter().any(|e| e.id == event),
        "event `{event}` not in the field table"
    );
}

#[test]
fn salvage_sell_requires_cargo() {
    let engine = load_salvage();
    let mut session = engine.create_session(8);

    // Fresh ship has no cargo; sell must be rejected and unlisted.
    assert!(!engine.available_actions(&session).contains(&"sell".to_string()));
    let report = engine.submit(&mut session, "sell").unwrap();
    assert!(!report.is_accepted());
    assert_eq!(session.turn(), 0);
}

#[test]
fn friendly_codes_reproduce_campaigns() {
    let engine = load_salvage();
    let seed = decode_to_seed("COMET17").unwrap();

    let status_a = run_random_campaign(&engine, seed, 1500);
    let status_b = run_random_campaign(&engine, seed, 1500);
    assert_eq!(status_a, status_b);
    assert_eq!(encode_friendly(seed), "COMET17");
}

#[test]
fn demo_configs_validate_cleanly() {
    // Engine construction validates; reaching here means both parsed.
    let salvage = load_salvage();
    let homestead = load_homestead();
    assert!(!salvage.config().resources.is_empty());
    assert!(!homestead.config().resources.is_empty());
    assert!(salvage.config().event_tables.get("deep_space").is_some());
    assert!(homestead.config().default_events.as_deref() == Some("field"));
}
