use std::{sync::Arc, time::Duration};

use lane_defence_core::{
    CellCoord, DefenderKind, Event, NullSink, Outcome, PlacementError, SellError, Tier,
    UpgradeError,
};
use lane_defence_simulation::{
    ChannelSink, LayoutConfig, SessionConfig, Simulation, SimulationError,
};
use tokio::sync::mpsc::UnboundedReceiver;

fn start(config: SessionConfig) -> (Simulation, UnboundedReceiver<Event>) {
    let (sink, receiver) = ChannelSink::new();
    let simulation = Simulation::start(config, Arc::new(sink)).expect("start session");
    (simulation, receiver)
}

fn drain(receiver: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

fn single_unit_config() -> SessionConfig {
    let mut config = SessionConfig::for_tier(Tier::Easy);
    config.waves.quota = 1;
    config.waves.count = Some(1);
    config
}

#[test]
fn starting_outside_a_runtime_is_rejected() {
    let (sink, _receiver) = ChannelSink::new();
    let error = Simulation::start(SessionConfig::for_tier(Tier::Easy), Arc::new(sink))
        .expect_err("no runtime");
    assert!(matches!(error, SimulationError::NoRuntime));
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected_before_launch() {
    let (sink, _receiver) = ChannelSink::new();
    let mut config = SessionConfig::for_tier(Tier::Easy);
    config.tick_ms = 0;
    let error = Simulation::start(config, Arc::new(sink)).expect_err("zero tick");
    assert!(matches!(error, SimulationError::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn placing_a_bolt_charges_its_price() {
    let (simulation, _receiver) = start(SessionConfig::for_tier(Tier::Easy));

    let _ = simulation
        .place_defender(DefenderKind::Bolt, CellCoord::new(0, 0))
        .expect("place bolt");

    let snapshot = simulation.snapshot();
    assert_eq!(snapshot.money, 150);
    assert_eq!(snapshot.defenders.len(), 1);
    assert_eq!(snapshot.defenders[0].level, 1);
}

#[tokio::test(start_paused = true)]
async fn placing_on_the_path_is_blocked() {
    let (simulation, _receiver) = start(SessionConfig::for_tier(Tier::Easy));

    assert_eq!(
        simulation.place_defender(DefenderKind::Bolt, CellCoord::new(1, 0)),
        Err(PlacementError::Blocked)
    );
    assert_eq!(simulation.snapshot().money, 250);
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_are_idempotent() {
    let (simulation, mut receiver) = start(SessionConfig::for_tier(Tier::Easy));

    assert!(simulation.pause());
    assert!(!simulation.pause());
    assert!(simulation.is_paused());
    assert_eq!(
        simulation.place_defender(DefenderKind::Bolt, CellCoord::new(0, 0)),
        Err(PlacementError::Paused)
    );
    assert_eq!(
        simulation.upgrade_defender(CellCoord::new(0, 0)),
        Err(UpgradeError::Paused)
    );
    assert_eq!(
        simulation.sell_defender(CellCoord::new(0, 0)),
        Err(SellError::Paused)
    );

    assert!(simulation.resume());
    assert!(!simulation.resume());

    let events = drain(&mut receiver);
    let paused = events.iter().filter(|e| **e == Event::Paused).count();
    let resumed = events.iter().filter(|e| **e == Event::Resumed).count();
    assert_eq!((paused, resumed), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_units_until_resumed() {
    let (simulation, _receiver) = start(SessionConfig::for_tier(Tier::Easy));

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert!(simulation.pause());
    let frozen = simulation.snapshot();
    assert_eq!(frozen.units.len(), 1);
    assert!(frozen.paused);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(simulation.snapshot(), frozen);

    assert!(simulation.resume());
    tokio::time::sleep(Duration::from_millis(500)).await;
    let moved = simulation.snapshot();
    assert!(!moved.paused);
    assert_ne!(moved.units[0].position, frozen.units[0].position);
}

#[tokio::test(start_paused = true)]
async fn undefended_objective_falls_to_a_single_arrival() {
    let mut config = single_unit_config();
    config.objective_hit_points = 1;
    let (simulation, mut receiver) = start(config);

    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(simulation.outcome(), Some(Outcome::Defeat));
    let snapshot = simulation.snapshot();
    assert_eq!(snapshot.objective_hit_points, 0);
    assert_eq!(snapshot.outcome, Some(Outcome::Defeat));
    assert_eq!(
        simulation.place_defender(DefenderKind::Bolt, CellCoord::new(0, 0)),
        Err(PlacementError::SessionOver)
    );
    assert!(!simulation.resume());

    let events = drain(&mut receiver);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::UnitArrived { .. })));
    let concluded: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::Concluded { .. }))
        .collect();
    assert_eq!(
        concluded,
        vec![&Event::Concluded {
            outcome: Outcome::Defeat
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn defended_lane_wins_and_pays_the_bounty() {
    let mut config = single_unit_config();
    config.starting_money = 1_000;
    let (simulation, _receiver) = start(config);

    for (column, row) in [(0, 0), (2, 0), (0, 1), (2, 1)] {
        let _ = simulation
            .place_defender(DefenderKind::Bolt, CellCoord::new(column, row))
            .expect("place bolt");
    }
    assert_eq!(simulation.snapshot().money, 600);

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(simulation.outcome(), Some(Outcome::Victory));
    let snapshot = simulation.snapshot();
    assert_eq!(snapshot.money, 610);
    assert_eq!(snapshot.objective_hit_points, 10);
    assert!(snapshot.units.iter().all(|unit| !unit.alive));
}

#[tokio::test(start_paused = true)]
async fn upgrade_and_sell_go_through_the_facade() {
    let mut config = SessionConfig::for_tier(Tier::Easy);
    config.starting_money = 500;
    let (simulation, _receiver) = start(config);
    let cell = CellCoord::new(0, 0);
    let _ = simulation
        .place_defender(DefenderKind::Bolt, cell)
        .expect("place bolt");

    assert_eq!(simulation.upgrade_defender(cell), Ok(2));
    assert_eq!(simulation.snapshot().money, 220);
    assert_eq!(simulation.sell_defender(cell), Ok(144));
    assert_eq!(simulation.snapshot().money, 364);
    assert!(simulation.snapshot().defenders.is_empty());
    assert_eq!(
        simulation.upgrade_defender(cell),
        Err(UpgradeError::NoDefender)
    );
}

#[tokio::test(start_paused = true)]
async fn restart_discards_the_previous_session() {
    let (mut simulation, _receiver) = start(SessionConfig::for_tier(Tier::Easy));
    let _ = simulation
        .place_defender(DefenderKind::Flare, CellCoord::new(0, 0))
        .expect("place flare");
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert!(simulation.pause());

    simulation.restart().expect("restart");

    let snapshot = simulation.snapshot();
    assert_eq!(snapshot.money, 250);
    assert_eq!(snapshot.wave, 1);
    assert!(snapshot.defenders.is_empty());
    assert!(snapshot.units.is_empty());
    assert!(!snapshot.paused);
    assert_eq!(snapshot.outcome, None);
    assert!(simulation
        .place_defender(DefenderKind::Flare, CellCoord::new(0, 0))
        .is_ok());
}

#[tokio::test(start_paused = true)]
async fn quitting_returns_the_final_state() {
    let (simulation, _receiver) = start(SessionConfig::for_tier(Tier::Medium));
    let _ = simulation
        .place_defender(DefenderKind::Bolt, CellCoord::new(5, 5))
        .ok();

    let snapshot = simulation.quit_to_menu();
    assert_eq!(snapshot.tier, Tier::Medium);
    assert_eq!(snapshot.outcome, None);
    assert_eq!(snapshot.total_waves, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn final_arrival_latches_defeat_on_every_worker_interleaving() {
    let mut config = single_unit_config();
    config.objective_hit_points = 1;
    config.tick_ms = 5;
    config.waves.intermission_ms = 0;
    config.waves.spawn_interval_ms = 5;
    config.layout = Some(LayoutConfig {
        waypoints: vec![(0, 0), (1, 0)],
        blocked: Vec::new(),
    });

    let sessions: Vec<Simulation> = (0..64)
        .map(|_| {
            Simulation::start(config.clone(), Arc::new(NullSink)).expect("start session")
        })
        .collect();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while sessions.iter().any(|session| session.outcome().is_none())
        && tokio::time::Instant::now() < deadline
    {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    for session in &sessions {
        assert_eq!(session.outcome(), Some(Outcome::Defeat));
        assert_eq!(session.snapshot().objective_hit_points, 0);
    }
}
