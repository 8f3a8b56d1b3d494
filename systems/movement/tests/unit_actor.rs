use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use lane_defence_core::{CellCoord, Event, EventSink, Tier, WorldPoint};
use lane_defence_system_coordinator::{drive, Actor, ActorStatus, Coordinator};
use lane_defence_system_movement::UnitActor;
use lane_defence_world::{UnitPhase, UnitTemplate, World, WorldConfig};

const TICK: Duration = Duration::from_millis(20);

/// Length of the easy path in world units.
const EASY_PATH_LENGTH: f32 = 1360.0;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: Event) {
        self.events.lock().expect("events lock").push(event);
    }
}

fn easy_world() -> (Arc<World>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let world = Arc::new(World::new(WorldConfig::for_tier(Tier::Easy), sink.clone()));
    (world, sink)
}

#[test]
fn unit_walks_toward_second_waypoint() {
    let (world, _sink) = easy_world();
    let unit = world.spawn_unit(1);
    let mut actor = UnitActor::new(Arc::clone(&world), Arc::clone(&unit));

    assert_eq!(actor.step(Duration::from_millis(500)), ActorStatus::Active);

    let start = CellCoord::new(1, 0).center();
    let expected = WorldPoint::new(start.x(), start.y() + 50.0);
    assert!(unit.position().distance(expected) < 1e-3);
}

#[test]
fn unit_killed_between_ticks_pays_bounty_once() {
    let (world, sink) = easy_world();
    let unit = world.roster().spawn(
        UnitTemplate {
            wave: 1,
            hit_points: 50,
            speed: 100.0,
            bounty: 10,
        },
        world.layout().spawn_position(),
    );
    let mut actor = UnitActor::new(Arc::clone(&world), Arc::clone(&unit));

    let _ = unit.apply_damage(30);
    assert_eq!(unit.hit_points(), 20);
    assert_eq!(actor.step(TICK), ActorStatus::Active);

    let _ = unit.apply_damage(30);
    assert!(unit.hit_points() <= 0);
    assert_eq!(actor.step(TICK), ActorStatus::Finished);
    assert_eq!(actor.step(TICK), ActorStatus::Finished);

    assert_eq!(unit.phase(), UnitPhase::Killed);
    assert_eq!(world.ledger().balance(), 260);
    assert!(world.roster().is_empty());
    assert_eq!(
        sink.count(|event| matches!(event, Event::UnitKilled { .. })),
        1
    );
}

#[test]
fn unit_reaching_objective_costs_one_life() {
    let (world, sink) = easy_world();
    let unit = world.spawn_unit(1);
    let mut actor = UnitActor::new(Arc::clone(&world), Arc::clone(&unit));

    let travel = Duration::from_secs_f32(EASY_PATH_LENGTH / unit.speed());
    assert_eq!(actor.step(travel + TICK), ActorStatus::Finished);
    assert_eq!(actor.step(TICK), ActorStatus::Finished);

    assert_eq!(unit.phase(), UnitPhase::Arrived);
    assert_eq!(unit.position(), world.objective().position());
    assert_eq!(world.objective().hit_points(), 9);
    assert!(world.roster().is_empty());
    assert_eq!(
        sink.count(|event| matches!(event, Event::ObjectiveDamaged { .. })),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn driven_unit_arrives_after_travel_time() {
    let (world, _sink) = easy_world();
    let coordinator = Coordinator::new();
    let unit = world.spawn_unit(1);
    let actor = UnitActor::new(Arc::clone(&world), Arc::clone(&unit));
    let task = tokio::spawn(drive(
        actor,
        coordinator.signal(),
        unit.lifeline().clone(),
        TICK,
    ));

    tokio::time::sleep(Duration::from_millis(13_000)).await;
    assert_eq!(unit.phase(), UnitPhase::Moving);
    assert_eq!(world.objective().hit_points(), 10);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(unit.phase(), UnitPhase::Arrived);
    assert_eq!(world.objective().hit_points(), 9);
    task.await.expect("unit task");
}
