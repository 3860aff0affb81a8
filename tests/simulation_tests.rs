//! Simulation engine tests
//!
//! Scenario tests place vehicles by hand with spawning switched off, so
//! the only randomness left is road order, which these scenarios are
//! insensitive to.

use rand::rngs::StdRng;
use rand::SeedableRng;

use road_network_sim::network::{Node, RoadGraph, RoadNetwork, Segment};
use road_network_sim::simulation::{
    IntersectionId, Position, RoadId, SimConfig, SimRoad, SimWorld, VehicleSpawner,
};
use road_network_sim::Error;

fn quiet_config() -> SimConfig {
    SimConfig::default().with_spawn_probability(0.0)
}

fn build_world(raw: &[((i64, i64), (i64, i64))], config: SimConfig) -> SimWorld {
    let segments: Vec<Segment> = raw.iter().map(|s| Segment::from(*s)).collect();
    let graph = RoadGraph::try_from(segments.as_slice()).expect("segments should form a graph");
    let gates = graph.derive_gates();
    SimWorld::new_with_seed(&graph, &gates.entry, &gates.exit, config, 11).expect("world should build")
}

fn road(world: &SimWorld, start: (i64, i64), end: (i64, i64)) -> RoadId {
    world
        .road_between(Node::from(start), Node::from(end))
        .expect("road should exist")
}

#[test]
fn test_vehicle_reaching_exit_is_removed() {
    let mut world = build_world(&[((0, 0), (100, 0))], quiet_config());
    let r = road(&world, (0, 0), (100, 0));
    let id = world.place_vehicle(r, Position::new(95.0, 0.0), 10.0).unwrap();

    world.tick();

    assert_eq!(world.vehicle_position(id), None);
    assert_eq!(world.vehicle_count(), 0);
    assert_eq!(world.stats.vehicles_exited, 1);
}

#[test]
fn test_follower_keeps_clearance_behind_leader() {
    let mut world = build_world(&[((0, 0), (100, 0))], quiet_config());
    let r = road(&world, (0, 0), (100, 0));
    let a = world.place_vehicle(r, Position::new(10.0, 0.0), 10.0).unwrap();
    let b = world.place_vehicle(r, Position::new(4.0, 0.0), 20.0).unwrap();

    world.tick();

    assert_eq!(world.vehicle_position(a), Some(Position::new(20.0, 0.0)));
    assert_eq!(world.vehicle_position(b), Some(Position::new(14.0, 0.0)));
}

#[test]
fn test_denied_vehicle_halts_at_stop_line() {
    let mut world = build_world(&[((0, 0), (100, 0)), ((100, 0), (200, 0))], quiet_config());
    let incoming = road(&world, (0, 0), (100, 0));
    let outgoing = road(&world, (100, 0), (200, 0));
    let parked = world.place_vehicle(outgoing, Position::new(103.0, 0.0), 0.0).unwrap();
    let approaching = world.place_vehicle(incoming, Position::new(90.0, 0.0), 10.0).unwrap();

    world.tick();

    assert_eq!(world.vehicle_position(approaching), Some(Position::new(94.0, 0.0)));
    assert_eq!(world.vehicle_position(parked), Some(Position::new(103.0, 0.0)));
}

#[test]
fn test_waiting_vehicle_holds_at_end_node() {
    let mut world = build_world(&[((0, 0), (100, 0)), ((100, 0), (200, 0))], quiet_config());
    let incoming = road(&world, (0, 0), (100, 0));
    let outgoing = road(&world, (100, 0), (200, 0));
    world.place_vehicle(outgoing, Position::new(105.0, 0.0), 0.0).unwrap();
    let waiting = world.place_vehicle(incoming, Position::new(100.0, 0.0), 5.0).unwrap();

    for _ in 0..3 {
        world.tick();
        assert_eq!(world.vehicle_position(waiting), Some(Position::new(100.0, 0.0)));
    }
    assert_eq!(world.road(incoming).unwrap().len(), 1);
    assert_eq!(world.stats.vehicles_transferred, 0);
}

#[test]
fn test_vehicle_turns_onto_outgoing_road() {
    let mut world = build_world(&[((0, 0), (100, 0)), ((100, 0), (200, 0))], quiet_config());
    let incoming = road(&world, (0, 0), (100, 0));
    let outgoing = road(&world, (100, 0), (200, 0));
    let id = world.place_vehicle(incoming, Position::new(98.0, 0.0), 10.0).unwrap();

    world.tick();

    assert!(world.road(incoming).unwrap().is_empty());
    assert_eq!(world.road(outgoing).unwrap().front().map(|v| v.id), Some(id));
    assert_eq!(world.stats.vehicles_transferred, 1);
    let x = world.vehicle_position(id).unwrap().x;
    assert!(x == 100.0 || x == 110.0, "unexpected position {x}");
}

#[test]
fn test_outgoing_clearance_boundary() {
    let mut world = build_world(&[((0, 0), (100, 0)), ((100, 0), (200, 0))], quiet_config());
    let incoming = road(&world, (0, 0), (100, 0));
    let outgoing = road(&world, (100, 0), (200, 0));
    world.place_vehicle(incoming, Position::new(97.0, 0.0), 1.0).unwrap();
    world.place_vehicle(outgoing, Position::new(105.9999, 0.0), 0.0).unwrap();

    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    let vehicle = world.road(incoming).unwrap().front().unwrap();
    assert!(!junction.can_approach(world.roads(), vehicle));

    let mut world = build_world(&[((0, 0), (100, 0)), ((100, 0), (200, 0))], quiet_config());
    world.place_vehicle(incoming, Position::new(97.0, 0.0), 1.0).unwrap();
    world.place_vehicle(outgoing, Position::new(106.0, 0.0), 0.0).unwrap();

    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    let vehicle = world.road(incoming).unwrap().front().unwrap();
    assert!(junction.can_approach(world.roads(), vehicle));
}

/// Two roads meeting at (100, 0), leaving along the x axis
const MERGE: &[((i64, i64), (i64, i64))] = &[
    ((0, 0), (100, 0)),
    ((100, 100), (100, 0)),
    ((100, 0), (200, 0)),
];

#[test]
fn test_equal_distance_priority_goes_to_caller() {
    let mut world = build_world(MERGE, quiet_config());
    let west = road(&world, (0, 0), (100, 0));
    let north = road(&world, (100, 100), (100, 0));
    world.place_vehicle(west, Position::new(95.0, 0.0), 1.0).unwrap();
    world.place_vehicle(north, Position::new(100.0, 5.0), 1.0).unwrap();

    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    let from_west = world.road(west).unwrap().front().unwrap();
    let from_north = world.road(north).unwrap().front().unwrap();

    assert_eq!(junction.closest_incoming(world.roads(), from_west).id, from_west.id);
    assert_eq!(junction.closest_incoming(world.roads(), from_north).id, from_north.id);
    assert!(junction.can_approach(world.roads(), from_west));
    assert!(junction.can_approach(world.roads(), from_north));
}

#[test]
fn test_closer_incoming_vehicle_has_priority() {
    let mut world = build_world(MERGE, quiet_config());
    let west = road(&world, (0, 0), (100, 0));
    let north = road(&world, (100, 100), (100, 0));
    world.place_vehicle(west, Position::new(90.0, 0.0), 1.0).unwrap();
    world.place_vehicle(north, Position::new(100.0, 5.0), 1.0).unwrap();

    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    let from_west = world.road(west).unwrap().front().unwrap();
    let from_north = world.road(north).unwrap().front().unwrap();

    assert_eq!(junction.closest_incoming(world.roads(), from_west).id, from_north.id);
    assert!(!junction.can_approach(world.roads(), from_west));
    assert!(junction.can_approach(world.roads(), from_north));
}

#[test]
fn test_available_outgoing_needs_double_clearance() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut world = build_world(MERGE, quiet_config());
    let east = road(&world, (100, 0), (200, 0));

    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    assert!(junction.closest_outgoing(world.roads()).is_none());
    assert_eq!(junction.find_available_outgoing(world.roads(), &mut rng), Some(east));

    world.place_vehicle(east, Position::new(111.9, 0.0), 0.0).unwrap();
    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    assert!(junction.closest_outgoing(world.roads()).is_some());
    assert_eq!(junction.find_available_outgoing(world.roads(), &mut rng), None);

    let mut world = build_world(MERGE, quiet_config());
    world.place_vehicle(east, Position::new(112.0, 0.0), 0.0).unwrap();
    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    assert_eq!(junction.find_available_outgoing(world.roads(), &mut rng), Some(east));
}

#[test]
fn test_intersections_link_roads_both_ways() {
    let world = build_world(MERGE, quiet_config());
    let junction = world.intersection_at(Node::new(100, 0)).unwrap();
    assert_eq!(junction.incoming_roads().len(), 2);
    assert_eq!(junction.outgoing_roads(), &[road(&world, (100, 0), (200, 0))]);

    for road in world.roads() {
        let end = world.intersection(road.intersection).unwrap();
        assert_eq!(end.node, road.segment.end);
        assert!(end.incoming_roads().contains(&road.id));
    }
    assert!(world.intersection(IntersectionId(world.intersections().len())).is_none());
}

#[test]
fn test_spawning_respects_clearance() {
    let config = SimConfig::default().with_spawn_probability(1.0);
    let mut world = build_world(&[((0, 0), (100, 0))], config);

    world.tick();
    assert_eq!(world.vehicle_count(), 1);
    assert_eq!(world.stats.vehicles_spawned, 1);

    // Top speed is at most 1.3, so the spawn point stays blocked
    world.tick();
    assert_eq!(world.vehicle_count(), 1);
}

#[test]
fn test_update_reports_every_vehicle() {
    let config = SimConfig::default().with_spawn_probability(1.0);
    let mut world = build_world(&[((0, 0), (100, 0))], config);
    let mut positions = vec![Position::new(-1.0, -1.0)];
    let mut colors = Vec::new();

    for _ in 0..40 {
        world.update(&mut positions, &mut colors);
        assert_eq!(positions.len(), world.vehicle_count());
        assert_eq!(colors.len(), positions.len());
    }
    assert!(world.vehicle_count() > 1);
}

#[test]
fn test_generated_network_runs_without_collisions() {
    let mut rng = StdRng::seed_from_u64(21);
    let network = RoadNetwork::generate(25, 20, true, &mut rng).unwrap();
    let config = SimConfig::default().with_spawn_probability(0.3);
    let mut world = SimWorld::from_network(&network, config, Some(5)).unwrap();

    for _ in 0..600 {
        world.tick();

        for road in world.roads() {
            let vehicles: Vec<_> = road.vehicles().iter().collect();
            for vehicle in &vehicles {
                assert!(road.distance_to_end(&vehicle.position) <= road.length() + 1e-9);
                assert!(vehicle.position.distance(&road.start) <= road.length() + 1e-9);
            }
            for pair in vehicles.windows(2) {
                let gap = pair[0].position.distance(&pair[1].position);
                assert!(gap >= road.clearance() - 1e-9, "vehicles {gap} apart on {}", road.segment);
            }
        }

        let stats = &world.stats;
        assert_eq!(
            stats.vehicles_spawned,
            stats.vehicles_exited + world.vehicle_count() as u64
        );
    }
    assert!(world.stats.vehicles_spawned > 0);
}

#[test]
fn test_seeded_worlds_are_reproducible() {
    let network = RoadNetwork::generate(15, 20, true, &mut StdRng::seed_from_u64(4)).unwrap();
    let config = SimConfig::default().with_spawn_probability(0.2);
    let mut first = SimWorld::from_network(&network, config.clone(), Some(8)).unwrap();
    let mut second = SimWorld::from_network(&network, config, Some(8)).unwrap();

    let (mut p1, mut c1, mut p2, mut c2) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for _ in 0..200 {
        first.update(&mut p1, &mut c1);
        second.update(&mut p2, &mut c2);
        assert_eq!(p1, p2);
        assert_eq!(c1, c2);
    }
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_invalid_parameters_rejected_at_construction() {
    let segments = vec![Segment::from(((0, 0), (100, 0)))];
    let graph = RoadGraph::try_from(segments.as_slice()).unwrap();
    let gates = graph.derive_gates();

    let too_tight = SimConfig::default().with_clearance(5.0);
    assert!(matches!(
        SimWorld::new(&graph, &gates.entry, &gates.exit, too_tight),
        Err(Error::InvalidParameter(_))
    ));

    let bad_probability = SimConfig::default().with_spawn_probability(1.5);
    assert!(matches!(
        SimWorld::new(&graph, &gates.entry, &gates.exit, bad_probability),
        Err(Error::InvalidParameter(_))
    ));

    let bad_speeds = SimConfig::default().with_speed_range(2.0..=1.0);
    assert!(matches!(
        SimWorld::new(&graph, &gates.entry, &gates.exit, bad_speeds),
        Err(Error::InvalidParameter(_))
    ));

    // Shorter than twice the clearance
    let short = RoadGraph::try_from([Segment::from(((0, 0), (10, 0)))].as_slice()).unwrap();
    let gates = short.derive_gates();
    assert!(matches!(
        SimWorld::new(&short, &gates.entry, &gates.exit, SimConfig::default()),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn test_road_construction_and_queue() {
    let segment = Segment::from(((0, 0), (100, 0)));
    let mut road = SimRoad::new(RoadId(0), segment, IntersectionId(1), 6.0, 0.5, true, false).unwrap();
    assert_eq!(road.stop_line, Position::new(94.0, 0.0));
    assert_eq!(road.direction, Position::new(1.0, 0.0));
    assert_eq!(road.distance_to_end(&Position::new(40.0, 0.0)), 60.0);

    let southbound = Segment::from(((0, 100), (0, 0)));
    let down = SimRoad::new(RoadId(1), southbound, IntersectionId(0), 6.0, 0.5, false, true).unwrap();
    assert_eq!(down.stop_line, Position::new(0.0, 6.0));

    let mut rng = StdRng::seed_from_u64(2);
    let mut spawner = VehicleSpawner::new(0.7..=1.3).unwrap();
    let first = spawner.spawn(Position::new(50.0, 0.0), &mut rng);
    let second = spawner.spawn(Position::new(10.0, 0.0), &mut rng);
    road.enqueue_at_back(first.clone());
    road.enqueue_at_back(second.clone());
    assert_eq!(road.front().map(|v| v.id), Some(first.id));
    assert_eq!(road.back().map(|v| v.id), Some(second.id));
    assert_eq!(road.dequeue_front().map(|v| v.id), Some(first.id));
    assert_eq!(road.dequeue_front().map(|v| v.id), Some(second.id));
    assert!(road.dequeue_front().is_none());

    let mut down = down;
    assert!(down.try_spawn(&mut rng, &mut spawner).is_none());
}

#[test]
fn test_road_rejects_bad_parameters() {
    let segment = Segment::from(((0, 0), (100, 0)));
    assert!(matches!(
        SimRoad::new(RoadId(0), segment, IntersectionId(0), 0.0, 0.5, false, false),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        SimRoad::new(RoadId(0), segment, IntersectionId(0), 6.0, -0.1, false, false),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        SimRoad::new(RoadId(0), Segment::from(((0, 0), (5, 5))), IntersectionId(0), 6.0, 0.5, false, false),
        Err(Error::Geometry(..))
    ));
    assert!(matches!(
        SimRoad::new(RoadId(0), Segment::from(((0, 0), (6, 0))), IntersectionId(0), 6.0, 0.5, false, false),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn test_spawner_ids_and_speeds() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut spawner = VehicleSpawner::new(0.7..=1.3).unwrap();
    let ids: Vec<u64> = (0..5)
        .map(|_| spawner.spawn(Position::default(), &mut rng))
        .inspect(|v| assert!((0.7..=1.3).contains(&v.max_speed)))
        .map(|v| v.id.0)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(spawner.spawned(), 5);

    // A second spawner starts its own sequence
    let mut other = VehicleSpawner::new(0.7..=1.3).unwrap();
    assert_eq!(other.spawn(Position::default(), &mut rng).id.0, 1);
}

#[test]
fn test_spawner_rejects_bad_speed_ranges() {
    for range in [2.0..=1.0, -1.0..=1.0, 0.5..=f64::INFINITY, f64::NAN..=1.0] {
        assert!(matches!(VehicleSpawner::new(range), Err(Error::InvalidParameter(_))));
    }
    assert!(VehicleSpawner::new(1.0..=1.0).is_ok());
}

#[test]
fn test_road_parameters_read_back() {
    let segment = Segment::from(((0, 0), (0, 50)));
    let road = SimRoad::new(RoadId(3), segment, IntersectionId(0), 8.0, 0.25, true, true).unwrap();
    assert_eq!(road.clearance(), 8.0);
    assert_eq!(road.spawn_probability(), 0.25);
    assert_eq!(road.stop_line, Position::new(0.0, 42.0));
}

#[test]
fn test_placing_on_unknown_road_spends_nothing() {
    let mut world = build_world(&[((0, 0), (100, 0))], quiet_config());
    let mut twin = build_world(&[((0, 0), (100, 0))], quiet_config());
    let r = road(&world, (0, 0), (100, 0));

    assert!(matches!(
        world.place_vehicle(RoadId(7), Position::new(50.0, 0.0), 1.0),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        world.place_vehicle(r, Position::new(50.0, 0.0), -1.0),
        Err(Error::InvalidParameter(_))
    ));
    assert_eq!(world.vehicle_count(), 0);

    let id = world.place_vehicle(r, Position::new(50.0, 0.0), 1.0).unwrap();
    let twin_id = twin.place_vehicle(r, Position::new(50.0, 0.0), 1.0).unwrap();
    assert_eq!(id, twin_id);
    assert_eq!(id.0, 1);

    // Same colour draw, so the generator was not advanced either
    let color = world.road(r).unwrap().front().unwrap().color;
    let twin_color = twin.road(r).unwrap().front().unwrap().color;
    assert_eq!(color, twin_color);
}

#[test]
fn test_world_spanning_the_lattice() {
    let network = RoadNetwork::from_segments(
        &[Segment::new(Node::new(i64::MAX, 0), Node::new(i64::MIN, 0))],
        true,
    )
    .unwrap();
    let config = SimConfig::default().with_spawn_probability(1.0);
    let mut world = SimWorld::from_network(&network, config, Some(1)).unwrap();

    for _ in 0..3 {
        world.tick();
    }
    assert_eq!(world.stats.vehicles_spawned, 1);
    assert!(world.render_map().contains('E'));
}
