use std::time::Duration;

use wirefield_core::{
    Command, Direction, Epoch, Event, LatticePoint, TipPosition, Wire, WireNode, WorldDimensions,
    SEGMENT_DURATION,
};
use wirefield_world::{self as world, query, World};

const TICK: Duration = Duration::from_millis(16);

fn wire(origin: LatticePoint, directions: &[Direction]) -> Wire {
    let mut point = origin;
    let nodes = directions
        .iter()
        .map(|direction| {
            let node = WireNode::new(point, *direction);
            point = direction.successor(point);
            node
        })
        .collect();
    Wire::new(nodes).expect("valid wire")
}

fn admit(world: &mut World, wire: Wire) {
    let mut events = Vec::new();
    let epoch = query::epoch(world);
    world::apply(world, Command::AdmitWire { epoch, wire }, &mut events);
    assert!(matches!(events.as_slice(), [Event::WireAdmitted { .. }]));
}

fn advance(world: &mut World, now: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    let epoch: Epoch = query::epoch(world);
    world::apply(world, Command::AdvanceReveal { epoch, now }, &mut events);
    events
}

#[test]
fn growing_segment_lerp_is_monotonic_until_complete() {
    let mut world = World::new(WorldDimensions::new(20, 20));
    let origin = LatticePoint::new(5, 0);
    admit(
        &mut world,
        wire(origin, &[Direction::Down, Direction::DownLeft, Direction::Down]),
    );

    let mut now = Duration::ZERO;
    let mut previous = -1.0_f32;
    loop {
        let _ = advance(&mut world, now);
        let piece = query::occupancy_view(&world)
            .piece(origin)
            .expect("head segment written");
        assert!(piece.lerp >= previous, "lerp regressed: {previous} -> {}", piece.lerp);
        previous = piece.lerp;
        if piece.is_complete() {
            break;
        }
        now += TICK;
    }

    assert_eq!(query::head_cursor(&world), Some(1));

    now += TICK;
    let _ = advance(&mut world, now);
    let next = query::occupancy_view(&world)
        .piece(Direction::Down.successor(origin))
        .expect("second segment started");
    assert!(next.lerp < 0.2, "fresh segment should restart near zero");
    assert_eq!(next.tip, TipPosition::End);
}

#[test]
fn second_wire_waits_for_first_to_drain() {
    let mut world = World::new(WorldDimensions::new(20, 20));
    let first = wire(LatticePoint::new(2, 0), &[Direction::Down; 3]);
    let second = wire(LatticePoint::new(10, 0), &[Direction::Down; 2]);
    let second_points: Vec<_> = second.iter().map(|node| node.point).collect();
    admit(&mut world, first);
    admit(&mut world, second);

    let mut now = Duration::ZERO;
    let mut first_drained = false;
    for _ in 0..200 {
        let events = advance(&mut world, now);
        now += TICK;

        if !first_drained {
            let view = query::occupancy_view(&world);
            for point in &second_points {
                assert!(
                    view.piece(*point).is_none(),
                    "second wire written before first drained"
                );
            }
            first_drained = events
                .iter()
                .any(|event| matches!(event, Event::WireDrained { .. }));
        }

        if query::is_reveal_idle(&world) {
            break;
        }
    }

    assert!(first_drained);
    assert!(query::is_reveal_idle(&world));
    let view = query::occupancy_view(&world);
    assert_eq!(view.len(), 5);
    for point in second_points {
        assert!(view.piece(point).map_or(false, |piece| piece.is_complete()));
    }
}

#[test]
fn completed_wire_carries_begin_and_end_markers() {
    let mut world = World::new(WorldDimensions::new(20, 20));
    let directions = [Direction::Down, Direction::DownRight, Direction::Down, Direction::DownLeft];
    let candidate = wire(LatticePoint::new(4, 1), &directions);
    let points: Vec<_> = candidate.iter().map(|node| node.point).collect();
    admit(&mut world, candidate);

    let mut now = Duration::ZERO;
    while !query::is_reveal_idle(&world) {
        let _ = advance(&mut world, now);
        now += SEGMENT_DURATION;
    }

    let view = query::occupancy_view(&world);
    let tips: Vec<_> = points
        .iter()
        .map(|point| view.piece(*point).expect("piece persisted").tip)
        .collect();
    assert_eq!(
        tips,
        vec![
            TipPosition::Begin,
            TipPosition::None,
            TipPosition::None,
            TipPosition::End
        ]
    );
}

#[test]
fn single_node_wire_starts_with_begin_end_marker() {
    let mut world = World::new(WorldDimensions::new(4, 4));
    let origin = LatticePoint::new(1, 1);
    admit(&mut world, wire(origin, &[Direction::DownRight]));

    let _ = advance(&mut world, Duration::from_millis(3));
    let piece = query::occupancy_view(&world)
        .piece(origin)
        .expect("snapshot written");
    assert_eq!(piece.tip, TipPosition::BeginEnd);
    assert_eq!(piece.direction, Direction::DownRight);
}

#[test]
fn drained_world_keeps_pieces_forever() {
    let mut world = World::new(WorldDimensions::new(4, 4));
    admit(&mut world, wire(LatticePoint::new(0, 0), &[Direction::Down; 2]));

    let mut now = Duration::ZERO;
    for _ in 0..50 {
        let _ = advance(&mut world, now);
        now += SEGMENT_DURATION;
    }

    assert!(query::is_reveal_idle(&world));
    assert_eq!(query::occupancy_view(&world).len(), 2);
}
