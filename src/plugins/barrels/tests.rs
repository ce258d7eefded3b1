//! Barrel queue + lane tests.

use bevy::prelude::*;

use super::*;
use crate::common::test_utils::{drain_messages, ensure_messages, run_system_once, set_fixed_delta, TestRng};
use crate::config::BarrelConfig;

// -----------------------------------------------------------------------------
// Queue (pure)
// -----------------------------------------------------------------------------

fn geo(policy: ThresholdPolicy) -> QueueGeometry {
    QueueGeometry { threshold_y: 5.0, spacing: 2.0, speed: 4.0, slide_speed: 8.0, policy }
}

fn ys<Id: Copy + PartialEq>(q: &BarrelQueue<Id>) -> Vec<f32> {
    q.entries().iter().map(|b| b.y).collect()
}

fn ids<Id: Copy + PartialEq>(q: &BarrelQueue<Id>) -> Vec<Id> {
    q.entries().iter().map(|b| b.id).collect()
}

#[test]
fn wave_is_spaced_from_the_base_position() {
    let g = geo(ThresholdPolicy::Stop);
    let mut q = BarrelQueue::default();
    q.push_wave([1, 2, 3], 20.0, &g);

    assert_eq!(ys(&q), vec![20.0, 22.0, 24.0]);
    assert_eq!(q.motion(), QueueMotion::AutoMoving);

    // A second wave lines up behind the tail, never overlapping it.
    q.push_wave([4], 20.0, &g);
    assert_eq!(ys(&q), vec![20.0, 22.0, 24.0, 26.0]);
}

#[test]
fn stop_policy_freezes_head_exactly_at_threshold() {
    let g = geo(ThresholdPolicy::Stop);
    let mut q = BarrelQueue::default();
    q.push_wave([1, 2], 6.0, &g);

    // 6.0 - 4.0 * 0.5 = 4.0 overshoots; everyone is shifted back by 1.0.
    assert!(q.advance(0.5, &g).is_empty());
    assert_eq!(q.motion(), QueueMotion::StoppedAtThreshold);
    assert_eq!(ys(&q), vec![5.0, 7.0]);

    q.advance(1.0, &g);
    assert_eq!(ys(&q), vec![5.0, 7.0]);
}

#[test]
fn destroy_policy_drops_crossing_head_and_keeps_order() {
    let g = geo(ThresholdPolicy::Destroy);
    let mut q = BarrelQueue::default();
    q.push_wave([1, 2], 6.0, &g);

    let crossed = q.advance(0.5, &g);
    assert_eq!(crossed, vec![1]);
    assert_eq!(q.len(), 1);
    assert_eq!(ids(&q), vec![2]);
    assert_eq!(q.motion(), QueueMotion::AutoMoving);
}

#[test]
fn removal_while_moving_does_not_slide() {
    let g = geo(ThresholdPolicy::Stop);
    let mut q = BarrelQueue::default();
    q.push_wave([1, 2, 3], 20.0, &g);

    assert_eq!(q.remove(2), Some(1));
    assert_eq!(q.motion(), QueueMotion::AutoMoving);
    assert_eq!(ys(&q), vec![20.0, 24.0]);
    assert_eq!(q.remove(2), None);
}

#[test]
fn slide_forward_preserves_order_and_exact_spacing() {
    let g = geo(ThresholdPolicy::Stop);
    let mut rng = TestRng::new(0xBA_22E1);

    for _case in 0..500 {
        let n = 2 + (rng.next_u64() % 8) as u32;
        let mut q = BarrelQueue::default();
        q.push_wave(0..n, 5.0, &g);
        q.advance(0.0, &g);
        assert_eq!(q.motion(), QueueMotion::StoppedAtThreshold);

        // Break a few random barrels, sliding to rest after each.
        let breaks = 1 + (rng.next_u64() % (n as u64 - 1)) as usize;
        for _ in 0..breaks {
            let pick = q.entries()[(rng.next_u64() % q.len() as u64) as usize].id;
            let before: Vec<u32> = ids(&q).into_iter().filter(|id| *id != pick).collect();

            q.remove(pick);
            assert_eq!(q.motion(), QueueMotion::SlidingForward);
            for _ in 0..200 {
                q.advance(1.0 / 64.0, &g);
                if q.motion() == QueueMotion::StoppedAtThreshold {
                    break;
                }
            }

            assert_eq!(q.motion(), QueueMotion::StoppedAtThreshold);
            assert_eq!(ids(&q), before);
            for (i, y) in ys(&q).into_iter().enumerate() {
                assert_eq!(y, g.threshold_y + i as f32 * g.spacing);
            }
        }
    }
}

#[test]
fn wave_pushed_onto_a_stopped_queue_packs_behind_the_head() {
    let g = geo(ThresholdPolicy::Stop);
    let mut q = BarrelQueue::default();
    q.push_wave([1], 5.0, &g);
    q.advance(0.0, &g);

    q.push_wave([2, 3], 20.0, &g);
    assert_eq!(q.motion(), QueueMotion::SlidingForward);
    for _ in 0..100 {
        q.advance(0.25, &g);
    }
    assert_eq!(q.motion(), QueueMotion::StoppedAtThreshold);
    assert_eq!(ys(&q), vec![5.0, 7.0, 9.0]);
}

#[test]
fn emptied_queue_resumes_auto_movement_on_refill() {
    let g = geo(ThresholdPolicy::Stop);
    let mut q = BarrelQueue::default();
    q.push_wave([1], 5.0, &g);
    q.advance(0.0, &g);
    q.remove(1);
    assert_eq!(q.motion(), QueueMotion::Empty);

    q.push_wave([2], 20.0, &g);
    assert_eq!(q.motion(), QueueMotion::AutoMoving);
}

// -----------------------------------------------------------------------------
// Lane systems
// -----------------------------------------------------------------------------

fn barrel(health: f32, kind: ModifierType, value: f32) -> BarrelConfig {
    BarrelConfig { health, modifier: Modifier::new(kind, ModifierOp::Increase, value) }
}

fn lane_world(policy: ThresholdPolicy, barrels: Vec<BarrelConfig>) -> World {
    let mut world = World::new();
    world.insert_resource(Tunables::default());
    world.init_resource::<Pools>();
    world.insert_resource(BarrelLane {
        schedule: DelaySchedule::new([(0.0, BarrelWave { pre_delay: 0.0, barrels })]),
        queue: BarrelQueue::default(),
        policy,
    });
    ensure_messages::<ApplyModifier>(&mut world);
    ensure_messages::<AddMembers>(&mut world);
    ensure_messages::<SpawnParticleRequest>(&mut world);
    set_fixed_delta(&mut world, 0.25);
    world
}

fn queued(world: &World) -> Vec<Entity> {
    world.resource::<BarrelLane>().queue.entries().iter().map(|b| b.id).collect()
}

#[test]
fn wave_spawns_into_the_barrel_lane() {
    let mut world = lane_world(
        ThresholdPolicy::Stop,
        vec![barrel(40.0, ModifierType::Damage, 15.0), barrel(60.0, ModifierType::Range, 10.0)],
    );
    run_system_once(&mut world, spawn_barrel_waves);

    let tunables = Tunables::default();
    let barrels = queued(&world);
    assert_eq!(barrels.len(), 2);
    for (i, e) in barrels.iter().enumerate() {
        let tf = world.get::<Transform>(*e).unwrap();
        assert_eq!(tf.translation.x, tunables.barrel_lane_x);
        assert_eq!(tf.translation.y, tunables.barrel_spawn_y + i as f32 * tunables.barrel_spacing);
        assert!(world.get::<PoolState>(*e).unwrap().is_active());
    }
    assert_eq!(world.get::<Health>(barrels[1]).unwrap().max, 60.0);
}

#[test]
fn broken_barrels_pay_out_their_modifier() {
    let mut world = lane_world(
        ThresholdPolicy::Stop,
        vec![barrel(40.0, ModifierType::Damage, 15.0), barrel(60.0, ModifierType::AddMember, 2.0)],
    );
    run_system_once(&mut world, spawn_barrel_waves);
    let barrels = queued(&world);

    for e in &barrels {
        world.get_mut::<Health>(*e).unwrap().apply_damage(1_000.0);
    }
    run_system_once(&mut world, barrel_deaths);

    assert_eq!(
        drain_messages::<ApplyModifier>(&mut world),
        vec![ApplyModifier(Modifier::new(ModifierType::Damage, ModifierOp::Increase, 15.0))]
    );
    assert_eq!(
        drain_messages::<AddMembers>(&mut world),
        vec![AddMembers { count: 2, step: Tunables::default().add_member_step }]
    );
    assert!(queued(&world).is_empty());
    for e in &barrels {
        assert_eq!(*world.get::<PoolState>(*e).unwrap(), PoolState::PendingReturn);
    }
}

#[test]
fn destroy_policy_crossing_gives_no_reward() {
    let mut world = lane_world(
        ThresholdPolicy::Destroy,
        vec![barrel(40.0, ModifierType::Damage, 15.0), barrel(60.0, ModifierType::FireRate, 20.0)],
    );
    run_system_once(&mut world, spawn_barrel_waves);
    let barrels = queued(&world);

    let tunables = Tunables::default();
    let travel = tunables.barrel_spawn_y - tunables.barrel_threshold_y;
    // Just enough for the head to cross while the second barrel stays behind the line.
    set_fixed_delta(&mut world, (travel + 0.5) / tunables.barrel_speed);
    run_system_once(&mut world, move_barrels);

    assert_eq!(*world.get::<PoolState>(barrels[0]).unwrap(), PoolState::PendingReturn);
    assert_eq!(queued(&world), vec![barrels[1]]);

    run_system_once(&mut world, barrel_deaths);
    assert!(drain_messages::<ApplyModifier>(&mut world).is_empty());
    assert!(drain_messages::<AddMembers>(&mut world).is_empty());
}

#[test]
fn stopped_queue_slides_after_a_break() {
    let mut world = lane_world(
        ThresholdPolicy::Stop,
        vec![
            barrel(40.0, ModifierType::Damage, 15.0),
            barrel(60.0, ModifierType::Range, 10.0),
            barrel(80.0, ModifierType::FireRate, 10.0),
        ],
    );
    run_system_once(&mut world, spawn_barrel_waves);
    let barrels = queued(&world);

    set_fixed_delta(&mut world, 60.0);
    run_system_once(&mut world, move_barrels);
    assert_eq!(world.resource::<BarrelLane>().queue.motion(), QueueMotion::StoppedAtThreshold);

    world.get_mut::<Health>(barrels[0]).unwrap().apply_damage(1_000.0);
    run_system_once(&mut world, barrel_deaths);
    assert_eq!(world.resource::<BarrelLane>().queue.motion(), QueueMotion::SlidingForward);

    set_fixed_delta(&mut world, 1.0 / 64.0);
    run_system_once(&mut world, move_barrels);
    assert_ne!(world.get::<Transform>(barrels[1]).unwrap().rotation, Quat::IDENTITY);

    set_fixed_delta(&mut world, 10.0);
    run_system_once(&mut world, move_barrels);
    run_system_once(&mut world, move_barrels);

    let tunables = Tunables::default();
    assert_eq!(queued(&world), vec![barrels[1], barrels[2]]);
    assert_eq!(world.get::<Transform>(barrels[1]).unwrap().translation.y, tunables.barrel_threshold_y);
    assert_eq!(
        world.get::<Transform>(barrels[2]).unwrap().translation.y,
        tunables.barrel_threshold_y + tunables.barrel_spacing
    );
    assert_eq!(world.get::<Transform>(barrels[1]).unwrap().rotation, Quat::IDENTITY);
}

#[test]
fn clearing_the_lane_cancels_the_sequence() {
    let mut world = lane_world(ThresholdPolicy::Stop, vec![barrel(40.0, ModifierType::Damage, 15.0)]);
    run_system_once(&mut world, clear_barrel_lane);
    run_system_once(&mut world, spawn_barrel_waves);

    assert!(queued(&world).is_empty());
    assert_eq!(world.resource::<Pools>().instantiated(PoolKey::Barrel), 0);
}
