use avian2d::prelude::*;
use bevy::prelude::*;

use super::motion::*;
use super::stats::*;
use super::*;
use crate::common::modifiers::{Modifier, ModifierOp, ModifierType};
use crate::common::test_utils::{run_system_once, set_fixed_delta, TestRng};

fn m(kind: ModifierType, op: ModifierOp, value: f32) -> Modifier {
    Modifier::new(kind, op, value)
}

// -----------------------------------------------------------------------------
// Stats
// -----------------------------------------------------------------------------

#[test]
fn percentages_stack_additively() {
    let mut l = Loadout::default();
    l.apply(&m(ModifierType::Damage, ModifierOp::Increase, 20.0));
    l.apply(&m(ModifierType::Damage, ModifierOp::Increase, 20.0));

    let base = WeaponProfile::Rifle.base_stats().damage;
    assert!((l.effective().damage - base * 1.4).abs() < 1e-4);
}

#[test]
fn machine_gun_swap_keeps_rifle_percentages_separate() {
    let mut l = Loadout::default();
    l.apply(&m(ModifierType::FireRate, ModifierOp::Increase, 50.0));
    let rifle_rate = l.effective().fire_rate;

    l.apply(&m(ModifierType::MachineGun, ModifierOp::Increase, 0.0));
    assert!(l.machine_gun());
    assert_eq!(l.effective().fire_rate, WeaponProfile::MachineGun.base_stats().fire_rate);

    l.apply(&m(ModifierType::MachineGun, ModifierOp::Decrease, 0.0));
    assert_eq!(l.effective().fire_rate, rifle_rate);
}

#[test]
fn resolved_stats_respect_floors_and_caps() {
    let mut l = Loadout::default();
    l.apply(&m(ModifierType::Damage, ModifierOp::Decrease, 500.0));
    l.apply(&m(ModifierType::FireRate, ModifierOp::Increase, 10_000.0));
    l.apply(&m(ModifierType::Range, ModifierOp::Decrease, 99.0));
    l.apply(&m(ModifierType::BulletCount, ModifierOp::Decrease, 4.0));

    let s = l.effective();
    assert_eq!(s.damage, DAMAGE_FLOOR);
    assert_eq!(s.fire_rate, FIRE_RATE_MAX);
    assert_eq!(s.range, RANGE_MIN);
    assert_eq!(s.bullet_count, 1);
}

#[test]
fn add_member_is_not_a_weapon_modifier() {
    let mut l = Loadout::default();
    assert!(!l.apply(&m(ModifierType::AddMember, ModifierOp::Increase, 2.0)));
    assert_eq!(l, Loadout::default());
}

#[test]
fn fan_offsets_are_symmetric() {
    let offsets: Vec<f32> = fan_offsets(3, 0.5).collect();
    assert_eq!(offsets, vec![-0.5, 0.0, 0.5]);

    let offsets: Vec<f32> = fan_offsets(2, 1.0).collect();
    assert_eq!(offsets, vec![-0.5, 0.5]);

    assert_eq!(fan_offsets(0, 1.0).count(), 1);
}

#[test]
fn shot_clock_fires_at_rate() {
    let mut clock = ShotClock::default();
    let shots = (0..60).filter(|_| clock.tick(1.0 / 60.0, 3.0)).count();
    // One second at 3 shots/s; float accumulation may land the last shot on the boundary.
    assert!((2..=3).contains(&shots), "shots = {shots}");
}

// -----------------------------------------------------------------------------
// Motion
// -----------------------------------------------------------------------------

#[test]
fn smooth_damp_never_overshoots_random_cases() {
    let mut rng = TestRng::new(0x5EED_0001);

    for _ in 0..5_000 {
        let mut current = rng.range_f32(-20.0, 20.0);
        let target = rng.range_f32(-20.0, 20.0);
        let mut vel = 0.0;
        let above = current > target;

        for _ in 0..120 {
            current = smooth_damp(current, target, &mut vel, 0.08, 40.0, 1.0 / 60.0);
            if above {
                assert!(current >= target - 1e-4);
            } else {
                assert!(current <= target + 1e-4);
            }
        }
        assert!((current - target).abs() < 0.05, "did not settle: {current} vs {target}");
    }
}

#[test]
fn hysteresis_needs_start_speed_and_grace_to_stop() {
    let mut h = MoveHysteresis::default();
    assert!(!h.update(0.2, 0.35, 0.12, 0.12, 0.05));
    assert!(h.update(0.5, 0.35, 0.12, 0.12, 0.05));

    // Between stop and start keeps moving.
    assert!(h.update(0.2, 0.35, 0.12, 0.12, 0.05));

    // Slow but not long enough.
    assert!(h.update(0.05, 0.35, 0.12, 0.12, 0.05));
    assert!(h.update(0.05, 0.35, 0.12, 0.12, 0.05));
    assert!(!h.update(0.05, 0.35, 0.12, 0.12, 0.05));
}

#[test]
fn strafe_weight_is_one_across_aim_and_zero_along_it() {
    assert!((strafe_weight(Vec2::Y, Vec2::X) - 1.0).abs() < 1e-6);
    assert!(strafe_weight(Vec2::Y, Vec2::Y).abs() < 1e-6);
    assert!(strafe_weight(Vec2::Y, -Vec2::Y).abs() < 1e-6);
    assert_eq!(strafe_weight(Vec2::Y, Vec2::ZERO), 0.0);
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

fn spawn_test_unit(world: &mut World, offset: Vec2, hp: f32) -> Entity {
    world
        .spawn((
            Name::new("TestUnit"),
            Unit,
            SquadSlot { index: 0, offset, leader: offset == Vec2::ZERO },
            UnitLife::Alive,
            Health::full(hp),
            Loadout::default(),
            UnitMotion::default(),
            Transform::default(),
            Visibility::Visible,
            CollisionLayers::new(Layer::Squad, [Layer::Enemy, Layer::Gate]),
        ))
        .id()
}

#[test]
fn units_follow_the_formation_target() {
    let mut world = World::new();
    world.insert_resource(Tunables::default());
    let mut formation = Formation::new(crate::plugins::squad::formation::MovementBounds::Unclamped, 0.0);
    formation.set_target_x(3.0);
    world.insert_resource(formation);
    set_fixed_delta(&mut world, 1.0 / 60.0);

    let e = spawn_test_unit(&mut world, Vec2::new(0.5, -0.7), 100.0);

    for _ in 0..120 {
        run_system_once(&mut world, move_units);
    }

    let tf = world.get::<Transform>(e).unwrap();
    assert!((tf.translation.x - 3.5).abs() < 0.01);
    assert_eq!(tf.translation.y, -0.7);
    assert!(!world.get::<UnitMotion>(e).unwrap().gait.is_moving());
}

#[test]
fn lateral_follow_reads_as_strafing() {
    let mut world = World::new();
    world.insert_resource(Tunables::default());
    let mut formation = Formation::default();
    formation.set_target_x(5.0);
    world.insert_resource(formation);
    set_fixed_delta(&mut world, 1.0 / 60.0);

    let e = spawn_test_unit(&mut world, Vec2::ZERO, 100.0);
    run_system_once(&mut world, move_units);

    let motion = world.get::<UnitMotion>(e).unwrap();
    assert!(motion.gait.is_moving());
    assert!((motion.strafe_weight - 1.0).abs() < 1e-4);
}

#[test]
fn death_is_terminal_and_disables_contacts() {
    let mut world = World::new();
    let e = spawn_test_unit(&mut world, Vec2::ZERO, 10.0);

    world.get_mut::<Health>(e).unwrap().apply_damage(25.0);
    run_system_once(&mut world, unit_death_trigger);

    assert_eq!(*world.get::<UnitLife>(e).unwrap(), UnitLife::Dead);
    assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Hidden);
    let layers = world.get::<CollisionLayers>(e).unwrap();
    assert!(!layers.filters.has_all(Layer::Enemy));

    // Dead units ignore the formation.
    world.insert_resource(Tunables::default());
    let mut formation = Formation::default();
    formation.set_target_x(4.0);
    world.insert_resource(formation);
    set_fixed_delta(&mut world, 1.0 / 60.0);
    run_system_once(&mut world, move_units);
    assert_eq!(world.get::<Transform>(e).unwrap().translation.x, 0.0);
}
