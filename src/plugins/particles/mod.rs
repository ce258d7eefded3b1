//! Pooled burst effects (enemy deaths, barrel breaks).
//!
//! Pure presentation driven by a lifetime timer: grow + fade, then back to the pool.

use bevy::prelude::*;

use crate::common::state::{GameState, TickSet};
use crate::plugins::pool::{return_to_pool_commit, PoolKey, PoolState, Pools, PARK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    EnemyBurst,
    BarrelBurst,
}

impl ParticleKind {
    fn lifetime_secs(self) -> f32 {
        match self {
            Self::EnemyBurst => 0.3,
            Self::BarrelBurst => 0.5,
        }
    }

    fn color(self) -> Color {
        match self {
            Self::EnemyBurst => Color::srgb(0.95, 0.35, 0.3),
            Self::BarrelBurst => Color::srgb(1.0, 0.75, 0.25),
        }
    }

    fn size(self) -> f32 {
        match self {
            Self::EnemyBurst => 0.9,
            Self::BarrelBurst => 1.6,
        }
    }
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct SpawnParticleRequest {
    pub kind: ParticleKind,
    pub pos: Vec2,
}

#[derive(Component, Debug, Clone)]
pub struct Particle {
    pub kind: ParticleKind,
    pub lifetime: Timer,
}

impl Particle {
    fn new(kind: ParticleKind) -> Self {
        Self { kind, lifetime: Timer::from_seconds(kind.lifetime_secs(), TimerMode::Once) }
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<SpawnParticleRequest>();

    app.add_systems(
        FixedUpdate,
        tick_particles
            .in_set(TickSet::Movement)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        allocate_particles
            .in_set(TickSet::Apply)
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        FixedPostUpdate,
        reset_released_particles
            .in_set(TickSet::PoolReturn)
            .before(return_to_pool_commit),
    );
}

pub fn allocate_particles(
    mut commands: Commands,
    mut pools: ResMut<Pools>,
    mut reader: MessageReader<SpawnParticleRequest>,
) {
    for req in reader.read() {
        let kind = req.kind;
        let acquired = pools.acquire(&mut commands, PoolKey::Particle(kind), |c| spawn_inactive_particle(c, kind));
        commands.entity(acquired.entity).insert((
            Particle::new(kind),
            Transform::from_translation(req.pos.extend(3.0)),
        ));
    }
}

fn spawn_inactive_particle(commands: &mut Commands, kind: ParticleKind) -> Entity {
    commands
        .spawn((
            Name::new(format!("Particle({kind:?})")),
            Particle::new(kind),
            Sprite {
                color: kind.color(),
                custom_size: Some(Vec2::splat(kind.size())),
                ..default()
            },
            Transform::from_translation(PARK),
            Visibility::Hidden,
        ))
        .id()
}

pub fn tick_particles(
    time: Res<Time<Fixed>>,
    mut q: Query<(&mut Particle, &mut PoolState, &mut Transform, &mut Sprite)>,
) {
    for (mut particle, mut state, mut tf, mut sprite) in &mut q {
        if !state.is_active() {
            continue;
        }
        particle.lifetime.tick(time.delta());

        let t = particle.lifetime.fraction();
        tf.scale = Vec3::splat(1.0 + t);
        sprite.color = particle.kind.color().with_alpha(1.0 - t);

        if particle.lifetime.is_finished() {
            state.release();
        }
    }
}

pub fn reset_released_particles(mut q: Query<(&mut Particle, &mut Sprite, &PoolState)>) {
    for (mut particle, mut sprite, state) in &mut q {
        if *state == PoolState::PendingReturn {
            particle.lifetime.reset();
            sprite.color = particle.kind.color();
        }
    }
}
