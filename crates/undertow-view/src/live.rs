use bevy::prelude::*;
use undertow_fluids::{scene::Scene, sph::SphFluid2D};

use crate::{
    canvas::{move_particles, spawn_particles, Canvas, FluidParticle, Particles, PlaybackState},
    overlay::ViewStats,
};

/// Steps a scene inside the render loop.
pub(crate) struct LivePlugin;

impl Plugin for LivePlugin {
    fn build(&self, app: &mut App) {
        app
            .add_systems(Startup, spawn_fluid)
            .add_systems(Update, (
                step_scene.run_if(in_state(PlaybackState::Playing)),
                sync_particles,
            ).chain());
    }
}

#[derive(Resource)]
pub(crate) struct LiveScene {
    pub scene: Scene<2, SphFluid2D>,
    pub steps_per_frame: usize,
}

fn spawn_fluid(
    mut commands: Commands,
    canvas: Res<Canvas>,
    live: Res<LiveScene>,
    mut particles: ResMut<Particles>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut stats: ResMut<ViewStats>,
) {
    particles.0 = spawn_particles(
        &mut commands,
        &canvas,
        live.scene.fluid.iter_positions().copied(),
        &mut meshes,
        &mut materials,
    );

    stats.step_label = "tick";
    stats.particles = particles.0.len();

    info!(
        "spawned {} fluid particles, stepping {} ticks per frame",
        particles.0.len(), live.steps_per_frame,
    );
}

fn step_scene(
    mut live: ResMut<LiveScene>,
    mut stats: ResMut<ViewStats>,
    mut next_state: ResMut<NextState<PlaybackState>>,
) {
    let steps = live.steps_per_frame;
    live.scene.step_frame(steps);
    stats.step = live.scene.tick();

    if !live.scene.fluid.is_finite() {
        warn!("fluid state diverged at tick {}, pausing", live.scene.tick());
        next_state.set(PlaybackState::Paused);
    }
}

fn sync_particles(
    live: Res<LiveScene>,
    particles: Res<Particles>,
    mut query: Query<&mut Transform, With<FluidParticle>>,
) {
    if !live.is_changed() {
        return;
    }

    move_particles(&particles, live.scene.fluid.iter_positions().copied(), &mut query);
}
