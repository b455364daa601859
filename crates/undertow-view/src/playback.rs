use bevy::prelude::*;
use undertow_io::decode::FluidData;

use crate::{
    canvas::{move_particles, spawn_particles, Canvas, FluidParticle, Particles, PlaybackState},
    overlay::ViewStats,
};

/// Plays back a recording at `fps` frames per second.
pub(crate) struct PlaybackPlugin {
    pub fps: u32,
}

impl Plugin for PlaybackPlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(Time::<Fixed>::from_hz(self.fps.max(1) as f64))
            .add_systems(Startup, spawn_fluid)
            .add_systems(FixedUpdate, progress_playback.run_if(in_state(PlaybackState::Playing)));
    }
}

#[derive(Resource)]
pub(crate) struct Recording {
    data: FluidData,
    frame: usize,
}

impl Recording {
    pub fn new(data: FluidData) -> Self {
        Self { data, frame: 0 }
    }
}

fn spawn_fluid(
    mut commands: Commands,
    canvas: Res<Canvas>,
    recording: Res<Recording>,
    mut particles: ResMut<Particles>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut stats: ResMut<ViewStats>,
) {
    let Some(first) = recording.data.frames.first() else {
        warn!("recording holds no frames");
        return;
    };

    particles.0 = spawn_particles(
        &mut commands,
        &canvas,
        first.positions.iter::<2>().map(Vec2::from),
        &mut meshes,
        &mut materials,
    );

    stats.step_label = "frame";
    stats.particles = particles.0.len();

    info!("spawned {} fluid particles", particles.0.len());
}

fn progress_playback(
    mut recording: ResMut<Recording>,
    particles: Res<Particles>,
    mut query: Query<&mut Transform, With<FluidParticle>>,
    mut next_state: ResMut<NextState<PlaybackState>>,
    mut stats: ResMut<ViewStats>,
) {
    let index = recording.frame;

    // Rewind once the last frame has been shown.
    if index >= recording.data.frames.len() {
        next_state.set(PlaybackState::Paused);
        recording.frame = 0;
        return;
    }

    let frame = &recording.data.frames[index];
    move_particles(&particles, frame.positions.iter::<2>().map(Vec2::from), &mut query);

    stats.step = index as u64;
    recording.frame += 1;
}
