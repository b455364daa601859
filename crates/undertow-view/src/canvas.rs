use bevy::{prelude::*, render::camera::ScalingMode};

use crate::PARTICLE_COLOR;

/// The simulated domain, in simulation units. The camera maps it onto the window so that particle
/// positions can be used as translations directly.
#[derive(Resource, Clone, Copy, Debug)]
pub(crate) struct Canvas {
    pub size: Vec2,
    pub particle_radius: f32,
}

pub(crate) struct CanvasPlugin {
    pub canvas: Canvas,
    pub initial_state: PlaybackState,
}

impl Plugin for CanvasPlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(ClearColor(Color::WHITE))
            .insert_resource(self.canvas)
            .insert_state(self.initial_state.clone())
            .init_resource::<Particles>()
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, toggle_playback);
    }
}

#[derive(States, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub(crate) enum PlaybackState {
    Playing,
    #[default]
    Paused,
}

/// Particle entities, in the same order as the fluid's particles.
#[derive(Resource, Default)]
pub(crate) struct Particles(pub Vec<Entity>);

#[derive(Component, Clone, Copy)]
pub(crate) struct FluidParticle;

fn spawn_camera(
    mut commands: Commands,
    canvas: Res<Canvas>,
) {
    commands.spawn((
        Camera2d,
        OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical { viewport_height: canvas.size.y },
            ..OrthographicProjection::default_2d()
        },
        Transform::from_xyz(canvas.size.x / 2.0, canvas.size.y / 2.0, 0.0),
    ));
}

fn toggle_playback(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<PlaybackState>>,
    mut next_state: ResMut<NextState<PlaybackState>>,
) {
    if keys.just_pressed(KeyCode::Space) {
        next_state.set(match state.get() {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
        });
    }
}

pub(crate) fn spawn_particles(
    commands: &mut Commands,
    canvas: &Canvas,
    positions: impl Iterator<Item = Vec2>,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
) -> Vec<Entity> {
    let mesh = meshes.add(Circle::new(canvas.particle_radius));
    let material = materials.add(PARTICLE_COLOR);

    positions
        .map(|pos| {
            commands.spawn((
                Mesh2d(mesh.clone()),
                MeshMaterial2d(material.clone()),
                Transform::from_xyz(pos.x, pos.y, 0.0),
                FluidParticle,
            )).id()
        })
        .collect()
}

pub(crate) fn move_particles(
    particles: &Particles,
    positions: impl Iterator<Item = Vec2>,
    query: &mut Query<&mut Transform, With<FluidParticle>>,
) {
    for (pos, &entity) in positions.zip(particles.0.iter()) {
        if let Ok(mut transform) = query.get_mut(entity) {
            transform.translation.x = pos.x;
            transform.translation.y = pos.y;
        }
    }
}
