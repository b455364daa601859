#![allow(clippy::type_complexity)]

use bevy::prelude::*;
use canvas::{Canvas, CanvasPlugin, PlaybackState};
use live::{LivePlugin, LiveScene};
use overlay::StatsOverlayPlugin;
use playback::{PlaybackPlugin, Recording};
use undertow_fluids::{scene::Scene, sph::SphFluid2D};
use undertow_io::decode::{DecodingError, FluidData};

mod canvas;
mod live;
mod overlay;
mod playback;

pub const PARTICLE_COLOR: Color = Color::srgb(0.0, 0.4, 0.8);

/// Opens a window that steps `scene` by `steps_per_frame` ticks every rendered frame.
pub fn view_live(scene: Scene<2, SphFluid2D>, steps_per_frame: usize) {
    let canvas = Canvas {
        size: Vec2::from(scene.size()),
        particle_radius: scene.particle_radius(),
    };

    App::new()
        .add_plugins((
            DefaultPlugins,
            StatsOverlayPlugin,
        ))
        .add_plugins(CanvasPlugin { canvas, initial_state: PlaybackState::Playing })
        .add_plugins(LivePlugin)
        .insert_resource(LiveScene { scene, steps_per_frame })
        .run();
}

/// Opens a window that plays back a decoded 2D recording at its own frame rate.
pub fn view_2d(data: FluidData) -> Result<(), DecodingError> {
    let canvas = Canvas {
        size: Vec2::from(data.metadata.size::<2>()?),
        particle_radius: data.metadata.particle_radius,
    };
    let fps = data.metadata.fps;

    App::new()
        .add_plugins((
            DefaultPlugins,
            StatsOverlayPlugin,
        ))
        .add_plugins(CanvasPlugin { canvas, initial_state: PlaybackState::Paused })
        .add_plugins(PlaybackPlugin { fps })
        .insert_resource(Recording::new(data))
        .run();

    Ok(())
}
