use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use undertow_fluids::{
    scene::Scene,
    sph::{GridLayout, SphConfig2D, SphFluid2D, SphFluid2DParams},
};
use undertow_io::encode::FluidDataEncoder;

use crate::CliError;

/// The reference dam: a jittered block of particles in the bottom left corner of the tank.
pub fn build_scene(params: SphFluid2DParams, seed: u64) -> Result<Scene<2, SphFluid2D>, CliError> {
    let layout = GridLayout::for_kernel_radius(params.kernel_radius);
    let config = SphConfig2D::new(params)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let fluid = SphFluid2D::from_grid(&layout, &mut rng);

    Ok(Scene::new(fluid, config))
}

pub fn run_d2(
    mut scene: Scene<2, SphFluid2D>,
    output: PathBuf,
    fps: u32,
    duration_s: f32,
    steps_per_frame: usize,
) -> Result<(), CliError> {
    let frames = (duration_s * fps as f32).round().max(0.0) as u64;

    let mut encoder = FluidDataEncoder::new(output.clone(), frames, fps)?;
    encoder.encode_metadata(&scene)?;

    let bar_template = "Running Simulation {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)?
        .progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress = ProgressBar::new(frames).with_style(style);

    for frame in (0..frames).progress_with(progress) {
        scene.step_frame(steps_per_frame);
        encoder.encode_frame(&scene)?;

        let stats = scene.fluid.diagnostics(scene.params());
        debug!(
            "frame {frame}: mean density {:.4}, max density {:.4}, max speed {:.2}, kinetic energy {:.2}",
            stats.mean_density, stats.max_density, stats.max_speed, stats.kinetic_energy,
        );
    }

    encoder.finish()?;

    info!("recorded {frames} frames ({} ticks) to {}", scene.tick(), output.display());

    Ok(())
}
