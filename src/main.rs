use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use config::load_params;
use log::info;
use run::{build_scene, run_d2};
use thiserror::Error;
use undertow_fluids::sph::ConfigError;
use undertow_io::{decode::{DecodingError, FluidDataDecoder}, encode::EncodingError};

mod config;
mod run;

/// Weakly compressible SPH fluids in 2D.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs a scene headless and records it.
    Simulate {
        /// Directory the recording is written to.
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        scene: SceneArgs,
        /// Recorded frames per second.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Length of the recording in seconds.
        #[arg(long, default_value_t = 10.0)]
        duration: f32,
    },
    /// Plays back a recording.
    Play {
        /// Directory holding the recording.
        input: PathBuf,
    },
    /// Simulates a scene in a window.
    Live {
        #[command(flatten)]
        scene: SceneArgs,
    },
}

#[derive(Args)]
struct SceneArgs {
    /// RON file with fluid parameters. Missing fields keep their defaults.
    #[arg(long)]
    params: Option<PathBuf>,
    /// Seed for the initial particle jitter.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Simulation ticks per rendered frame.
    #[arg(long, default_value_t = 16)]
    steps_per_frame: usize,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid fluid parameters: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read parameters: {0}")]
    Params(#[from] ron::error::SpannedError),
    #[error("failed to write recording: {0}")]
    Encoding(#[from] EncodingError),
    #[error("failed to read recording: {0}")]
    Decoding(#[from] DecodingError),
    #[error(transparent)]
    Progress(#[from] indicatif::style::TemplateError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate { output, scene, fps, duration } => {
            // The viewers log through bevy, which installs its own logger, so only the headless
            // path sets one up. Anything logged before a viewer starts is dropped.
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

            let params = load_params(scene.params.as_deref())?;
            let fluid_scene = build_scene(params, scene.seed)?;

            info!(
                "seeded {} particles from {} (seed {})",
                fluid_scene.fluid.len(),
                scene.params.as_deref().map_or("default parameters".into(), |p| p.display().to_string()),
                scene.seed,
            );

            run_d2(fluid_scene, output, fps, duration, scene.steps_per_frame)?;
        },
        Command::Play { input } => {
            let data = FluidDataDecoder::new(input).decode_all()?;
            undertow_view::view_2d(data)?;
        },
        Command::Live { scene } => {
            let params = load_params(scene.params.as_deref())?;
            let fluid_scene = build_scene(params, scene.seed)?;

            undertow_view::view_live(fluid_scene, scene.steps_per_frame);
        },
    }

    Ok(())
}
