//! Recordings of simulated fluids.
//!
//! A recording is a directory holding a `_meta` file and one `.dat` file per frame. All values
//! are little-endian.
//!
//! `_meta`: `dim: u8`, `fps: u32`, `num_frames: u64`, `particle_radius: f32`, then `dim` `f32`s of
//! domain size.
//!
//! Frame files are zero-padded frame numbers (`007.dat`) and hold a sequence of sections, each a
//! `u64` vector count followed by that many `dim`-vectors of `f32`. Section 0 holds positions and
//! section 1 holds velocities.

use std::{io::Write, path::{Path, PathBuf}};

use encode::{EncodingError, FluidFrameEncoder};
use undertow_fluids::sph::SphFluid2D;

pub mod as_bytes;
pub mod decode;
pub mod encode;

/// Name of the metadata file inside a recording directory.
pub const METADATA_FILE: &str = "_meta";

/// A fluid whose per-frame state can be written into a recording.
pub trait EncodeFluid<const D: usize> {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError>;
}

impl EncodeFluid<2> for SphFluid2D {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError> {
        encoder.encode_section(self.len(), self.iter_positions().copied())?;
        encoder.encode_section(self.len(), self.velocities().iter().copied())?;

        Ok(())
    }
}

pub(crate) fn frame_path(dir: &Path, frame: u64, num_frames: u64) -> PathBuf {
    let max_digits = num_frames.saturating_sub(1).checked_ilog10().unwrap_or(0) + 1;
    let digits = frame.checked_ilog10().unwrap_or(0) + 1;
    let zeros = max_digits.saturating_sub(digits);

    dir.join(format!("{}{frame}.dat", "0".repeat(zeros as usize)))
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::{rngs::StdRng, SeedableRng};
    use undertow_fluids::{
        scene::Scene,
        sph::{GridLayout, SphConfig2D},
    };

    use super::*;
    use crate::decode::{DecodingError, FluidDataDecoder};
    use crate::encode::FluidDataEncoder;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("undertow-io-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_frame_path_padding() {
        let dir = Path::new("out");

        assert_eq!(frame_path(dir, 0, 1), dir.join("0.dat"));
        assert_eq!(frame_path(dir, 7, 600), dir.join("007.dat"));
        assert_eq!(frame_path(dir, 42, 600), dir.join("042.dat"));
        assert_eq!(frame_path(dir, 599, 600), dir.join("599.dat"));
        assert_eq!(frame_path(dir, 0, 0), dir.join("0.dat"));
    }

    #[test]
    fn test_recording_replays_simulated_frames() {
        let dir = temp_dir("replay");
        let layout = GridLayout { columns: 3, rows: 4, ..GridLayout::default() };
        let fluid = SphFluid2D::from_grid(&layout, &mut StdRng::seed_from_u64(11));
        let mut scene = Scene::new(fluid, SphConfig2D::default());

        let num_frames = 3;
        let mut encoder = FluidDataEncoder::new(dir.clone(), num_frames, 60).unwrap();
        encoder.encode_metadata(&scene).unwrap();

        let mut expected = vec![];
        for _ in 0..num_frames {
            scene.step_frame(5);
            encoder.encode_frame(&scene).unwrap();
            expected.push((
                scene.fluid.iter_positions().map(|&p| p.to_array()).collect::<Vec<_>>(),
                scene.fluid.velocities().iter().map(|&v| v.to_array()).collect::<Vec<_>>(),
            ));
        }
        encoder.finish().unwrap();

        let data = FluidDataDecoder::new(dir.clone()).decode_all().unwrap();
        assert_eq!(data.metadata.dim, 2);
        assert_eq!(data.metadata.fps, 60);
        assert_eq!(data.metadata.num_frames, num_frames);
        assert_eq!(data.metadata.particle_radius, 3.75);
        assert_eq!(data.metadata.size::<2>().unwrap(), [600.0, 800.0]);
        assert_eq!(data.frames.len(), num_frames as usize);

        for (frame, (positions, velocities)) in data.frames.iter().zip(expected) {
            assert_eq!(frame.positions.iter::<2>().collect::<Vec<_>>(), positions);
            assert_eq!(frame.velocities.iter::<2>().collect::<Vec<_>>(), velocities);
            assert_eq!(frame.positions.len::<2>(), 12);
            assert_eq!(frame.positions.get::<2>(1), Some(positions[1]));
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_truncated_frame_is_reported() {
        let dir = temp_dir("truncated");
        let scene = Scene::new(SphFluid2D::from_positions([Vec2::new(50.0, 50.0); 4]), SphConfig2D::default());

        let mut encoder = FluidDataEncoder::new(dir.clone(), 1, 30).unwrap();
        encoder.encode_metadata(&scene).unwrap();
        encoder.encode_frame(&scene).unwrap();
        encoder.finish().unwrap();

        let path = frame_path(&dir, 0, 1);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut decoder = FluidDataDecoder::new(dir.clone());
        decoder.decode_metadata().unwrap();
        assert!(matches!(decoder.decode_frame(), Err(DecodingError::UnexpectedEof)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_oversized_section_length_is_reported() {
        let dir = temp_dir("oversized");
        let scene = Scene::new(SphFluid2D::from_positions([Vec2::new(50.0, 50.0)]), SphConfig2D::default());

        let mut encoder = FluidDataEncoder::new(dir.clone(), 1, 30).unwrap();
        encoder.encode_metadata(&scene).unwrap();

        let path = frame_path(&dir, 0, 1);

        std::fs::write(&path, u64::MAX.to_le_bytes()).unwrap();
        let mut decoder = FluidDataDecoder::new(dir.clone());
        decoder.decode_metadata().unwrap();
        assert!(matches!(decoder.decode_frame(), Err(DecodingError::Corrupt { len: u64::MAX })));

        std::fs::write(&path, (1u64 << 40).to_le_bytes()).unwrap();
        assert!(matches!(decoder.decode_all(), Err(DecodingError::UnexpectedEof)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_encoder_rejects_extra_frames() {
        let dir = temp_dir("extra");
        let scene = Scene::new(SphFluid2D::from_positions([Vec2::new(50.0, 50.0)]), SphConfig2D::default());

        let mut encoder = FluidDataEncoder::new(dir.clone(), 1, 30).unwrap();
        encoder.encode_frame(&scene).unwrap();
        assert!(matches!(
            encoder.encode_frame(&scene),
            Err(EncodingError::TooManyFrames { num_frames: 1 }),
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
