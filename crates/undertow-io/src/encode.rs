use std::{fs::File, io::{BufWriter, Write}, path::PathBuf};

use log::debug;
use thiserror::Error;

use undertow_fluids::{scene::Scene, Fluid};

use crate::{frame_path, EncodeFluid, METADATA_FILE};

use super::as_bytes::AsBytes;

pub struct FluidDataEncoder {
    /// The path to the directory into which the fluid data will be placed.
    path: PathBuf,
    num_frames: u64,
    fps: u32,
    current_frame: u64,
}

impl FluidDataEncoder {
    /// Prepares a recording of `num_frames` frames in `path`, creating the directory if needed.
    pub fn new(path: PathBuf, num_frames: u64, fps: u32) -> Result<FluidDataEncoder, EncodingError> {
        std::fs::create_dir_all(&path)?;

        Ok(Self {
            path,
            num_frames,
            fps,
            current_frame: 0,
        })
    }

    pub fn encode_metadata<const D: usize, F: Fluid<D>>(&mut self, scene: &Scene<D, F>) -> Result<(), EncodingError> {
        let path = self.path.join(METADATA_FILE);
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(&(D as u8).to_bytes())?;
        writer.write_all(&self.fps.to_bytes())?;
        writer.write_all(&self.num_frames.to_bytes())?;
        writer.write_all(&scene.particle_radius().to_bytes())?;

        for extent in scene.size() {
            writer.write_all(&extent.to_bytes())?;
        }

        writer.flush()?;

        Ok(())
    }

    pub fn encode_frame<const D: usize, F>(&mut self, scene: &Scene<D, F>) -> Result<(), EncodingError>
    where
        F: Fluid<D> + EncodeFluid<D>,
    {
        if self.current_frame >= self.num_frames {
            return Err(EncodingError::TooManyFrames { num_frames: self.num_frames });
        }

        let path = frame_path(&self.path, self.current_frame, self.num_frames);
        let mut encoder = FluidFrameEncoder { writer: BufWriter::new(File::create(path)?) };

        scene.fluid.encode_state(&mut encoder)?;
        encoder.finish()?;

        self.current_frame += 1;

        Ok(())
    }

    /// Checks that every announced frame was written.
    pub fn finish(self) -> Result<(), EncodingError> {
        if self.current_frame != self.num_frames {
            return Err(EncodingError::MissingFrames {
                num_frames: self.num_frames,
                written: self.current_frame,
            });
        }

        debug!("wrote {} frames to {}", self.num_frames, self.path.display());

        Ok(())
    }
}

pub struct FluidFrameEncoder<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> FluidFrameEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: BufWriter::new(writer) }
    }

    /// Writes `len` followed by the bytes of every value.
    pub fn encode_section<const N: usize, T, I>(&mut self, len: usize, values: I) -> Result<(), EncodingError>
    where
        I: Iterator<Item = T>,
        T: AsBytes<N>,
    {
        self.writer.write_all(&(len as u64).to_bytes())?;

        let mut written = 0;
        for v in values {
            self.writer.write_all(&v.to_bytes())?;
            written += 1;
        }

        if written != len {
            return Err(EncodingError::SectionLength { len, written });
        }

        Ok(())
    }

    pub fn finish(mut self) -> Result<(), EncodingError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("recording only holds {num_frames} frames")]
    TooManyFrames { num_frames: u64 },
    #[error("recording announced {num_frames} frames but {written} were written")]
    MissingFrames { num_frames: u64, written: u64 },
    #[error("section announced {len} values but {written} were written")]
    SectionLength { len: usize, written: usize },
}
