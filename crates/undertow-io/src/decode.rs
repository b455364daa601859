use std::{fs::File, io::{self, BufReader, Read}, path::PathBuf};

use log::debug;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{frame_path, METADATA_FILE};

/// Frames preallocated by [`FluidDataDecoder::decode_all`] before any has been read.
const MAX_PREALLOCATED_FRAMES: u64 = 1024;

use super::as_bytes::AsBytes;

pub struct FluidDataDecoder {
    /// The path to the directory in which the fluid data resides.
    path: PathBuf,
    dim: u8,
    num_frames: u64,
    current_frame: u64,
}

impl FluidDataDecoder {
    pub fn new(path: PathBuf) -> FluidDataDecoder {
        Self {
            path,
            dim: 0,
            num_frames: 0,
            current_frame: 0,
        }
    }

    fn read_value<const N: usize, T: AsBytes<N>, R: Read>(reader: &mut R) -> Result<T, DecodingError> {
        let mut bytes = [0; N];
        reader.read_exact(&mut bytes)?;

        Ok(T::from_bytes(bytes))
    }

    fn read_section<R: Read>(&self, reader: &mut R) -> Result<FluidDataArray, DecodingError> {
        let len = Self::read_value::<8, u64, _>(reader)?;
        let num_bytes = len
            .checked_mul(self.dim as u64 * 4)
            .ok_or(DecodingError::Corrupt { len })?;

        // The length is untrusted, so the buffer only grows as far as the file actually goes.
        let mut bytes = Vec::new();
        reader.by_ref().take(num_bytes).read_to_end(&mut bytes)?;

        if (bytes.len() as u64) < num_bytes {
            return Err(DecodingError::UnexpectedEof);
        }

        let values = bytes
            .chunks_exact(4)
            .map(|b| f32::from_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(FluidDataArray(values))
    }

    /// Reads `_meta`. Must be called before any frame is decoded.
    pub fn decode_metadata(&mut self) -> Result<FluidMetadata, DecodingError> {
        let path = self.path.join(METADATA_FILE);
        let mut reader = BufReader::new(File::open(path)?);

        let dim = Self::read_value::<1, u8, _>(&mut reader)?;
        let fps = Self::read_value::<4, u32, _>(&mut reader)?;
        let num_frames = Self::read_value::<8, u64, _>(&mut reader)?;
        let particle_radius = Self::read_value::<4, f32, _>(&mut reader)?;
        let mut size: SmallVec<[_; 4]> = SmallVec::new();

        for _ in 0..dim {
            let v = Self::read_value::<4, f32, _>(&mut reader)?;
            size.push(v);
        }

        self.dim = dim;
        self.num_frames = num_frames;

        Ok(FluidMetadata {
            dim,
            fps,
            num_frames,
            particle_radius,
            size,
        })
    }

    /// Reads the next frame, or `None` once every frame has been read.
    pub fn decode_frame(&mut self) -> Result<Option<FluidFrameData>, DecodingError> {
        if self.current_frame >= self.num_frames {
            return Ok(None)
        }

        let path = frame_path(&self.path, self.current_frame, self.num_frames);
        let mut reader = BufReader::new(File::open(path)?);

        let positions = self.read_section(&mut reader)?;
        let velocities = self.read_section(&mut reader)?;

        self.current_frame += 1;

        Ok(Some(FluidFrameData {
            positions,
            velocities,
        }))
    }

    /// Reads the whole recording from the start.
    pub fn decode_all(&mut self) -> Result<FluidData, DecodingError> {
        self.reset();

        let metadata = self.decode_metadata()?;
        let capacity = metadata.num_frames.min(MAX_PREALLOCATED_FRAMES) as usize;
        let mut frames = Vec::with_capacity(capacity);

        while let Some(frame) = self.decode_frame()? {
            frames.push(frame);
        }

        debug!("decoded {} frames from {}", frames.len(), self.path.display());

        Ok(FluidData { metadata, frames })
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
    }
}

pub struct FluidMetadata {
    pub dim: u8,
    pub fps: u32,
    pub num_frames: u64,
    pub particle_radius: f32,
    pub size: SmallVec<[f32; 4]>,
}

impl FluidMetadata {
    pub fn size<const D: usize>(&self) -> Result<[f32; D], DecodingError> {
        self.size
            .as_slice()
            .try_into()
            .map_err(|_| DecodingError::DimensionMismatch { expected: D, found: self.dim })
    }
}

pub struct FluidFrameData {
    pub positions: FluidDataArray,
    pub velocities: FluidDataArray,
}

/// A flat list of `D`-vectors.
pub struct FluidDataArray(Vec<f32>);

impl FluidDataArray {
    pub fn iter<const D: usize>(&self) -> impl Iterator<Item = [f32; D]> + '_ {
        self.0.chunks_exact(D).map(|chunk| std::array::from_fn(|k| chunk[k]))
    }

    pub fn get<const D: usize>(&self, i: usize) -> Option<[f32; D]> {
        let chunk = self.0.get(i * D..(i + 1) * D)?;
        Some(std::array::from_fn(|k| chunk[k]))
    }

    pub fn len<const D: usize>(&self) -> usize {
        self.0.len() / D
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A fully decoded recording.
pub struct FluidData {
    pub metadata: FluidMetadata,
    pub frames: Vec<FluidFrameData>,
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error(transparent)]
    Io(io::Error),
    #[error("recording ended in the middle of a value")]
    UnexpectedEof,
    #[error("section claims {len} vectors, more than can be addressed")]
    Corrupt { len: u64 },
    #[error("expected a {expected}D recording, found {found}D")]
    DimensionMismatch { expected: usize, found: u8 },
}

impl From<io::Error> for DecodingError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => DecodingError::UnexpectedEof,
            _ => DecodingError::Io(e),
        }
    }
}
