//! Weakly compressible smoothed-particle hydrodynamics in two dimensions.

pub mod d2;
pub mod kernel;
pub mod params;
pub mod particle;
mod spatial;

pub use d2::{Diagnostics, SphFluid2D, MIN_DENSITY};
pub use kernel::SphKernel2D;
pub use params::{ConfigError, NeighborSearch, SphConfig2D, SphFluid2DParams, PARTICLE_SIZE_RATIO};
pub use particle::{GridLayout, Particle};
pub use spatial::MAX_GRID_CELLS;
