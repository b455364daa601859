use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FluidParams;

use super::{
    kernel::SphKernel2D,
    spatial::{grid_resolution, MAX_GRID_CELLS},
};

/// Particle draw size with respect to the kernel radius.
pub const PARTICLE_SIZE_RATIO: f32 = 0.75;

/// How the density and acceleration passes find the particles inside a kernel radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NeighborSearch {
    /// Visit every particle for every particle.
    #[default]
    AllPairs,
    /// Bin particles into cells of one kernel radius and only visit the surrounding 3x3 cells.
    Grid,
}

/// Raw, unvalidated parameters of a 2D SPH fluid.
///
/// The defaults describe a 600x800 tank of water-like fluid with a kernel radius of `10`. Turn
/// them into a [`SphConfig2D`] before stepping a fluid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SphFluid2DParams {
    /// Smoothing kernel radius `h`.
    pub kernel_radius: f32,
    /// Mass of every particle.
    pub mass: f32,
    /// Stiffness `K` of the linear equation of state.
    pub stiffness: f32,
    /// Density at which pressure is zero.
    pub rest_density: f32,
    /// Dynamic viscosity `μ`.
    pub viscosity: f32,
    /// Timestep of a single tick.
    pub dt: f32,
    /// Distance from each wall at which particles are stopped.
    pub boundary_margin: f32,
    /// Fraction of the normal velocity kept (and reversed) on hitting a wall.
    pub bounce_rate: f32,
    /// Width and height of the tank.
    pub domain: Vec2,
    pub gravity: Vec2,
    pub neighbor_search: NeighborSearch,
}

impl Default for SphFluid2DParams {
    fn default() -> Self {
        let kernel_radius = 10.0;

        Self {
            kernel_radius,
            mass: 10.0,
            stiffness: 2000.0,
            rest_density: 1500.0,
            viscosity: 500.0,
            dt: 0.001,
            boundary_margin: kernel_radius / 2.0,
            bounce_rate: 0.1,
            domain: Vec2::new(600.0, 800.0),
            gravity: Vec2::new(0.0, -2000.0 * 9.8),
            neighbor_search: NeighborSearch::AllPairs,
        }
    }
}

impl SphFluid2DParams {
    /// Checks every parameter the solver would otherwise divide by or degenerate on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.kernel_radius) {
            return Err(ConfigError::KernelRadius(self.kernel_radius));
        }

        if !is_positive(self.mass) {
            return Err(ConfigError::Mass(self.mass));
        }

        if !is_positive(self.dt) {
            return Err(ConfigError::Timestep(self.dt));
        }

        if !(self.stiffness >= 0.0 && self.stiffness.is_finite()) {
            return Err(ConfigError::Stiffness(self.stiffness));
        }

        if !self.rest_density.is_finite() {
            return Err(ConfigError::RestDensity(self.rest_density));
        }

        if !(self.viscosity >= 0.0 && self.viscosity.is_finite()) {
            return Err(ConfigError::Viscosity(self.viscosity));
        }

        if !(0.0..=1.0).contains(&self.bounce_rate) {
            return Err(ConfigError::BounceRate(self.bounce_rate));
        }

        if !(self.boundary_margin >= 0.0 && self.boundary_margin.is_finite()) {
            return Err(ConfigError::BoundaryMargin(self.boundary_margin));
        }

        let inner = self.domain - 2.0 * self.boundary_margin;
        if !(inner.x > 0.0 && inner.y > 0.0 && self.domain.is_finite()) {
            return Err(ConfigError::Domain {
                width: self.domain.x,
                height: self.domain.y,
                margin: self.boundary_margin,
            });
        }

        if !self.gravity.is_finite() {
            return Err(ConfigError::Gravity(self.gravity));
        }

        if self.neighbor_search == NeighborSearch::Grid
            && grid_resolution(self.domain, self.kernel_radius).is_none()
        {
            return Err(ConfigError::GridTooLarge {
                width: self.domain.x,
                height: self.domain.y,
                kernel_radius: self.kernel_radius,
            });
        }

        Ok(())
    }

    /// Radius particles are drawn with.
    pub fn particle_radius(&self) -> f32 {
        0.5 * PARTICLE_SIZE_RATIO * self.kernel_radius
    }
}

#[inline(always)]
fn is_positive(v: f32) -> bool {
    v > 0.0 && v.is_finite()
}

/// Validated parameters together with the kernel coefficients derived from them.
///
/// This is what [`SphFluid2D::step`](super::d2::SphFluid2D::step) consumes, so a fluid can never
/// be stepped with a degenerate kernel radius, mass or timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct SphConfig2D {
    params: SphFluid2DParams,
    kernel: SphKernel2D,
}

impl SphConfig2D {
    pub fn new(params: SphFluid2DParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let kernel = SphKernel2D::new(params.kernel_radius, params.mass, params.viscosity);
        Ok(Self { params, kernel })
    }

    #[inline(always)]
    pub fn params(&self) -> &SphFluid2DParams {
        &self.params
    }

    #[inline(always)]
    pub fn kernel(&self) -> &SphKernel2D {
        &self.kernel
    }

    /// Linear equation of state, `K (ρ - ρ₀)`. Negative below rest density.
    #[inline(always)]
    pub fn pressure(&self, density: f32) -> f32 {
        self.params.stiffness * (density - self.params.rest_density)
    }
}

impl Default for SphConfig2D {
    fn default() -> Self {
        let params = SphFluid2DParams::default();
        let kernel = SphKernel2D::new(params.kernel_radius, params.mass, params.viscosity);

        Self { params, kernel }
    }
}

impl TryFrom<SphFluid2DParams> for SphConfig2D {
    type Error = ConfigError;

    fn try_from(params: SphFluid2DParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

impl FluidParams<2> for SphConfig2D {
    fn domain_size(&self) -> [f32; 2] {
        self.params.domain.into()
    }

    fn particle_radius(&self) -> f32 {
        self.params.particle_radius()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("kernel radius must be positive, got {0}")]
    KernelRadius(f32),
    #[error("particle mass must be positive, got {0}")]
    Mass(f32),
    #[error("timestep must be positive, got {0}")]
    Timestep(f32),
    #[error("stiffness must be non-negative, got {0}")]
    Stiffness(f32),
    #[error("rest density must be finite, got {0}")]
    RestDensity(f32),
    #[error("viscosity must be non-negative, got {0}")]
    Viscosity(f32),
    #[error("bounce rate must lie in [0, 1], got {0}")]
    BounceRate(f32),
    #[error("boundary margin must be non-negative, got {0}")]
    BoundaryMargin(f32),
    #[error("a {width}x{height} domain leaves no room inside a boundary margin of {margin}")]
    Domain { width: f32, height: f32, margin: f32 },
    #[error("gravity must be finite, got {0}")]
    Gravity(Vec2),
    #[error(
        "a grid search over a {width}x{height} domain with kernel radius {kernel_radius} needs more \
        than {max} cells",
        max = MAX_GRID_CELLS
    )]
    GridTooLarge { width: f32, height: f32, kernel_radius: f32 },
}
