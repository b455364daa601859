use glam::Vec2;
use log::warn;
use ndarray::{azip, Array1, ArrayView1, Zip};
use rand::Rng;

use crate::Fluid;

use super::{
    params::{NeighborSearch, SphConfig2D},
    particle::{GridLayout, Particle},
    spatial::{Neighbors, ParticleGrid2D},
};

/// Smallest density the solver divides by.
///
/// A particle always sees its own kernel term, so this only matters for particles seeded with a
/// zero density and stepped out of order.
pub const MIN_DENSITY: f32 = 1e-6;

/// A weakly compressible 2D SPH fluid.
///
/// The particle count is fixed at construction. Every tick runs four passes in order, each one
/// finishing for all particles before the next starts:
///
/// 1. [`update_density_pressure`](Self::update_density_pressure)
/// 2. [`update_acceleration`](Self::update_acceleration)
/// 3. [`integrate`](Self::integrate)
/// 4. [`enforce_boundaries`](Self::enforce_boundaries)
///
/// Particle state is stored column-wise and each pass writes only columns it does not read, so no
/// particle ever observes a neighbour's half-updated state.
#[derive(Debug, Clone)]
pub struct SphFluid2D {
    /// Particle positions.
    positions: Array1<Vec2>,
    /// Particle velocities.
    velocities: Array1<Vec2>,
    /// Net particle accelerations of the last tick.
    accelerations: Array1<Vec2>,
    /// Particle densities of the last tick.
    densities: Array1<f32>,
    /// Particle pressures of the last tick.
    pressures: Array1<f32>,

    grid: ParticleGrid2D,
}

impl SphFluid2D {
    /// Creates a fluid from explicit particle records.
    pub fn from_particles<I: IntoIterator<Item = Particle>>(particles: I) -> Self {
        let particles: Vec<Particle> = particles.into_iter().collect();

        Self {
            positions: particles.iter().map(|p| p.position).collect(),
            velocities: particles.iter().map(|p| p.velocity).collect(),
            accelerations: particles.iter().map(|p| p.acceleration).collect(),
            densities: particles.iter().map(|p| p.density).collect(),
            pressures: particles.iter().map(|p| p.pressure).collect(),
            grid: ParticleGrid2D::default(),
        }
    }

    /// Creates a fluid of particles at rest at the given positions.
    pub fn from_positions<I: IntoIterator<Item = Vec2>>(positions: I) -> Self {
        Self::from_particles(positions.into_iter().map(Particle::new))
    }

    /// Creates a fluid of particles at rest laid out in a jittered grid.
    pub fn from_grid<R: Rng>(layout: &GridLayout, rng: &mut R) -> Self {
        Self::from_positions(layout.positions(rng))
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates over the current particle positions, in particle order.
    pub fn iter_positions(&self) -> impl Iterator<Item = &Vec2> {
        self.positions.iter()
    }

    pub fn positions(&self) -> ArrayView1<Vec2> {
        self.positions.view()
    }

    pub fn velocities(&self) -> ArrayView1<Vec2> {
        self.velocities.view()
    }

    pub fn accelerations(&self) -> ArrayView1<Vec2> {
        self.accelerations.view()
    }

    pub fn densities(&self) -> ArrayView1<f32> {
        self.densities.view()
    }

    pub fn pressures(&self) -> ArrayView1<f32> {
        self.pressures.view()
    }

    pub fn particle(&self, i: usize) -> Option<Particle> {
        Some(Particle {
            position: *self.positions.get(i)?,
            velocity: self.velocities[i],
            acceleration: self.accelerations[i],
            density: self.densities[i],
            pressure: self.pressures[i],
        })
    }

    pub fn iter_particles(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.len()).filter_map(|i| self.particle(i))
    }

    /// Runs one full tick.
    pub fn step(&mut self, config: &SphConfig2D) {
        let params = config.params();

        // Positions only move in `integrate`, so one grid serves both neighbour passes.
        self.refresh_grid(config);
        self.density_pressure_pass(config);
        self.acceleration_pass(config);
        self.integrate(params.dt);
        self.enforce_boundaries(params.domain, params.boundary_margin, params.bounce_rate);
    }

    fn refresh_grid(&mut self, config: &SphConfig2D) {
        let params = config.params();

        if params.neighbor_search == NeighborSearch::Grid {
            self.grid.rebuild(self.positions.view(), params.kernel_radius, params.domain);
        }
    }

    /// Recomputes every density from the current positions, then every pressure from its
    /// density.
    ///
    /// Each particle sums the poly6 term of every particle within the kernel radius, its own
    /// `h⁶` term included, so densities are never below [`SphKernel2D::self_density`].
    ///
    /// [`SphKernel2D::self_density`]: super::kernel::SphKernel2D::self_density
    pub fn update_density_pressure(&mut self, config: &SphConfig2D) {
        self.refresh_grid(config);
        self.density_pressure_pass(config);
    }

    fn density_pressure_pass(&mut self, config: &SphConfig2D) {
        let kernel = config.kernel();
        let neighbors = Neighbors::new(config.params().neighbor_search, self.positions.len(), &self.grid);
        let positions = self.positions.view();

        let update = |rho: &mut f32, p: &mut f32, &qi: &Vec2| {
            let mut sum = 0.0;
            neighbors.for_each(qi, |j| sum += kernel.density_term(qi.distance_squared(positions[j])));

            *rho = (kernel.density_coeff * sum).max(MIN_DENSITY);
            *p = config.pressure(*rho);
        };

        let zip = Zip::from(&mut self.densities)
            .and(&mut self.pressures)
            .and(&self.positions);

        #[cfg(feature = "parallel")]
        zip.par_for_each(update);
        #[cfg(not(feature = "parallel"))]
        zip.for_each(update);
    }

    /// Recomputes every acceleration from gravity plus the pressure gradient and viscosity
    /// contributions of all particles within the kernel radius.
    ///
    /// Reads the densities and pressures of the same tick, so
    /// [`update_density_pressure`](Self::update_density_pressure) must have run since positions
    /// last changed.
    pub fn update_acceleration(&mut self, config: &SphConfig2D) {
        self.refresh_grid(config);
        self.acceleration_pass(config);
    }

    fn acceleration_pass(&mut self, config: &SphConfig2D) {
        let kernel = config.kernel();
        let gravity = config.params().gravity;
        let neighbors = Neighbors::new(config.params().neighbor_search, self.positions.len(), &self.grid);

        let positions = self.positions.view();
        let velocities = self.velocities.view();
        let densities = self.densities.view();
        let pressures = self.pressures.view();

        let update = |a: &mut Vec2, &qi: &Vec2, &vi: &Vec2, &rho_i: &f32, &p_i: &f32| {
            let rho_i = rho_i.max(MIN_DENSITY);
            let mut a_press = Vec2::ZERO;
            let mut a_visco = Vec2::ZERO;

            neighbors.for_each(qi, |j| {
                let diff = qi - positions[j];
                let r_sq = diff.length_squared();
                if !kernel.supports(r_sq) {
                    return;
                }

                let r = r_sq.sqrt();
                let rho_ij = rho_i * densities[j].max(MIN_DENSITY);

                // A pair at zero distance (the particle itself, or one stacked exactly on top of
                // it) has no direction to push along and contributes no pressure force.
                let dir = diff.normalize_or_zero();

                a_press += (p_i + pressures[j]) / (2.0 * rho_ij) * kernel.pressure_term(r) * dir;
                a_visco += (velocities[j] - vi) / rho_ij * kernel.viscosity_term(r);
            });

            *a = gravity + kernel.pressure_coeff * a_press + kernel.viscosity_coeff * a_visco;
        };

        let zip = Zip::from(&mut self.accelerations)
            .and(&self.positions)
            .and(&self.velocities)
            .and(&self.densities)
            .and(&self.pressures);

        #[cfg(feature = "parallel")]
        zip.par_for_each(update);
        #[cfg(not(feature = "parallel"))]
        zip.for_each(update);
    }

    /// Semi-implicit Euler: velocities first, then positions with the new velocities.
    pub fn integrate(&mut self, dt: f32) {
        azip!((v in &mut self.velocities, q in &mut self.positions, &a in &self.accelerations) {
            *v += dt * a;
            *q += dt * *v;
        });
    }

    /// Clamps particles into `[margin, domain - margin]` on both axes, reversing and damping the
    /// velocity component of every axis that was clamped.
    pub fn enforce_boundaries(&mut self, domain: Vec2, margin: f32, bounce_rate: f32) {
        let min = Vec2::splat(margin);
        let max = domain - margin;

        azip!((q in &mut self.positions, v in &mut self.velocities) {
            if q.x < min.x {
                q.x = min.x;
                v.x *= -bounce_rate;
            }

            if q.x > max.x {
                q.x = max.x;
                v.x *= -bounce_rate;
            }

            if q.y < min.y {
                q.y = min.y;
                v.y *= -bounce_rate;
            }

            if q.y > max.y {
                q.y = max.y;
                v.y *= -bounce_rate;
            }
        });
    }

    /// Whether every particle field is free of NaN and infinity.
    pub fn is_finite(&self) -> bool {
        self.positions.iter().all(|p| p.is_finite())
            && self.velocities.iter().all(|v| v.is_finite())
            && self.accelerations.iter().all(|a| a.is_finite())
            && self.densities.iter().all(|rho| rho.is_finite())
            && self.pressures.iter().all(|p| p.is_finite())
    }

    pub fn diagnostics(&self, config: &SphConfig2D) -> Diagnostics {
        if self.is_empty() {
            return Diagnostics::default();
        }

        let mass = config.params().mass;
        let max_speed_sq = self.velocities.iter().map(|v| v.length_squared()).fold(0.0, f32::max);
        let speed_sq_sum: f32 = self.velocities.iter().map(|v| v.length_squared()).sum();

        let diagnostics = Diagnostics {
            mean_density: self.densities.sum() / self.len() as f32,
            max_density: self.densities.iter().copied().fold(0.0, f32::max),
            max_speed: max_speed_sq.sqrt(),
            kinetic_energy: 0.5 * mass * speed_sq_sum,
        };

        if !self.is_finite() {
            warn!("fluid state is no longer finite: {diagnostics:?}");
        }

        diagnostics
    }
}

impl Fluid<2> for SphFluid2D {
    type Params = SphConfig2D;

    fn step(&mut self, params: &Self::Params) {
        SphFluid2D::step(self, params);
    }

    fn num_particles(&self) -> usize {
        self.len()
    }
}

/// Summary statistics of a fluid, for logging and overlays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Diagnostics {
    pub mean_density: f32,
    pub max_density: f32,
    pub max_speed: f32,
    pub kinetic_energy: f32,
}
