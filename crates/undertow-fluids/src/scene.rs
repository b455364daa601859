use log::{debug, trace};

use super::{Fluid, FluidParams};

pub struct Scene<const D: usize, F: Fluid<D>> {
    /// The fluid for this scene.
    pub fluid: F,
    /// The parameters for this scene's fluid.
    params: F::Params,
    /// The number of ticks simulated so far.
    tick: u64,
}

impl<const D: usize, F: Fluid<D>> Scene<D, F> {
    #[inline(always)]
    pub fn new(fluid: F, params: F::Params) -> Self {
        Self {
            fluid,
            params,
            tick: 0,
        }
    }

    #[inline(always)]
    pub fn size(&self) -> [f32; D] {
        self.params.domain_size()
    }

    #[inline(always)]
    pub fn particle_radius(&self) -> f32 {
        self.params.particle_radius()
    }

    #[inline(always)]
    pub fn params(&self) -> &F::Params {
        &self.params
    }

    #[inline(always)]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advances the fluid by a single tick.
    pub fn step(&mut self) {
        self.fluid.step(&self.params);
        self.tick += 1;

        trace!("tick {} done", self.tick);
    }

    /// Advances the fluid by `ticks` ticks, e.g. everything that happens between two rendered
    /// frames.
    pub fn step_frame(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }

        debug!(
            "stepped {ticks} ticks of {} particles, now at tick {}",
            self.fluid.num_particles(), self.tick,
        );
    }
}
