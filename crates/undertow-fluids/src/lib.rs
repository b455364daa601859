pub mod scene;
pub mod sph;

/// A particle fluid that advances in discrete ticks.
pub trait Fluid<const D: usize> {
    type Params: FluidParams<D>;

    /// Advances the fluid by one tick.
    fn step(&mut self, params: &Self::Params);

    fn num_particles(&self) -> usize;
}

/// The parts of a fluid's parameters that outlive the solver: what a recording or a viewer needs
/// to know about the scene.
pub trait FluidParams<const D: usize> {
    /// Domain size.
    fn domain_size(&self) -> [f32; D];

    /// Radius particles are drawn with.
    fn particle_radius(&self) -> f32;
}
