use glam::Vec2;
use rand::Rng;

/// A snapshot of a single SPH particle.
///
/// [`SphFluid2D`](super::d2::SphFluid2D) stores its particles column-wise; this is the record used
/// to seed a fluid and to read one particle back out of it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Net acceleration of the last tick.
    pub acceleration: Vec2,
    /// Density of the last tick.
    pub density: f32,
    /// Pressure of the last tick, negative below rest density.
    pub pressure: f32,
}

impl Particle {
    /// A particle at rest at `position`.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// A rectangular block of particles, laid out column by column with some horizontal jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    /// Distance between neighbouring columns (`x`) and rows (`y`).
    pub spacing: Vec2,
    /// Position of the first particle before jitter.
    pub start: Vec2,
    /// Maximum horizontal offset applied to every particle, in either direction.
    pub jitter: f32,
}

impl GridLayout {
    /// A tall 15x75 column of fluid in the bottom left corner, spaced for kernel radius `h`.
    pub fn for_kernel_radius(h: f32) -> Self {
        Self {
            columns: 15,
            rows: 75,
            spacing: Vec2::new(0.9 * h, h),
            start: Vec2::splat(10.0),
            jitter: 0.1 * h,
        }
    }

    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generates the particle positions, drawing jitter from `rng`.
    pub fn positions<'a, R: Rng>(&'a self, rng: &'a mut R) -> impl Iterator<Item = Vec2> + 'a {
        let jitter = self.jitter.abs();

        (0..self.columns)
            .flat_map(move |i| (0..self.rows).map(move |j| (i, j)))
            .map(move |(i, j)| {
                let mut p = self.start + self.spacing * Vec2::new(i as f32, j as f32);
                if jitter > 0.0 {
                    p.x += rng.gen_range(-jitter..=jitter);
                }
                p
            })
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::for_kernel_radius(10.0)
    }
}
