use glam::{IVec2, UVec2, Vec2};
use log::warn;
use ndarray::ArrayView1;

use super::params::NeighborSearch;

/// Largest number of cells a grid neighbour search may allocate.
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Cells per axis of a grid with cells `cell_size` wide over `domain`, or `None` if the grid
/// would exceed [`MAX_GRID_CELLS`].
pub(crate) fn grid_resolution(domain: Vec2, cell_size: f32) -> Option<UVec2> {
    let resolution = (domain / cell_size).floor() + 1.0;
    if !(resolution.is_finite() && resolution.x >= 1.0 && resolution.y >= 1.0) {
        return None;
    }

    let cells = (resolution.x as usize).checked_mul(resolution.y as usize)?;
    (cells <= MAX_GRID_CELLS).then(|| resolution.as_uvec2())
}

/// Uniform grid over the domain, with particles bucketed by cell through a counting sort.
///
/// Cells are one kernel radius wide, so every particle within a kernel radius of a point lies in
/// the 3x3 block of cells around it. Positions outside the domain are clamped into the edge cells,
/// which keeps that property.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParticleGrid2D {
    cell_size: f32,
    resolution: UVec2,

    /// Number of particles per cell.
    cell_particle_count: Vec<usize>,
    /// Index into `cell_particle_indices` of the first particle of each cell, plus a final entry
    /// holding the particle count.
    first_cell_particle: Vec<usize>,
    cell_particle_indices: Vec<usize>,

    rebuild_count: usize,
}

impl ParticleGrid2D {
    pub fn rebuild(&mut self, positions: ArrayView1<Vec2>, cell_size: f32, domain: Vec2) {
        match grid_resolution(domain, cell_size) {
            Some(resolution) => {
                self.cell_size = cell_size;
                self.resolution = resolution;
            },
            None => {
                // A single infinitely wide cell, i.e. all pairs.
                warn!("a grid of {cell_size}-wide cells over {domain} is too large, visiting all pairs");
                self.cell_size = f32::INFINITY;
                self.resolution = UVec2::ONE;
            },
        }

        self.rebuild_count += 1;

        let cell_count = self.resolution.x as usize * self.resolution.y as usize;

        self.cell_particle_count.clear();
        self.cell_particle_count.resize(cell_count, 0);
        self.first_cell_particle.clear();
        self.first_cell_particle.resize(cell_count + 1, 0);
        self.cell_particle_indices.clear();
        self.cell_particle_indices.resize(positions.len(), 0);

        for &p in positions.iter() {
            let cell_nr = self.cell_index(self.cell_of(p));
            self.cell_particle_count[cell_nr] += 1;
        }

        let mut first = 0;

        for (count, first_cell) in self.cell_particle_count.iter().zip(self.first_cell_particle.iter_mut()) {
            first += count;
            *first_cell = first;
        }

        self.first_cell_particle[cell_count] = first;

        for (i, &p) in positions.iter().enumerate() {
            let cell_nr = self.cell_index(self.cell_of(p));
            self.first_cell_particle[cell_nr] -= 1;
            self.cell_particle_indices[self.first_cell_particle[cell_nr]] = i;
        }
    }

    /// Calls `f` with the index of every particle in the 3x3 block of cells around `p`.
    pub fn for_each_candidate(&self, p: Vec2, mut f: impl FnMut(usize)) {
        if self.cell_particle_indices.is_empty() {
            return;
        }

        let pi = self.cell_of(p);
        let p0 = pi.max(UVec2::ONE) - 1;
        let p1 = (pi + 1).min(self.resolution - 1);

        for xi in p0.x..=p1.x {
            for yi in p0.y..=p1.y {
                let cell_nr = self.cell_index(UVec2::new(xi, yi));
                let first = self.first_cell_particle[cell_nr];
                let last = self.first_cell_particle[cell_nr + 1];

                for &id in &self.cell_particle_indices[first..last] {
                    f(id);
                }
            }
        }
    }

    /// Number of rebuilds since creation.
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    #[inline(always)]
    fn cell_of(&self, p: Vec2) -> UVec2 {
        (p / self.cell_size)
            .floor()
            .as_ivec2()
            .clamp(IVec2::ZERO, self.resolution.as_ivec2() - 1)
            .as_uvec2()
    }

    #[inline(always)]
    fn cell_index(&self, cell: UVec2) -> usize {
        cell.x as usize * self.resolution.y as usize + cell.y as usize
    }
}

/// The candidate set a stage sums over for each particle.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Neighbors<'a> {
    All(usize),
    Grid(&'a ParticleGrid2D),
}

impl<'a> Neighbors<'a> {
    pub fn new(search: NeighborSearch, n_particles: usize, grid: &'a ParticleGrid2D) -> Self {
        match search {
            NeighborSearch::AllPairs => Neighbors::All(n_particles),
            NeighborSearch::Grid => Neighbors::Grid(grid),
        }
    }

    /// Calls `f` with a superset of the particles within a kernel radius of `p`, `p`'s own
    /// particle included. Callers still apply the kernel's support test.
    #[inline(always)]
    pub fn for_each(&self, p: Vec2, f: impl FnMut(usize)) {
        match self {
            Neighbors::All(n) => (0..*n).for_each(f),
            Neighbors::Grid(grid) => grid.for_each_candidate(p, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array1;

    use super::*;

    fn candidates(grid: &ParticleGrid2D, p: Vec2) -> Vec<usize> {
        let mut ids = vec![];
        grid.for_each_candidate(p, |i| ids.push(i));
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_every_particle_is_binned_once() {
        let positions = Array1::from_iter((0..50).map(|i| Vec2::new(i as f32 * 7.3 % 100.0, i as f32 * 3.1 % 60.0)));
        let mut grid = ParticleGrid2D::default();
        grid.rebuild(positions.view(), 10.0, Vec2::new(100.0, 60.0));

        let mut seen = grid.cell_particle_indices.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
        assert_eq!(*grid.first_cell_particle.last().unwrap(), 50);
    }

    #[test]
    fn test_candidates_cover_kernel_radius() {
        let h = 10.0;
        let positions = Array1::from_iter((0..400).map(|i| Vec2::new((i % 20) as f32 * 4.7, (i / 20) as f32 * 3.9)));
        let mut grid = ParticleGrid2D::default();
        grid.rebuild(positions.view(), h, Vec2::new(95.0, 80.0));

        for (i, &p) in positions.iter().enumerate() {
            let found = candidates(&grid, p);
            assert!(found.contains(&i));

            for (j, &q) in positions.iter().enumerate() {
                if p.distance(q) < h {
                    assert!(found.contains(&j), "particle {j} missing from the neighbours of {i}");
                }
            }
        }
    }

    #[test]
    fn test_out_of_domain_positions_are_clamped() {
        let positions = Array1::from_vec(vec![Vec2::new(-4.0, -4.0), Vec2::new(3.0, 3.0), Vec2::new(250.0, 5.0)]);
        let mut grid = ParticleGrid2D::default();
        grid.rebuild(positions.view(), 10.0, Vec2::new(100.0, 100.0));

        assert_eq!(candidates(&grid, Vec2::new(-4.0, -4.0)), vec![0, 1]);
        assert_eq!(candidates(&grid, Vec2::new(250.0, 5.0)), vec![2]);
    }

    #[test]
    fn test_grid_resolution_limit() {
        assert_eq!(grid_resolution(Vec2::new(600.0, 800.0), 10.0), Some(UVec2::new(61, 81)));
        assert_eq!(grid_resolution(Vec2::new(600.0, 800.0), 0.01), None);
        assert_eq!(grid_resolution(Vec2::new(600.0, 800.0), 0.0), None);
    }

    #[test]
    fn test_oversized_grid_visits_all_pairs() {
        let positions = Array1::from_vec(vec![Vec2::new(1.0, 1.0), Vec2::new(300.0, 10.0), Vec2::new(599.0, 799.0)]);
        let mut grid = ParticleGrid2D::default();
        grid.rebuild(positions.view(), 0.01, Vec2::new(600.0, 800.0));

        assert_eq!(grid.resolution, UVec2::ONE);
        for &p in positions.iter() {
            assert_eq!(candidates(&grid, p), vec![0, 1, 2]);
        }
    }
}
