use std::f32::consts::PI;

/// Smoothing kernels of the 2D weakly compressible solver, with their normalisation and the
/// particle mass folded into three coefficients.
///
/// All three kernels have compact support: every term is zero at or beyond [`Self::radius`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphKernel2D {
    /// Support radius `h`.
    pub radius: f32,
    radius_sq: f32,
    /// `4m / (π h⁸)`, turns a sum of [`Self::density_term`]s into a density.
    pub density_coeff: f32,
    /// `-30m / (π h⁵)`, scales the summed pressure gradient into an acceleration.
    pub pressure_coeff: f32,
    /// `20μm / (3π h⁵)`, scales the summed viscosity laplacian into an acceleration.
    pub viscosity_coeff: f32,
}

impl SphKernel2D {
    pub fn new(radius: f32, mass: f32, viscosity: f32) -> Self {
        let h2 = radius * radius;
        let h4 = h2 * h2;
        let h5 = h4 * radius;
        let h8 = h4 * h4;

        Self {
            radius,
            radius_sq: h2,
            density_coeff: 4.0 * mass / (PI * h8),
            pressure_coeff: -30.0 * mass / (PI * h5),
            viscosity_coeff: 20.0 * viscosity * mass / (3.0 * PI * h5),
        }
    }

    #[inline(always)]
    pub fn radius_squared(&self) -> f32 {
        self.radius_sq
    }

    /// Whether a pair at squared distance `r_sq` interacts at all.
    #[inline(always)]
    pub fn supports(&self, r_sq: f32) -> bool {
        r_sq < self.radius_sq
    }

    /// Poly6 term `(h² - r²)³`.
    #[inline(always)]
    pub fn density_term(&self, r_sq: f32) -> f32 {
        if self.supports(r_sq) {
            let d = self.radius_sq - r_sq;
            d * d * d
        } else {
            0.0
        }
    }

    /// Spiky gradient magnitude `(h - r)²`.
    #[inline(always)]
    pub fn pressure_term(&self, r: f32) -> f32 {
        let d = (self.radius - r).max(0.0);
        d * d
    }

    /// Viscosity laplacian `h - r`.
    #[inline(always)]
    pub fn viscosity_term(&self, r: f32) -> f32 {
        (self.radius - r).max(0.0)
    }

    /// Density of a particle with nothing else inside its support, i.e. only its own `h⁶` term.
    pub fn self_density(&self) -> f32 {
        self.density_coeff * self.density_term(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients() {
        let kernel = SphKernel2D::new(10.0, 10.0, 500.0);

        let density = 4.0 * 10.0 / (PI * 1.0e8);
        let pressure = -30.0 * 10.0 / (PI * 1.0e5);
        let viscosity = 20.0 * 500.0 * 10.0 / (3.0 * PI * 1.0e5);

        assert!((kernel.density_coeff - density).abs() <= density * 1e-5);
        assert!((kernel.pressure_coeff - pressure).abs() <= pressure.abs() * 1e-5);
        assert!((kernel.viscosity_coeff - viscosity).abs() <= viscosity * 1e-5);
    }

    #[test]
    fn test_compact_support() {
        let kernel = SphKernel2D::new(2.0, 1.0, 1.0);

        assert_eq!(kernel.density_term(4.0), 0.0);
        assert_eq!(kernel.density_term(9.0), 0.0);
        assert_eq!(kernel.pressure_term(2.0), 0.0);
        assert_eq!(kernel.pressure_term(3.0), 0.0);
        assert_eq!(kernel.viscosity_term(2.5), 0.0);

        assert_eq!(kernel.density_term(0.0), 64.0);
        assert_eq!(kernel.pressure_term(0.0), 4.0);
        assert_eq!(kernel.viscosity_term(0.5), 1.5);
    }

    #[test]
    fn test_self_density() {
        let kernel = SphKernel2D::new(10.0, 10.0, 500.0);
        let expected = kernel.density_coeff * 1.0e6;

        assert!((kernel.self_density() - expected).abs() <= expected * 1e-6);
        assert!(kernel.self_density() > 0.0);
    }
}
