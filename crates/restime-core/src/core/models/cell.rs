use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    #[error("Degenerate periodic cell: the basis matrix is not invertible")]
    Degenerate,
}

/// The periodic simulation cell for one trajectory frame.
///
/// Holds the 3x3 matrix whose columns are the cell basis vectors, together
/// with its precomputed inverse (the reciprocal matrix). The inverse maps a
/// Cartesian displacement into fractional coordinates, which is what makes
/// minimum-image folding correct for triclinic (non-orthogonal) cells; simple
/// per-axis modulo arithmetic would only be valid for orthorhombic ones.
///
/// The cell is recomputed per frame; construction is the single place where a
/// singular matrix is rejected, so every geometry operation downstream is
/// infallible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicCell {
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl PeriodicCell {
    /// Builds a cell from a basis matrix (columns are the basis vectors).
    ///
    /// # Errors
    ///
    /// Returns [`CellError::Degenerate`] if the matrix is not invertible.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Result<Self, CellError> {
        let inverse = matrix.try_inverse().ok_or(CellError::Degenerate)?;
        Ok(Self { matrix, inverse })
    }

    /// Builds an orthorhombic cell with edge lengths `a`, `b`, `c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, CellError> {
        Self::from_matrix(Matrix3::from_diagonal(&Vector3::new(a, b, c)))
    }

    /// The direct basis matrix (columns are the basis vectors).
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// The reciprocal (inverse) matrix.
    pub fn inverse(&self) -> &Matrix3<f64> {
        &self.inverse
    }

    /// Returns the shortest periodic displacement from `a` to `b`.
    ///
    /// The raw displacement `b - a` is fractionalized through the reciprocal
    /// matrix, each fractional component is wrapped to the nearest image by
    /// subtracting its rounded value, and the result is mapped back to
    /// Cartesian space through the direct matrix.
    pub fn minimum_image(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
        let mut fractional = self.inverse * (b - a);
        for i in 0..3 {
            fractional[i] -= fractional[i].round();
        }
        self.matrix * fractional
    }

    /// Euclidean norm of the minimum-image displacement.
    pub fn minimum_image_distance(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.minimum_image(a, b).norm()
    }
}

/// Builds a basis matrix from crystallographic cell parameters.
///
/// `a`, `b`, `c` are the edge lengths and `alpha`, `beta`, `gamma` the cell
/// angles in degrees. The `a` vector lies along x and the `b` vector in the
/// xy plane, which is the standard crystallographic construction.
pub fn lengths_angles_matrix(
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> Matrix3<f64> {
    let alpha = alpha.to_radians();
    let beta = beta.to_radians();
    let gamma = gamma.to_radians();

    let cos_alpha = alpha.cos();
    let cos_beta = beta.cos();
    let cos_gamma = gamma.cos();
    let sin_gamma = gamma.sin();

    let fact = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
    let cz = c * (1.0 - cos_beta * cos_beta - fact * fact).sqrt();

    Matrix3::new(
        a,
        b * cos_gamma,
        c * cos_beta,
        0.0,
        b * sin_gamma,
        c * fact,
        0.0,
        0.0,
        cz,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1.0e-10;

    #[test]
    fn from_matrix_rejects_singular_matrix() {
        let singular = Matrix3::from_diagonal(&Vector3::new(10.0, 0.0, 10.0));
        assert_eq!(PeriodicCell::from_matrix(singular), Err(CellError::Degenerate));
    }

    #[test]
    fn minimum_image_wraps_across_the_cubic_boundary() {
        let cell = PeriodicCell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let a = Point3::new(0.5, 5.0, 5.0);
        let b = Point3::new(9.5, 5.0, 5.0);

        let d = cell.minimum_image(&a, &b);
        assert!((d.x + 1.0).abs() < TOL);
        assert!(d.y.abs() < TOL);
        assert!(d.z.abs() < TOL);
        assert!((cell.minimum_image_distance(&a, &b) - 1.0).abs() < TOL);
    }

    #[test]
    fn separation_just_past_half_the_box_folds_below_half() {
        let l = 10.0;
        let cell = PeriodicCell::orthorhombic(l, l, l).unwrap();
        let a = Point3::origin();
        let b = Point3::new(l / 2.0 + 0.01, 0.0, 0.0);

        assert!(cell.minimum_image_distance(&a, &b) < l / 2.0);
    }

    #[test]
    fn short_displacements_are_unchanged() {
        let cell = PeriodicCell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(2.0, 3.5, 2.0);

        let d = cell.minimum_image(&a, &b);
        assert!((d - (b - a)).norm() < TOL);
    }

    #[test]
    fn triclinic_minimum_image_beats_the_raw_displacement() {
        // A sheared cell: the raw displacement crosses a periodic image that
        // per-axis modulo arithmetic would miss.
        let m = lengths_angles_matrix(10.0, 10.0, 10.0, 90.0, 90.0, 60.0);
        let cell = PeriodicCell::from_matrix(m).unwrap();

        let a = Point3::origin();
        let b = Point3::new(9.0, 0.5, 0.2);
        let folded = cell.minimum_image_distance(&a, &b);
        assert!(folded < (b - a).norm());

        // Folding must land within one cell: every fractional component of
        // the folded displacement lies in [-0.5, 0.5].
        let f = cell.inverse() * cell.minimum_image(&a, &b);
        for i in 0..3 {
            assert!(f[i].abs() <= 0.5 + TOL);
        }
    }

    #[test]
    fn lengths_angles_matrix_reproduces_an_orthorhombic_cell() {
        let m = lengths_angles_matrix(10.0, 20.0, 30.0, 90.0, 90.0, 90.0);
        assert!((m[(0, 0)] - 10.0).abs() < 1.0e-9);
        assert!((m[(1, 1)] - 20.0).abs() < 1.0e-9);
        assert!((m[(2, 2)] - 30.0).abs() < 1.0e-9);
        assert!(m[(1, 0)].abs() < 1.0e-9);
        assert!(m[(0, 1)].abs() < 1.0e-9);
    }

    #[test]
    fn lengths_angles_matrix_preserves_edge_lengths() {
        let m = lengths_angles_matrix(8.0, 9.0, 11.0, 80.0, 95.0, 105.0);
        for (col, len) in [(0, 8.0), (1, 9.0), (2, 11.0)] {
            assert!((m.column(col).norm() - len).abs() < 1.0e-9);
        }
    }
}
