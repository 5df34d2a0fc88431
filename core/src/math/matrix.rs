use ndarray::{arr1, arr2, Array1, Array2, ArrayView1, ArrayView2};

/// Rotation and vector helpers for 3x3 frames in the local ENU space.
///
/// Angles are in degrees. Rotations are active and right-handed: a positive
/// angle turns a vector counter-clockwise when looking down the axis.
pub struct MatrixHelper;

impl MatrixHelper {
    /// Multiply two 2D arrays.
    pub fn multiply(lhs: ArrayView2<f64>, rhs: ArrayView2<f64>) -> Array2<f64> {
        lhs.dot(&rhs)
    }

    pub fn apply(matrix: ArrayView2<f64>, vector: ArrayView1<f64>) -> Array1<f64> {
        matrix.dot(&vector)
    }

    /// Rotation about the East (x) axis.
    pub fn rotation_x(angle_deg: f64) -> Array2<f64> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        arr2(&[[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    /// Rotation about the North (y) axis.
    pub fn rotation_y(angle_deg: f64) -> Array2<f64> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        arr2(&[[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    /// Rotation about the Up (z) axis.
    pub fn rotation_z(angle_deg: f64) -> Array2<f64> {
        let (s, c) = angle_deg.to_radians().sin_cos();
        arr2(&[[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Rodrigues rotation about an arbitrary axis. A zero axis yields identity.
    pub fn rotation_about(axis: ArrayView1<f64>, angle_deg: f64) -> Array2<f64> {
        let Some(k) = Self::unit(axis) else {
            return Array2::eye(3);
        };
        let (s, c) = angle_deg.to_radians().sin_cos();
        let skew = arr2(&[
            [0.0, -k[2], k[1]],
            [k[2], 0.0, -k[0]],
            [-k[1], k[0], 0.0],
        ]);
        let skew_sq = skew.dot(&skew);
        Array2::eye(3) + skew * s + skew_sq * (1.0 - c)
    }

    pub fn norm(vector: ArrayView1<f64>) -> f64 {
        vector.dot(&vector).sqrt()
    }

    /// Unit vector along `vector`, or `None` when it has no usable length.
    pub fn unit(vector: ArrayView1<f64>) -> Option<Array1<f64>> {
        let length = Self::norm(vector);
        if length.is_finite() && length > f64::EPSILON {
            Some(vector.to_owned() / length)
        } else {
            None
        }
    }

    pub fn from_array(values: [f64; 3]) -> Array1<f64> {
        arr1(&values)
    }
}
