//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Return the euclidian distance between two 2D points.
pub fn dist_2d<T>(point_0: &[T; 2], point_1: &[T; 2]) -> T
where
    T: Float,
{
    (point_0[0] - point_1[0]).hypot(point_0[1] - point_1[1])
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float + std::ops::Rem,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle into the range [-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi: T = T::from(std::f64::consts::PI).unwrap();
    let tau: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(angle + pi, tau) - pi
}

/// Get the shortest signed angular distance from `a` to `b`.
///
/// The result is in the range [-pi, pi], with positive values indicating that
/// `b` is anticlockwise of `a`.
pub fn ang_dist<T>(a: T, b: T) -> T
where
    T: Float,
{
    wrap_pi(b - a)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&2.0, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-2.0, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.5, &-1.0, &1.0), 0.5);
    }

    #[test]
    fn test_dist_2d() {
        assert_eq!(dist_2d(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(dist_2d(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_ang_dist() {
        assert!((ang_dist(0.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((ang_dist(1.0, 0.0) + 1.0).abs() < 1e-12);
        assert!(ang_dist(0.0, TAU).abs() < 1e-12);
        // Wrapping over the -pi/pi boundary takes the short way round
        assert!((ang_dist(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-12);
        assert!((ang_dist(-PI + 0.1, PI - 0.1) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_pi(-TAU - 0.5) + 0.5).abs() < 1e-12);
    }
}
