//! Float helpers shared by the iterative solvers.

/// `|new - old|` scaled by `max(|new|, floor)`.
pub fn relative_change(new: f64, old: f64, floor: f64) -> f64 {
    (new - old).abs() / new.abs().max(floor)
}

/// Largest absolute value; zero for an empty sequence.
pub fn max_abs<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().map(f64::abs).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_change_uses_floor() {
        assert!((relative_change(0.5, 0.0, 1.0) - 0.5).abs() < 1e-15);
        assert!((relative_change(200.0, 100.0, 1.0) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn max_abs_ignores_sign() {
        assert_eq!(max_abs([1.0, -3.0, 2.0]), 3.0);
        assert_eq!(max_abs(Vec::new()), 0.0);
    }
}
