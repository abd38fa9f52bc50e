//! In-place Gaussian elimination with partial pivoting.

/// Solves the dense N x N system `a * x = b` in place.
///
/// `a` is the row-major matrix (length `n * n`), `b` the right-hand side
/// (length `n`). On success the solution overwrites `b`; `a` is consumed
/// as scratch. Returns `false` if a pivot degenerates, i.e. the matrix is
/// numerically singular - callers keep systems well-posed by construction
/// (distinct node abscissae), so a `false` here means broken parameters
/// upstream, not something to recover from mid-solve.
///
/// Coefficients are f64: the spline systems involve x^4 terms of nearby
/// nodes and lose too much precision in f32.
///
/// # Panics
///
/// Panics in debug builds if the slice lengths don't match `n`.
pub fn gauss_solve(a: &mut [f64], b: &mut [f64]) -> bool {
    let n = b.len();
    debug_assert_eq!(a.len(), n * n, "matrix/rhs size mismatch");

    for col in 0..n {
        // partial pivoting: bring the largest remaining entry of this
        // column to the diagonal
        let mut pivot_row = col;
        let mut pivot_mag = a[col * n + col].abs();
        for row in col + 1..n {
            let mag = a[row * n + col].abs();
            if mag > pivot_mag {
                pivot_mag = mag;
                pivot_row = row;
            }
        }
        if pivot_mag < 1e-30 {
            return false;
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap(col * n + k, pivot_row * n + k);
            }
            b.swap(col, pivot_row);
        }

        // eliminate below the pivot
        let pivot = a[col * n + col];
        for row in col + 1..n {
            let factor = a[row * n + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
            b[row] -= factor * b[col];
        }
    }

    // back substitution
    for col in (0..n).rev() {
        let mut sum = b[col];
        for k in col + 1..n {
            sum -= a[col * n + k] * b[k];
        }
        b[col] = sum / a[col * n + col];
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_4x4() {
        // random-ish well-conditioned system, verified against the
        // residual a * x = b
        let a_orig = [
            4.0, 1.0, 2.0, 0.5, //
            1.0, 3.0, 0.0, 1.0, //
            2.0, 0.0, 5.0, 2.0, //
            0.5, 1.0, 2.0, 4.0,
        ];
        let b_orig = [1.0, 2.0, 3.0, 4.0];

        let mut a = a_orig;
        let mut b = b_orig;
        assert!(gauss_solve(&mut a, &mut b));

        for row in 0..4 {
            let mut acc = 0.0;
            for col in 0..4 {
                acc += a_orig[row * 4 + col] * b[col];
            }
            assert_relative_eq!(acc, b_orig[row], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_solve_5x5_requires_pivoting() {
        // zero on the first diagonal entry forces a row swap
        let a_orig = [
            0.0, 2.0, 1.0, 0.0, 1.0, //
            3.0, 0.0, 2.0, 1.0, 0.0, //
            1.0, 1.0, 4.0, 0.0, 2.0, //
            0.0, 1.0, 0.0, 3.0, 1.0, //
            2.0, 0.0, 1.0, 1.0, 5.0,
        ];
        let b_orig = [5.0, 4.0, 3.0, 2.0, 1.0];

        let mut a = a_orig;
        let mut b = b_orig;
        assert!(gauss_solve(&mut a, &mut b));

        for row in 0..5 {
            let mut acc = 0.0;
            for col in 0..5 {
                acc += a_orig[row * 5 + col] * b[col];
            }
            assert_relative_eq!(acc, b_orig[row], max_relative = 1e-10);
        }
    }

    #[test]
    fn test_singular_detected() {
        // second row is twice the first
        let mut a = [
            1.0, 2.0, 3.0, 4.0, //
            2.0, 4.0, 6.0, 8.0, //
            0.0, 1.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, 1.0,
        ];
        let mut b = [1.0, 2.0, 3.0, 4.0];
        assert!(!gauss_solve(&mut a, &mut b));
    }
}
