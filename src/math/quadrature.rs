//! One-dimensional quadrature over sampled data
//!
//! Both rules accept arbitrary (monotonic) sample positions. Simpson's rule
//! handles an odd number of intervals by correcting the last interval with
//! a quadratic fitted through the final three samples (Cartwright), which
//! keeps it exact for polynomials up to degree two.

/// Composite trapezoidal rule
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    debug_assert_eq!(y.len(), x.len());
    y.windows(2)
        .zip(x.windows(2))
        .map(|(y, x)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum()
}

/// Composite Simpson's rule
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    debug_assert_eq!(y.len(), x.len());
    let n = y.len();
    if n < 3 {
        return trapezoid(y, x);
    }

    if n % 2 == 1 {
        return basic_simpson(y, x);
    }

    // Even sample count: Simpson on the leading even number of intervals,
    // then the last interval from the quadratic through the final 3 samples
    let mut result = basic_simpson(&y[..n - 1], &x[..n - 1]);
    let h0 = x[n - 2] - x[n - 3];
    let h1 = x[n - 1] - x[n - 2];
    let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
    let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
    let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
    result += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
    result
}

/// Simpson's rule over an even number of (possibly unequal) intervals
fn basic_simpson(y: &[f64], x: &[f64]) -> f64 {
    let mut result = 0.0;
    let mut i = 0;
    while i + 2 < y.len() {
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        let hsum = h0 + h1;
        let hprod = h0 * h1;
        let ratio = h0 / h1;
        result += hsum / 6.0
            * (y[i] * (2.0 - 1.0 / ratio) + y[i + 1] * (hsum * hsum / hprod) + y[i + 2] * (2.0 - ratio));
        i += 2;
    }
    result
}
