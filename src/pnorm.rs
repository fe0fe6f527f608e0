//! P-norm reduction of a distortion map.
//!
//! The score combines norms of order `p`, `2p` and `4p`: each retained
//! pixel contributes `d^p`, `d^{2p}` and `d^{4p}` to three running sums,
//! each sum is normalized by the retained pixel count and taken to the
//! matching root, and the three terms are averaged. The higher-order
//! terms push the score toward localized outliers without letting it
//! grow unboundedly.
//!
//! `p = 3` is the conventional exponent and gets a vectorized path that
//! forms the powers by repeated multiplication. Every other exponent goes
//! through scalar `powf`.

use std::sync::atomic::{AtomicBool, Ordering};

use wide::f64x4;

use crate::image::ImageF;
use crate::MetricParams;

/// Width of the edge band skipped in approximate-border mode.
///
/// Smoothing with zero-valued boundary handling contaminates a band less
/// than half the largest kernel diameter; 8 also keeps the retained
/// region vector-aligned.
const BORDER: usize = 8;

/// Set once the scalar `powf` path has logged its diagnostic.
static GENERAL_PATH_NOTICE: AtomicBool = AtomicBool::new(false);

/// Computes the p-norm score. Preconditions (non-empty map, positive
/// finite `p`) are checked by the caller.
pub(crate) fn pnorm_impl(distmap: &ImageF, params: &MetricParams, p: f64) -> f64 {
    let mut border = if params.approximate_border() { BORDER } else { 0 };
    if distmap.width() <= 2 * border || distmap.height() <= 2 * border {
        border = 0;
    }

    if (p - 3.0).abs() < 1e-6 {
        pnorm3(distmap, border, p)
    } else {
        pnorm_general(distmap, border, p)
    }
}

/// Vectorized reduction for `p` within 1e-6 of 3.0.
///
/// Powers are formed as `d*d*d`, then squared twice, avoiding
/// transcendental-function error on top of being faster. Inputs are
/// promoted from f32 to f64 lanes before the first multiply so the sums
/// stay accurate over large maps.
#[multiversion::multiversion(targets(
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
fn pnorm3(distmap: &ImageF, border: usize, p: f64) -> f64 {
    let width = distmap.width();
    let height = distmap.height();

    let mut vsums0 = f64x4::splat(0.0);
    let mut vsums1 = f64x4::splat(0.0);
    let mut vsums2 = f64x4::splat(0.0);
    let mut tail = [0.0f64; 3];

    for y in border..height - border {
        let row = &distmap.row(y)[border..width - border];
        let chunks = row.len() / 4;

        for i in 0..chunks {
            let lane: [f32; 4] = row[i * 4..i * 4 + 4].try_into().unwrap();
            let d1 = f64x4::from(lane.map(f64::from));
            let d2 = d1 * d1 * d1;
            vsums0 += d2;
            let d3 = d2 * d2;
            vsums1 += d3;
            let d4 = d3 * d3;
            vsums2 += d4;
        }

        // Scalar tail for the remainder of the row
        for &d in &row[chunks * 4..] {
            let d1 = f64::from(d);
            let mut d2 = d1 * d1 * d1;
            tail[0] += d2;
            d2 *= d2;
            tail[1] += d2;
            d2 *= d2;
            tail[2] += d2;
        }
    }

    let one_per_pixel = 1.0 / retained_pixels(width, height, border);

    let mut v = 0.0;
    v += (one_per_pixel * (tail[0] + horizontal_sum(vsums0))).powf(1.0 / p);
    v += (one_per_pixel * (tail[1] + horizontal_sum(vsums1))).powf(1.0 / (2.0 * p));
    v += (one_per_pixel * (tail[2] + horizontal_sum(vsums2))).powf(1.0 / (4.0 * p));
    v / 3.0
}

/// Scalar reduction for arbitrary exponents.
///
/// Logs a process-wide diagnostic on first use; the atomic swap makes the
/// notice fire exactly once no matter how many threads race here.
fn pnorm_general(distmap: &ImageF, border: usize, p: f64) -> f64 {
    if !GENERAL_PATH_NOTICE.swap(true, Ordering::Relaxed) {
        tracing::warn!(
            exponent = p,
            "p-norm reduction falling back to the scalar pow() path"
        );
    }

    let width = distmap.width();
    let height = distmap.height();

    let mut sums = [0.0f64; 3];
    for y in border..height - border {
        for &d in &distmap.row(y)[border..width - border] {
            let mut dp = f64::from(d).powf(p);
            sums[0] += dp;
            dp *= dp;
            sums[1] += dp;
            dp *= dp;
            sums[2] += dp;
        }
    }

    let one_per_pixel = 1.0 / retained_pixels(width, height, border);

    let mut v = 0.0;
    for (i, sum) in sums.iter().enumerate() {
        v += (one_per_pixel * sum).powf(1.0 / (p * f64::from(1 << i)));
    }
    v / 3.0
}

/// Count of pixels inside the retained (border-excluded) region.
fn retained_pixels(width: usize, height: usize, border: usize) -> f64 {
    ((width - 2 * border) * (height - 2 * border)) as f64
}

fn horizontal_sum(v: f64x4) -> f64 {
    v.to_array().iter().sum()
}
