//! Chroma-weighted squared-difference metric between two color images.
//!
//! Differences are taken in the sRGB reference encoding, which tracks
//! perception more closely than linear light. The channel weights assume
//! a luma-dominant ordering (the middle plane carries most of the
//! perceptual signal): chroma planes count 1/8 each, the center plane
//! 6/8. The weights are applied linearly rather than squared; 1/64 would
//! suppress chroma far too strongly.

use wide::f32x8;

use crate::image::Image3F;
use crate::srgb::ColorBundle;
use crate::MetricError;

/// Per-channel weights, luma-dominant ordering.
const CHANNEL_WEIGHTS: [f32; 3] = [1.0 / 8.0, 6.0 / 8.0, 1.0 / 8.0];

/// Computes the weighted sum of squared differences. Dimensions are
/// checked by the caller; encoding conversion happens here.
pub(crate) fn weighted_sq_diff_impl(
    img1: &ColorBundle,
    img2: &ColorBundle,
) -> Result<f64, MetricError> {
    // Convert to sRGB where needed. Converted copies are temporary and
    // dropped on return; the inputs are never mutated.
    let converted1;
    let srgb1 = if img1.is_srgb() {
        img1.image()
    } else {
        converted1 = img1.to_srgb()?;
        converted1.image()
    };

    let converted2;
    let srgb2 = if img2.is_srgb() {
        img2.image()
    } else {
        converted2 = img2.to_srgb()?;
        converted2.image()
    };

    Ok(weighted_sq_diff_srgb(srgb1, srgb2))
}

/// Accumulates weighted squared differences over all planes.
///
/// Full lane groups go through the vector accumulator; each row's
/// remainder lands in a scalar f64 side sum. The result is their sum,
/// deliberately not normalized by pixel count.
#[multiversion::multiversion(targets(
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
fn weighted_sq_diff_srgb(img1: &Image3F, img2: &Image3F) -> f64 {
    let width = img1.width();
    let height = img1.height();

    let mut vsums = f32x8::splat(0.0);
    let mut tail = 0.0f64;

    for (c, &weight) in CHANNEL_WEIGHTS.iter().enumerate() {
        let vweight = f32x8::splat(weight);

        for y in 0..height {
            let row1 = img1.plane_row(c, y);
            let row2 = img2.plane_row(c, y);
            let chunks = width / 8;

            for i in 0..chunks {
                let x = i * 8;
                let v1 = f32x8::from(<[f32; 8]>::try_from(&row1[x..x + 8]).unwrap());
                let v2 = f32x8::from(<[f32; 8]>::try_from(&row2[x..x + 8]).unwrap());
                let diff = v1 - v2;
                vsums += diff * diff * vweight;
            }

            // Scalar tail for the remainder of the row
            for x in chunks * 8..width {
                let diff = row1[x] - row2[x];
                tail += f64::from(diff * diff * weight);
            }
        }
    }

    f64::from(horizontal_sum(vsums)) + tail
}

fn horizontal_sum(v: f32x8) -> f32 {
    v.to_array().iter().sum()
}
