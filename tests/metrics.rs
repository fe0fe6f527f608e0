//! End-to-end tests of the two public metric operations.
//!
//! Each test pins down one externally observable property: degenerate
//! reductions for uniform inputs, exact zeros, invariance across map
//! sizes, the closed-form value for constant offsets, and the error
//! paths for bad inputs.
//!
//! Run with: `cargo test --test metrics`

use distscore::{
    pnorm_score, weighted_sq_diff, ColorBundle, ColorEncoding, Image3F, ImageF, Img, MetricError,
    MetricParams, RGB,
};

fn srgb_bundle(img: Image3F) -> ColorBundle {
    ColorBundle::new(img, ColorEncoding::Srgb)
}

// ============================================================================
// P-norm score
// ============================================================================

#[test]
fn test_uniform_map_returns_fill_value() {
    let map = ImageF::filled(16, 16, 2.0);
    let score = pnorm_score(&map, &MetricParams::default(), 3.0).expect("valid input");
    assert!(
        (score - 2.0).abs() < 1e-5,
        "16x16 map of 2.0 at p=3 must score 2.0, got {score}"
    );
}

#[test]
fn test_zero_map_returns_exact_zero() {
    let map = ImageF::new(40, 25);
    let score = pnorm_score(&map, &MetricParams::default(), 3.0).expect("valid input");
    assert_eq!(score, 0.0);
}

#[test]
fn test_uniform_score_invariant_to_dimensions() {
    let value = 1.7f32;
    let reference = pnorm_score(
        &ImageF::filled(16, 16, value),
        &MetricParams::default(),
        3.0,
    )
    .expect("valid input");

    for (width, height) in [(16, 64), (64, 16), (128, 128), (33, 7)] {
        let score = pnorm_score(
            &ImageF::filled(width, height, value),
            &MetricParams::default(),
            3.0,
        )
        .expect("valid input");
        assert!(
            (score - reference).abs() < 1e-6,
            "{width}x{height}: {score} != {reference}"
        );
    }
}

#[test]
fn test_fast_and_general_paths_match() {
    let map = ImageF::from_fn(50, 30, |x, y| ((x * 13 + y * 29) % 17) as f32 / 17.0);
    let params = MetricParams::default();

    // 3.0 is inside the fast-path window, 3.0 + 2e-6 is just outside it.
    let fast = pnorm_score(&map, &params, 3.0).expect("valid input");
    let general = pnorm_score(&map, &params, 3.0 + 2e-6).expect("valid input");

    let rel = (fast - general).abs() / fast.max(1e-30);
    assert!(
        rel < 1e-4,
        "paths disagree: fast={fast} general={general} rel={rel}"
    );
}

#[test]
fn test_border_mode_is_noop_for_small_maps() {
    // Neither dimension exceeds twice the 8-pixel band, so border
    // exclusion must be disabled and both settings agree exactly.
    let map = ImageF::from_fn(16, 16, |x, y| (x * y) as f32 / 225.0);
    let on = pnorm_score(&map, &MetricParams::new().with_approximate_border(true), 3.0)
        .expect("valid input");
    let off = pnorm_score(&map, &MetricParams::default(), 3.0).expect("valid input");
    assert_eq!(on, off);
}

#[test]
fn test_border_mode_drops_edge_band() {
    let map = ImageF::from_fn(64, 64, |x, y| {
        let edge = x < 8 || y < 8 || x >= 56 || y >= 56;
        if edge {
            3.0
        } else {
            1.0
        }
    });
    let on = pnorm_score(&map, &MetricParams::new().with_approximate_border(true), 3.0)
        .expect("valid input");
    assert!(
        (on - 1.0).abs() < 1e-5,
        "edge band must be excluded, got {on}"
    );
}

#[test]
fn test_empty_map_is_invalid() {
    for (width, height) in [(0, 0), (0, 10), (10, 0)] {
        let map = ImageF::new(width, height);
        let result = pnorm_score(&map, &MetricParams::default(), 3.0);
        assert!(
            matches!(result, Err(MetricError::InvalidDimensions { .. })),
            "{width}x{height} must be rejected"
        );
    }
}

#[test]
fn test_nonpositive_exponent_is_invalid() {
    let map = ImageF::filled(8, 8, 1.0);
    for exponent in [0.0, -0.5, f64::NEG_INFINITY, f64::NAN] {
        let result = pnorm_score(&map, &MetricParams::default(), exponent);
        assert!(
            matches!(result, Err(MetricError::InvalidExponent { .. })),
            "exponent {exponent} must be rejected"
        );
    }
}

#[test]
fn test_general_exponents_on_uniform_maps() {
    // (d^p averaged over a uniform map)^(1/p) recovers d for any p.
    let map = ImageF::filled(24, 24, 0.6);
    for p in [0.5, 1.0, 2.0, 6.0] {
        let score = pnorm_score(&map, &MetricParams::default(), p).expect("valid input");
        assert!(
            (score - 0.6).abs() < 1e-4,
            "p={p}: expected 0.6, got {score}"
        );
    }
}

// ============================================================================
// Weighted squared difference
// ============================================================================

#[test]
fn test_identical_images_score_exact_zero() {
    let img = Image3F::from_planes([
        ImageF::from_fn(31, 19, |x, y| (x + y) as f32 / 50.0),
        ImageF::from_fn(31, 19, |x, y| (x * y) as f32 / 600.0),
        ImageF::filled(31, 19, 0.75),
    ]);
    let result = weighted_sq_diff(&srgb_bundle(img.clone()), &srgb_bundle(img))
        .expect("valid input");
    assert_eq!(result, 0.0);
}

#[test]
fn test_constant_offset_closed_form() {
    // Offset e in every channel: weights sum to 1, so the total is
    // width * height * e^2.
    let width = 30;
    let height = 22;
    let e = 0.1f32;

    let img1 = Image3F::new(width, height);
    let mut img2 = Image3F::new(width, height);
    for c in 0..3 {
        for y in 0..height {
            img2.plane_row_mut(c, y).fill(e);
        }
    }

    let result = weighted_sq_diff(&srgb_bundle(img1), &srgb_bundle(img2)).expect("valid input");
    let expected = f64::from((width * height) as u32) * f64::from(e) * f64::from(e);
    assert!(
        (result - expected).abs() / expected < 1e-6,
        "got {result}, expected {expected}"
    );
}

#[test]
fn test_dimension_mismatch_is_an_error() {
    let a = srgb_bundle(Image3F::new(16, 16));
    let b = srgb_bundle(Image3F::new(16, 17));
    let result = weighted_sq_diff(&a, &b);
    assert!(matches!(
        result,
        Err(MetricError::DimensionMismatch {
            w1: 16,
            h1: 16,
            w2: 16,
            h2: 17
        })
    ));
}

#[test]
fn test_linear_input_converted_before_differencing() {
    // A linear bundle against its own sRGB conversion must diff to zero.
    let img = Image3F::from_planes([
        ImageF::from_fn(14, 14, |x, _| x as f32 / 14.0),
        ImageF::from_fn(14, 14, |_, y| y as f32 / 14.0),
        ImageF::filled(14, 14, 0.3),
    ]);
    let linear = ColorBundle::new(img, ColorEncoding::LinearRgb);
    let srgb = linear.to_srgb().expect("finite samples");

    let result = weighted_sq_diff(&linear, &srgb).expect("valid input");
    assert!(result < 1e-9, "self-comparison across encodings: {result}");
}

#[test]
fn test_gray_bundle_conversion() {
    let gray = ImageF::from_fn(10, 10, |x, y| (x + y) as f32 / 40.0);
    let img = Image3F::from_planes([gray.clone(), gray.clone(), gray]);
    let a = ColorBundle::new(img.clone(), ColorEncoding::LinearRgb).with_grayscale(true);
    let b = ColorBundle::new(img, ColorEncoding::LinearRgb);

    // The gray-specific path and the per-plane path see identical planes,
    // so they must produce identical conversions.
    let result = weighted_sq_diff(&a, &b).expect("valid input");
    assert!(result < 1e-12, "gray and color paths diverged: {result}");
}

#[test]
fn test_conversion_failure_is_reported() {
    let mut img = Image3F::new(8, 8);
    img.plane_mut(0).set(7, 7, f32::NAN);
    let bad = ColorBundle::new(img, ColorEncoding::LinearRgb);
    let good = srgb_bundle(Image3F::new(8, 8));

    let result = weighted_sq_diff(&good, &bad);
    assert!(matches!(
        result,
        Err(MetricError::EncodingConversion {
            plane: 0,
            x: 7,
            y: 7
        })
    ));
}

// ============================================================================
// API interop
// ============================================================================

#[test]
fn test_imgref_inputs() {
    let width = 9;
    let height = 6;
    let pixels: Vec<RGB<f32>> = (0..width * height)
        .map(|i| RGB::new(i as f32 / 100.0, i as f32 / 50.0, 0.2))
        .collect();
    let img = Img::new(pixels, width, height);

    let bundle = srgb_bundle(Image3F::from_rgb_img(img.as_ref()));
    let result = weighted_sq_diff(&bundle, &bundle.clone()).expect("valid input");
    assert_eq!(result, 0.0);

    let map_data: Vec<f32> = (0..width * height).map(|i| (i % 5) as f32 / 5.0).collect();
    let map = ImageF::from_img(Img::new(map_data, width, height).as_ref());
    let score = pnorm_score(&map, &MetricParams::default(), 3.0).expect("valid input");
    assert!(score > 0.0);
}

#[test]
fn test_errors_are_std_error() {
    let map = ImageF::new(0, 0);
    let err = pnorm_score(&map, &MetricParams::default(), 3.0).unwrap_err();
    let boxed: Box<dyn std::error::Error> = Box::new(err);
    assert!(boxed.to_string().contains("0x0"));
}
