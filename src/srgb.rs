//! Color-encoding descriptors and conversion to the sRGB reference
//! encoding.
//!
//! The weighted difference metric compares images in sRGB rather than
//! linear light, so every input is normalized to that encoding first.
//! Conversion always produces a fresh copy; caller buffers are never
//! mutated.

use crate::image::{Image3F, ImageF};
use crate::MetricError;

/// How a [`ColorBundle`]'s sample values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorEncoding {
    /// Gamma-compressed sRGB (IEC 61966-2-1). The reference encoding.
    Srgb,
    /// Linear-light RGB.
    LinearRgb,
}

/// A three-plane color image together with its encoding descriptor.
///
/// All three planes share identical dimensions (guaranteed by
/// [`Image3F`]). A grayscale bundle carries the same samples in all
/// three planes and converts through a gray-specific path that applies
/// the transfer curve once per pixel.
#[derive(Debug, Clone)]
pub struct ColorBundle {
    color: Image3F,
    encoding: ColorEncoding,
    grayscale: bool,
}

impl ColorBundle {
    /// Wraps a color image with its encoding descriptor.
    #[must_use]
    pub fn new(color: Image3F, encoding: ColorEncoding) -> Self {
        Self {
            color,
            encoding,
            grayscale: false,
        }
    }

    /// Marks the bundle as grayscale (identical planes).
    #[must_use]
    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    /// The underlying planes.
    #[inline]
    #[must_use]
    pub fn image(&self) -> &Image3F {
        &self.color
    }

    /// The bundle's encoding descriptor.
    #[inline]
    #[must_use]
    pub fn encoding(&self) -> ColorEncoding {
        self.encoding
    }

    /// Whether the samples are already in the reference encoding.
    #[inline]
    #[must_use]
    pub fn is_srgb(&self) -> bool {
        self.encoding == ColorEncoding::Srgb
    }

    /// Whether the bundle is marked grayscale.
    #[inline]
    #[must_use]
    pub fn is_grayscale(&self) -> bool {
        self.grayscale
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.color.width()
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.color.height()
    }

    /// Returns a copy of the bundle converted to the sRGB reference
    /// encoding. A bundle already in sRGB is cloned as-is.
    ///
    /// Grayscale bundles convert one plane and replicate it, so the
    /// transfer curve runs once per pixel instead of three times.
    ///
    /// # Errors
    /// Returns [`MetricError::EncodingConversion`] if a sample is
    /// non-finite; the transfer curve is undefined there and silently
    /// propagating NaN would poison the metric sums downstream.
    pub fn to_srgb(&self) -> Result<Self, MetricError> {
        if self.is_srgb() {
            return Ok(self.clone());
        }

        let converted = if self.grayscale {
            let gray = convert_plane(self.color.plane(0), 0)?;
            Image3F::from_planes([gray.clone(), gray.clone(), gray])
        } else {
            Image3F::from_planes([
                convert_plane(self.color.plane(0), 0)?,
                convert_plane(self.color.plane(1), 1)?,
                convert_plane(self.color.plane(2), 2)?,
            ])
        };

        Ok(Self {
            color: converted,
            encoding: ColorEncoding::Srgb,
            grayscale: self.grayscale,
        })
    }
}

fn convert_plane(plane: &ImageF, c: usize) -> Result<ImageF, MetricError> {
    let mut out = ImageF::new(plane.width(), plane.height());
    for y in 0..plane.height() {
        let src = plane.row(y);
        let dst = out.row_mut(y);
        for x in 0..src.len() {
            let v = src[x];
            if !v.is_finite() {
                return Err(MetricError::EncodingConversion { plane: c, x, y });
            }
            dst[x] = linear_to_srgb(v);
        }
    }
    Ok(out)
}

/// Converts a linear-light sample to gamma-compressed sRGB.
///
/// Expects input in the 0.0-1.0 range.
#[inline]
#[must_use]
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Converts a gamma-compressed sRGB sample to linear light.
///
/// Expects input in the 0.0-1.0 range.
#[inline]
#[must_use]
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
