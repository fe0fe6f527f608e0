//! Pixel buffer types consumed by the metric reductions.
//!
//! Both metrics only read these buffers; nothing in this crate mutates a
//! caller-supplied image. Rows are stored with a stride rounded up to a
//! multiple of 16 floats so that lane-group loads never straddle a row
//! boundary into the next row's data.

use imgref::{Img, ImgRef, ImgVec};
use rgb::RGB;

/// Single-plane row-major `f32` grid.
///
/// Used as the distortion-map input of [`crate::pnorm_score`] and as the
/// per-channel plane store of [`Image3F`]. Distortion maps hold per-pixel
/// error magnitudes, so their values are expected to be non-negative.
#[derive(Debug, Clone)]
pub struct ImageF {
    data: Vec<f32>,
    width: usize,
    height: usize,
    stride: usize, // pixels per row, >= width
}

impl ImageF {
    /// Creates a new image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Creates an image filled with a constant value.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        let stride = (width + 15) & !15;
        Self {
            data: vec![value; stride * height],
            width,
            height,
            stride,
        }
    }

    /// Creates an image by evaluating `f(x, y)` for every pixel.
    #[must_use]
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut img = Self::new(width, height);
        for y in 0..height {
            let row = img.row_mut(y);
            for (x, out) in row.iter_mut().enumerate() {
                *out = f(x, y);
            }
        }
        img
    }

    /// Creates an image from a tightly packed row-major buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    #[must_use]
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height);
        let mut img = Self::new(width, height);
        for y in 0..height {
            img.row_mut(y)
                .copy_from_slice(&data[y * width..(y + 1) * width]);
        }
        img
    }

    /// Creates an image from an [`ImgRef`], honoring its stride.
    #[must_use]
    pub fn from_img(src: ImgRef<'_, f32>) -> Self {
        let mut img = Self::new(src.width(), src.height());
        for (y, src_row) in src.rows().enumerate() {
            img.row_mut(y).copy_from_slice(src_row);
        }
        img
    }

    /// Converts into a tightly packed [`ImgVec`], dropping row padding.
    #[must_use]
    pub fn into_imgvec(self) -> ImgVec<f32> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        Img::new(out, self.width, self.height)
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels per stored row (width plus alignment padding).
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns row `y` without padding.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Returns row `y` mutably, without padding.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Gets a pixel value.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }

    /// Sets a pixel value.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.stride + x] = value;
    }

    /// Checks whether two images have the same dimensions.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Three same-sized `f32` planes forming one color image.
///
/// The plane ordering is the caller's channel ordering; the weighted
/// difference metric treats the middle plane as the dominant (luma-like)
/// channel.
#[derive(Debug, Clone)]
pub struct Image3F {
    planes: [ImageF; 3],
}

impl Image3F {
    /// Creates a new 3-plane image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            planes: [
                ImageF::new(width, height),
                ImageF::new(width, height),
                ImageF::new(width, height),
            ],
        }
    }

    /// Assembles an image from three planes.
    ///
    /// # Panics
    /// Panics if the planes differ in size.
    #[must_use]
    pub fn from_planes(planes: [ImageF; 3]) -> Self {
        assert!(planes[0].same_size(&planes[1]));
        assert!(planes[0].same_size(&planes[2]));
        Self { planes }
    }

    /// Deinterleaves an [`ImgRef`] of RGB pixels into three planes.
    #[must_use]
    pub fn from_rgb_img(src: ImgRef<'_, RGB<f32>>) -> Self {
        let mut img = Self::new(src.width(), src.height());
        for (y, src_row) in src.rows().enumerate() {
            for (x, px) in src_row.iter().enumerate() {
                img.planes[0].row_mut(y)[x] = px.r;
                img.planes[1].row_mut(y)[x] = px.g;
                img.planes[2].row_mut(y)[x] = px.b;
            }
        }
        img
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.planes[0].width()
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.planes[0].height()
    }

    /// Returns plane `c`.
    #[inline]
    #[must_use]
    pub fn plane(&self, c: usize) -> &ImageF {
        &self.planes[c]
    }

    /// Returns plane `c` mutably.
    #[inline]
    pub fn plane_mut(&mut self, c: usize) -> &mut ImageF {
        &mut self.planes[c]
    }

    /// Returns row `y` of plane `c`.
    #[inline]
    #[must_use]
    pub fn plane_row(&self, c: usize, y: usize) -> &[f32] {
        self.planes[c].row(y)
    }

    /// Returns row `y` of plane `c` mutably.
    #[inline]
    pub fn plane_row_mut(&mut self, c: usize, y: usize) -> &mut [f32] {
        self.planes[c].row_mut(y)
    }

    /// Checks whether two images have the same dimensions.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.planes[0].same_size(&other.planes[0])
    }
}
