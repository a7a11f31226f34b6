//! Luminance sources: the read-only grayscale view the binarizers consume.

use std::borrow::Cow;
use std::sync::Arc;

use image::{DynamicImage, GrayImage};

use super::grayscale::{rgb_to_grayscale, rgba_to_grayscale};
use crate::error::{QrError, Result};

/// A grid of 8-bit luminance values, 0 black to 255 white
pub trait LuminanceSource {
    /// Width in pixels
    fn width(&self) -> usize;
    /// Height in pixels
    fn height(&self) -> usize;
    /// One row, `width()` values
    fn row(&self, y: usize) -> Cow<'_, [u8]>;

    /// The whole grid, row-major
    fn matrix(&self) -> Cow<'_, [u8]> {
        let mut data = Vec::with_capacity(self.width() * self.height());
        for y in 0..self.height() {
            data.extend_from_slice(&self.row(y));
        }
        Cow::Owned(data)
    }
}

/// Owned grayscale frame with an optional crop window.
///
/// Cropping and rotation share or rebuild the underlying buffer; the source
/// itself is never mutated.
#[derive(Debug, Clone)]
pub struct GrayLuminanceSource {
    data: Arc<[u8]>,
    data_width: usize,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
}

impl GrayLuminanceSource {
    /// Wrap row-major luminance values
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(QrError::InvalidArgument(format!(
                "{} luminance values for a {width}x{height} frame",
                data.len()
            )));
        }
        Ok(Self {
            data: data.into(),
            data_width: width,
            left: 0,
            top: 0,
            width,
            height,
        })
    }

    /// From packed RGB bytes
    pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Result<Self> {
        if rgb.len() != width * height * 3 {
            return Err(QrError::InvalidArgument(format!(
                "{} RGB bytes for a {width}x{height} frame",
                rgb.len()
            )));
        }
        Self::new(rgb_to_grayscale(rgb, width, height), width, height)
    }

    /// From packed RGBA bytes; alpha is ignored
    pub fn from_rgba(rgba: &[u8], width: usize, height: usize) -> Result<Self> {
        if rgba.len() != width * height * 4 {
            return Err(QrError::InvalidArgument(format!(
                "{} RGBA bytes for a {width}x{height} frame",
                rgba.len()
            )));
        }
        Self::new(rgba_to_grayscale(rgba, width, height), width, height)
    }

    /// Share the pixels of an 8-bit grayscale image
    pub fn from_gray_image(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.as_raw().as_slice().into(),
            data_width: width as usize,
            left: 0,
            top: 0,
            width: width as usize,
            height: height as usize,
        }
    }

    /// Any decoded image; colour images go through the RGB path
    pub fn from_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::from_gray_image(gray),
            other => {
                let rgb = other.to_rgb8();
                let (width, height) = rgb.dimensions();
                let (width, height) = (width as usize, height as usize);
                Self {
                    data: rgb_to_grayscale(rgb.as_raw(), width, height).into(),
                    data_width: width,
                    left: 0,
                    top: 0,
                    width,
                    height,
                }
            }
        }
    }

    /// A window into this source
    pub fn crop(&self, left: usize, top: usize, width: usize, height: usize) -> Result<Self> {
        if left + width > self.width || top + height > self.height {
            return Err(QrError::InvalidArgument(format!(
                "crop {width}x{height}+{left}+{top} exceeds {}x{}",
                self.width, self.height
            )));
        }
        Ok(Self {
            data: Arc::clone(&self.data),
            data_width: self.data_width,
            left: self.left + left,
            top: self.top + top,
            width,
            height,
        })
    }

    /// The visible window rotated 90 degrees counter-clockwise
    pub fn rotate_counter_clockwise(&self) -> Self {
        let (width, height) = (self.height, self.width);
        let mut rotated = vec![0u8; width * height];
        for y in 0..self.height {
            let row = self.row(y);
            for (x, &value) in row.iter().enumerate() {
                // (x, y) -> (y, width_old - 1 - x)
                rotated[(self.width - 1 - x) * width + y] = value;
            }
        }
        Self {
            data: rotated.into(),
            data_width: width,
            left: 0,
            top: 0,
            width,
            height,
        }
    }
}

impl LuminanceSource for GrayLuminanceSource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn row(&self, y: usize) -> Cow<'_, [u8]> {
        let start = (self.top + y) * self.data_width + self.left;
        Cow::Borrowed(&self.data[start..start + self.width])
    }

    fn matrix(&self) -> Cow<'_, [u8]> {
        if self.left == 0 && self.top == 0 && self.width == self.data_width {
            let len = self.width * self.height;
            return Cow::Borrowed(&self.data[..len]);
        }
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            data.extend_from_slice(&self.row(y));
        }
        Cow::Owned(data)
    }
}

/// Light-on-dark view of another source
#[derive(Debug, Clone)]
pub struct InvertedLuminanceSource<S> {
    inner: S,
}

impl<S: LuminanceSource> InvertedLuminanceSource<S> {
    /// Invert `inner`
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The wrapped source
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: LuminanceSource> LuminanceSource for InvertedLuminanceSource<S> {
    fn width(&self) -> usize {
        self.inner.width()
    }

    fn height(&self) -> usize {
        self.inner.height()
    }

    fn row(&self, y: usize) -> Cow<'_, [u8]> {
        Cow::Owned(self.inner.row(y).iter().map(|&v| 255 - v).collect())
    }

    fn matrix(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.inner.matrix().iter().map(|&v| 255 - v).collect())
    }
}
