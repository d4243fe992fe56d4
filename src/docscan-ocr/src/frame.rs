use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::error::{OcrError, Result};

/// RGBA8 image handed to the inference engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>, // RGBA format
}

impl Frame {
    /// Wrap raw RGBA pixels, checking the buffer size against the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected_size = width as usize * height as usize * 4;
        if data.len() != expected_size {
            return Err(OcrError::InvalidFrame(format!(
                "invalid frame data size: expected {}, got {}",
                expected_size,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Copy any decoded image into RGBA8
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        debug!("converted {}x{} image to RGBA frame", width, height);
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }

    /// View as an `image` buffer for engines that work on `image` types
    pub fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| OcrError::InvalidFrame("failed to create image buffer".to_string()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA pixels, `width * height * 4` bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the pixels back out of the frame
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Longer of the two sides
    pub fn long_side(&self) -> u32 {
        self.width.max(self.height)
    }
}
