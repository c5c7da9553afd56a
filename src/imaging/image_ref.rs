//! The opaque image handle.

use crate::types::ImageType;
use image::DynamicImage;

/// A decoded image and the format it came from.
///
/// Operations never mutate an `ImageRef` in place; each one returns a new
/// handle and leaves the input untouched.
#[derive(Debug, Clone)]
pub struct ImageRef {
    image: DynamicImage,
    format: ImageType,
    icc_profile: Option<Vec<u8>>,
}

impl ImageRef {
    pub fn new(image: DynamicImage, format: ImageType) -> Self {
        Self {
            image,
            format,
            icc_profile: None,
        }
    }

    pub fn with_icc_profile(mut self, icc_profile: Option<Vec<u8>>) -> Self {
        self.icc_profile = icc_profile;
        self
    }

    /// Derive a new handle with different pixels, keeping format and profile.
    pub fn derive(&self, image: DynamicImage) -> Self {
        Self {
            image,
            format: self.format,
            icc_profile: self.icc_profile.clone(),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn format(&self) -> ImageType {
        self.format
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Number of channels (bands), alpha included.
    pub fn bands(&self) -> u8 {
        self.image.color().channel_count()
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }
}
