//! Decoded thumbnail values shared between the cache and display targets.

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;

/// A decoded image, cheap to clone.
///
/// The byte footprint is measured once at construction from the decoded
/// pixel buffer, so cache accounting never has to touch the pixels again.
#[derive(Clone)]
pub struct Thumbnail {
    image: Arc<DynamicImage>,
    size_bytes: usize,
}

impl Thumbnail {
    /// Wrap a decoded image.
    #[must_use]
    pub fn new(image: DynamicImage) -> Self {
        let size_bytes = image.as_bytes().len();
        Self {
            image: Arc::new(image),
            size_bytes,
        }
    }

    /// The decoded image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Decoded size in bytes.
    pub const fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether both values point at the same decoded buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_is_decoded_footprint() {
        let luma = Thumbnail::new(DynamicImage::new_luma8(40, 1));
        assert_eq!(luma.size_bytes(), 40);

        let rgba = Thumbnail::new(DynamicImage::new_rgba8(8, 8));
        assert_eq!(rgba.size_bytes(), 8 * 8 * 4);
        assert_eq!((rgba.width(), rgba.height()), (8, 8));
    }

    #[test]
    fn test_clone_shares_buffer() {
        let a = Thumbnail::new(DynamicImage::new_luma8(2, 2));
        let b = a.clone();
        let c = Thumbnail::new(DynamicImage::new_luma8(2, 2));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
