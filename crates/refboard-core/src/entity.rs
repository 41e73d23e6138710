//! Image entities placed on the board.

use image::DynamicImage;
use kurbo::{Point, Rect, Size};
use std::io::Cursor;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for an entity.
pub type EntityId = Uuid;

/// Smallest scale an entity may reach through any ratio-based operation.
pub const MIN_SCALE: f64 = 0.1;

/// Encoded image format, detected from the payload header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }

        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }

        None
    }
}

/// One placed image.
///
/// `position` is the world-space center. The decoded bitmap is a cache
/// derived from `data` and is rebuilt whenever the payload is replaced.
#[derive(Debug, Clone)]
pub struct ImageEntity {
    pub(crate) id: EntityId,
    /// World-space center.
    pub position: Point,
    /// Uniform multiplier of the native pixel size.
    pub scale: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    data: Vec<u8>,
    bitmap: Option<Arc<DynamicImage>>,
    native_size: Size,
}

impl ImageEntity {
    /// Create an entity from an encoded payload, failing if it cannot be decoded.
    pub fn decode(data: Vec<u8>, position: Point) -> Result<Self, image::ImageError> {
        let bitmap = image::load_from_memory(&data)?;
        let mut entity = Self::empty(data, position);
        entity.set_bitmap(Some(Arc::new(bitmap)));
        Ok(entity)
    }

    /// Create an entity from an encoded payload, keeping it even if decoding fails.
    ///
    /// An undecodable entity has no bitmap and a zero native size; it is
    /// skipped by rendering and never hit.
    pub fn from_payload(data: Vec<u8>, position: Point) -> Self {
        let mut entity = Self::empty(data, position);
        entity.refresh_bitmap();
        entity
    }

    /// Create an entity from an already decoded bitmap (drop/paste).
    ///
    /// The bitmap is encoded as PNG so the board stays self-contained.
    pub fn from_bitmap(bitmap: DynamicImage, position: Point) -> Result<Self, image::ImageError> {
        let mut data = Vec::new();
        bitmap.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)?;
        let mut entity = Self::empty(data, position);
        entity.set_bitmap(Some(Arc::new(bitmap)));
        Ok(entity)
    }

    fn empty(data: Vec<u8>, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            scale: 1.0,
            rotation: 0.0,
            data,
            bitmap: None,
            native_size: Size::ZERO,
        }
    }

    /// Builder: set the scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: set the rotation in degrees.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The encoded payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Detected format of the payload, if recognized.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.data)
    }

    /// The decoded bitmap, if the payload could be decoded.
    pub fn bitmap(&self) -> Option<&Arc<DynamicImage>> {
        self.bitmap.as_ref()
    }

    /// Whether the entity has something to draw.
    pub fn is_renderable(&self) -> bool {
        self.bitmap.is_some()
    }

    /// Native pixel size of the decoded bitmap (zero if undecodable).
    pub fn native_size(&self) -> Size {
        self.native_size
    }

    /// Replace the payload and rebuild the bitmap cache.
    ///
    /// The new payload is decoded first; on failure the entity is left as it was.
    pub fn replace_data(&mut self, data: Vec<u8>) -> Result<(), image::ImageError> {
        let bitmap = image::load_from_memory(&data)?;
        self.data = data;
        self.set_bitmap(Some(Arc::new(bitmap)));
        Ok(())
    }

    fn refresh_bitmap(&mut self) {
        match image::load_from_memory(&self.data) {
            Ok(bitmap) => self.set_bitmap(Some(Arc::new(bitmap))),
            Err(e) => {
                log::warn!(
                    "Failed to decode image payload for entity {} ({} bytes): {}",
                    self.id,
                    self.data.len(),
                    e
                );
                self.set_bitmap(None);
            }
        }
    }

    fn set_bitmap(&mut self, bitmap: Option<Arc<DynamicImage>>) {
        self.native_size = bitmap
            .as_ref()
            .map(|b| Size::new(b.width() as f64, b.height() as f64))
            .unwrap_or(Size::ZERO);
        self.bitmap = bitmap;
    }

    /// Axis-aligned rectangle of the entity, rotation ignored.
    pub fn bounds(&self) -> Rect {
        self.bounds_at(self.position, self.scale)
    }

    /// Axis-aligned rectangle the entity would have at `position` and `scale`.
    pub fn bounds_at(&self, position: Point, scale: f64) -> Rect {
        let size = self.native_size * scale;
        Rect::from_center_size(position, size)
    }
}
