//! The versioned JSON board document.
//!
//! ```json
//! { "version": 2, "images": [ { "x": 0, "y": 0, "scale": 1.0, "rotation": 0, "data": "<base64>" } ] }
//! ```

use crate::board::{BOARD_VERSION, Board};
use crate::entity::ImageEntity;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Version assumed for documents that do not declare one.
pub const LEGACY_VERSION: u32 = 1;

/// On-disk form of a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardFile {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub images: Vec<EntityRecord>,
}

/// On-disk form of one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    #[serde(default)]
    pub rotation: f64,
    /// Base64 (standard alphabet) of the encoded image.
    #[serde(default)]
    pub data: String,
}

fn legacy_version() -> u32 {
    LEGACY_VERSION
}

fn unit_scale() -> f64 {
    1.0
}

impl EntityRecord {
    fn from_entity(entity: &ImageEntity) -> Self {
        Self {
            x: entity.position.x,
            y: entity.position.y,
            scale: entity.scale,
            rotation: entity.rotation,
            data: STANDARD.encode(entity.data()),
        }
    }

    /// Rebuild the entity, or `None` if the payload is missing or not base64.
    ///
    /// A payload that is valid base64 but not a decodable image still
    /// yields an entity, just without a bitmap.
    fn into_entity(self, index: usize) -> Option<ImageEntity> {
        if self.data.is_empty() {
            log::warn!("Skipping image record {}: no data", index);
            return None;
        }
        let bytes = match STANDARD.decode(self.data.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Skipping image record {}: invalid base64: {}", index, e);
                return None;
            }
        };
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            log::warn!("Image record {} has invalid scale {}, using 1.0", index, self.scale);
            1.0
        };
        let rotation = if self.rotation.is_finite() { self.rotation } else { 0.0 };
        Some(
            ImageEntity::from_payload(bytes, Point::new(self.x, self.y))
                .with_scale(scale)
                .with_rotation(rotation),
        )
    }
}

impl BoardFile {
    /// Snapshot a board. Always writes the current format version.
    pub fn from_board(board: &Board) -> Self {
        Self {
            version: BOARD_VERSION,
            images: board.iter().map(EntityRecord::from_entity).collect(),
        }
    }

    /// Decode every record, skipping the ones without a usable payload.
    pub fn into_board(self) -> Board {
        if self.version != BOARD_VERSION {
            log::info!(
                "Board declares version {} (current is {}), reading as-is",
                self.version,
                BOARD_VERSION
            );
        }
        let entities = self
            .images
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| record.into_entity(i))
            .collect();
        Board::from_entities(self.version, entities)
    }
}

impl Board {
    /// Serialize to the JSON document format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&BoardFile::from_board(self))
    }

    /// Deserialize from the JSON document format.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: BoardFile = serde_json::from_str(json)?;
        Ok(file.into_board())
    }
}
