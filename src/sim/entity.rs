//! Game object definitions
//!
//! The player, trams, coins and obstacles share one shape: an id, a
//! top-left position, a size and a kind tag carrying kind-specific data.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::{Bounded, Rect};

/// Rejected entity geometry
#[derive(Debug, Error, PartialEq)]
pub enum EntityError {
    #[error("entity id must not be empty")]
    EmptyId,
    #[error("entity `{id}` has non-finite position ({x}, {y})")]
    NonFinitePosition { id: String, x: f32, y: f32 },
    #[error("entity `{id}` has invalid size {width}x{height} (must be finite and positive)")]
    InvalidSize { id: String, width: f32, height: f32 },
    #[error("invalid color `{0}` (expected #RRGGBB)")]
    InvalidColor(String),
}

/// 24-bit color used to tell trams apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// From a packed `0xRRGGBB` value
    pub const fn from_rgb(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
        }
    }

    /// Parse a `#RRGGBB` string
    pub fn from_hex(s: &str) -> Result<Self, EntityError> {
        let invalid = || EntityError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Platform { color: Color },
    Collectible { collected: bool },
    Hazard,
}

/// A game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique within its collection
    pub id: String,
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height, always positive
    pub size: Vec2,
    pub kind: EntityKind,
}

impl Entity {
    /// Build an entity, rejecting empty ids and degenerate geometry
    pub fn new(
        id: impl Into<String>,
        pos: Vec2,
        size: Vec2,
        kind: EntityKind,
    ) -> Result<Self, EntityError> {
        let id = id.into();
        if id.is_empty() {
            return Err(EntityError::EmptyId);
        }
        if !pos.is_finite() {
            return Err(EntityError::NonFinitePosition {
                id,
                x: pos.x,
                y: pos.y,
            });
        }
        if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
            return Err(EntityError::InvalidSize {
                id,
                width: size.x,
                height: size.y,
            });
        }
        Ok(Self { id, pos, size, kind })
    }

    pub fn player(id: impl Into<String>, pos: Vec2, size: Vec2) -> Result<Self, EntityError> {
        Self::new(id, pos, size, EntityKind::Player)
    }

    pub fn platform(
        id: impl Into<String>,
        pos: Vec2,
        size: Vec2,
        color: Color,
    ) -> Result<Self, EntityError> {
        Self::new(id, pos, size, EntityKind::Platform { color })
    }

    /// An active (not yet collected) collectible
    pub fn collectible(id: impl Into<String>, pos: Vec2, size: Vec2) -> Result<Self, EntityError> {
        Self::new(id, pos, size, EntityKind::Collectible { collected: false })
    }

    pub fn hazard(id: impl Into<String>, pos: Vec2, size: Vec2) -> Result<Self, EntityError> {
        Self::new(id, pos, size, EntityKind::Hazard)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Returns true for a collectible that has already been picked up
    pub fn is_collected(&self) -> bool {
        matches!(self.kind, EntityKind::Collectible { collected: true })
    }

    /// Mark a collectible as taken. No effect on other kinds.
    pub fn collect(&mut self) {
        if let EntityKind::Collectible { collected } = &mut self.kind {
            *collected = true;
        }
    }
}

impl Bounded for Entity {
    fn bounds(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_construction() {
        let e = Entity::player("hero", Vec2::new(100.0, 300.0), Vec2::new(40.0, 40.0)).unwrap();
        assert_eq!(e.kind, EntityKind::Player);
        assert_eq!(e.width(), 40.0);
        assert_eq!(e.bounds().bottom(), 340.0);
    }

    #[test]
    fn test_rejects_bad_size() {
        let err = Entity::hazard("rock", Vec2::ZERO, Vec2::new(-1.0, 10.0)).unwrap_err();
        assert!(matches!(err, EntityError::InvalidSize { .. }));

        let err = Entity::hazard("rock", Vec2::ZERO, Vec2::new(10.0, 0.0)).unwrap_err();
        assert!(matches!(err, EntityError::InvalidSize { .. }));

        let err = Entity::hazard("rock", Vec2::ZERO, Vec2::new(f32::NAN, 1.0)).unwrap_err();
        assert!(matches!(err, EntityError::InvalidSize { .. }));
    }

    #[test]
    fn test_rejects_bad_position_and_id() {
        let err = Entity::hazard("rock", Vec2::new(f32::INFINITY, 0.0), Vec2::ONE).unwrap_err();
        assert!(matches!(err, EntityError::NonFinitePosition { .. }));

        let err = Entity::hazard("", Vec2::ZERO, Vec2::ONE).unwrap_err();
        assert_eq!(err, EntityError::EmptyId);
    }

    #[test]
    fn test_collect_is_sticky() {
        let mut coin = Entity::collectible("coin1", Vec2::ZERO, Vec2::splat(20.0)).unwrap();
        assert!(!coin.is_collected());
        coin.collect();
        assert!(coin.is_collected());
        coin.collect();
        assert!(coin.is_collected());

        // Only collectibles carry the flag
        let mut rock = Entity::hazard("rock", Vec2::ZERO, Vec2::ONE).unwrap();
        rock.collect();
        assert_eq!(rock.kind, EntityKind::Hazard);
    }

    #[test]
    fn test_color_hex() {
        let c = Color::from_hex("#FF6B35").unwrap();
        assert_eq!((c.r, c.g, c.b), (0xFF, 0x6B, 0x35));
        assert_eq!(c.to_hex(), "#FF6B35");
        assert_eq!(Color::from_rgb(0xFF6B35), c);
        assert!(Color::from_hex("FF6B35").is_err());
        assert!(Color::from_hex("#FF6B3").is_err());
        assert!(Color::from_hex("#GG6B35").is_err());
    }
}
