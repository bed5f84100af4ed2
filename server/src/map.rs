//! Spawn bounds, optionally read from a map asset.

use log::info;
use rand::Rng;
use serde::Deserialize;
use shared::{Vector2, DEFAULT_MAP_SIZE};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse map asset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("map asset describes an empty area")]
    Empty,
    #[error("map asset describes an unbounded area")]
    Unbounded,
}

/// Only the outer dimensions of a map are relevant to the server.
#[derive(Debug, Deserialize)]
struct MapAsset {
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
}

/// Axis-aligned area `[0, size.x] x [0, size.y]` where entities may spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub size: Vector2,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            size: Vector2::new(DEFAULT_MAP_SIZE, DEFAULT_MAP_SIZE),
        }
    }
}

impl MapBounds {
    /// Creates bounds of the given size.
    ///
    /// Sizes that are not strictly positive, including NaN, are `Empty`.
    /// Infinite sizes are `Unbounded`.
    pub fn new(size: Vector2) -> Result<Self, MapError> {
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(MapError::Empty);
        }
        if !(size.x.is_finite() && size.y.is_finite()) {
            return Err(MapError::Unbounded);
        }
        Ok(Self { size })
    }

    /// Reads bounds from a JSON map asset on disk.
    ///
    /// Only `width`, `height`, `tile_width` and `tile_height` are read; the
    /// size is the tile count times the tile size on each axis.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let contents = std::fs::read_to_string(path)?;
        let bounds = Self::from_json(&contents)?;
        info!(
            "Loaded map {} ({}x{})",
            path.display(),
            bounds.size.x,
            bounds.size.y
        );
        Ok(bounds)
    }

    pub fn from_json(contents: &str) -> Result<Self, MapError> {
        let asset: MapAsset = serde_json::from_str(contents)?;
        Self::new(Vector2::new(
            asset.width as f32 * asset.tile_width,
            asset.height as f32 * asset.tile_height,
        ))
    }

    pub fn contains(&self, position: Vector2) -> bool {
        (0.0..=self.size.x).contains(&position.x) && (0.0..=self.size.y).contains(&position.y)
    }

    pub fn clamp(&self, position: Vector2) -> Vector2 {
        Vector2::new(
            position.x.clamp(0.0, self.size.x),
            position.y.clamp(0.0, self.size.y),
        )
    }

    /// Returns a uniformly random point inside the bounds
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector2 {
        Vector2::new(rng.gen_range(0.0..self.size.x), rng.gen_range(0.0..self.size.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_bounds() {
        let bounds = MapBounds::default();
        assert_eq!(bounds.size, Vector2::new(640.0, 640.0));
        assert!(bounds.contains(Vector2::new(0.0, 640.0)));
        assert!(!bounds.contains(Vector2::new(-0.1, 10.0)));
        assert!(!bounds.contains(Vector2::new(10.0, 640.5)));
    }

    #[test]
    fn test_from_json() {
        let bounds =
            MapBounds::from_json(r#"{"width": 20, "height": 15, "tile_width": 32, "tile_height": 32}"#)
                .unwrap();
        assert_eq!(bounds.size, Vector2::new(640.0, 480.0));
    }

    #[test]
    fn test_invalid_assets() {
        assert!(matches!(
            MapBounds::from_json(r#"{"width": 0, "height": 15, "tile_width": 32, "tile_height": 32}"#),
            Err(MapError::Empty)
        ));
        // Tile sizes beyond f32 range parse as infinity
        assert!(matches!(
            MapBounds::from_json(r#"{"width": 1, "height": 1, "tile_width": 1e39, "tile_height": 32}"#),
            Err(MapError::Unbounded)
        ));
        assert!(matches!(
            MapBounds::from_json(r#"{"width": 4000000000, "height": 1, "tile_width": 3e30, "tile_height": 32}"#),
            Err(MapError::Unbounded)
        ));
        assert!(matches!(MapBounds::from_json("not json"), Err(MapError::Parse(_))));
        assert!(matches!(
            MapBounds::load(Path::new("/definitely/not/here.json")),
            Err(MapError::Io(_))
        ));
    }

    #[test]
    fn test_random_positions_stay_inside() {
        let bounds = MapBounds::new(Vector2::new(100.0, 50.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(bounds.contains(bounds.random_position(&mut rng)));
        }
    }

    #[test]
    fn test_clamp() {
        let bounds = MapBounds::default();
        assert_eq!(
            bounds.clamp(Vector2::new(-5.0, 700.0)),
            Vector2::new(0.0, 640.0)
        );
    }
}
