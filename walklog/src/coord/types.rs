//! Tile key types for the slippy-map tiling scheme.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Zoom level used for "explored area" tiles when none is configured.
///
/// At zoom 17 a tile is roughly 300m wide at the equator, a comfortable
/// granularity for walking.
pub const DEFAULT_TILE_ZOOM: u8 = 17;

/// Latitude limit of the Web Mercator projection in degrees.
///
/// Keys computed beyond this latitude fall outside the tile grid.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Errors that can occur while parsing a tile key string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileKeyParseError {
    /// The key does not have the `{zoom}/{x}/{y}` shape.
    #[error("Malformed tile key '{0}': expected zoom/x/y")]
    Malformed(String),

    /// One of the components is not a valid integer.
    #[error("Invalid {component} in tile key '{key}'")]
    InvalidComponent {
        component: &'static str,
        key: String,
    },
}

/// A slippy-map tile identifier at a given zoom level.
///
/// Rendered and parsed as `"{zoom}/{x}/{y}"`. `x` grows eastwards from the
/// antimeridian, `y` grows southwards from the northern Mercator limit.
///
/// Coordinates are signed: points beyond [`MAX_MERCATOR_LAT`] produce keys
/// outside the grid rather than being clamped. Use
/// [`TileKey::is_within_bounds`] to detect them.
///
/// Serializes as its string form, matching how explored tiles are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TileKey {
    /// Zoom level.
    pub zoom: u8,
    /// Tile column.
    pub x: i64,
    /// Tile row.
    pub y: i64,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(zoom: u8, x: i64, y: i64) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along one axis at this zoom level.
    pub fn tiles_per_axis(&self) -> f64 {
        2.0_f64.powi(self.zoom as i32)
    }

    /// Whether the key addresses a tile that exists in the Web Mercator grid.
    pub fn is_within_bounds(&self) -> bool {
        let n = self.tiles_per_axis();
        self.x >= 0 && self.y >= 0 && (self.x as f64) < n && (self.y as f64) < n
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

impl FromStr for TileKey {
    type Err = TileKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let (Some(zoom), Some(x), Some(y), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TileKeyParseError::Malformed(s.to_string()));
        };

        let invalid = |component| TileKeyParseError::InvalidComponent {
            component,
            key: s.to_string(),
        };

        Ok(Self {
            zoom: zoom.parse().map_err(|_| invalid("zoom"))?,
            x: x.parse().map_err(|_| invalid("x"))?,
            y: y.parse().map_err(|_| invalid("y"))?,
        })
    }
}

impl From<TileKey> for String {
    fn from(key: TileKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for TileKey {
    type Error = TileKeyParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let key = TileKey::new(17, 116_415, 51_623);
        assert_eq!(key.to_string(), "17/116415/51623");
    }

    #[test]
    fn test_parse_valid_key() {
        let key: TileKey = "17/116415/51623".parse().unwrap();
        assert_eq!(key, TileKey::new(17, 116_415, 51_623));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(matches!(
            "17/116415".parse::<TileKey>(),
            Err(TileKeyParseError::Malformed(_))
        ));
        assert!(matches!(
            "17/1/2/3".parse::<TileKey>(),
            Err(TileKeyParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_component() {
        let err = "17/abc/5".parse::<TileKey>().unwrap_err();
        assert_eq!(
            err,
            TileKeyParseError::InvalidComponent {
                component: "x",
                key: "17/abc/5".to_string()
            }
        );

        // zoom is a u8
        assert!("300/1/1".parse::<TileKey>().is_err());
    }

    #[test]
    fn test_bounds() {
        assert!(TileKey::new(0, 0, 0).is_within_bounds());
        assert!(TileKey::new(2, 3, 3).is_within_bounds());
        assert!(!TileKey::new(2, 4, 0).is_within_bounds());
        assert!(!TileKey::new(17, 10, -1).is_within_bounds());
    }

    #[test]
    fn test_ordering_is_zoom_then_x_then_y() {
        let mut keys = vec![
            TileKey::new(17, 2, 1),
            TileKey::new(16, 9, 9),
            TileKey::new(17, 1, 5),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                TileKey::new(16, 9, 9),
                TileKey::new(17, 1, 5),
                TileKey::new(17, 2, 1),
            ]
        );
    }

    #[test]
    fn test_serializes_as_string() {
        let key = TileKey::new(17, 116_423, 51_613);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"17/116423/51613\"");

        let back: TileKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<TileKey>("\"17/x/1\"").is_err());
    }
}
