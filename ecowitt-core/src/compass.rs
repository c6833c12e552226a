use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::NormalizeError;

/// 360 degrees split into 16 points.
const SECTOR_DEGREES: f64 = 22.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    North,
    NorthNorthEast,
    NorthEast,
    EastNorthEast,
    East,
    EastSouthEast,
    SouthEast,
    SouthSouthEast,
    South,
    SouthSouthWest,
    SouthWest,
    WestSouthWest,
    West,
    WestNorthWest,
    NorthWest,
    NorthNorthWest,
}

const POINTS: [CompassPoint; 16] = [
    CompassPoint::North,
    CompassPoint::NorthNorthEast,
    CompassPoint::NorthEast,
    CompassPoint::EastNorthEast,
    CompassPoint::East,
    CompassPoint::EastSouthEast,
    CompassPoint::SouthEast,
    CompassPoint::SouthSouthEast,
    CompassPoint::South,
    CompassPoint::SouthSouthWest,
    CompassPoint::SouthWest,
    CompassPoint::WestSouthWest,
    CompassPoint::West,
    CompassPoint::WestNorthWest,
    CompassPoint::NorthWest,
    CompassPoint::NorthNorthWest,
];

impl CompassPoint {
    /// Nearest compass point for `degrees` in `[0, 360]`.
    pub fn from_degrees(degrees: i64) -> Result<Self, NormalizeError> {
        if !(0..=360).contains(&degrees) {
            return Err(NormalizeError::DegreesOutOfRange(degrees));
        }

        let index = (degrees as f64 / SECTOR_DEGREES + 0.5).floor() as usize;
        Ok(POINTS[index % POINTS.len()])
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::NorthNorthEast => "NNE",
            Self::NorthEast => "NE",
            Self::EastNorthEast => "ENE",
            Self::East => "E",
            Self::EastSouthEast => "ESE",
            Self::SouthEast => "SE",
            Self::SouthSouthEast => "SSE",
            Self::South => "S",
            Self::SouthSouthWest => "SSW",
            Self::SouthWest => "SW",
            Self::WestSouthWest => "WSW",
            Self::West => "W",
            Self::WestNorthWest => "WNW",
            Self::NorthWest => "NW",
            Self::NorthNorthWest => "NNW",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Abbreviated compass name (`"N"`, `"NNE"`, ...) for a wind direction.
pub fn wind_degrees_to_name(degrees: i64) -> Result<&'static str, NormalizeError> {
    CompassPoint::from_degrees(degrees).map(CompassPoint::abbreviation)
}
