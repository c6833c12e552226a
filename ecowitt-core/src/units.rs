//! Unit newtypes and the conversion constants between the station's
//! imperial units and the metric units stored downstream.

use serde::{Deserialize, Serialize};

/// Exact SI definition of one mile per hour in metres per second.
pub const MPH_TO_MS: f64 = 0.44704;

pub const INHG_TO_HPA: f64 = 33.8638866667;

pub const INCH_TO_MM: f64 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fahrenheit(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Celsius(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InchesOfMercury(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hectopascals(pub f64);

/// Rain depth in inches. Rain rates use the same type, per hour.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

/// Rain depth in millimetres. Rain rates use the same type, per hour.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilesPerHour(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerSecond(pub f64);

/// Multiplicative factors used by [`crate::UnitNormalizer`].
///
/// The table is built once and handed to the normalizer; nothing in this
/// crate keeps a process-wide registry of units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionTable {
    /// mph -> m/s
    pub speed: f64,
    /// inHg -> hPa
    pub pressure: f64,
    /// in -> mm
    pub length: f64,
}

impl ConversionTable {
    pub const EXACT: Self = Self {
        speed: MPH_TO_MS,
        pressure: INHG_TO_HPA,
        length: INCH_TO_MM,
    };

    pub fn speed(&self, value: MilesPerHour) -> MetersPerSecond {
        MetersPerSecond(value.0 * self.speed)
    }

    pub fn pressure(&self, value: InchesOfMercury) -> Hectopascals {
        Hectopascals(value.0 * self.pressure)
    }

    pub fn length(&self, value: Inches) -> Millimeters {
        Millimeters(value.0 * self.length)
    }

    /// Temperature is affine, so it has no factor in the table.
    pub fn temperature(&self, value: Fahrenheit) -> Celsius {
        Celsius(fahrenheit_to_celsius(value.0))
    }
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::EXACT
    }
}

pub fn mph_to_ms(mph: f64) -> f64 {
    mph * MPH_TO_MS
}

pub fn inhg_to_hpa(inhg: f64) -> f64 {
    inhg * INHG_TO_HPA
}

pub fn inch_to_mm(inches: f64) -> f64 {
    inches * INCH_TO_MM
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}
