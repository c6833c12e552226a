use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::compass::CompassPoint;
use crate::normalize::NormalizeError;
use crate::units::{
    Celsius, Fahrenheit, Hectopascals, Inches, InchesOfMercury, MetersPerSecond, MilesPerHour,
    Millimeters,
};

type BoxStr = Box<str>;

/// One report as the station sends it, in imperial units.
///
/// Every field is optional: a station only sends the sensors it has, and
/// `None` means the field was not part of this report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayload {
    /// Opaque device identifier. Some firmware sends an uppercase MD5 of the
    /// station MAC address.
    pub passkey: Option<BoxStr>,
    pub barom_abs_in: Option<InchesOfMercury>,
    pub barom_rel_in: Option<InchesOfMercury>,
    pub daily_rain_in: Option<Inches>,
    /// Station clock, UTC.
    pub date_utc: Option<Timestamp>,
    pub event_rain_in: Option<Inches>,
    /// Radio band, e.g. `868M`.
    pub freq: Option<BoxStr>,
    pub heap: Option<i64>,
    pub hourly_rain_in: Option<Inches>,
    pub humidity: Option<i64>,
    pub humidity_in: Option<i64>,
    /// Upload interval in seconds.
    pub interval: Option<i64>,
    pub max_daily_gust: Option<MilesPerHour>,
    pub model: Option<BoxStr>,
    pub monthly_rain_in: Option<Inches>,
    /// Inches per hour.
    pub rain_rate_in: Option<Inches>,
    /// Seconds since the station booted.
    pub runtime: Option<i64>,
    /// W/m²
    pub solar_radiation: Option<f64>,
    pub station_type: Option<BoxStr>,
    pub temp_f: Option<Fahrenheit>,
    pub temp_in_f: Option<Fahrenheit>,
    pub total_rain_in: Option<Inches>,
    pub uv: Option<f64>,
    /// Vapour pressure deficit.
    pub vpd: Option<InchesOfMercury>,
    pub weekly_rain_in: Option<Inches>,
    /// 0 = OK, anything else = low. Not validated.
    pub wh65_batt: Option<f64>,
    /// Degrees, as measured by the sensor before any mounting correction.
    pub wind_dir: Option<i64>,
    pub wind_gust_mph: Option<MilesPerHour>,
    pub wind_speed_mph: Option<MilesPerHour>,
    pub yearly_rain_in: Option<Inches>,
}

/// A report normalized to metric units, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub passkey: Option<BoxStr>,
    pub timestamp: Option<Timestamp>,
    pub pressure_absolute: Option<Hectopascals>,
    pub pressure_relative: Option<Hectopascals>,
    pub frequency: Option<BoxStr>,
    pub heap: Option<i64>,
    pub daily_rain: Option<Millimeters>,
    pub event_rain: Option<Millimeters>,
    pub hourly_rain: Option<Millimeters>,
    pub monthly_rain: Option<Millimeters>,
    /// Millimetres per hour.
    pub rain_rate: Option<Millimeters>,
    pub total_rain: Option<Millimeters>,
    pub weekly_rain: Option<Millimeters>,
    pub yearly_rain: Option<Millimeters>,
    pub humidity_outdoor: Option<i64>,
    pub humidity_indoor: Option<i64>,
    pub interval: Option<SignedDuration>,
    pub model: Option<BoxStr>,
    pub runtime: Option<i64>,
    pub solar_radiation: Option<f64>,
    pub station_type: Option<BoxStr>,
    pub temperature_outdoor: Option<Celsius>,
    pub temperature_indoor: Option<Celsius>,
    pub uv: Option<f64>,
    pub vpd: Option<Hectopascals>,
    pub battery: Option<f64>,
    pub wind_max_daily_gust: Option<MetersPerSecond>,
    /// Degrees in `[0, 360)`, corrected for the sensor mounting offset.
    pub wind_direction: Option<i64>,
    pub wind_gust: Option<MetersPerSecond>,
    pub wind_speed: Option<MetersPerSecond>,
}

impl WeatherObservation {
    /// Compass point of the corrected wind direction, if one was reported.
    pub fn compass_point(&self) -> Result<Option<CompassPoint>, NormalizeError> {
        self.wind_direction
            .map(CompassPoint::from_degrees)
            .transpose()
    }
}
