use jiff::SignedDuration;
use thiserror::Error;

use crate::payload::{RawPayload, WeatherObservation};
use crate::units::ConversionTable;

/// Offset of the deployed station's wind vane, which is mounted a quarter
/// turn off north.
pub const DEFAULT_WIND_OFFSET: i64 = -90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("invalid wind degrees {0}")]
    DegreesOutOfRange(i64),
}

/// Rotates `degrees` by `offset`, wrapping into `[0, 360)`.
pub fn offset_degrees(degrees: i64, offset: i64) -> i64 {
    // Reducing both operands first keeps the sum from overflowing.
    ((degrees % 360 + offset % 360) % 360 + 360) % 360
}

/// Turns a [`RawPayload`] into a [`WeatherObservation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitNormalizer {
    wind_offset: i64,
    table: ConversionTable,
}

impl UnitNormalizer {
    pub fn new(wind_offset: i64) -> Self {
        Self::with_table(wind_offset, ConversionTable::EXACT)
    }

    pub fn with_table(wind_offset: i64, table: ConversionTable) -> Self {
        Self { wind_offset, table }
    }

    pub fn wind_offset(&self) -> i64 {
        self.wind_offset
    }

    pub fn normalize(&self, raw: RawPayload) -> WeatherObservation {
        let t = &self.table;

        WeatherObservation {
            passkey: raw.passkey,
            timestamp: raw.date_utc,
            pressure_absolute: raw.barom_abs_in.map(|v| t.pressure(v)),
            pressure_relative: raw.barom_rel_in.map(|v| t.pressure(v)),
            frequency: raw.freq,
            heap: raw.heap,
            daily_rain: raw.daily_rain_in.map(|v| t.length(v)),
            event_rain: raw.event_rain_in.map(|v| t.length(v)),
            hourly_rain: raw.hourly_rain_in.map(|v| t.length(v)),
            monthly_rain: raw.monthly_rain_in.map(|v| t.length(v)),
            rain_rate: raw.rain_rate_in.map(|v| t.length(v)),
            total_rain: raw.total_rain_in.map(|v| t.length(v)),
            weekly_rain: raw.weekly_rain_in.map(|v| t.length(v)),
            yearly_rain: raw.yearly_rain_in.map(|v| t.length(v)),
            humidity_outdoor: raw.humidity,
            humidity_indoor: raw.humidity_in,
            interval: raw.interval.map(SignedDuration::from_secs),
            model: raw.model,
            runtime: raw.runtime,
            solar_radiation: raw.solar_radiation,
            station_type: raw.station_type,
            temperature_outdoor: raw.temp_f.map(|v| t.temperature(v)),
            temperature_indoor: raw.temp_in_f.map(|v| t.temperature(v)),
            uv: raw.uv,
            vpd: raw.vpd.map(|v| t.pressure(v)),
            battery: raw.wh65_batt,
            wind_max_daily_gust: raw.max_daily_gust.map(|v| t.speed(v)),
            wind_direction: raw.wind_dir.map(|d| offset_degrees(d, self.wind_offset)),
            wind_gust: raw.wind_gust_mph.map(|v| t.speed(v)),
            wind_speed: raw.wind_speed_mph.map(|v| t.speed(v)),
        }
    }
}

impl Default for UnitNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_WIND_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::compass::CompassPoint;
    use crate::units::*;

    fn sample() -> RawPayload {
        RawPayload {
            passkey: Some("LA5ZAQUAHNGEDOOW0DAEROOV8VEZIETI".into()),
            barom_abs_in: Some(InchesOfMercury(29.565)),
            barom_rel_in: Some(InchesOfMercury(29.92)),
            daily_rain_in: Some(Inches(0.1)),
            date_utc: Some("2024-06-16T16:32:08Z".parse().unwrap()),
            event_rain_in: Some(Inches(0.2)),
            freq: Some("868M".into()),
            heap: Some(24000),
            hourly_rain_in: Some(Inches(0.01)),
            humidity: Some(47),
            humidity_in: Some(48),
            interval: Some(60),
            max_daily_gust: Some(MilesPerHour(4.47)),
            model: Some("WS2900_V2.02.03".into()),
            monthly_rain_in: Some(Inches(1.5)),
            rain_rate_in: Some(Inches(0.05)),
            runtime: Some(1240),
            solar_radiation: Some(142.55),
            station_type: Some("EasyWeatherPro_V5.1.3".into()),
            temp_f: Some(Fahrenheit(67.8)),
            temp_in_f: Some(Fahrenheit(70.0)),
            total_rain_in: Some(Inches(12.0)),
            uv: Some(1.0),
            vpd: Some(InchesOfMercury(0.153)),
            weekly_rain_in: Some(Inches(0.3)),
            wh65_batt: Some(0.0),
            wind_dir: Some(207),
            wind_gust_mph: Some(MilesPerHour(1.12)),
            wind_speed_mph: Some(MilesPerHour(0.22)),
            yearly_rain_in: Some(Inches(20.0)),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn offset_examples() {
        assert_eq!(offset_degrees(0, -90), 270);
        assert_eq!(offset_degrees(207, -90), 117);
        assert_eq!(offset_degrees(360, 0), 0);
        assert_eq!(offset_degrees(350, 20), 10);
        assert_eq!(offset_degrees(10, -370), 0);
    }

    #[test]
    fn offset_round_trips() {
        for offset in [-450, -360, -90, -1, 0, 1, 45, 90, 180, 359, 720] {
            for raw in 0..=360 {
                let corrected = offset_degrees(raw, offset);
                assert!((0..360).contains(&corrected));
                assert_eq!(offset_degrees(corrected, -offset), raw % 360);
            }
        }
    }

    #[test]
    fn zero_offset_is_idempotent() {
        for raw in 0..=360 {
            let once = offset_degrees(raw, 0);
            assert_eq!(offset_degrees(once, 0), once);
        }
    }

    #[test]
    fn offset_does_not_overflow() {
        assert!((0..360).contains(&offset_degrees(i64::MAX, i64::MAX)));
        assert!((0..360).contains(&offset_degrees(i64::MIN, -90)));
    }

    #[test]
    fn normalizes_every_field() {
        let raw = sample();
        let obs = UnitNormalizer::new(-90).normalize(raw.clone());

        assert_eq!(obs.passkey, raw.passkey);
        assert_eq!(obs.timestamp, Some("2024-06-16T16:32:08Z".parse::<Timestamp>().unwrap()));
        assert!(close(obs.pressure_absolute.unwrap().0, 29.565 * INHG_TO_HPA));
        assert!(close(obs.pressure_relative.unwrap().0, 29.92 * INHG_TO_HPA));
        assert_eq!(obs.frequency.as_deref(), Some("868M"));
        assert_eq!(obs.heap, Some(24000));
        assert!(close(obs.daily_rain.unwrap().0, 2.54));
        assert!(close(obs.event_rain.unwrap().0, 5.08));
        assert!(close(obs.hourly_rain.unwrap().0, 0.254));
        assert!(close(obs.monthly_rain.unwrap().0, 38.1));
        assert!(close(obs.rain_rate.unwrap().0, 1.27));
        assert!(close(obs.total_rain.unwrap().0, 304.8));
        assert!(close(obs.weekly_rain.unwrap().0, 7.62));
        assert!(close(obs.yearly_rain.unwrap().0, 508.0));
        assert_eq!(obs.humidity_outdoor, Some(47));
        assert_eq!(obs.humidity_indoor, Some(48));
        assert_eq!(obs.interval, Some(SignedDuration::from_secs(60)));
        assert_eq!(obs.model.as_deref(), Some("WS2900_V2.02.03"));
        assert_eq!(obs.runtime, Some(1240));
        assert_eq!(obs.solar_radiation, Some(142.55));
        assert_eq!(obs.station_type.as_deref(), Some("EasyWeatherPro_V5.1.3"));
        assert!(close(obs.temperature_outdoor.unwrap().0, (67.8 - 32.0) * 5.0 / 9.0));
        assert_eq!(obs.temperature_indoor, Some(Celsius((70.0 - 32.0) * 5.0 / 9.0)));
        assert_eq!(obs.uv, Some(1.0));
        assert!(close(obs.vpd.unwrap().0, 0.153 * INHG_TO_HPA));
        assert_eq!(obs.battery, Some(0.0));
        assert!(close(obs.wind_max_daily_gust.unwrap().0, 4.47 * 0.44704));
        assert_eq!(obs.wind_direction, Some(117));
        assert!(close(obs.wind_gust.unwrap().0, 1.12 * 0.44704));
        assert!(close(obs.wind_speed.unwrap().0, 0.22 * 0.44704));

        assert_eq!(obs.compass_point(), Ok(Some(CompassPoint::EastSouthEast)));
    }

    #[test]
    fn absent_fields_stay_absent() {
        let obs = UnitNormalizer::default().normalize(RawPayload::default());

        assert_eq!(obs.temperature_outdoor, None);
        assert_eq!(obs.wind_direction, None);
        assert_eq!(obs.interval, None);
        assert_eq!(obs.compass_point(), Ok(None));
    }

    #[test]
    fn uses_the_supplied_table() {
        let table = ConversionTable {
            speed: 1.0,
            pressure: 2.0,
            length: 3.0,
        };
        let raw = RawPayload {
            wind_speed_mph: Some(MilesPerHour(5.0)),
            barom_abs_in: Some(InchesOfMercury(5.0)),
            daily_rain_in: Some(Inches(5.0)),
            temp_f: Some(Fahrenheit(212.0)),
            ..RawPayload::default()
        };

        let obs = UnitNormalizer::with_table(0, table).normalize(raw);
        assert_eq!(obs.wind_speed, Some(MetersPerSecond(5.0)));
        assert_eq!(obs.pressure_absolute, Some(Hectopascals(10.0)));
        assert_eq!(obs.daily_rain, Some(Millimeters(15.0)));
        assert_eq!(obs.temperature_outdoor, Some(Celsius(100.0)));
    }

    #[test]
    fn full_circle_direction_wraps() {
        let raw = RawPayload {
            wind_dir: Some(360),
            ..RawPayload::default()
        };
        let obs = UnitNormalizer::new(0).normalize(raw);

        assert_eq!(obs.wind_direction, Some(0));
        assert_eq!(obs.compass_point(), Ok(Some(CompassPoint::North)));
    }

    #[test]
    fn out_of_range_raw_direction_is_passed_to_the_offset() {
        // Raw values outside [0, 360] are not clamped; the offset still wraps them.
        let raw = RawPayload {
            wind_dir: Some(-30),
            ..RawPayload::default()
        };
        let obs = UnitNormalizer::new(0).normalize(raw);
        assert_eq!(obs.wind_direction, Some(330));
    }

    #[test]
    fn default_uses_deployment_offset() {
        let normalizer = UnitNormalizer::default();
        assert_eq!(normalizer.wind_offset(), DEFAULT_WIND_OFFSET);
        assert_eq!(UnitNormalizer::new(45).wind_offset(), 45);
    }
}
