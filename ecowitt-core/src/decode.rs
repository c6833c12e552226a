use std::fmt;

use jiff::{Timestamp, civil, tz::TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::form::FormValues;
use crate::payload::RawPayload;
use crate::units::{Fahrenheit, Inches, InchesOfMercury, MilesPerHour};

/// Wire layout of `dateutc`, e.g. `2024-06-16 16:32:08`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_LEN: usize = "YYYY-MM-DD HH:MM:SS".len();

/// What to do with a form field that is not part of the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Fail the report with [`FieldError::UnknownField`].
    #[default]
    Reject,
    /// Skip the field, so newer firmware sending extra sensors still gets
    /// through.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Integer,
    Text,
    Timestamp,
}

#[derive(Clone, Copy)]
enum Setter {
    Float(fn(&mut RawPayload, f64)),
    Integer(fn(&mut RawPayload, i64)),
    Text(fn(&mut RawPayload, Box<str>)),
    Timestamp(fn(&mut RawPayload, Timestamp)),
}

/// One entry of the report schema: a lowercase wire name and where its
/// value goes in [`RawPayload`].
pub struct FieldSpec {
    name: &'static str,
    setter: Setter,
}

impl FieldSpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        match self.setter {
            Setter::Float(_) => FieldKind::Float,
            Setter::Integer(_) => FieldKind::Integer,
            Setter::Text(_) => FieldKind::Text,
            Setter::Timestamp(_) => FieldKind::Timestamp,
        }
    }

    fn assign(&self, payload: &mut RawPayload, value: &str) -> Result<(), FieldError> {
        let field = self.name;

        match self.setter {
            Setter::Float(set) => set(payload, parse_float(field, value)?),
            Setter::Integer(set) => {
                let parsed = value.parse::<i64>().map_err(|_| FieldError::InvalidInteger {
                    field,
                    value: value.to_string(),
                })?;
                set(payload, parsed);
            }
            Setter::Text(set) => {
                if value.contains(char::REPLACEMENT_CHARACTER) {
                    return Err(FieldError::InvalidText {
                        field,
                        value: value.to_string(),
                    });
                }
                set(payload, value.into());
            }
            Setter::Timestamp(set) => {
                let parsed =
                    parse_timestamp(value).ok_or_else(|| FieldError::InvalidTimestamp {
                        field,
                        value: value.to_string(),
                    })?;
                set(payload, parsed);
            }
        }

        Ok(())
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

static SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        name: "passkey",
        setter: Setter::Text(|p, v| p.passkey = Some(v)),
    },
    FieldSpec {
        name: "baromabsin",
        setter: Setter::Float(|p, v| p.barom_abs_in = Some(InchesOfMercury(v))),
    },
    FieldSpec {
        name: "baromrelin",
        setter: Setter::Float(|p, v| p.barom_rel_in = Some(InchesOfMercury(v))),
    },
    FieldSpec {
        name: "dailyrainin",
        setter: Setter::Float(|p, v| p.daily_rain_in = Some(Inches(v))),
    },
    FieldSpec {
        name: "dateutc",
        setter: Setter::Timestamp(|p, v| p.date_utc = Some(v)),
    },
    FieldSpec {
        name: "eventrainin",
        setter: Setter::Float(|p, v| p.event_rain_in = Some(Inches(v))),
    },
    FieldSpec {
        name: "freq",
        setter: Setter::Text(|p, v| p.freq = Some(v)),
    },
    FieldSpec {
        name: "heap",
        setter: Setter::Integer(|p, v| p.heap = Some(v)),
    },
    FieldSpec {
        name: "hourlyrainin",
        setter: Setter::Float(|p, v| p.hourly_rain_in = Some(Inches(v))),
    },
    FieldSpec {
        name: "humidity",
        setter: Setter::Integer(|p, v| p.humidity = Some(v)),
    },
    FieldSpec {
        name: "humidityin",
        setter: Setter::Integer(|p, v| p.humidity_in = Some(v)),
    },
    FieldSpec {
        name: "interval",
        setter: Setter::Integer(|p, v| p.interval = Some(v)),
    },
    FieldSpec {
        name: "maxdailygust",
        setter: Setter::Float(|p, v| p.max_daily_gust = Some(MilesPerHour(v))),
    },
    FieldSpec {
        name: "model",
        setter: Setter::Text(|p, v| p.model = Some(v)),
    },
    FieldSpec {
        name: "monthlyrainin",
        setter: Setter::Float(|p, v| p.monthly_rain_in = Some(Inches(v))),
    },
    FieldSpec {
        name: "rainratein",
        setter: Setter::Float(|p, v| p.rain_rate_in = Some(Inches(v))),
    },
    FieldSpec {
        name: "runtime",
        setter: Setter::Integer(|p, v| p.runtime = Some(v)),
    },
    FieldSpec {
        name: "solarradiation",
        setter: Setter::Float(|p, v| p.solar_radiation = Some(v)),
    },
    FieldSpec {
        name: "stationtype",
        setter: Setter::Text(|p, v| p.station_type = Some(v)),
    },
    FieldSpec {
        name: "tempf",
        setter: Setter::Float(|p, v| p.temp_f = Some(Fahrenheit(v))),
    },
    FieldSpec {
        name: "tempinf",
        setter: Setter::Float(|p, v| p.temp_in_f = Some(Fahrenheit(v))),
    },
    FieldSpec {
        name: "totalrainin",
        setter: Setter::Float(|p, v| p.total_rain_in = Some(Inches(v))),
    },
    FieldSpec {
        name: "uv",
        setter: Setter::Float(|p, v| p.uv = Some(v)),
    },
    FieldSpec {
        name: "vpd",
        setter: Setter::Float(|p, v| p.vpd = Some(InchesOfMercury(v))),
    },
    FieldSpec {
        name: "weeklyrainin",
        setter: Setter::Float(|p, v| p.weekly_rain_in = Some(Inches(v))),
    },
    FieldSpec {
        name: "wh65batt",
        setter: Setter::Float(|p, v| p.wh65_batt = Some(v)),
    },
    FieldSpec {
        name: "winddir",
        setter: Setter::Integer(|p, v| p.wind_dir = Some(v)),
    },
    FieldSpec {
        name: "windgustmph",
        setter: Setter::Float(|p, v| p.wind_gust_mph = Some(MilesPerHour(v))),
    },
    FieldSpec {
        name: "windspeedmph",
        setter: Setter::Float(|p, v| p.wind_speed_mph = Some(MilesPerHour(v))),
    },
    FieldSpec {
        name: "yearlyrainin",
        setter: Setter::Float(|p, v| p.yearly_rain_in = Some(Inches(v))),
    },
];

/// Every field the decoder knows about.
pub fn schema() -> &'static [FieldSpec] {
    SCHEMA
}

/// Finds the schema field for a form key, ignoring ASCII case.
pub fn lookup(key: &str) -> Option<&'static FieldSpec> {
    SCHEMA.iter().find(|spec| spec.name.eq_ignore_ascii_case(key))
}

/// Parses the station's `YYYY-MM-DD HH:MM:SS` wall-clock time as UTC.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let bytes = value.as_bytes();
    if bytes.len() != TIMESTAMP_LEN {
        return None;
    }

    // `%Y` and `%S` alone would accept signs, space padding and leap seconds.
    let layout_ok = bytes.iter().enumerate().all(|(i, &b)| match i {
        4 | 7 => b == b'-',
        10 => b == b' ',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    });
    if !layout_ok || &bytes[17..] == b"60" {
        return None;
    }

    let datetime = civil::DateTime::strptime(TIMESTAMP_FORMAT, value).ok()?;
    datetime
        .to_zoned(TimeZone::UTC)
        .ok()
        .map(|zoned| zoned.timestamp())
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, FieldError> {
    let parsed = value.parse::<f64>().map_err(|_| FieldError::InvalidFloat {
        field,
        value: value.to_string(),
    })?;

    // `f64::from_str` accepts "NaN" and "inf"; neither is a measurement.
    if !parsed.is_finite() {
        return Err(FieldError::NonFinite {
            field,
            value: value.to_string(),
        });
    }

    Ok(parsed)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field {key:?}")]
    UnknownField { key: String },
    #[error("field {field} was sent without a value")]
    MissingValue { field: &'static str },
    #[error("field {field}: {value:?} is not a decimal number")]
    InvalidFloat { field: &'static str, value: String },
    #[error("field {field}: {value:?} is not a finite number")]
    NonFinite { field: &'static str, value: String },
    #[error("field {field}: {value:?} is not an integer")]
    InvalidInteger { field: &'static str, value: String },
    #[error("field {field}: {value:?} does not match YYYY-MM-DD HH:MM:SS")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("field {field}: {value:?} is not valid UTF-8")]
    InvalidText { field: &'static str, value: String },
}

impl FieldError {
    /// The offending form key, or the schema name when the key matched.
    pub fn key(&self) -> &str {
        match self {
            Self::UnknownField { key } => key,
            Self::MissingValue { field }
            | Self::InvalidFloat { field, .. }
            | Self::NonFinite { field, .. }
            | Self::InvalidInteger { field, .. }
            | Self::InvalidTimestamp { field, .. }
            | Self::InvalidText { field, .. } => field,
        }
    }
}

/// A rejected report. Holds at least one [`FieldError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid report: {}", join(errors))]
pub struct DecodeError {
    errors: Vec<FieldError>,
}

impl DecodeError {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn first(&self) -> &FieldError {
        &self.errors[0]
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Maps form fields onto [`RawPayload`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder {
    unknown_fields: UnknownFieldPolicy,
}

impl PayloadDecoder {
    pub fn new(unknown_fields: UnknownFieldPolicy) -> Self {
        Self { unknown_fields }
    }

    pub fn unknown_fields(&self) -> UnknownFieldPolicy {
        self.unknown_fields
    }

    /// Decodes a report, failing if any field is unknown (under
    /// [`UnknownFieldPolicy::Reject`]), empty, or does not parse.
    pub fn decode(&self, form: &FormValues) -> Result<RawPayload, DecodeError> {
        let (payload, errors) = self.decode_partial(form);

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(DecodeError { errors })
        }
    }

    /// Decodes every field it can. Fields that fail are left unset and
    /// reported in order of appearance.
    pub fn decode_partial(&self, form: &FormValues) -> (RawPayload, Vec<FieldError>) {
        let mut payload = RawPayload::default();
        let mut errors = Vec::new();

        for (key, values) in form.iter() {
            let Some(spec) = lookup(key) else {
                match self.unknown_fields {
                    UnknownFieldPolicy::Reject => errors.push(FieldError::UnknownField {
                        key: key.to_string(),
                    }),
                    UnknownFieldPolicy::Ignore => debug!(key, "ignoring unknown field"),
                }
                continue;
            };

            let Some(value) = values.first() else {
                errors.push(FieldError::MissingValue { field: spec.name });
                continue;
            };

            if let Err(e) = spec.assign(&mut payload, value) {
                errors.push(e);
            }
        }

        (payload, errors)
    }
}
