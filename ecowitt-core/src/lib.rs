//! Decoding and unit normalization of Ecowitt weather station reports.
//!
//! A report arrives as form fields ([`FormValues`]), is decoded into a
//! [`RawPayload`] by [`PayloadDecoder`], and converted to a metric
//! [`WeatherObservation`] by [`UnitNormalizer`]. Nothing here does I/O.

mod compass;
mod decode;
mod form;
mod normalize;
mod payload;
pub mod units;

pub use compass::{CompassPoint, wind_degrees_to_name};
pub use decode::{
    DecodeError, FieldError, FieldKind, FieldSpec, PayloadDecoder, TIMESTAMP_FORMAT,
    UnknownFieldPolicy, lookup, parse_timestamp, schema,
};
pub use form::FormValues;
pub use normalize::{DEFAULT_WIND_OFFSET, NormalizeError, UnitNormalizer, offset_degrees};
pub use payload::{RawPayload, WeatherObservation};
pub use units::ConversionTable;
