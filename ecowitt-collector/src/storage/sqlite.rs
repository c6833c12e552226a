use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use ecowitt_core::WeatherObservation;
use ecowitt_core::units::{Celsius, Hectopascals, MetersPerSecond, Millimeters};
use jiff::{SignedDuration, Timestamp};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteRow, SqliteSynchronous};
use sqlx::{Error as SqlxError, Row, SqlitePool};
use thiserror::Error;
use ulid::Ulid;

use crate::storage::{ObservationId, ObservationStorage, StoredObservation};

/// Column names and types, in insert order. Every field of
/// [`WeatherObservation`] has one column.
const COLUMNS: &[(&str, &str)] = &[
    ("id", "TEXT PRIMARY KEY NOT NULL"),
    // microseconds since the unix epoch
    ("received_at", "INTEGER NOT NULL"),
    // seconds since the unix epoch
    ("time", "INTEGER"),
    ("passkey", "TEXT"),
    ("pressure_absolute", "REAL"),
    ("pressure_relative", "REAL"),
    ("frequency", "TEXT"),
    ("heap", "INTEGER"),
    ("daily_rain", "REAL"),
    ("event_rain", "REAL"),
    ("hourly_rain", "REAL"),
    ("monthly_rain", "REAL"),
    ("rain_rate", "REAL"),
    ("total_rain", "REAL"),
    ("weekly_rain", "REAL"),
    ("yearly_rain", "REAL"),
    ("humidity_outdoor", "INTEGER"),
    ("humidity_indoor", "INTEGER"),
    // seconds
    ("interval", "INTEGER"),
    ("model", "TEXT"),
    ("runtime", "INTEGER"),
    ("solar_radiation", "REAL"),
    ("station_type", "TEXT"),
    ("temperature_outdoor", "REAL"),
    ("temperature_indoor", "REAL"),
    ("uv", "REAL"),
    ("vpd", "REAL"),
    ("battery", "REAL"),
    ("wind_max_daily_gust", "REAL"),
    ("wind_direction", "INTEGER"),
    ("wind_gust", "REAL"),
    ("wind_speed", "REAL"),
];

#[derive(Debug, Error)]
pub enum SqliteStorageError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] SqlxError),
    #[error("invalid ulid {0:?}")]
    InvalidUlid(String),
    #[error("invalid timestamp {0}")]
    InvalidTimestamp(i64),
}

#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
    table: String,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path` and makes sure `table`
    /// exists. `table` must be a plain identifier; the configuration layer
    /// checks this.
    pub async fn new<P: AsRef<Path>>(path: P, table: &str) -> Result<Self, SqliteStorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePool::connect_with(options).await?;

        let storage = Self {
            pool,
            table: table.to_string(),
        };
        storage.create_table().await?;

        Ok(storage)
    }

    async fn create_table(&self) -> Result<(), SqliteStorageError> {
        sqlx::query(&create_table_statement(&self.table))
            .execute(&self.pool)
            .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {table}_received_at ON {table} (received_at)",
            table = self.table
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_entry(row: &SqliteRow) -> Result<StoredObservation, SqliteStorageError> {
        let id = row.try_get::<String, _>("id")?;
        let ulid = Ulid::from_str(&id).map_err(|_| SqliteStorageError::InvalidUlid(id.clone()))?;

        let received_at = row.try_get::<i64, _>("received_at")?;
        let received_at = Timestamp::from_microsecond(received_at)
            .map_err(|_| SqliteStorageError::InvalidTimestamp(received_at))?;

        let timestamp = row
            .try_get::<Option<i64>, _>("time")?
            .map(|s| Timestamp::from_second(s).map_err(|_| SqliteStorageError::InvalidTimestamp(s)))
            .transpose()?;

        let text = |column: &str| -> Result<Option<Box<str>>, SqlxError> {
            Ok(row
                .try_get::<Option<String>, _>(column)?
                .map(String::into_boxed_str))
        };
        let real = |column: &str| row.try_get::<Option<f64>, _>(column);
        let integer = |column: &str| row.try_get::<Option<i64>, _>(column);

        let observation = WeatherObservation {
            passkey: text("passkey")?,
            timestamp,
            pressure_absolute: real("pressure_absolute")?.map(Hectopascals),
            pressure_relative: real("pressure_relative")?.map(Hectopascals),
            frequency: text("frequency")?,
            heap: integer("heap")?,
            daily_rain: real("daily_rain")?.map(Millimeters),
            event_rain: real("event_rain")?.map(Millimeters),
            hourly_rain: real("hourly_rain")?.map(Millimeters),
            monthly_rain: real("monthly_rain")?.map(Millimeters),
            rain_rate: real("rain_rate")?.map(Millimeters),
            total_rain: real("total_rain")?.map(Millimeters),
            weekly_rain: real("weekly_rain")?.map(Millimeters),
            yearly_rain: real("yearly_rain")?.map(Millimeters),
            humidity_outdoor: integer("humidity_outdoor")?,
            humidity_indoor: integer("humidity_indoor")?,
            interval: integer("interval")?.map(SignedDuration::from_secs),
            model: text("model")?,
            runtime: integer("runtime")?,
            solar_radiation: real("solar_radiation")?,
            station_type: text("station_type")?,
            temperature_outdoor: real("temperature_outdoor")?.map(Celsius),
            temperature_indoor: real("temperature_indoor")?.map(Celsius),
            uv: real("uv")?,
            vpd: real("vpd")?.map(Hectopascals),
            battery: real("battery")?,
            wind_max_daily_gust: real("wind_max_daily_gust")?.map(MetersPerSecond),
            wind_direction: integer("wind_direction")?,
            wind_gust: real("wind_gust")?.map(MetersPerSecond),
            wind_speed: real("wind_speed")?.map(MetersPerSecond),
        };

        Ok(StoredObservation {
            id: ObservationId(ulid),
            received_at,
            observation,
        })
    }
}

fn create_table_statement(table: &str) -> String {
    let columns = COLUMNS
        .iter()
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE IF NOT EXISTS {table} ({columns})")
}

fn insert_statement(table: &str) -> String {
    let columns = COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(",");
    let placeholders = vec!["?"; COLUMNS.len()].join(",");

    format!("INSERT INTO {table}({columns}) VALUES({placeholders})")
}

#[async_trait]
impl ObservationStorage for SqliteStorage {
    type Error = SqliteStorageError;

    async fn store(&self, entry: StoredObservation) -> Result<(), Self::Error> {
        let sql = insert_statement(&self.table);
        let o = &entry.observation;

        sqlx::query(&sql)
            .bind(entry.id.0.to_string())
            .bind(entry.received_at.as_microsecond())
            .bind(o.timestamp.map(|t| t.as_second()))
            .bind(o.passkey.as_deref())
            .bind(o.pressure_absolute.map(|v| v.0))
            .bind(o.pressure_relative.map(|v| v.0))
            .bind(o.frequency.as_deref())
            .bind(o.heap)
            .bind(o.daily_rain.map(|v| v.0))
            .bind(o.event_rain.map(|v| v.0))
            .bind(o.hourly_rain.map(|v| v.0))
            .bind(o.monthly_rain.map(|v| v.0))
            .bind(o.rain_rate.map(|v| v.0))
            .bind(o.total_rain.map(|v| v.0))
            .bind(o.weekly_rain.map(|v| v.0))
            .bind(o.yearly_rain.map(|v| v.0))
            .bind(o.humidity_outdoor)
            .bind(o.humidity_indoor)
            .bind(o.interval.map(|d| d.as_secs()))
            .bind(o.model.as_deref())
            .bind(o.runtime)
            .bind(o.solar_radiation)
            .bind(o.station_type.as_deref())
            .bind(o.temperature_outdoor.map(|v| v.0))
            .bind(o.temperature_indoor.map(|v| v.0))
            .bind(o.uv)
            .bind(o.vpd.map(|v| v.0))
            .bind(o.battery)
            .bind(o.wind_max_daily_gust.map(|v| v.0))
            .bind(o.wind_direction)
            .bind(o.wind_gust.map(|v| v.0))
            .bind(o.wind_speed.map(|v| v.0))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn latest(&self) -> Result<Option<StoredObservation>, Self::Error> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY received_at DESC, rowid DESC LIMIT 1",
            self.table
        );

        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;

        Ok(count as usize)
    }
}
