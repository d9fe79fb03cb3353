use chrono::{Local, NaiveDateTime, SubsecRound};
use diesel::backend;
use diesel::connection::SimpleConnection;
use diesel::deserialize::{self, FromSql};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use diesel::{prelude::*, AsExpression, FromSqlRow};
use thiserror::Error;

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub mod schema;

use schema::gpu_temperatures;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {path:?}")]
    Connect {
        path: PathBuf,
        #[source]
        source: diesel::ConnectionError,
    },

    #[error("database {stage} failed")]
    Query {
        stage: &'static str,
        #[source]
        source: diesel::result::Error,
    },
}

fn failed(stage: &'static str) -> impl FnOnce(diesel::result::Error) -> StoreError {
    move |source| StoreError::Query { stage, source }
}

/// A persisted GPU temperature sample.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = gpu_temperatures)]
#[diesel(check_for_backend(Sqlite))]
pub struct Reading {
    pub id: i32,
    pub timestamp: Timestamp,
    pub temperature: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = gpu_temperatures)]
struct NewReading {
    timestamp: Timestamp,
    temperature: i32,
}

/// Local wall-clock time at second precision, stored as `YYYY-MM-DD HH:MM:SS` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    // Older databases carry a fractional-seconds suffix; `%.f` accepts it when present.
    const PARSE_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn now() -> Timestamp {
        Timestamp(Local::now().naive_local().trunc_subsecs(0))
    }
}

impl Deref for Timestamp {
    type Target = NaiveDateTime;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), Self::PARSE_FORMAT)
            .map(|datetime| Timestamp(datetime.trunc_subsecs(0)))
    }
}

impl FromSql<Text, Sqlite> for Timestamp {
    fn from_sql(value: backend::RawValue<Sqlite>) -> deserialize::Result<Self> {
        let raw_val = <String as FromSql<Text, Sqlite>>::from_sql(value)?;

        Ok(raw_val.parse()?)
    }
}

impl ToSql<Text, Sqlite> for Timestamp {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.to_string());

        Ok(IsNull::No)
    }
}

/// SQLite-backed store of GPU temperature readings.
///
/// Every operation opens its own connection and drops it when done, so a
/// query run from another process can read while a monitor run is writing.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    const CREATE_TABLE: &'static str = "CREATE TABLE IF NOT EXISTS gpu_temperatures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME NOT NULL,
            temperature INTEGER NOT NULL
        )";

    pub fn open(path: impl Into<PathBuf>) -> Store {
        Store {
            path: path.into(),
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<SqliteConnection, StoreError> {
        log::trace!("Opening database {:?}.", self.path);

        let mut conn = SqliteConnection::establish(&self.path.to_string_lossy()).map_err(
            |source| StoreError::Connect {
                path: self.path.clone(),
                source,
            },
        )?;

        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(failed("connection setup"))?;

        Ok(conn)
    }

    /// Creates the readings table unless it already exists.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.connect()?;

        log::trace!("Ensuring gpu_temperatures table exists.");
        conn.batch_execute(Self::CREATE_TABLE)
            .map_err(failed("ensure schema"))
    }

    /// Appends one reading and returns it with its assigned id.
    pub fn insert(&self, timestamp: Timestamp, temperature: i32) -> Result<Reading, StoreError> {
        use schema::gpu_temperatures::dsl;

        let mut conn = self.connect()?;

        log::trace!("Inserting reading {temperature} at {timestamp}.");
        conn.immediate_transaction(|conn| {
            diesel::insert_into(dsl::gpu_temperatures)
                .values(&NewReading {
                    timestamp,
                    temperature,
                })
                .execute(conn)?;

            dsl::gpu_temperatures
                .order(dsl::id.desc())
                .select(Reading::as_select())
                .first(conn)
        })
        .map_err(failed("insert"))
    }

    /// Returns up to `limit` readings, most recently inserted first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        use schema::gpu_temperatures::dsl;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connect()?;

        dsl::gpu_temperatures
            .order(dsl::id.desc())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(Reading::as_select())
            .load(&mut conn)
            .map_err(failed("recent"))
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        use schema::gpu_temperatures::dsl;

        let mut conn = self.connect()?;

        dsl::gpu_temperatures
            .count()
            .get_result(&mut conn)
            .map_err(failed("count"))
    }
}
