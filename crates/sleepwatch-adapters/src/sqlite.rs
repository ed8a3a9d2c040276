//! SQLite outcome store.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use sleepwatch_core::domain::{DailySummary, EyeState, PostureFinding, SleepOutcome};
use sleepwatch_core::ports::OutcomeStore;
use tracing::{debug, info, warn};

const CURRENT_SCHEMA_VERSION: i32 = 2;

/// `OutcomeStore` backed by one SQLite connection.
///
/// Writes are serialized through a mutex. Aggregation runs as a single
/// `GROUP BY date(timestamp)` query.
pub struct SqliteOutcomeStore {
    conn: Mutex<Connection>,
}

impl SqliteOutcomeStore {
    /// Opens (creating if needed) the database at `path` and migrates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or migrations fail.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!("Failed to enable WAL mode: {err}");
        }
        info!("Opened outcome database at {}", path.display());
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Every stored outcome, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn outcomes(&self) -> Result<Vec<SleepOutcome>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(
            "SELECT timestamp, prediction, sleep_confirmed, posture
             FROM eye_state_records
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| Ok(row_to_outcome(row)))?;

        let outcomes: Result<Vec<SleepOutcome>> = rows.map(|row| row?).collect();
        outcomes
    }
}

impl OutcomeStore for SqliteOutcomeStore {
    fn append(&self, outcome: &SleepOutcome) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO eye_state_records (timestamp, prediction, sleep_confirmed, posture)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                outcome
                    .recorded_at()
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
                outcome.prediction().as_str(),
                outcome.sleep_confirmed(),
                outcome.posture().map(PostureFinding::as_str),
            ],
        )
        .context("Failed to insert outcome")?;
        debug!(id = conn.last_insert_rowid(), "Inserted outcome");
        Ok(())
    }

    fn daily_summaries(&self, limit: usize) -> Result<Vec<DailySummary>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(
            "SELECT date(timestamp) AS day,
                    COUNT(*) AS total_predictions,
                    SUM(CASE WHEN prediction = 'Closed' THEN 1 ELSE 0 END) AS closed_count,
                    SUM(CASE WHEN prediction = 'Open' THEN 1 ELSE 0 END) AS open_count,
                    SUM(CASE WHEN sleep_confirmed = 1 THEN 1 ELSE 0 END) AS sleep_confirmed_count
             FROM eye_state_records
             WHERE date(timestamp) IS NOT NULL
             GROUP BY day
             ORDER BY day DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], |row| Ok(row_to_summary(row)))?;

        let summaries: Result<Vec<DailySummary>> = rows.map(|row| row?).collect();
        summaries
    }
}

fn row_to_summary(row: &Row) -> Result<DailySummary> {
    let day: String = row.get("day")?;
    Ok(DailySummary {
        date: NaiveDate::parse_from_str(&day, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{day}'"))?,
        total_predictions: to_u64(row.get("total_predictions")?, "total_predictions")?,
        closed_count: to_u64(row.get("closed_count")?, "closed_count")?,
        open_count: to_u64(row.get("open_count")?, "open_count")?,
        sleep_confirmed_count: to_u64(row.get("sleep_confirmed_count")?, "sleep_confirmed_count")?,
    })
}

fn row_to_outcome(row: &Row) -> Result<SleepOutcome> {
    let timestamp: String = row.get("timestamp")?;
    let prediction: String = row.get("prediction")?;
    let posture: Option<String> = row.get("posture")?;

    Ok(SleepOutcome::from_parts(
        parse_timestamp(&timestamp)?,
        prediction.parse::<EyeState>().map_err(|e| anyhow!(e))?,
        row.get("sleep_confirmed")?,
        posture
            .map(|p| p.parse::<PostureFinding>().map_err(|e| anyhow!(e)))
            .transpose()?,
    ))
}

fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

/// Parses RFC 3339, or SQLite's `CURRENT_TIMESTAMP` form (UTC) used by older rows.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.and_utc())
        .with_context(|| format!("invalid timestamp '{value}'"))
}

fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({version}) is newer than supported schema ({CURRENT_SCHEMA_VERSION})"
        );
    }
    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;
    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    debug!(version, "Schema migrated");
    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    let sql = match version {
        1 => include_str!("schemas/schema_v1.sql"),
        2 => include_str!("schemas/schema_v2.sql"),
        other => bail!("no migration for version {other}"),
    };
    tx.execute_batch(sql)
        .with_context(|| format!("failed to execute schema_v{version}.sql"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_set_version() {
        let store = SqliteOutcomeStore::in_memory().unwrap();
        let conn = store.conn.lock().unwrap();
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();
        assert!(run_migrations(&mut conn).is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-06-01T22:15:00.250Z").unwrap();
        assert_eq!(rfc.to_rfc3339_opts(SecondsFormat::Millis, true), "2024-06-01T22:15:00.250Z");

        let legacy = parse_timestamp("2024-06-01 22:15:00").unwrap();
        assert_eq!(legacy.to_rfc3339(), "2024-06-01T22:15:00+00:00");

        assert!(parse_timestamp("yesterday").is_err());
    }
}
