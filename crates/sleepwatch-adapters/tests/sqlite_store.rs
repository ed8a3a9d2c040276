//! Integration tests for the SQLite outcome store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use sleepwatch_adapters::SqliteOutcomeStore;
use sleepwatch_core::domain::{
    EyeState, PostureFinding, SleepOutcome, SleepVerdict, UnconfirmedReason,
};
use sleepwatch_core::pipeline::summarize_by_day;
use sleepwatch_core::OutcomeStore;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

fn sample_outcomes() -> Vec<SleepOutcome> {
    vec![
        SleepOutcome::new(SleepVerdict::Open, at(1, 8)),
        SleepOutcome::new(SleepVerdict::ClosedConfirmed, at(1, 23)),
        SleepOutcome::new(
            SleepVerdict::ClosedUnconfirmed(UnconfirmedReason::Upright),
            at(2, 0),
        ),
        SleepOutcome::new(
            SleepVerdict::ClosedUnconfirmed(UnconfirmedReason::NoPoseDetected),
            at(2, 12),
        ),
        SleepOutcome::new(SleepVerdict::Open, at(2, 13)),
        SleepOutcome::new(SleepVerdict::ClosedConfirmed, at(4, 2)),
    ]
}

#[test]
fn test_round_trip_preserves_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteOutcomeStore::open(dir.path().join("outcomes.db")).unwrap();

    for outcome in sample_outcomes() {
        store.append(&outcome).unwrap();
    }

    assert_eq!(store.outcomes().unwrap(), sample_outcomes());
}

#[test]
fn test_posture_column_keeps_three_states() {
    let store = SqliteOutcomeStore::in_memory().unwrap();
    for outcome in sample_outcomes() {
        store.append(&outcome).unwrap();
    }

    let postures: Vec<_> = store
        .outcomes()
        .unwrap()
        .iter()
        .map(SleepOutcome::posture)
        .collect();
    assert_eq!(
        postures,
        vec![
            None,
            Some(PostureFinding::LyingDown),
            Some(PostureFinding::Upright),
            Some(PostureFinding::Undetected),
            None,
            Some(PostureFinding::LyingDown),
        ]
    );
}

#[test]
fn test_summaries_agree_with_in_memory_aggregation() {
    let store = SqliteOutcomeStore::in_memory().unwrap();
    for outcome in sample_outcomes() {
        store.append(&outcome).unwrap();
    }

    for limit in [0, 1, 2, 30] {
        assert_eq!(
            store.daily_summaries(limit).unwrap(),
            summarize_by_day(&sample_outcomes(), limit),
            "limit {limit}"
        );
    }
}

#[test]
fn test_summaries_newest_first() {
    let store = SqliteOutcomeStore::in_memory().unwrap();
    for outcome in sample_outcomes() {
        store.append(&outcome).unwrap();
    }

    let summaries = store.daily_summaries(30).unwrap();
    let dates: Vec<_> = summaries.iter().map(|s| s.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ]
    );

    let day2 = &summaries[1];
    assert_eq!(day2.total_predictions, 3);
    assert_eq!(day2.closed_count, 2);
    assert_eq!(day2.open_count, 1);
    assert_eq!(day2.sleep_confirmed_count, 0);
}

#[test]
fn test_window_limits_distinct_dates() {
    let store = SqliteOutcomeStore::in_memory().unwrap();
    let start = at(1, 12);
    for offset in 0..40 {
        let when = start + chrono::Days::new(offset);
        store
            .append(&SleepOutcome::new(SleepVerdict::Open, when))
            .unwrap();
    }

    let summaries = store.daily_summaries(30).unwrap();
    assert_eq!(summaries.len(), 30);
    assert_eq!(summaries[0].date, NaiveDate::from_ymd_opt(2024, 4, 9).unwrap());
    assert_eq!(summaries[29].date, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
}

#[test]
fn test_empty_store() {
    let store = SqliteOutcomeStore::in_memory().unwrap();
    assert!(store.daily_summaries(30).unwrap().is_empty());
    assert!(store.outcomes().unwrap().is_empty());
}

#[test]
fn test_reopen_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/dir/outcomes.db");

    {
        let store = SqliteOutcomeStore::open(&path).unwrap();
        store
            .append(&SleepOutcome::new(SleepVerdict::ClosedConfirmed, at(5, 3)))
            .unwrap();
    }

    let store = SqliteOutcomeStore::open(&path).unwrap();
    let outcomes = store.outcomes().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].prediction(), EyeState::Closed);
}

#[test]
fn test_upgrades_legacy_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    // A database written before posture was tracked, with server-side timestamps.
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE eye_state_records (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                 prediction TEXT NOT NULL,
                 sleep_confirmed INTEGER
             );
             INSERT INTO eye_state_records (timestamp, prediction, sleep_confirmed)
                 VALUES ('2024-02-10 21:30:00', 'Closed', 1);
             INSERT INTO eye_state_records (timestamp, prediction, sleep_confirmed)
                 VALUES ('2024-02-10 22:00:00', 'Open', NULL);
             PRAGMA user_version = 1;",
        )
        .unwrap();
    }

    let store = SqliteOutcomeStore::open(&path).unwrap();
    let outcomes = store.outcomes().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].sleep_confirmed(), Some(true));
    assert_eq!(outcomes[0].posture(), None);
    assert_eq!(outcomes[1].prediction(), EyeState::Open);

    let summaries = store.daily_summaries(30).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
    assert_eq!(summaries[0].sleep_confirmed_count, 1);

    // New rows land next to the legacy ones.
    store
        .append(&SleepOutcome::new(SleepVerdict::Open, at(1, 0)))
        .unwrap();
    assert_eq!(store.outcomes().unwrap().len(), 3);
}
