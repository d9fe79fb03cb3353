use anyhow::Result;

use std::io::Write;

use crate::db::{Reading, Store};
use crate::sampler::Tick;

pub fn render_reading(reading: &Reading) -> String {
    format!("{}: {}°C", reading.timestamp, reading.temperature)
}

pub fn render_tick(tick: &Tick) -> String {
    match tick.temperature {
        Some(temperature) => format!("{}: {temperature}°C", tick.timestamp),
        None => format!("{}: no reading", tick.timestamp),
    }
}

/// Writes the `limit` most recent readings to `out`, newest first.
pub fn show_recent(store: &Store, limit: usize, mut out: impl Write) -> Result<()> {
    let readings = store.recent(limit)?;

    if readings.is_empty() {
        writeln!(out, "No temperature readings found in database")?;
        return Ok(());
    }

    writeln!(out, "Last {limit} temperature readings:")?;
    for reading in &readings {
        writeln!(out, "{}", render_reading(reading))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("gpu_temperatures.db"));
        store.ensure_schema().unwrap();
        (dir, store)
    }

    fn show(store: &Store, limit: usize) -> String {
        let mut out = Vec::new();
        show_recent(store, limit, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn lists_readings_newest_first() {
        let (_dir, store) = temp_store();
        store.insert("2024-05-01 10:00:00".parse().unwrap(), 61).unwrap();
        store.insert("2024-05-01 10:00:01".parse().unwrap(), 63).unwrap();

        assert_eq!(
            show(&store, 10),
            "Last 10 temperature readings:\n\
             2024-05-01 10:00:01: 63°C\n\
             2024-05-01 10:00:00: 61°C\n"
        );
    }

    #[test]
    fn empty_store_prints_notice() {
        let (_dir, store) = temp_store();

        assert_eq!(show(&store, 10), "No temperature readings found in database\n");
    }

    #[test]
    fn zero_limit_prints_notice_and_leaves_store_alone() {
        let (_dir, store) = temp_store();
        store.insert("2024-05-01 10:00:00".parse().unwrap(), 61).unwrap();

        assert_eq!(show(&store, 0), "No temperature readings found in database\n");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn renders_missed_tick() {
        let tick = Tick {
            timestamp: "2024-05-01 10:00:00".parse().unwrap(),
            temperature: None,
        };

        assert_eq!(render_tick(&tick), "2024-05-01 10:00:00: no reading");
    }
}
