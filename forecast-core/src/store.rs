//! Persistence of fetched forecasts.
//!
//! Merge logic lives on [`ForecastTable`]; the file formats sit behind
//! [`TableStore`] and [`JsonDatasetStore`].

use indexmap::IndexMap;
use std::path::Path;

use crate::{error::StoreError, model::ForecastRecord};

pub mod dataset;
pub mod table;

pub use dataset::JsonDatasetStore;
pub use table::CsvTableStore;

/// Result of inserting a record into a [`ForecastTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Forecast rows keyed by city, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastTable {
    rows: IndexMap<String, ForecastRecord>,
}

impl ForecastTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the row for `record.city` in place, or append it.
    pub fn upsert(&mut self, record: ForecastRecord) -> Upsert {
        match self.rows.insert(record.city.clone(), record) {
            Some(_) => Upsert::Updated,
            None => Upsert::Inserted,
        }
    }

    pub fn get(&self, city: &str) -> Option<&ForecastRecord> {
        self.rows.get(city)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForecastRecord> {
        self.rows.values()
    }
}

impl FromIterator<ForecastRecord> for ForecastTable {
    fn from_iter<I: IntoIterator<Item = ForecastRecord>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.upsert(record);
        }
        table
    }
}

/// Serialization boundary for a [`ForecastTable`].
pub trait TableStore {
    /// Load the stored table. A store with no backing file yet is empty.
    fn load(&self) -> Result<ForecastTable, StoreError>;

    /// Replace the stored table with `table`.
    fn save(&self, table: &ForecastTable) -> Result<(), StoreError>;

    fn location(&self) -> &Path;
}

/// What [`save_record`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
    /// There was no record; the store was left untouched.
    Skipped,
}

impl From<Upsert> for SaveOutcome {
    fn from(value: Upsert) -> Self {
        match value {
            Upsert::Inserted => SaveOutcome::Inserted,
            Upsert::Updated => SaveOutcome::Updated,
        }
    }
}

/// Upsert `record` into the store by city. `None` skips without touching the store.
pub fn save_record<S>(store: &S, record: Option<ForecastRecord>) -> Result<SaveOutcome, StoreError>
where
    S: TableStore + ?Sized,
{
    let Some(record) = record else {
        tracing::info!(path = %store.location().display(), "no forecast to save");
        return Ok(SaveOutcome::Skipped);
    };

    let mut table = store.load()?;
    let city = record.city.clone();
    let outcome = table.upsert(record);
    store.save(&table)?;

    tracing::info!(%city, ?outcome, rows = table.len(), "forecast table saved");
    Ok(outcome.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn record(city: &str, condition: &str) -> ForecastRecord {
        ForecastRecord {
            condition: condition.into(),
            precipitation_probability: "20%".into(),
            min_temperature: "18°C".into(),
            max_temperature: "25°C".into(),
            comfort_index: "舒適".into(),
            city: city.into(),
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut table = ForecastTable::new();
        assert_eq!(table.upsert(record("臺北市", "陰")), Upsert::Inserted);
        assert_eq!(table.upsert(record("臺中市", "晴")), Upsert::Inserted);
        assert_eq!(table.upsert(record("臺北市", "雨")), Upsert::Updated);

        let cities: Vec<_> = table.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, ["臺北市", "臺中市"]);
        assert_eq!(table.get("臺北市").unwrap().condition, "雨");
    }

    #[test]
    fn collecting_keeps_last_duplicate() {
        let table: ForecastTable = vec![
            record("臺北市", "陰"),
            record("高雄市", "晴"),
            record("臺北市", "雨"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("臺北市").unwrap().condition, "雨");
    }
}
