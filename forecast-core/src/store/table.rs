use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::StoreError, model::ForecastRecord};

use super::{ForecastTable, TableStore};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column header of the CSV table, in serialization order of [`ForecastRecord`].
pub const CSV_HEADER: [&str; 6] = [
    "天氣狀態",
    "降雨機率",
    "最低溫度",
    "最高溫度",
    "天氣體感",
    "城市",
];

/// CSV file with a UTF-8 byte-order mark and one row per city.
///
/// Rows are read by header name, so column order in an existing file does not matter.
/// Saving rewrites the whole file; there is no locking between processes.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    path: PathBuf,
}

impl CsvTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TableStore for CsvTableStore {
    fn load(&self) -> Result<ForecastTable, StoreError> {
        if !self.path.exists() {
            return Ok(ForecastTable::new());
        }

        let text = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());

        let mut table = ForecastTable::new();
        for row in reader.deserialize::<ForecastRecord>() {
            table.upsert(row.map_err(|e| self.csv_error(e))?);
        }

        tracing::debug!(path = %self.path.display(), rows = table.len(), "loaded forecast table");
        Ok(table)
    }

    fn save(&self, table: &ForecastTable) -> Result<(), StoreError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::from(UTF8_BOM));

        writer
            .write_record(CSV_HEADER)
            .map_err(|e| self.csv_error(e))?;
        for record in table.iter() {
            writer.serialize(record).map_err(|e| self.csv_error(e))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| self.io_error(e.into_error()))?;

        fs::write(&self.path, bytes).map_err(|e| self.io_error(e))
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SaveOutcome, save_record, tests::record};

    fn store_in(dir: &tempfile::TempDir) -> CsvTableStore {
        CsvTableStore::new(dir.path().join("weather_data.csv"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = store_in(&dir).load().unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn written_file_has_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        save_record(&store, Some(record("臺中市", "多雲"))).unwrap();

        let bytes = fs::read(store.location()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("天氣狀態,降雨機率,最低溫度,最高溫度,天氣體感,城市"));
        assert_eq!(lines.next(), Some("多雲,20%,18°C,25°C,舒適,臺中市"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn saving_same_city_twice_keeps_one_row_with_latest_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let first = save_record(&store, Some(record("臺中市", "晴"))).unwrap();
        let second = save_record(&store, Some(record("臺中市", "陣雨"))).unwrap();

        assert_eq!(first, SaveOutcome::Inserted);
        assert_eq!(second, SaveOutcome::Updated);

        let table = store.load().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("臺中市").unwrap().condition, "陣雨");
    }

    #[test]
    fn saving_another_city_preserves_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        save_record(&store, Some(record("臺中市", "晴"))).unwrap();
        save_record(&store, Some(record("高雄市", "多雲"))).unwrap();

        let table = store.load().unwrap();
        let cities: Vec<_> = table.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, ["臺中市", "高雄市"]);
        assert_eq!(table.get("臺中市").unwrap().condition, "晴");
    }

    #[test]
    fn absent_record_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        save_record(&store, Some(record("臺中市", "晴"))).unwrap();
        let before = fs::read(store.location()).unwrap();

        let outcome = save_record(&store, None).unwrap();

        assert_eq!(outcome, SaveOutcome::Skipped);
        assert_eq!(fs::read(store.location()).unwrap(), before);
    }

    #[test]
    fn absent_record_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        save_record(&store, None).unwrap();

        assert!(!store.location().exists());
    }

    #[test]
    fn reads_reordered_columns_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.location(),
            "\u{feff}城市,天氣狀態,降雨機率,最低溫度,最高溫度,天氣體感\n臺南市,晴,0%,20°C,28°C,舒適\n",
        )
        .unwrap();

        save_record(&store, Some(record("臺中市", "多雲"))).unwrap();

        let table = store.load().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("臺南市").unwrap().max_temperature, "28°C");
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.location(), "城市,天氣狀態\n臺南市,晴\n").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Csv { .. }));
    }
}
