use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{error::StoreError, model::ForecastEntry};

/// JSON array of [`ForecastEntry`] values, the input of the question-answering shell.
#[derive(Debug, Clone)]
pub struct JsonDatasetStore {
    path: PathBuf,
}

impl JsonDatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn location(&self) -> &Path {
        &self.path
    }

    /// Load every entry. A missing file is [`StoreError::NotFound`].
    pub fn load(&self) -> Result<Vec<ForecastEntry>, StoreError> {
        let text = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound(self.path.clone())
            } else {
                StoreError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, entries: &[ForecastEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace every entry of `city` with `entries`, keeping other cities.
    ///
    /// Returns the number of entries written.
    pub fn merge_city(&self, city: &str, entries: Vec<ForecastEntry>) -> Result<usize, StoreError> {
        let mut all = match self.load() {
            Ok(existing) => existing,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };

        all.retain(|e| e.city.as_deref() != Some(city));
        all.extend(entries);
        self.save(&all)?;

        tracing::info!(path = %self.path.display(), %city, total = all.len(), "dataset saved");
        Ok(all.len())
    }
}
