//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The CWA open data forecast provider
//! - Keyed forecast tables and their CSV/JSON stores
//! - A retrieval-augmented question-answering chain over saved forecasts
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod rag;
pub mod store;

pub use config::{AssistantConfig, Config, FetchConfig};
pub use error::{FetchError, RagError, StoreError};
pub use model::{ForecastEntry, ForecastRecord, ForecastRequest, TimeSlot};
pub use provider::{ForecastProvider, cwa::CityForecast, cwa::CwaProvider};
pub use rag::{Embedder, Generator, QaChain, Retriever};
pub use store::{
    CsvTableStore, ForecastTable, JsonDatasetStore, SaveOutcome, TableStore, save_record,
};
